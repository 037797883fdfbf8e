// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A CPU renderer that paints into plain memory.
//!
//! [`MemoryRenderer`] mirrors the shared-memory renderer's request sequence
//! (attach, damage the whole buffer, commit) with two alternating
//! buffers, but keeps the pixels in `Vec<u8>`s. It stands in for a real
//! backend when replaying sessions headlessly.
//!
//! Like the shared-memory renderer it never repaints a buffer the compositor
//! still holds: when both are held the frame fails with
//! [`PresentError::BuffersBusy`].

use pane_core::SurfaceSize;
use pane_core::backend::{BackendError, FrameContext, PresentError, Presentation, Renderer};
use pane_core::pixels::{BufferLayout, Pattern, PixelFormat, next_free_buffer, paint};
use pane_core::surface::{DamageRect, SurfaceOps};

use crate::wire::{BufferInfo, RecordingSurface};

struct Slot {
    id: u32,
    layout: BufferLayout,
    pixels: Vec<u8>,
}

impl Slot {
    fn new(id: u32, layout: BufferLayout) -> Self {
        Self {
            id,
            layout,
            pixels: vec![0; layout.byte_len()],
        }
    }
}

/// Paints a [`Pattern`] into two alternating in-memory buffers.
pub struct MemoryRenderer {
    pattern: Pattern,
    slots: [Slot; 2],
    next: usize,
    next_id: u32,
    fail_every: Option<u64>,
    resizes: Vec<SurfaceSize>,
}

impl std::fmt::Debug for MemoryRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRenderer")
            .field("pattern", &self.pattern)
            .field("size", &self.size())
            .field("next", &self.next)
            .field("fail_every", &self.fail_every)
            .finish_non_exhaustive()
    }
}

impl MemoryRenderer {
    /// Allocates two buffers of `size`.
    pub fn new(size: SurfaceSize, pattern: Pattern) -> Result<Self, BackendError> {
        let layout = layout(size)?;
        Ok(Self {
            pattern,
            slots: [Slot::new(1, layout), Slot::new(2, layout)],
            next: 0,
            next_id: 3,
            fail_every: None,
            resizes: Vec::new(),
        })
    }

    /// Makes every `n`th frame (1-based) fail to present.
    #[must_use]
    pub fn failing_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }

    /// Current buffer size.
    #[must_use]
    pub fn size(&self) -> SurfaceSize {
        self.slots[0].layout.size()
    }

    /// Every size passed to [`Renderer::resize`].
    #[must_use]
    pub fn resizes(&self) -> &[SurfaceSize] {
        &self.resizes
    }

    /// Pixels of the most recently painted buffer.
    #[must_use]
    pub fn front(&self) -> &[u8] {
        &self.slots[1 - self.next].pixels
    }
}

fn layout(size: SurfaceSize) -> Result<BufferLayout, BackendError> {
    BufferLayout::new(size, PixelFormat::Argb8888)
        .map_err(|e| BackendError::resource("memory buffer", e.to_string()))
}

impl Renderer<RecordingSurface> for MemoryRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.resizes.push(size);
        match layout(size) {
            Ok(layout) => {
                for slot in &mut self.slots {
                    *slot = Slot::new(self.next_id, layout);
                    self.next_id += 1;
                }
            }
            Err(err) => tracing::warn!(%err, "keeping previous buffers"),
        }
    }

    fn render_frame(
        &mut self,
        target: &mut RecordingSurface,
        frame: &FrameContext,
    ) -> Result<Presentation, PresentError> {
        if self
            .fail_every
            .is_some_and(|n| (frame.frame_index + 1) % n == 0)
        {
            return Err(PresentError::Failed("injected failure".to_owned()));
        }
        let busy = self.slots.each_ref().map(|slot| target.is_held(slot.id));
        let index = next_free_buffer(&busy, self.next).ok_or(PresentError::BuffersBusy)?;
        let slot = &mut self.slots[index];
        paint(&mut slot.pixels, &slot.layout, &self.pattern, frame)
            .map_err(|e| PresentError::Failed(e.to_string()))?;
        let info = BufferInfo {
            id: slot.id,
            size: slot.layout.size(),
        };
        target.attach(Some(&info));
        target.damage(DamageRect::full(info.size));
        target.commit();
        self.next = 1 - index;
        Ok(Presentation::Committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pane_core::pixels::Argb;
    use pane_core::time::Duration;

    use crate::wire::ReleasePolicy;

    fn frame(index: u64) -> FrameContext {
        FrameContext {
            frame_index: index,
            size: SurfaceSize::DEFAULT,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn buffers_alternate() {
        let size = SurfaceSize::new(4, 4).unwrap();
        let mut r = MemoryRenderer::new(size, Pattern::Solid(Argb::RED)).unwrap();
        let mut s = RecordingSurface::new();
        r.render_frame(&mut s, &frame(0)).unwrap();
        r.render_frame(&mut s, &frame(1)).unwrap();
        r.render_frame(&mut s, &frame(2)).unwrap();
        let ids: Vec<u32> = s
            .log()
            .requests()
            .filter_map(|r| match r {
                crate::wire::Request::Attach(Some(b)) => Some(b.id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, [1, 2, 1]);
        assert_eq!(r.front().len(), 64);
        assert_eq!(&r.front()[..4], &Argb::RED.0.to_le_bytes());
    }

    #[test]
    fn resize_reallocates_at_the_new_size() {
        let mut r =
            MemoryRenderer::new(SurfaceSize::DEFAULT, Pattern::default()).unwrap();
        let size = SurfaceSize::new(10, 3).unwrap();
        r.resize(size);
        assert_eq!(r.size(), size);
        assert_eq!(r.front().len(), 120);
        assert_eq!(r.resizes(), &[size]);
    }

    #[test]
    fn injected_failures_skip_the_attach() {
        let size = SurfaceSize::new(2, 2).unwrap();
        let mut r = MemoryRenderer::new(size, Pattern::default())
            .unwrap()
            .failing_every(2);
        let mut s = RecordingSurface::new();
        assert!(r.render_frame(&mut s, &frame(0)).is_ok());
        assert!(r.render_frame(&mut s, &frame(1)).is_err());
        assert_eq!(s.log().attach_count(), 1);
    }

    #[test]
    fn held_buffers_are_not_repainted() {
        let size = SurfaceSize::new(2, 2).unwrap();
        let mut r = MemoryRenderer::new(size, Pattern::default()).unwrap();
        let mut s = RecordingSurface::new();
        s.set_release_policy(ReleasePolicy::Manual);
        r.render_frame(&mut s, &frame(0)).unwrap();
        r.render_frame(&mut s, &frame(1)).unwrap();
        assert_eq!(r.render_frame(&mut s, &frame(2)), Err(PresentError::BuffersBusy));
        assert_eq!(s.log().attach_count(), 2);
    }
}
