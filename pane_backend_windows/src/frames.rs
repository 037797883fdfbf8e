// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame bookkeeping of the render loop.

#![cfg_attr(
    not(windows),
    allow(dead_code, reason = "only the Win32 loop drives it outside tests")
)]

use pane_core::SurfaceSize;
use pane_core::backend::{FrameContext, Presentation, Renderer};
use pane_core::time::Duration;
use pane_core::trace::{PresentEvent, PresentOutcome, TraceSink};

/// Numbers frames and reports each present.
///
/// Every frame handed to the renderer counts as drawn, failed presents
/// included, the same as on Wayland.
#[derive(Debug, Default)]
pub(crate) struct FrameLoop {
    frames_drawn: u64,
}

impl FrameLoop {
    pub(crate) fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Draws one frame into `target` and reports it to `sink`.
    pub(crate) fn draw<S, R: Renderer<S>>(
        &mut self,
        renderer: &mut R,
        target: &mut S,
        size: SurfaceSize,
        elapsed: Duration,
        sink: &mut dyn TraceSink,
    ) -> PresentOutcome {
        let frame = FrameContext {
            frame_index: self.frames_drawn,
            size,
            elapsed,
        };
        let outcome = match renderer.render_frame(target, &frame) {
            Ok(Presentation::Committed) => PresentOutcome::Committed,
            Ok(Presentation::Uncommitted) => PresentOutcome::Uncommitted,
            Err(err) => {
                tracing::warn!(%err, frame = frame.frame_index, "present failed");
                PresentOutcome::Failed
            }
        };
        self.frames_drawn += 1;
        sink.on_present(&PresentEvent {
            frame_index: frame.frame_index,
            size,
            elapsed_ms: elapsed.as_millis(),
            outcome,
        });
        outcome
    }
}
