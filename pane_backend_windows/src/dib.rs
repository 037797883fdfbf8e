// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU renderer: a top-down 32-bit DIB section blitted with GDI.
//!
//! A 32-bit `BI_RGB` DIB stores each pixel as a little-endian `0x00RRGGBB`,
//! the same bytes [`paint`] writes for `Xrgb8888`. Frames are paced with
//! `DwmFlush`.

#![expect(unsafe_code, reason = "GDI device contexts and DIB sections")]

use std::ffi::c_void;
use std::ptr;

use pane_core::SurfaceSize;
use pane_core::backend::{
    BackendError, FrameContext, InitStage, PresentError, Presentation, Renderer,
};
use pane_core::pixels::{BufferLayout, PixelFormat, Pattern, paint};
use windows::Win32::Graphics::Dwm::DwmFlush;
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleDC, CreateDIBSection,
    DIB_RGB_COLORS, DeleteDC, DeleteObject, GdiFlush, GetDC, HBITMAP, HDC, HGDIOBJ, ReleaseDC,
    SRCCOPY, SelectObject,
};

use crate::window::Window;

/// A DIB section selected into its own memory DC.
#[derive(Debug)]
struct DibSection {
    dc: HDC,
    bitmap: HBITMAP,
    previous: HGDIOBJ,
    bits: *mut u8,
    layout: BufferLayout,
}

impl DibSection {
    fn new(layout: BufferLayout) -> Result<Self, BackendError> {
        let (width, height) = layout.size().to_i32();
        let info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height selects a top-down bitmap.
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };
        // SAFETY: `info` and `bits` are locals; the returned handles are
        // owned by the new section and released in `Drop`.
        unsafe {
            let dc = CreateCompatibleDC(None);
            if dc.is_invalid() {
                return Err(BackendError::init(InitStage::Surface, "CreateCompatibleDC failed"));
            }
            let mut bits: *mut c_void = ptr::null_mut();
            let bitmap = match CreateDIBSection(Some(dc), &info, DIB_RGB_COLORS, &mut bits, None, 0)
            {
                Ok(bitmap) if !bits.is_null() => bitmap,
                Ok(bitmap) => {
                    let _ = DeleteObject(bitmap.into());
                    let _ = DeleteDC(dc);
                    return Err(BackendError::init(InitStage::SharedMemory, "DIB has no bits"));
                }
                Err(err) => {
                    let _ = DeleteDC(dc);
                    return Err(BackendError::init(InitStage::SharedMemory, err.message()));
                }
            };
            let previous = SelectObject(dc, bitmap.into());
            Ok(Self {
                dc,
                bitmap,
                previous,
                bits: bits.cast(),
                layout,
            })
        }
    }

    fn pixels(&mut self) -> &mut [u8] {
        // SAFETY: the section holds `byte_len` bytes at `bits` until drop;
        // the exclusive borrow keeps this the only slice.
        unsafe { std::slice::from_raw_parts_mut(self.bits, self.layout.byte_len()) }
    }
}

impl Drop for DibSection {
    fn drop(&mut self) {
        // SAFETY: restores the DC's original bitmap before deleting ours.
        unsafe {
            SelectObject(self.dc, self.previous);
            let _ = DeleteObject(self.bitmap.into());
            let _ = DeleteDC(self.dc);
        }
    }
}

/// Paints a [`Pattern`] on the CPU and blits it into the window.
#[derive(Debug)]
pub struct DibRenderer {
    pattern: Pattern,
    size: SurfaceSize,
    section: Option<DibSection>,
}

impl DibRenderer {
    /// Allocates a DIB section of `size`.
    pub fn new(size: SurfaceSize, pattern: Pattern) -> Result<Self, BackendError> {
        let mut renderer = Self {
            pattern,
            size,
            section: None,
        };
        renderer.section = Some(renderer.allocate()?);
        Ok(renderer)
    }

    fn allocate(&self) -> Result<DibSection, BackendError> {
        let layout = BufferLayout::new(self.size, PixelFormat::Xrgb8888)
            .map_err(|err| BackendError::init(InitStage::SharedMemory, err.to_string()))?;
        DibSection::new(layout)
    }
}

impl Renderer<Window> for DibRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        // Reallocated by the next render.
        self.section = None;
    }

    fn render_frame(
        &mut self,
        target: &mut Window,
        frame: &FrameContext,
    ) -> Result<Presentation, PresentError> {
        if self.section.is_none() {
            self.section = Some(
                self.allocate()
                    .map_err(|err| PresentError::Failed(err.to_string()))?,
            );
        }
        let Some(section) = &mut self.section else {
            return Err(PresentError::Failed("no DIB section".into()));
        };
        let layout = section.layout;
        paint(section.pixels(), &layout, &self.pattern, frame)
            .map_err(|err| PresentError::Failed(err.to_string()))?;

        let (width, height) = layout.size().to_i32();
        let hwnd = target.hwnd();
        // SAFETY: the window DC is released before returning; the section's
        // DC is alive for the blit.
        let blitted = unsafe {
            let _ = GdiFlush();
            let window_dc = GetDC(Some(hwnd));
            let blitted = BitBlt(window_dc, 0, 0, width, height, Some(section.dc), 0, 0, SRCCOPY);
            ReleaseDC(Some(hwnd), window_dc);
            blitted
        };
        blitted.map_err(|err| PresentError::Failed(err.message()))?;

        // SAFETY: no arguments; blocks until the compositor's next frame.
        if let Err(err) = unsafe { DwmFlush() } {
            tracing::trace!(%err, "DwmFlush failed");
        }
        Ok(Presentation::Committed)
    }
}
