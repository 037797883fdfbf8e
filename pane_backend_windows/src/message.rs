// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window messages the run loop reacts to.
//!
//! Decoding works on raw `WPARAM`/`LPARAM` values so it can be tested on any
//! platform.

use pane_core::SurfaceSize;

/// `WM_DESTROY`.
pub const WM_DESTROY: u32 = 0x0002;
/// `WM_SIZE`.
pub const WM_SIZE: u32 = 0x0005;
/// `WM_CLOSE`.
pub const WM_CLOSE: u32 = 0x0010;
/// `WM_KEYDOWN`.
pub const WM_KEYDOWN: u32 = 0x0100;
/// Virtual-key code of Escape.
pub const VK_ESCAPE: usize = 0x1B;

/// What a window message means for the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowEvent {
    /// The client area changed to a non-zero size.
    Resized(SurfaceSize),
    /// The user asked to close the window (close button, Alt+F4, Escape).
    CloseRequested,
    /// The window is being destroyed.
    Destroyed,
}

/// Decodes one message; `None` for messages left to `DefWindowProcW`.
///
/// `WM_SIZE` with a zero dimension (minimised) is dropped.
#[must_use]
pub fn translate(msg: u32, wparam: usize, lparam: isize) -> Option<WindowEvent> {
    match msg {
        WM_SIZE => {
            let (width, height) = client_size(lparam);
            SurfaceSize::new(width, height).map(WindowEvent::Resized)
        }
        WM_CLOSE => Some(WindowEvent::CloseRequested),
        WM_KEYDOWN if wparam == VK_ESCAPE => Some(WindowEvent::CloseRequested),
        WM_DESTROY => Some(WindowEvent::Destroyed),
        _ => None,
    }
}

/// Splits a `WM_SIZE` `LPARAM` into width (low word) and height (high word).
#[must_use]
pub fn client_size(lparam: isize) -> (u32, u32) {
    let bits = lparam as usize;
    let width = bits & 0xFFFF;
    let height = (bits >> 16) & 0xFFFF;
    #[expect(clippy::cast_possible_truncation, reason = "both are 16-bit")]
    (width as u32, height as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_lparam(width: u16, height: u16) -> isize {
        ((usize::from(height) << 16) | usize::from(width)) as isize
    }

    #[test]
    fn size_words_are_split() {
        assert_eq!(client_size(size_lparam(800, 600)), (800, 600));
        assert_eq!(client_size(size_lparam(u16::MAX, 1)), (65535, 1));
    }

    #[test]
    fn resize_becomes_event() {
        assert_eq!(
            translate(WM_SIZE, 0, size_lparam(320, 200)),
            Some(WindowEvent::Resized(SurfaceSize::new(320, 200).unwrap()))
        );
    }

    #[test]
    fn minimise_is_ignored() {
        assert_eq!(translate(WM_SIZE, 1, size_lparam(0, 0)), None);
        assert_eq!(translate(WM_SIZE, 0, size_lparam(640, 0)), None);
    }

    #[test]
    fn close_and_escape_request_close() {
        assert_eq!(translate(WM_CLOSE, 0, 0), Some(WindowEvent::CloseRequested));
        assert_eq!(
            translate(WM_KEYDOWN, VK_ESCAPE, 0),
            Some(WindowEvent::CloseRequested)
        );
        assert_eq!(translate(WM_KEYDOWN, 0x41, 0), None, "other keys pass through");
    }

    #[test]
    fn destroy_is_reported() {
        assert_eq!(translate(WM_DESTROY, 0, 0), Some(WindowEvent::Destroyed));
        assert_eq!(translate(0x000F, 0, 0), None, "WM_PAINT is left alone");
    }
}
