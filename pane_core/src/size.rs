// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface dimensions and protocol serials.

use core::fmt;

/// Size of a drawable surface in buffer pixels.
///
/// Both dimensions are always non-zero. Compositors are free to suggest `0`
/// for either dimension ("client decides"); such suggestions never become a
/// `SurfaceSize`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    width: u32,
    height: u32,
}

impl SurfaceSize {
    /// 640×480, the size a window starts with before the compositor suggests
    /// anything else.
    pub const DEFAULT: Self = Self {
        width: 640,
        height: 480,
    };

    /// Creates a size, or `None` if either dimension is zero.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }

    /// Converts a compositor-suggested size (signed, as sent on the wire).
    ///
    /// Returns `None` when either dimension is zero or negative.
    #[must_use]
    pub fn from_suggested(width: i32, height: i32) -> Option<Self> {
        let width = u32::try_from(width).ok()?;
        let height = u32::try_from(height).ok()?;
        Self::new(width, height)
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(self) -> u32 {
        self.height
    }

    /// Number of pixels covered by this size.
    #[must_use]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Width and height as the signed integers most protocol requests take,
    /// saturating at `i32::MAX`.
    #[must_use]
    pub fn to_i32(self) -> (i32, i32) {
        (
            i32::try_from(self.width).unwrap_or(i32::MAX),
            i32::try_from(self.height).unwrap_or(i32::MAX),
        )
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A protocol serial correlating a request with its acknowledgement
/// (configure/ack_configure, ping/pong).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Serial(pub u32);

impl fmt::Debug for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Serial({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::SurfaceSize;

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(SurfaceSize::new(0, 10), None);
        assert_eq!(SurfaceSize::new(10, 0), None);
        assert!(SurfaceSize::new(1, 1).is_some(), "1x1 is a valid size");
    }

    #[test]
    fn suggested_size_ignores_non_positive_values() {
        assert_eq!(SurfaceSize::from_suggested(0, 0), None);
        assert_eq!(SurfaceSize::from_suggested(-5, 300), None);
        assert_eq!(SurfaceSize::from_suggested(800, 0), None);

        let size = SurfaceSize::from_suggested(800, 600).expect("positive size");
        assert_eq!((size.width(), size.height()), (800, 600));
    }

    #[test]
    fn area_does_not_overflow_u32() {
        let size = SurfaceSize::new(u32::MAX, 2).expect("non-zero");
        assert_eq!(size.area(), u64::from(u32::MAX) * 2);
    }

    #[test]
    fn to_i32_saturates() {
        let size = SurfaceSize::new(u32::MAX, 7).expect("non-zero");
        assert_eq!(size.to_i32(), (i32::MAX, 7));
    }
}
