// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time in nanoseconds.
//!
//! Backends read their platform clock (`CLOCK_MONOTONIC`,
//! `QueryPerformanceCounter`) and convert to [`HostTime`]; everything in this
//! crate only needs differences between two readings.

use core::fmt;
use core::ops::Sub;

/// A point in time as monotonic nanoseconds with a backend-defined origin.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns the duration since an earlier time, or zero if `earlier` is
    /// after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// A span of time in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// Zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from milliseconds, saturating on overflow.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Whole milliseconds in this duration.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000_000
    }

    /// Seconds as `f32`, for animation parameters.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "animation time only needs f32 precision"
    )]
    pub fn as_secs_f32(self) -> f32 {
        (self.0 as f64 / 1_000_000_000.0) as f32
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}ns)", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Duration, HostTime};

    #[test]
    fn subtraction_saturates() {
        assert_eq!(HostTime(5) - HostTime(10), Duration::ZERO);
        assert_eq!(HostTime(10) - HostTime(4), Duration(6));
    }

    #[test]
    fn millis_conversions() {
        let d = Duration::from_millis(1_500);
        assert_eq!(d.as_millis(), 1_500);
        assert!((d.as_secs_f32() - 1.5).abs() < 1e-6, "1500ms is 1.5s");
        assert_eq!(Duration::from_millis(u64::MAX), Duration(u64::MAX));
    }
}
