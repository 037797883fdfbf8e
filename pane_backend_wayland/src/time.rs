// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host clock reads for session timing.

use pane_core::time::HostTime;
use rustix::time::{ClockId, Timespec, clock_gettime};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Returns the current `CLOCK_MONOTONIC` time in nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    timespec_to_host_time(clock_gettime(ClockId::Monotonic))
}

fn timespec_to_host_time(timespec: Timespec) -> HostTime {
    let seconds = u64::try_from(timespec.tv_sec).unwrap_or(0);
    let nanos = u64::try_from(timespec.tv_nsec)
        .unwrap_or(0)
        .min(999_999_999);

    let ticks = u128::from(seconds)
        .saturating_mul(NANOS_PER_SECOND)
        .saturating_add(u128::from(nanos));
    HostTime(u64::try_from(ticks).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::{now, timespec_to_host_time};
    use pane_core::time::HostTime;
    use rustix::time::Timespec;

    #[test]
    fn now_does_not_go_backwards() {
        let first = now();
        let second = now();
        assert!(second >= first, "monotonic clock should not go backwards");
    }

    #[test]
    fn timespec_becomes_nanoseconds() {
        let input = Timespec {
            tv_sec: 3,
            tv_nsec: 250_000_000,
        };
        assert_eq!(timespec_to_host_time(input), HostTime(3_250_000_000));
    }

    #[test]
    fn negative_seconds_clamp_to_zero() {
        let input = Timespec {
            tv_sec: -5,
            tv_nsec: 10,
        };
        assert_eq!(timespec_to_host_time(input), HostTime(10));
    }

    #[test]
    fn huge_values_saturate() {
        let input = Timespec {
            tv_sec: i64::MAX,
            tv_nsec: 999_999_999,
        };
        assert_eq!(timespec_to_host_time(input), HostTime(u64::MAX));
    }
}
