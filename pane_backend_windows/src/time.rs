// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host clock reads via `QueryPerformanceCounter`.

use pane_core::time::HostTime;
use windows::Win32::System::Performance::{QueryPerformanceCounter, QueryPerformanceFrequency};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Returns the current performance-counter time in nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    let mut counter = 0_i64;
    let mut frequency = 0_i64;
    // SAFETY: both calls only write the local integers passed to them.
    #[expect(unsafe_code, reason = "Win32 clock reads")]
    let ok = unsafe {
        QueryPerformanceCounter(&mut counter).is_ok()
            && QueryPerformanceFrequency(&mut frequency).is_ok()
    };
    if !ok {
        return HostTime(0);
    }
    counts_to_host_time(counter, frequency)
}

fn counts_to_host_time(counter: i64, frequency: i64) -> HostTime {
    let (Ok(counter), Ok(frequency)) = (u64::try_from(counter), u64::try_from(frequency)) else {
        return HostTime(0);
    };
    if frequency == 0 {
        return HostTime(0);
    }
    let nanos = u128::from(counter) * NANOS_PER_SECOND / u128::from(frequency);
    HostTime(u64::try_from(nanos).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_megahertz_counter_converts() {
        assert_eq!(counts_to_host_time(25_000_000, 10_000_000), HostTime(2_500_000_000));
    }

    #[test]
    fn bad_frequency_is_zero() {
        assert_eq!(counts_to_host_time(5, 0), HostTime(0));
        assert_eq!(counts_to_host_time(-5, 10), HostTime(0));
    }

    #[test]
    fn clock_advances() {
        let first = now();
        let second = now();
        assert!(second >= first, "performance counter should not go backwards");
    }
}
