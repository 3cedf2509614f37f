//! Circular time helpers for the 60-minute spawn cycle (pure math, no I/O).
//!
//! Every spawn point repeats on the hour, so absolute timestamps are folded
//! onto a 3600-second circle before any pattern reasoning happens.

use chrono::{DateTime, Utc};

/// Length of one spawn cycle in seconds.
pub const CYCLE_SECS: u32 = 3600;

/// Length of one quarter of the cycle in seconds.
pub const QUARTER_SECS: u32 = 900;

/// Seconds since the top of the enclosing hour.
///
/// Uses the Euclidean remainder so instants before the epoch still land in
/// `0..3600`.
pub fn time_of_cycle(ts: &DateTime<Utc>) -> u32 {
    ts.timestamp().rem_euclid(CYCLE_SECS as i64) as u32
}

/// Seconds from position `a` forward to position `b`, going around the circle.
pub fn forward_gap(a: u32, b: u32) -> u32 {
    (b as i64 - a as i64).rem_euclid(CYCLE_SECS as i64) as u32
}

/// True when `t` lies on the forward arc from `start` to `end` (inclusive).
///
/// `start == end` is treated as a single point, not the whole circle.
pub fn clock_between(start: u32, t: u32, end: u32) -> bool {
    forward_gap(start, t) <= forward_gap(start, end)
}

/// Index (0..4) of the quarter containing `secs`, after folding.
pub fn quarter_of(secs: u32) -> usize {
    ((secs % CYCLE_SECS) / QUARTER_SECS) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_of_cycle_ignores_hour_and_day() {
        let a = Utc.with_ymd_and_hms(2017, 1, 11, 18, 14, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2017, 1, 12, 3, 14, 59).unwrap();
        assert_eq!(time_of_cycle(&a), 14 * 60 + 59);
        assert_eq!(time_of_cycle(&a), time_of_cycle(&b));
    }

    #[test]
    fn test_time_of_cycle_before_epoch() {
        let ts = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(time_of_cycle(&ts), 3540);
    }

    #[test]
    fn test_forward_gap_wraps() {
        assert_eq!(forward_gap(100, 200), 100);
        assert_eq!(forward_gap(3500, 100), 200);
        assert_eq!(forward_gap(42, 42), 0);
    }

    #[test]
    fn test_clock_between_across_hour_mark() {
        assert!(clock_between(3500, 10, 200));
        assert!(clock_between(3500, 3500, 200));
        assert!(clock_between(3500, 200, 200));
        assert!(!clock_between(3500, 300, 200));
        assert!(!clock_between(100, 3000, 200));
    }

    #[test]
    fn test_quarter_of() {
        assert_eq!(quarter_of(0), 0);
        assert_eq!(quarter_of(899), 0);
        assert_eq!(quarter_of(900), 1);
        assert_eq!(quarter_of(2699), 2);
        assert_eq!(quarter_of(3599), 3);
        assert_eq!(quarter_of(4281), 0);
    }
}
