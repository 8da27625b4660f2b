//! Day-count used for both the "days remaining" text and the notification
//! idempotency key.

use chrono::{DateTime, Utc};

const NANOS_PER_DAY: i64 = 86_400 * 1_000_000_000;
const SECS_PER_DAY: i64 = 86_400;

/// Whole days from `now` to `deadline`, rounded up.
///
/// Returns 0 when they are equal, 1 for anything up to one day ahead, `n`
/// for exactly `n` days and `n + 1` for anything between `n` and `n + 1`
/// days. Past deadlines give the ceiling of a negative count, so a deadline
/// one second ago is 0 and one 25 hours ago is -1.
pub fn ceil_days(now: DateTime<Utc>, deadline: DateTime<Utc>) -> i64 {
    let diff = deadline.signed_duration_since(now);
    match diff.num_nanoseconds() {
        Some(nanos) => ceil_div(nanos, NANOS_PER_DAY),
        // Beyond ~292 years nanoseconds overflow; second precision is plenty there.
        None => ceil_div(diff.num_seconds(), SECS_PER_DAY),
    }
}

fn ceil_div(value: i64, unit: i64) -> i64 {
    let days = value.div_euclid(unit);
    if value.rem_euclid(unit) != 0 {
        days + 1
    } else {
        days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn same_instant_is_zero() {
        assert_eq!(ceil_days(t0(), t0()), 0);
    }

    #[test]
    fn anything_within_a_day_is_one() {
        assert_eq!(ceil_days(t0(), t0() + Duration::nanoseconds(1)), 1);
        assert_eq!(ceil_days(t0(), t0() + Duration::hours(12)), 1);
        assert_eq!(ceil_days(t0(), t0() + Duration::days(1)), 1);
    }

    #[test]
    fn whole_days_are_exact() {
        for n in 1..=30 {
            assert_eq!(ceil_days(t0(), t0() + Duration::days(n)), n);
        }
    }

    #[test]
    fn partial_days_round_up() {
        for n in 0..=30 {
            let deadline = t0() + Duration::days(n) + Duration::seconds(1);
            assert_eq!(ceil_days(t0(), deadline), n + 1);
            let deadline = t0() + Duration::days(n + 1) - Duration::nanoseconds(1);
            assert_eq!(ceil_days(t0(), deadline), n + 1);
        }
    }

    #[test]
    fn passed_deadlines_round_towards_zero_day() {
        assert_eq!(ceil_days(t0(), t0() - Duration::seconds(1)), 0);
        assert_eq!(ceil_days(t0(), t0() - Duration::days(1)), -1);
        assert_eq!(ceil_days(t0(), t0() - Duration::hours(25)), -1);
    }

    #[test]
    fn far_future_falls_back_to_seconds() {
        let deadline = t0() + Duration::days(400 * 365) + Duration::seconds(1);
        assert_eq!(ceil_days(t0(), deadline), 400 * 365 + 1);
    }
}
