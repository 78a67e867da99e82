//! Choices offered by a booking form.
//!
//! Start and end times are offered on a fixed grid laid over business hours
//! on the business clock, then shown to the operator in their own zone. Past
//! dates are not offered at all.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::model::{Instant, WallClock};
use crate::policy::IntervalPolicy;

/// Start-time choices for the business day `date`: every `step` from opening
/// up to, but not including, closing.
///
/// Each slot is an operator-zone wall-clock value, so its date can differ
/// from `date` when the zones are far apart.
pub fn start_slots(policy: &IntervalPolicy, date: NaiveDate, step: Duration) -> Vec<WallClock> {
    let close = policy.close();
    grid(policy, date, policy.open(), step, |time| time < close)
}

/// End-time choices for the business day `date`: every `step` from one step
/// after opening up to and including closing.
pub fn end_slots(policy: &IntervalPolicy, date: NaiveDate, step: Duration) -> Vec<WallClock> {
    let (first, wrapped) = policy.open().overflowing_add_signed(step);
    if wrapped != 0 {
        return Vec::new();
    }
    let close = policy.close();
    grid(policy, date, first, step, |time| time <= close)
}

/// Times from `first` in `step` increments while `keep` holds, stopping at
/// midnight.
fn grid<F>(
    policy: &IntervalPolicy,
    date: NaiveDate,
    first: NaiveTime,
    step: Duration,
    keep: F,
) -> Vec<WallClock>
where
    F: Fn(NaiveTime) -> bool,
{
    let mut slots = Vec::new();
    if step <= Duration::zero() {
        return slots;
    }
    let normalizer = policy.normalizer();
    let mut time = first;
    while keep(time) {
        slots.push(normalizer.business_to_operator(WallClock::new(date, time)));
        let (next, wrapped) = time.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        time = next;
    }
    slots
}

/// Whether `date` may be picked: not before the operator's today.
pub fn selectable_date(policy: &IntervalPolicy, now: Instant, date: NaiveDate) -> bool {
    date >= policy.normalizer().operator_wall(now).date
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::normalizer::TimeNormalizer;
    use chrono::{TimeZone, Utc};

    fn policy(operator: &str) -> IntervalPolicy {
        IntervalPolicy::new(TimeNormalizer::from_names("America/New_York", operator).unwrap())
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_start_slots_cover_business_day() {
        let slots = start_slots(&policy("America/New_York"), monday(), Duration::minutes(15));
        assert_eq!(slots.len(), 56);
        assert_eq!(slots[0].time, time(8, 0));
        assert_eq!(slots[55].time, time(21, 45));
    }

    #[test]
    fn test_end_slots_run_through_closing() {
        let slots = end_slots(&policy("America/New_York"), monday(), Duration::minutes(15));
        assert_eq!(slots.len(), 56);
        assert_eq!(slots[0].time, time(8, 15));
        assert_eq!(slots[55].time, time(22, 0));
    }

    #[test]
    fn test_slots_rendered_in_operator_zone() {
        // Eastern and Pacific are both on daylight time by March 16
        let slots = start_slots(&policy("America/Los_Angeles"), monday(), Duration::hours(1));
        assert_eq!(slots[0], WallClock::new(monday(), time(5, 0)));

        // 21:00 EDT is 01:00 UTC the next day, 10:00 in Tokyo
        let tokyo = start_slots(&policy("Asia/Tokyo"), monday(), Duration::hours(1));
        let last = tokyo.last().unwrap();
        assert_eq!(last.date, monday().succ_opt().unwrap());
        assert_eq!(last.time, time(10, 0));
    }

    #[test]
    fn test_late_closing_keeps_end_slots() {
        let config = EngineConfig {
            close: time(23, 50),
            ..EngineConfig::default()
        };
        let policy = IntervalPolicy::from_config(&config).unwrap();
        let step = Duration::minutes(15);

        let starts = start_slots(&policy, monday(), step);
        assert_eq!(starts.len(), 64);
        assert_eq!(starts.last().unwrap().time, time(23, 45));

        let ends = end_slots(&policy, monday(), step);
        assert_eq!(ends.len(), 63);
        assert_eq!(ends[0].time, time(8, 15));
        assert_eq!(ends.last().unwrap().time, time(23, 45));
    }

    #[test]
    fn test_selectable_date_rejects_past_days() {
        let p = policy("America/New_York");
        let now = Utc.with_ymd_and_hms(2026, 3, 16, 14, 0, 0).unwrap();
        assert!(selectable_date(&p, now, monday()));
        assert!(selectable_date(&p, now, monday().succ_opt().unwrap()));
        assert!(!selectable_date(&p, now, monday().pred_opt().unwrap()));
    }
}
