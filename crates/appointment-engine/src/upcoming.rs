//! Appointments about to start, for the reminder shown when an operator logs in.

use chrono::Duration;

use crate::model::{Appointment, Instant};

/// Whether `start` lies within `window` of `now`, on either side.
pub fn within_window(start: Instant, now: Instant, window: Duration) -> bool {
    (start - now).abs() <= window
}

/// Appointments starting within `window` of `now`, earliest first.
///
/// Appointments that began less than `window` ago are included.
pub fn upcoming<'a, I>(appointments: I, now: Instant, window: Duration) -> Vec<&'a Appointment>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    let mut found: Vec<&Appointment> = appointments
        .into_iter()
        .filter(|appt| within_window(appt.interval.start(), now, window))
        .collect();
    found.sort_by_key(|appt| (appt.interval.start(), appt.id));
    found
}
