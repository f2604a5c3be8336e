//! Formatting for people. Nothing here feeds back into availability or storage.

use crate::{error::BookingError, types::TimeOfDay};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

pub fn parse_timezone(name: &str) -> Result<Tz, BookingError> {
    name.parse::<Tz>()
        .map_err(|_| BookingError::Validation(format!("Unknown timezone '{name}'")))
}

/// `2026-02-15`, `09:00` (UTC) in `Asia/Dubai` -> `1:00 PM`
pub fn utc_to_local(date: NaiveDate, time: TimeOfDay, timezone: Tz) -> String {
    instant_to_local(time.on(date), timezone)
}

pub fn instant_to_local(instant: DateTime<Utc>, timezone: Tz) -> String {
    instant
        .with_timezone(&timezone)
        .format("%-I:%M %p")
        .to_string()
}

/// `2026-02-15` -> `Sunday, February 15, 2026`
pub fn format_booking_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}
