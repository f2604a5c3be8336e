use crate::types::{AvailabilityRule, BlockedSlot, BookedSlot, BookingStatus, TimeOfDay, TimeSlot};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

pub const SLOT_DURATION_MINUTES: u16 = 60;

/// Day of week of a calendar date, 0 = Sunday .. 6 = Saturday.
///
/// Works on the date components only, so the host timezone can never shift the result.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Discretizes the rules of `date` into 60 minute slots and marks each one available or not.
///
/// Rules for other weekdays or inactive rules are skipped, as are cancelled bookings. A slot is
/// unavailable when a booking starts at the same time, when a block covers it, or when it starts
/// before `now`. Slots of several rules are concatenated in rule order; overlapping
/// rules produce duplicate slots.
pub fn generate_slots(
    date: NaiveDate,
    rules: &[AvailabilityRule],
    bookings: &[BookedSlot],
    blocks: &[BlockedSlot],
    now: DateTime<Utc>,
) -> Vec<TimeSlot> {
    let weekday = day_of_week(date);
    let mut slots = Vec::new();

    for rule in rules
        .iter()
        .filter(|rule| rule.active && rule.day_of_week == weekday)
    {
        let mut current = rule.start_time.minutes();
        let end = rule.end_time.minutes();

        while current + SLOT_DURATION_MINUTES <= end {
            let (Some(slot_start), Some(slot_end)) = (
                TimeOfDay::from_minutes(current),
                TimeOfDay::from_minutes(current + SLOT_DURATION_MINUTES),
            ) else {
                break;
            };

            let start = slot_start.on(date);
            let is_booked = bookings.iter().any(|booking| {
                booking.status != BookingStatus::Cancelled && booking.start_time == slot_start
            });
            let is_blocked = blocks.iter().any(|block| block.covers(slot_start, slot_end));
            let is_past = start < now;

            slots.push(TimeSlot {
                start,
                end: slot_end.on(date),
                available: !is_booked && !is_blocked && !is_past,
            });

            current += SLOT_DURATION_MINUTES;
        }
    }

    slots
}
