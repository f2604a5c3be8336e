use crate::{
    error::BookingError,
    slots::{day_of_week, generate_slots},
    types::{AvailabilityRule, BlockedSlot, BookedSlot, Booking, NewBooking, TimeSlot},
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Source of availability data and sink for new bookings.
///
/// Implementations never cache: every call reflects the latest committed state.
pub trait Scheduler: Clone + Send + Sync + 'static {
    /// Active rules for a day of week (0 = Sunday).
    fn rules_for_day(&self, day_of_week: u8) -> Result<Vec<AvailabilityRule>, BookingError>;
    /// Bookings on `date` that are not cancelled.
    fn bookings_on(&self, date: NaiveDate) -> Result<Vec<BookedSlot>, BookingError>;
    fn blocks_on(&self, date: NaiveDate) -> Result<Vec<BlockedSlot>, BookingError>;
    /// Single insert. Fails with `BookingError::Conflict` when the slot is already taken.
    fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingError>;
    fn booking(&self, id: Uuid) -> Result<Booking, BookingError>;

    fn availability(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, BookingError> {
        let rules = self.rules_for_day(day_of_week(date))?;
        if rules.is_empty() {
            return Ok(vec![]);
        }
        let bookings = self.bookings_on(date)?;
        let blocks = self.blocks_on(date)?;
        Ok(generate_slots(date, &rules, &bookings, &blocks, now))
    }
}
