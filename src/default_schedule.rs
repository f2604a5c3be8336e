use crate::{
    error::BookingError,
    scheduler::Scheduler,
    types::{AvailabilityRule, BlockedSlot, BookedSlot, Booking, NewBooking, WeeklySchedule},
};
use chrono::NaiveDate;
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};
use tracing::{debug, error, info};
use uuid::Uuid;

pub const MAX_REMEMBERED_BOOKINGS: usize = 1000;

/// Bookings in insertion order, dropping the oldest once full.
#[derive(Debug, Default)]
struct BookingStore {
    by_id: HashMap<Uuid, Booking>,
    order: VecDeque<Uuid>,
}

impl BookingStore {
    fn remember(&mut self, booking: Booking, capacity: usize) {
        while self.order.len() >= capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.by_id.remove(&oldest);
            debug!(id = %oldest, "Forgot in-memory booking");
        }
        self.order.push_back(booking.id);
        self.by_id.insert(booking.id, booking);
    }
}

/// Scheduler used when no database is configured.
///
/// Availability comes from the injected weekly schedule only. Created bookings are remembered for
/// lookup but never close a slot, so there is no conflict detection. Only the latest
/// `MAX_REMEMBERED_BOOKINGS` are kept.
#[derive(Debug, Clone)]
pub struct DefaultSchedule {
    schedule: Arc<WeeklySchedule>,
    bookings: Arc<Mutex<BookingStore>>,
    capacity: usize,
}

impl DefaultSchedule {
    pub fn new(schedule: WeeklySchedule) -> Self {
        Self::with_capacity(schedule, MAX_REMEMBERED_BOOKINGS)
    }

    pub fn with_capacity(schedule: WeeklySchedule, capacity: usize) -> Self {
        Self {
            schedule: Arc::new(schedule),
            bookings: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    fn lock_bookings(&self) -> Result<std::sync::MutexGuard<'_, BookingStore>, BookingError> {
        self.bookings.lock().map_err(|_| {
            let err = "In-memory booking store is poisoned";
            error!(err);
            BookingError::Transient(err.into())
        })
    }
}

impl Default for DefaultSchedule {
    fn default() -> Self {
        Self::new(WeeklySchedule::default())
    }
}

impl Scheduler for DefaultSchedule {
    fn rules_for_day(&self, day_of_week: u8) -> Result<Vec<AvailabilityRule>, BookingError> {
        Ok(self.schedule.rules_for_day(day_of_week))
    }

    fn bookings_on(&self, _date: NaiveDate) -> Result<Vec<BookedSlot>, BookingError> {
        Ok(vec![])
    }

    fn blocks_on(&self, _date: NaiveDate) -> Result<Vec<BlockedSlot>, BookingError> {
        Ok(vec![])
    }

    fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        let booking = booking.with_id(Uuid::new_v4());
        info!(id = %booking.id, date = %booking.date, start = %booking.start_time, "Created in-memory booking");
        self.lock_bookings()?
            .remember(booking.clone(), self.capacity);
        Ok(booking)
    }

    fn booking(&self, id: Uuid) -> Result<Booking, BookingError> {
        self.lock_bookings()?
            .by_id
            .get(&id)
            .cloned()
            .ok_or(BookingError::NotFound)
    }
}
