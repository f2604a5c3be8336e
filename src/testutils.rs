use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::BookingError,
    scheduler::Scheduler,
    types::{AvailabilityRule, BlockedSlot, BookedSlot, Booking, NewBooking},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Stored,
    Conflict,
    Unavailable,
}

pub struct MockSchedulerInner {
    pub insert_outcome: Mutex<InsertOutcome>,
    pub calls_to_rules_for_day: AtomicU64,
    pub calls_to_bookings_on: AtomicU64,
    pub calls_to_blocks_on: AtomicU64,
    pub calls_to_insert_booking: AtomicU64,
    pub calls_to_booking: AtomicU64,
    pub rules: Mutex<Vec<AvailabilityRule>>,
    pub bookings: Mutex<Vec<BookedSlot>>,
    pub blocks: Mutex<Vec<BlockedSlot>>,
    pub stored: Mutex<HashMap<Uuid, Booking>>,
}

#[derive(Clone)]
pub struct MockScheduler(pub Arc<MockSchedulerInner>);

impl MockSchedulerInner {
    fn new() -> Self {
        Self {
            insert_outcome: Mutex::new(InsertOutcome::Stored),
            calls_to_rules_for_day: AtomicU64::default(),
            calls_to_bookings_on: AtomicU64::default(),
            calls_to_blocks_on: AtomicU64::default(),
            calls_to_insert_booking: AtomicU64::default(),
            calls_to_booking: AtomicU64::default(),
            rules: Mutex::default(),
            bookings: Mutex::default(),
            blocks: Mutex::default(),
            stored: Mutex::default(),
        }
    }
}

impl MockScheduler {
    pub fn new() -> Self {
        Self(Arc::new(MockSchedulerInner::new()))
    }

    pub fn set_insert_outcome(&self, outcome: InsertOutcome) {
        *self.0.insert_outcome.lock().unwrap() = outcome;
    }

    pub fn inserts(&self) -> u64 {
        self.0.calls_to_insert_booking.load(Ordering::SeqCst)
    }
}

impl Scheduler for MockScheduler {
    fn rules_for_day(&self, day_of_week: u8) -> Result<Vec<AvailabilityRule>, BookingError> {
        self.0.calls_to_rules_for_day.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .0
            .rules
            .lock()
            .unwrap()
            .iter()
            .filter(|rule| rule.day_of_week == day_of_week)
            .cloned()
            .collect())
    }

    fn bookings_on(&self, _date: NaiveDate) -> Result<Vec<BookedSlot>, BookingError> {
        self.0.calls_to_bookings_on.fetch_add(1, Ordering::SeqCst);
        Ok(self.0.bookings.lock().unwrap().clone())
    }

    fn blocks_on(&self, _date: NaiveDate) -> Result<Vec<BlockedSlot>, BookingError> {
        self.0.calls_to_blocks_on.fetch_add(1, Ordering::SeqCst);
        Ok(self.0.blocks.lock().unwrap().clone())
    }

    fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        self.0.calls_to_insert_booking.fetch_add(1, Ordering::SeqCst);
        match *self.0.insert_outcome.lock().unwrap() {
            InsertOutcome::Stored => {
                let booking = booking.with_id(Uuid::new_v4());
                self.0
                    .stored
                    .lock()
                    .unwrap()
                    .insert(booking.id, booking.clone());
                Ok(booking)
            }
            InsertOutcome::Conflict => Err(BookingError::Conflict),
            InsertOutcome::Unavailable => Err(BookingError::Transient("Supposed to fail".into())),
        }
    }

    fn booking(&self, id: Uuid) -> Result<Booking, BookingError> {
        self.0.calls_to_booking.fetch_add(1, Ordering::SeqCst);
        self.0
            .stored
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(BookingError::NotFound)
    }
}
