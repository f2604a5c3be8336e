use crate::schema::{availability_rules, blocked_slots, bookings};
use crate::{
    error::BookingError,
    scheduler::Scheduler,
    types::{AvailabilityRule, BlockedSlot, BookedSlot, Booking, NewBooking, TimeOfDay},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use diesel::{ConnectionError, PgConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Queryable)]
struct BookingRow {
    id: Uuid,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    client_name: String,
    client_email: String,
    description: String,
    status: String,
    timezone: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = BookingError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|err: String| {
            error!(id = %row.id, %err, "Booking row carries an unknown status");
            BookingError::Transient(err)
        })?;
        Ok(Booking {
            id: row.id,
            date: row.date,
            start_time: row.start_time.into(),
            end_time: TimeOfDay::from_end_time(row.end_time),
            client_name: row.client_name,
            client_email: row.client_email,
            description: row.description,
            status,
            timezone: row.timezone,
            created_at: row.created_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = bookings)]
struct NewBookingRow<'a> {
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    client_name: &'a str,
    client_email: &'a str,
    description: &'a str,
    status: &'a str,
    timezone: &'a str,
    created_at: DateTime<Utc>,
}

impl<'a> From<&'a NewBooking> for NewBookingRow<'a> {
    fn from(booking: &'a NewBooking) -> Self {
        Self {
            date: booking.date,
            start_time: booking.start_time.to_naive_time(),
            end_time: booking.end_time.to_naive_time(),
            client_name: &booking.client_name,
            client_email: &booking.client_email,
            description: &booking.description,
            status: booking.status.as_str(),
            timezone: &booking.timezone,
            created_at: booking.created_at,
        }
    }
}

/// Scheduler backed by PostgreSQL. Rules and blocks are maintained outside this service.
#[derive(Clone)]
pub struct DatabaseInterface {
    connection: Arc<Mutex<PgConnection>>,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> Result<Self, ConnectionError> {
        let connection = Self::establish_connection(database_url)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn establish_connection(database_url: &str) -> Result<PgConnection, ConnectionError> {
        PgConnection::establish(database_url)
    }

    fn connection(&self) -> Result<MutexGuard<'_, PgConnection>, BookingError> {
        self.connection.lock().map_err(|_| {
            let err = "Database connection is poisoned";
            error!(err);
            BookingError::Transient(err.into())
        })
    }
}

fn storage_error(context: &str, err: DieselError) -> BookingError {
    error!(?err, "{context}");
    BookingError::Transient(format!("{context}: {err}"))
}

impl Scheduler for DatabaseInterface {
    fn rules_for_day(&self, day_of_week: u8) -> Result<Vec<AvailabilityRule>, BookingError> {
        let mut connection = self.connection()?;
        let windows = availability_rules::table
            .filter(availability_rules::day_of_week.eq(i16::from(day_of_week)))
            .filter(availability_rules::is_active.eq(true))
            .order(availability_rules::start_time.asc())
            .select((availability_rules::start_time, availability_rules::end_time))
            .load::<(NaiveTime, NaiveTime)>(&mut *connection)
            .map_err(|err| storage_error("Failed to read availability rules", err))?;

        Ok(windows
            .into_iter()
            .map(|(start, end)| {
                AvailabilityRule::new(day_of_week, start.into(), TimeOfDay::from_end_time(end))
            })
            .collect())
    }

    fn bookings_on(&self, date: NaiveDate) -> Result<Vec<BookedSlot>, BookingError> {
        let mut connection = self.connection()?;
        let rows = bookings::table
            .filter(bookings::date.eq(date))
            .filter(bookings::status.ne("cancelled"))
            .select((bookings::start_time, bookings::end_time, bookings::status))
            .load::<(NaiveTime, NaiveTime, String)>(&mut *connection)
            .map_err(|err| storage_error("Failed to read bookings", err))?;

        rows.into_iter()
            .map(|(start, end, status)| {
                Ok(BookedSlot {
                    start_time: start.into(),
                    end_time: TimeOfDay::from_end_time(end),
                    status: status.parse().map_err(BookingError::Transient)?,
                })
            })
            .collect()
    }

    fn blocks_on(&self, date: NaiveDate) -> Result<Vec<BlockedSlot>, BookingError> {
        let mut connection = self.connection()?;
        let rows = blocked_slots::table
            .filter(blocked_slots::date.eq(date))
            .select((
                blocked_slots::start_time,
                blocked_slots::end_time,
                blocked_slots::reason,
            ))
            .load::<(Option<NaiveTime>, Option<NaiveTime>, Option<String>)>(&mut *connection)
            .map_err(|err| storage_error("Failed to read blocked slots", err))?;

        Ok(rows
            .into_iter()
            .map(|(start, end, reason)| BlockedSlot {
                date,
                start_time: start.map(TimeOfDay::from),
                end_time: end.map(TimeOfDay::from_end_time),
                reason,
            })
            .collect())
    }

    fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        let mut connection = self.connection()?;
        let result = diesel::insert_into(bookings::table)
            .values(NewBookingRow::from(&booking))
            .get_result::<BookingRow>(&mut *connection);

        match result {
            Ok(row) => row.try_into(),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                warn!(
                    date = %booking.date,
                    start = %booking.start_time,
                    constraint = ?info.constraint_name(),
                    "Slot was booked concurrently"
                );
                Err(BookingError::Conflict)
            }
            Err(err) => Err(storage_error("Booking can't be stored", err)),
        }
    }

    fn booking(&self, id: Uuid) -> Result<Booking, BookingError> {
        let mut connection = self.connection()?;
        bookings::table
            .find(id)
            .first::<BookingRow>(&mut *connection)
            .optional()
            .map_err(|err| storage_error("Failed to read booking", err))?
            .ok_or(BookingError::NotFound)?
            .try_into()
    }
}
