use crate::{
    error::BookingError,
    notifications::Mailer,
    scheduler::Scheduler,
    slots::SLOT_DURATION_MINUTES,
    types::{Booking, BookingRequest, BookingStatus, NewBooking},
};
use chrono::{DateTime, Days, Utc};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};
use validator::Validate;

/// Upper bound on how long a booking response waits for its confirmation emails.
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Validates `request`, stores it with a single insert and sends the confirmation emails.
///
/// The insert is the only guard against double booking; a taken slot comes back as
/// `BookingError::Conflict`. Email failures are logged and never fail the booking, and a mail
/// API that stalls is abandoned after `NOTIFICATION_TIMEOUT`.
pub async fn submit_booking<S: Scheduler>(
    scheduler: &S,
    mailer: &Mailer,
    request: BookingRequest,
    now: DateTime<Utc>,
    horizon_days: u32,
) -> Result<Booking, BookingError> {
    request.validate()?;

    let duration = request
        .end_time
        .minutes()
        .checked_sub(request.start_time.minutes());
    if duration != Some(SLOT_DURATION_MINUTES) {
        return Err(BookingError::Validation(format!(
            "A session lasts {SLOT_DURATION_MINUTES} minutes, got {} - {}",
            request.start_time, request.end_time
        )));
    }

    if request.start_time.on(request.date) < now {
        let err = "Timeslot already passed";
        warn!(date = %request.date, start = %request.start_time, err);
        return Err(BookingError::Validation(err.into()));
    }

    let last_day = now
        .date_naive()
        .checked_add_days(Days::new(u64::from(horizon_days)));
    if last_day.is_some_and(|last_day| request.date > last_day) {
        return Err(BookingError::Validation(format!(
            "Sessions can be booked at most {horizon_days} days ahead"
        )));
    }

    let booking = scheduler.insert_booking(NewBooking {
        date: request.date,
        start_time: request.start_time,
        end_time: request.end_time,
        client_name: request.client_name.trim().to_string(),
        client_email: request.client_email.trim().to_string(),
        description: request.description.trim().to_string(),
        status: BookingStatus::Confirmed,
        timezone: request.timezone,
        created_at: now,
    })?;
    info!(id = %booking.id, date = %booking.date, start = %booking.start_time, "Booking confirmed");

    match timeout(NOTIFICATION_TIMEOUT, mailer.send_booking_confirmation(&booking)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(?err, id = %booking.id, "Failed to send booking confirmation"),
        Err(_) => warn!(id = %booking.id, "Booking confirmation timed out"),
    }

    Ok(booking)
}
