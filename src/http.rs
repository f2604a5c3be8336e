use crate::{
    booking::submit_booking,
    calendar::{booking_to_ics, CalendarSettings},
    configuration::Configuration,
    display::{instant_to_local, parse_timezone},
    error::BookingError,
    notifications::Mailer,
    scheduler::Scheduler,
    types::{Booking, BookingRequest, ContactRequest},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;
use uuid::Uuid;
use validator::Validate;

const EVENT_TITLE: &str = "Discovery Session";

lazy_static! {
    static ref DATE_PATTERN: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

#[derive(Clone)]
struct AppState<S: Scheduler, C: Configuration> {
    scheduler: S,
    mailer: Mailer,
    configuration: C,
}

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    date: Option<String>,
    timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotView {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_local: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_local: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AvailabilityResponse {
    slots: Vec<SlotView>,
    date: String,
}

#[derive(Debug, Serialize)]
struct ContactResponse {
    success: bool,
}

pub fn create_app<S: Scheduler, C: Configuration>(
    scheduler: S,
    mailer: Mailer,
    configuration: C,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        scheduler,
        mailer,
        configuration,
    };

    Router::new()
        .route("/availability", get(get_availability))
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/calendar.ics", get(get_booking_calendar))
        .route("/contact", post(send_contact))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn parse_date(text: Option<&str>) -> Result<NaiveDate, BookingError> {
    let invalid = || BookingError::Validation("Invalid date format. Use YYYY-MM-DD.".into());
    let text = text.ok_or_else(invalid)?;
    if !DATE_PATTERN.is_match(text) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| invalid())
}

fn calendar_settings<C: Configuration>(configuration: &C) -> CalendarSettings {
    CalendarSettings {
        uid_domain: configuration.calendar_domain(),
        organizer_email: configuration.operator_email(),
        event_title: EVENT_TITLE.into(),
    }
}

async fn get_availability<S: Scheduler, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, BookingError> {
    let date = parse_date(query.date.as_deref())?;
    let timezone = query
        .timezone
        .as_deref()
        .map(parse_timezone)
        .transpose()?;

    let slots = state
        .scheduler
        .availability(date, Utc::now())?
        .into_iter()
        .map(|slot| SlotView {
            start_local: timezone.map(|timezone| instant_to_local(slot.start, timezone)),
            end_local: timezone.map(|timezone| instant_to_local(slot.end, timezone)),
            start: slot.start,
            end: slot.end,
            available: slot.available,
        })
        .collect();

    Ok(Json(AvailabilityResponse {
        slots,
        date: date.format("%Y-%m-%d").to_string(),
    }))
}

async fn create_booking<S: Scheduler, C: Configuration>(
    State(state): State<AppState<S, C>>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), BookingError> {
    let Json(request) = payload.map_err(|rejection| BookingError::Validation(rejection.body_text()))?;

    let booking = submit_booking(
        &state.scheduler,
        &state.mailer,
        request,
        Utc::now(),
        state.configuration.booking_horizon_days(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

async fn get_booking<S: Scheduler, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, BookingError> {
    Ok(Json(state.scheduler.booking(id)?))
}

async fn get_booking_calendar<S: Scheduler, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let booking = state.scheduler.booking(id)?;
    let calendar = booking_to_ics(&booking, &calendar_settings(&state.configuration));

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"discovery-session.ics\"",
            ),
        ],
        calendar,
    ))
}

async fn send_contact<S: Scheduler, C: Configuration>(
    State(state): State<AppState<S, C>>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>, BookingError> {
    let Json(contact) = payload.map_err(|rejection| BookingError::Validation(rejection.body_text()))?;
    contact.validate()?;

    state
        .mailer
        .send_contact_notification(&contact)
        .await
        .map_err(|err| {
            error!(?err, "Failed to send contact notification");
            BookingError::Transient("Failed to send email".into())
        })?;

    Ok(Json(ContactResponse { success: true }))
}
