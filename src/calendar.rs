use crate::types::{Booking, BookingStatus, TimeOfDay};
use chrono::{DateTime, NaiveDate, Utc};
use ics::{
    escape_text,
    properties::{Attendee, Description, DtEnd, DtStart, Organizer, Status, Summary},
    Event, ICalendar,
};

pub const PRODID: &str = "-//Session Booking//Booking//EN";
const DEFAULT_DESCRIPTION: &str = "Discovery session";

#[derive(Debug, Clone)]
pub struct CalendarSettings {
    /// Suffix of every event UID, `<booking id>@<uid_domain>`.
    pub uid_domain: String,
    pub organizer_email: String,
    pub event_title: String,
}

fn utc_stamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

fn slot_stamp(date: NaiveDate, time: TimeOfDay) -> String {
    utc_stamp(time.on(date))
}

fn status(status: BookingStatus) -> Status<'static> {
    match status {
        BookingStatus::Pending => Status::new("TENTATIVE"),
        BookingStatus::Confirmed => Status::new("CONFIRMED"),
        BookingStatus::Cancelled => Status::new("CANCELLED"),
    }
}

/// Renders a single-event calendar for `booking`. The output only depends on its inputs:
/// DTSTAMP is the booking's creation time.
pub fn booking_to_ics(booking: &Booking, settings: &CalendarSettings) -> String {
    let uid = format!("{}@{}", booking.id, settings.uid_domain);
    let summary = format!("{} - {}", settings.event_title, booking.client_name);
    let description = if booking.description.trim().is_empty() {
        DEFAULT_DESCRIPTION
    } else {
        booking.description.as_str()
    };

    let mut event = Event::new(uid, utc_stamp(booking.created_at));
    event.push(DtStart::new(slot_stamp(booking.date, booking.start_time)));
    event.push(DtEnd::new(slot_stamp(booking.date, booking.end_time)));
    event.push(Summary::new(escape_text(summary)));
    event.push(Description::new(escape_text(description)));
    event.push(Organizer::new(format!("mailto:{}", settings.organizer_email)));
    event.push(Attendee::new(format!("mailto:{}", booking.client_email)));
    event.push(status(booking.status));

    let mut calendar = ICalendar::new("2.0", PRODID);
    calendar.add_event(event);
    calendar.to_string()
}
