use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, path::Path, str::FromStr};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

lazy_static! {
    static ref TIME_PATTERN: Regex = Regex::new(r"^([01]\d|2[0-4]):([0-5]\d)$").unwrap();
}

/// Wall-clock time of day with minute precision, stored as minutes since midnight.
///
/// `24:00` is the end of the day and only makes sense as the end of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes <= MINUTES_PER_DAY).then_some(Self(minutes))
    }

    /// Reads the end of a range from a `TIME` column, where midnight means the end of the day.
    pub fn from_end_time(time: NaiveTime) -> Self {
        match Self::from(time) {
            Self(0) => Self(MINUTES_PER_DAY),
            end => end,
        }
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if minute >= 60 {
            return None;
        }
        Self::from_minutes(hour * 60 + minute)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// `24:00` wraps to midnight; read it back with `from_end_time`.
    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(u32::from(self.0 % MINUTES_PER_DAY) * 60, 0)
            .unwrap_or_default()
    }

    /// The UTC instant of this time of day on `date`. `24:00` is midnight of the next day.
    pub fn on(self, date: NaiveDate) -> DateTime<Utc> {
        date.and_time(NaiveTime::MIN).and_utc() + Duration::minutes(i64::from(self.0))
    }
}

// Seconds are truncated, matching the "HH:MM" resolution of the whole model.
impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let captures = TIME_PATTERN
            .captures(text)
            .ok_or_else(|| format!("Invalid time '{text}'. Use HH:MM."))?;
        let hour: u16 = captures[1].parse().map_err(|_| format!("Invalid hour in '{text}'"))?;
        let minute: u16 = captures[2]
            .parse()
            .map_err(|_| format!("Invalid minute in '{text}'"))?;
        Self::from_hm(hour, minute).ok_or_else(|| format!("Invalid time '{text}'"))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl AvailabilityRule {
    pub fn new(day_of_week: u8, start_time: TimeOfDay, end_time: TimeOfDay) -> Self {
        Self {
            day_of_week,
            start_time,
            end_time,
            active: true,
        }
    }

    fn check(&self) -> Result<(), ScheduleError> {
        if self.day_of_week > 6 {
            return Err(ScheduleError::InvalidRule(format!(
                "day_of_week {} is outside 0..=6",
                self.day_of_week
            )));
        }
        if self.start_time >= self.end_time {
            return Err(ScheduleError::InvalidRule(format!(
                "start {} is not before end {}",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Failed to read schedule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse schedule file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid availability rule: {0}")]
    InvalidRule(String),
}

/// Recurring weekly availability used when no database is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub rules: Vec<AvailabilityRule>,
}

impl Default for WeeklySchedule {
    /// Sunday to Thursday, 09:00 to 17:00. Friday and Saturday are off.
    fn default() -> Self {
        let start = TimeOfDay(9 * 60);
        let end = TimeOfDay(17 * 60);
        Self {
            rules: (0..=4)
                .map(|day| AvailabilityRule::new(day, start, end))
                .collect(),
        }
    }
}

impl WeeklySchedule {
    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        let schedule: WeeklySchedule = serde_json::from_str(json)?;
        for rule in &schedule.rules {
            rule.check()?;
        }
        Ok(schedule)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScheduleError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn rules_for_day(&self, day_of_week: u8) -> Vec<AvailabilityRule> {
        self.rules
            .iter()
            .filter(|rule| rule.active && rule.day_of_week == day_of_week)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub client_name: String,
    pub client_email: String,
    pub description: String,
    pub status: BookingStatus,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

/// A booking as handed to the storage layer, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub client_name: String,
    pub client_email: String,
    pub description: String,
    pub status: BookingStatus,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn with_id(self, id: Uuid) -> Booking {
        Booking {
            id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            client_name: self.client_name,
            client_email: self.client_email,
            description: self.description,
            status: self.status,
            timezone: self.timezone,
            created_at: self.created_at,
        }
    }
}

/// The part of a booking that matters for availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedSlot {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedSlot {
    pub date: NaiveDate,
    /// `None` blocks the whole day.
    pub start_time: Option<TimeOfDay>,
    /// Required whenever `start_time` is set; a range without an end covers nothing.
    pub end_time: Option<TimeOfDay>,
    pub reason: Option<String>,
}

impl BlockedSlot {
    pub fn full_day(date: NaiveDate) -> Self {
        Self {
            date,
            start_time: None,
            end_time: None,
            reason: None,
        }
    }

    pub fn range(date: NaiveDate, start_time: TimeOfDay, end_time: TimeOfDay) -> Self {
        Self {
            date,
            start_time: Some(start_time),
            end_time: Some(end_time),
            reason: None,
        }
    }

    pub fn covers(&self, slot_start: TimeOfDay, slot_end: TimeOfDay) -> bool {
        match (self.start_time, self.end_time) {
            (None, _) => true,
            (Some(start), Some(end)) => start <= slot_start && end >= slot_end,
            (Some(_), None) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookingRequest {
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub client_name: String,
    #[validate(
        custom(function = "not_blank", message = "Email is required"),
        email(message = "Email address is not valid")
    )]
    pub client_email: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: String,
    #[validate(custom(function = "known_timezone", message = "Unknown timezone"))]
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[validate(
        custom(function = "not_blank", message = "Message is required"),
        length(max = 5000, message = "Message is too long")
    )]
    pub message: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn known_timezone(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<chrono_tz::Tz>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("timezone"))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;
    use test_case::test_case;

    #[test_case("00:00", 0)]
    #[test_case("09:00", 540)]
    #[test_case("09:05", 545)]
    #[test_case("23:59", 1439)]
    #[test_case("24:00", 1440)]
    fn parse_time_of_day(text: &str, minutes: u16) {
        let time: TimeOfDay = text.parse().unwrap();
        assert_eq!(time.minutes(), minutes);
        assert_eq!(time.to_string(), text);
    }

    #[test_case("9:00")]
    #[test_case("24:01")]
    #[test_case("25:00")]
    #[test_case("12:60")]
    #[test_case("12:00:00")]
    #[test_case("")]
    fn reject_malformed_time_of_day(text: &str) {
        assert!(text.parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn time_of_day_from_database_time_truncates_seconds() {
        let time = NaiveTime::from_hms_opt(14, 30, 59).unwrap();
        assert_eq!(TimeOfDay::from(time).to_string(), "14:30");
    }

    #[test]
    fn end_of_day_is_midnight_of_the_next_date() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        let end: TimeOfDay = "24:00".parse().unwrap();

        assert_eq!(end.on(date).to_rfc3339(), "2026-02-16T00:00:00+00:00");
        assert_eq!(end.to_naive_time(), NaiveTime::MIN);
        assert_eq!(TimeOfDay::from_end_time(end.to_naive_time()), end);
        assert_eq!(
            TimeOfDay::from_end_time(NaiveTime::from_hms_opt(17, 0, 0).unwrap()).to_string(),
            "17:00"
        );
    }

    #[test]
    fn rule_may_end_at_midnight() {
        let schedule = WeeklySchedule::from_json(
            r#"{"rules": [{"day_of_week": 0, "start_time": "17:00", "end_time": "24:00"}]}"#,
        )
        .unwrap();
        assert_eq!(schedule.rules_for_day(0)[0].end_time.minutes(), MINUTES_PER_DAY);

        WeeklySchedule::from_json(
            r#"{"rules": [{"day_of_week": 0, "start_time": "24:00", "end_time": "24:00"}]}"#,
        )
        .unwrap_err();
    }

    #[test]
    fn time_of_day_serializes_as_text() {
        let time = TimeOfDay::from_hm(7, 5).unwrap();
        assert_eq!(serde_json::to_string(&time).unwrap(), "\"07:05\"");
        let parsed: TimeOfDay = serde_json::from_str("\"07:05\"").unwrap();
        assert_eq!(parsed, time);
        serde_json::from_str::<TimeOfDay>("\"7am\"").unwrap_err();
    }

    #[test]
    fn default_schedule_is_sunday_to_thursday() {
        let schedule = WeeklySchedule::default();
        for day in 0..=4 {
            let rules = schedule.rules_for_day(day);
            assert_eq!(rules.len(), 1);
            assert_eq!(rules[0].start_time.to_string(), "09:00");
            assert_eq!(rules[0].end_time.to_string(), "17:00");
        }
        assert!(schedule.rules_for_day(5).is_empty());
        assert!(schedule.rules_for_day(6).is_empty());
    }

    #[test]
    fn load_schedule_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"rules": [
                {{"day_of_week": 1, "start_time": "08:00", "end_time": "12:00"}},
                {{"day_of_week": 1, "start_time": "13:00", "end_time": "16:00"}},
                {{"day_of_week": 3, "start_time": "10:00", "end_time": "11:00", "active": false}}
            ]}}"#
        )
        .unwrap();

        let schedule = WeeklySchedule::from_file(file.path()).unwrap();
        assert_eq!(schedule.rules.len(), 3);
        assert_eq!(schedule.rules_for_day(1).len(), 2);
        assert!(schedule.rules_for_day(3).is_empty());
    }

    #[test_case(r#"{"rules": [{"day_of_week": 7, "start_time": "08:00", "end_time": "12:00"}]}"#)]
    #[test_case(r#"{"rules": [{"day_of_week": 1, "start_time": "12:00", "end_time": "12:00"}]}"#)]
    #[test_case(r#"{"rules": [{"day_of_week": 1, "start_time": "8", "end_time": "12:00"}]}"#)]
    #[test_case("not json")]
    fn reject_invalid_schedule(json: &str) {
        WeeklySchedule::from_json(json).unwrap_err();
    }

    #[test]
    fn missing_schedule_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = WeeklySchedule::from_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ScheduleError::Io(_)));
    }

    #[test]
    fn blocked_slot_coverage() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        let t = |text: &str| text.parse::<TimeOfDay>().unwrap();

        assert!(BlockedSlot::full_day(date).covers(t("09:00"), t("10:00")));

        let block = BlockedSlot::range(date, t("10:00"), t("12:00"));
        assert!(block.covers(t("10:00"), t("11:00")));
        assert!(block.covers(t("11:00"), t("12:00")));
        assert!(!block.covers(t("09:00"), t("10:00")));
        assert!(!block.covers(t("11:30"), t("12:30")));

        let open_ended = BlockedSlot {
            end_time: None,
            ..BlockedSlot::range(date, t("15:00"), t("16:00"))
        };
        assert!(!open_ended.covers(t("15:00"), t("16:00")));
        assert!(!open_ended.covers(t("16:00"), t("17:00")));
        assert!(!open_ended.covers(t("14:00"), t("15:00")));
    }

    #[test]
    fn booking_status_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_string(&BookingStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
        "done".parse::<BookingStatus>().unwrap_err();
    }

    fn booking_request() -> BookingRequest {
        BookingRequest {
            date: NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            start_time: TimeOfDay::from_hm(9, 0).unwrap(),
            end_time: TimeOfDay::from_hm(10, 0).unwrap(),
            client_name: "Ada".into(),
            client_email: "ada@example.com".into(),
            description: String::new(),
            timezone: "Asia/Dubai".into(),
        }
    }

    #[test]
    fn validate_booking_request() {
        booking_request().validate().unwrap();

        let blank_name = BookingRequest {
            client_name: "   ".into(),
            ..booking_request()
        };
        blank_name.validate().unwrap_err();

        let no_email = BookingRequest {
            client_email: String::new(),
            ..booking_request()
        };
        no_email.validate().unwrap_err();

        let bad_email = BookingRequest {
            client_email: "not-an-email".into(),
            ..booking_request()
        };
        bad_email.validate().unwrap_err();

        let bad_timezone = BookingRequest {
            timezone: "Mars/Olympus".into(),
            ..booking_request()
        };
        bad_timezone.validate().unwrap_err();
    }

    #[test]
    fn description_is_optional_in_json() {
        let request: BookingRequest = serde_json::from_str(
            r#"{"date": "2026-02-15", "start_time": "09:00", "end_time": "10:00",
                "client_name": "Ada", "client_email": "ada@example.com", "timezone": "UTC"}"#,
        )
        .unwrap();
        assert_eq!(request.description, "");
        request.validate().unwrap();
    }
}
