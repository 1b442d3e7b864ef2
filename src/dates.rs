//! Local-calendar-day normalization.
//!
//! Every "day" in lectio is the device's local calendar day, never the UTC day.
//! Streaks, missed days and daily counts all go through the helpers here so that
//! day boundaries agree across the crate.
//!
//! Timestamps are persisted as UTC RFC 3339 strings with microsecond precision
//! (`2024-03-01T21:15:00.000000Z`), which keeps them lexically sortable and lets SQL
//! range filters compare them as plain text.

use crate::constants::{DATE_FORMAT_ISO, LEGACY_TIMESTAMP_FORMAT};
use crate::errors::{DatabaseError, ValidationError};
use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat,
    TimeZone, Utc,
};

/// Today's local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Today's local date as `YYYY-MM-DD`.
pub fn today_string() -> String {
    today().format(DATE_FORMAT_ISO).to_string()
}

/// Yesterday's local date as `YYYY-MM-DD`.
pub fn yesterday_string() -> String {
    (today() - Duration::days(1))
        .format(DATE_FORMAT_ISO)
        .to_string()
}

/// The local calendar date on which `timestamp` falls.
pub fn local_date<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> NaiveDate {
    timestamp.with_timezone(&Local).date_naive()
}

/// Formats the local calendar date of `timestamp` as `YYYY-MM-DD`.
pub fn to_local_date_string<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    local_date(timestamp).format(DATE_FORMAT_ISO).to_string()
}

/// Start of the local day containing `timestamp`, or of today when `None`.
pub fn local_midnight(timestamp: Option<&DateTime<Local>>) -> DateTime<Local> {
    let date = match timestamp {
        Some(ts) => ts.date_naive(),
        None => today(),
    };
    midnight_of(date)
}

/// The first instant of `date` in local time.
///
/// On DST transitions that skip midnight the first existing instant of the day is
/// used instead.
pub fn midnight_of(date: NaiveDate) -> DateTime<Local> {
    let naive = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(ts) => ts,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => (1..=24)
            .find_map(|hours| {
                Local
                    .from_local_datetime(&(naive + Duration::hours(hours)))
                    .earliest()
            })
            .unwrap_or_else(|| Local.from_utc_datetime(&naive)),
    }
}

/// Parses a `YYYY-MM-DD` string into a calendar date.
pub fn parse_local_date(date_str: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT_ISO)
        .map_err(|_| ValidationError::InvalidDate(date_str.to_string()))
}

/// Parses a `YYYY-MM-DD` string into local midnight of that day.
///
/// Round-trips with [`to_local_date_string`].
pub fn parse_local_date_string(date_str: &str) -> Result<DateTime<Local>, ValidationError> {
    parse_local_date(date_str).map(midnight_of)
}

/// True when both instants fall on the same local calendar day.
pub fn is_same_local_day<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> bool {
    local_date(a) == local_date(b)
}

/// Whole local calendar days between two instants, regardless of order.
///
/// Two instants on the same calendar day are 0 apart whatever their times; 23:30
/// and 00:15 the next day are 1 apart.
pub fn days_between<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> i64 {
    date_span(local_date(a), local_date(b))
}

/// Absolute number of days between two calendar dates.
pub fn date_span(a: NaiveDate, b: NaiveDate) -> i64 {
    a.signed_duration_since(b).num_days().abs()
}

/// Serializes an instant in the canonical storage layout.
pub fn to_storage<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    timestamp
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Reads a canonical storage timestamp back as local time.
pub fn from_storage(value: &str) -> Result<DateTime<Local>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Local))
        .map_err(|e| DatabaseError::InvalidRow(format!("bad timestamp '{}': {}", value, e)))
}

/// Parses any timestamp layout lectio has ever written.
///
/// Accepts RFC 3339 with any offset, and the zone-less `YYYY-MM-DD HH:MM:SS[.fff]`
/// layout (optionally with a `T` separator), which older stores wrote in UTC.
pub fn parse_lenient(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    let legacy_with_t = LEGACY_TIMESTAMP_FORMAT.replacen(' ', "T", 1);
    [LEGACY_TIMESTAMP_FORMAT, legacy_with_t.as_str()]
        .iter()
        .find_map(|format| {
            NaiveDateTime::parse_from_str(value, &format!("{}%.f", format))
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
}
