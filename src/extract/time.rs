//! Human-readable, timezone-aware rendering of timestamps.

use chrono::{DateTime, FixedOffset, Offset, TimeZone};
use chrono_tz::Tz;

use crate::base::{
    error::ExtractError,
    prompts::{HUMAN_READABLE_LOCAL_FORMAT, HUMAN_READABLE_TIME_FORMAT},
};

/// Render `time` in `tz` as `Weekday, Month Day, Year, HH:MM TZ`.
pub fn human_readable<T: TimeZone>(time: &DateTime<T>, tz: Tz) -> String {
    time.with_timezone(&tz).format(HUMAN_READABLE_TIME_FORMAT).to_string()
}

/// Render `time` at its own offset as `Weekday, Month Day, Year, HH:MM TZ`.
///
/// The zone label is `tz`'s abbreviation when `tz` has the same offset at that instant,
/// `UTC` for a zero offset, and the numeric offset (e.g. `+05:30`) otherwise.
pub fn human_readable_at_offset(time: &DateTime<FixedOffset>, tz: Tz) -> String {
    let offset = time.offset().local_minus_utc();
    let display = time.with_timezone(&tz);

    let label = if display.offset().fix().local_minus_utc() == offset {
        display.format("%Z").to_string()
    } else if offset == 0 {
        "UTC".to_string()
    } else {
        time.format("%:z").to_string()
    };

    format!("{} {label}", time.format(HUMAN_READABLE_LOCAL_FORMAT))
}

/// The UTC offset of `time` in `tz`, e.g. `-05:00`.
pub fn utc_offset<T: TimeZone>(time: &DateTime<T>, tz: Tz) -> String {
    time.with_timezone(&tz).format("%:z").to_string()
}

/// Parse a model-provided RFC3339 timestamp.
pub fn parse_event_date(date: &str) -> Result<DateTime<chrono::FixedOffset>, ExtractError> {
    DateTime::parse_from_rfc3339(date.trim()).map_err(|source| ExtractError::DateParse { date: date.to_string(), source })
}
