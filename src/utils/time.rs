//! Time utilities: parsing HH:MM, WebUntis HHMM integers, local-time resolution.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t.trim(), "%H:%M").ok()
}

/// WebUntis encodes times as `HHMM` integers (`745` is 07:45).
pub fn from_untis_time(n: i64) -> Option<NaiveTime> {
    let hour = u32::try_from(n / 100).ok()?;
    let minute = u32::try_from(n % 100).ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Interpret a wall-clock time in `tz`. Ambiguous times take the earlier
/// instant; times inside a DST gap do not exist and yield `None`.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}

pub fn at_time(day: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Tz>> {
    localize(day.and_time(time), tz)
}
