use crate::errors::{AppError, AppResult};
use crate::utils::time::localize;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

/// Today's date in the given time zone.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// WebUntis encodes dates as `YYYYMMDD` integers.
pub fn to_untis_date(d: NaiveDate) -> i64 {
    i64::from(d.year()) * 10_000 + i64::from(d.month()) * 100 + i64::from(d.day())
}

pub fn from_untis_date(n: i64) -> Option<NaiveDate> {
    let year = i32::try_from(n / 10_000).ok()?;
    let month = u32::try_from((n / 100) % 100).ok()?;
    let day = u32::try_from(n % 100).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Inclusive range of calendar days a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn around(today: NaiveDate, days_back: u32, days_forward: u32) -> AppResult<Self> {
        let start = today
            .checked_sub_days(Days::new(u64::from(days_back)))
            .ok_or_else(|| AppError::Config(format!("days_back out of range: {days_back}")))?;
        let end = today
            .checked_add_days(Days::new(u64::from(days_forward)))
            .ok_or_else(|| AppError::Config(format!("days_forward out of range: {days_forward}")))?;
        Self::new(start, end)
    }

    /// UTC instants from local midnight of `start` to local midnight after `end`.
    pub fn utc_bounds(&self, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let midnight = |day: NaiveDate| -> DateTime<Utc> {
            let naive = day.and_time(NaiveTime::MIN);
            match localize(naive, tz) {
                Some(local) => local.with_timezone(&Utc),
                // midnight skipped by a DST jump
                None => Utc.from_utc_datetime(&naive),
            }
        };
        let after_end = self.end.succ_opt().unwrap_or(self.end);
        (midnight(self.start), midnight(after_end))
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}
