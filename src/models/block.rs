use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

/// A `(begin, end)` pair taken from a taught (non-cancelled) lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub begin: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl Interval {
    pub fn new(begin: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self { begin, end }
    }
}

/// Maximal run of contiguous intervals on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceBlock {
    pub day: NaiveDate,
    pub begin: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl AttendanceBlock {
    pub fn as_interval(&self) -> Interval {
        Interval::new(self.begin, self.end)
    }

    /// "07:55-13:05"
    pub fn span_label(&self) -> String {
        format!(
            "{}-{}",
            self.begin.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}
