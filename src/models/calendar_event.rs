use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Lesson,
    Block,
    Homework,
    Exam,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Lesson => "lesson",
            EventKind::Block => "block",
            EventKind::Homework => "homework",
            EventKind::Exam => "exam",
        }
    }
}

/// One synthesized calendar entry. `uid` depends only on the identifying fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub uid: String,
    pub kind: EventKind,
    pub title: String,
    pub begin: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub cancelled: bool,
}

impl CalendarEvent {
    pub fn begin_utc(&self) -> DateTime<Utc> {
        self.begin.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }
}
