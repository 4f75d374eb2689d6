use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A subject/room/teacher reference as delivered by the timetable source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
}

impl NamedRef {
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Long name, then short name. Blank strings count as missing.
    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.long_name.as_deref()).or_else(|| non_blank(self.name.as_deref()))
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Begin/end timestamp of a raw lesson: either already zoned or local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Zoned(DateTime<FixedOffset>),
    Local(NaiveDateTime),
}

/// One lesson record in the shape the timetable source delivers it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLesson {
    #[serde(default)]
    pub begin: Option<RawTimestamp>,
    #[serde(default)]
    pub end: Option<RawTimestamp>,
    #[serde(default)]
    pub subjects: Vec<NamedRef>,
    #[serde(default)]
    pub rooms: Vec<NamedRef>,
    #[serde(default)]
    pub teachers: Vec<NamedRef>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub subst_text: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub lesson_text: Option<String>,
    #[serde(default)]
    pub notices: Vec<String>,
}

/// Canonical lesson, localized to the configured time zone. `begin < end` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDetail {
    pub begin: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub subject: String,
    pub room: String,
    pub teachers: String,
    pub code: String,
    pub note: String,
    pub cancelled: bool,
}

impl LessonDetail {
    /// Local calendar day the lesson starts on.
    pub fn day(&self) -> NaiveDate {
        self.begin.date_naive()
    }
}
