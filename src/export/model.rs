// src/export/model.rs

use crate::models::calendar_event::CalendarEvent;
use serde::Serialize;

/// Flat event row for CSV / JSON / table output.
#[derive(Serialize, Clone, Debug)]
pub struct EventExport {
    pub uid: String,
    pub kind: String,
    pub date: String,
    pub begin: String,
    pub end: String,
    pub title: String,
    pub location: String,
    pub description: String,
    pub cancelled: bool,
}

impl From<&CalendarEvent> for EventExport {
    fn from(ev: &CalendarEvent) -> Self {
        Self {
            uid: ev.uid.clone(),
            kind: ev.kind.as_str().to_string(),
            date: ev.begin.format("%Y-%m-%d").to_string(),
            begin: ev.begin.to_rfc3339(),
            end: ev.end.to_rfc3339(),
            title: ev.title.clone(),
            location: ev.location.clone().unwrap_or_default(),
            description: ev.description.clone().unwrap_or_default(),
            cancelled: ev.cancelled,
        }
    }
}

pub(crate) fn to_rows(events: &[CalendarEvent]) -> Vec<EventExport> {
    events.iter().map(EventExport::from).collect()
}
