// src/export/json_csv.rs

use crate::errors::{AppError, AppResult};
use crate::export::model::to_rows;
use crate::models::calendar_event::CalendarEvent;

/// JSON, pretty-printed.
pub(crate) fn render_json(events: &[CalendarEvent]) -> AppResult<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(&to_rows(events))?;
    json.push(b'\n');
    Ok(json)
}

/// CSV, header included thanks to serde.
pub(crate) fn render_csv(events: &[CalendarEvent]) -> AppResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in to_rows(events) {
        wtr.serialize(row)?;
    }
    wtr.into_inner()
        .map_err(|e| AppError::Export(format!("CSV flush error: {e}")))
}
