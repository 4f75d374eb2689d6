// src/export/mod.rs

pub mod caldav;
mod fs_utils;
pub mod ics;
mod json_csv;
mod model;

use crate::errors::AppResult;
use crate::models::calendar_event::CalendarEvent;
use crate::ui::messages::success;
use crate::utils::date::DateWindow;
use clap::ValueEnum;
use std::path::{Path, PathBuf};

pub use caldav::CalDavSink;

/// Common completion message for file exports.
pub(crate) fn notify_export_success(label: &str, path: &Path) {
    success(format!("{label} export completed: {}", path.display()));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Ics,
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Ics => "ics",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Where `sync` publishes the event set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SyncTarget {
    File,
    Caldav,
}

/// Receives the complete event set of a run and replaces its content for the window.
pub trait CalendarSink {
    fn publish(&mut self, window: &DateWindow, events: &[CalendarEvent]) -> AppResult<()>;
}

impl<T: CalendarSink + ?Sized> CalendarSink for Box<T> {
    fn publish(&mut self, window: &DateWindow, events: &[CalendarEvent]) -> AppResult<()> {
        (**self).publish(window, events)
    }
}

/// Writes the whole event set to one file, atomically.
pub struct FileSink {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub force: bool,
}

impl FileSink {
    pub fn new(format: ExportFormat, path: PathBuf, force: bool) -> Self {
        Self {
            format,
            path,
            force,
        }
    }

    /// Serialize `events` in this sink's format.
    pub fn render(&self, window: &DateWindow, events: &[CalendarEvent]) -> AppResult<Vec<u8>> {
        match self.format {
            ExportFormat::Ics => Ok(ics::render_calendar(window, events).into_bytes()),
            ExportFormat::Json => json_csv::render_json(events),
            ExportFormat::Csv => json_csv::render_csv(events),
        }
    }
}

impl CalendarSink for FileSink {
    fn publish(&mut self, window: &DateWindow, events: &[CalendarEvent]) -> AppResult<()> {
        fs_utils::ensure_writable(&self.path, self.force)?;
        // only ask once, retries must not prompt again
        self.force = true;

        let bytes = self.render(window, events)?;
        fs_utils::write_atomic(&self.path, &bytes)?;

        notify_export_success(&self.format.as_str().to_uppercase(), &self.path);
        Ok(())
    }
}
