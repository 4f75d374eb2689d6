//! Offline source reading a JSON timetable dump.

use super::TimetableSource;
use crate::errors::AppResult;
use crate::models::lesson::RawLesson;
use crate::models::scope::Scope;
use crate::utils::date::DateWindow;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct TimetableDump {
    #[serde(default)]
    pub identity: Option<Scope>,
    #[serde(default)]
    pub lessons: Vec<RawLesson>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DumpShape {
    Full(TimetableDump),
    Bare(Vec<RawLesson>),
}

/// Serves every lesson in the file, regardless of scope and window.
#[derive(Debug)]
pub struct JsonFileSource {
    dump: TimetableDump,
}

impl JsonFileSource {
    pub fn from_json(json: &str) -> AppResult<Self> {
        let dump = match serde_json::from_str::<DumpShape>(json)? {
            DumpShape::Full(dump) => dump,
            DumpShape::Bare(lessons) => TimetableDump {
                identity: None,
                lessons,
            },
        };
        Ok(Self { dump })
    }

    pub fn open(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)?;
        let source = Self::from_json(&content)?;
        log::info!(
            "loaded {} lessons from {}",
            source.dump.lessons.len(),
            path.display()
        );
        Ok(source)
    }
}

impl TimetableSource for JsonFileSource {
    fn current_identity(&mut self) -> AppResult<Option<Scope>> {
        Ok(self.dump.identity)
    }

    fn fetch(&mut self, _scope: &Scope, _window: &DateWindow) -> AppResult<Vec<RawLesson>> {
        Ok(self.dump.lessons.clone())
    }
}
