use crate::core::annotations::KeywordSet;
use crate::errors::{AppError, AppResult};
use crate::models::scope::ExplicitIds;
use crate::utils::date::DateWindow;
use crate::utils::path::expand_tilde;
use crate::utils::time::parse_time;
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod env;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timezone: String,

    // WebUntis account
    pub server: String,
    pub school: String,
    pub username: String,
    pub password: String,
    pub client: String,

    // Explicit scope (takes priority over the logged-in identity)
    pub student_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub class_id: Option<i64>,

    pub days_back: u32,
    pub days_forward: u32,

    pub merge_gap_minutes: u32,
    pub include_lessons: bool,
    pub include_blocks: bool,
    pub block_title: String,

    pub homework_time: String,
    pub homework_duration_minutes: u32,
    pub exam_time: String,
    pub exam_duration_minutes: u32,
    pub homework_keywords: Vec<String>,
    pub exam_keywords: Vec<String>,

    pub fetch_timeout_secs: u64,
    pub retry_attempts: u32,
    pub output: String,

    // CalDAV publishing (`sync --target caldav`)
    pub caldav_url: String,
    pub caldav_username: String,
    pub caldav_password: String,
    pub calendar_name: String,
}

pub fn default_homework_keywords() -> Vec<String> {
    [
        "hausaufgabe",
        "hausaufgaben",
        "ha:",
        "aufgabe",
        "übung",
        "vokabeln",
        "abgabe",
        "homework",
        "assignment",
        "exercise",
        "vocabulary",
        "due",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_exam_keywords() -> Vec<String> {
    [
        "klassenarbeit",
        "klausur",
        "schulaufgabe",
        "prüfung",
        "lernkontrolle",
        "test",
        "exam",
        "quiz",
        "written assessment",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "Europe/Berlin".to_string(),
            server: String::new(),
            school: String::new(),
            username: String::new(),
            password: String::new(),
            client: "untiscal".to_string(),
            student_id: None,
            teacher_id: None,
            class_id: None,
            days_back: 0,
            days_forward: 14,
            merge_gap_minutes: 15,
            include_lessons: true,
            include_blocks: true,
            block_title: "School".to_string(),
            homework_time: "07:00".to_string(),
            homework_duration_minutes: 15,
            exam_time: "07:30".to_string(),
            exam_duration_minutes: 30,
            homework_keywords: default_homework_keywords(),
            exam_keywords: default_exam_keywords(),
            fetch_timeout_secs: 20,
            retry_attempts: 3,
            output: Self::config_dir()
                .join("untiscal.ics")
                .to_string_lossy()
                .to_string(),
            caldav_url: "https://caldav.icloud.com/".to_string(),
            caldav_username: String::new(),
            caldav_password: String::new(),
            calendar_name: "Untis".to_string(),
        }
    }
}

/// Validated, typed view of the configuration consumed by the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub tz: Tz,
    pub merge_gap: TimeDelta,
    pub include_lessons: bool,
    pub include_blocks: bool,
    pub block_title: String,
    pub homework_time: NaiveTime,
    pub homework_duration: TimeDelta,
    pub exam_time: NaiveTime,
    pub exam_duration: TimeDelta,
    pub homework_keywords: KeywordSet,
    pub exam_keywords: KeywordSet,
}

impl Config {
    /// Return the standard configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".untiscal")
    }

    /// Return the full path of the default config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("untiscal.conf")
    }

    /// Load configuration from `path`, or return defaults if the file does not exist.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            log::debug!("no config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        Ok(cfg)
    }

    /// Load file (default location unless overridden) and apply environment overrides.
    pub fn load(custom: Option<&str>) -> AppResult<Self> {
        let path = custom
            .map(expand_tilde)
            .unwrap_or_else(Self::config_file);
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env(|name| std::env::var(name).ok())?;
        Ok(cfg)
    }

    /// Write this configuration as YAML, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn timezone(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| AppError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn explicit_ids(&self) -> ExplicitIds {
        ExplicitIds {
            student_id: self.student_id,
            teacher_id: self.teacher_id,
            class_id: self.class_id,
        }
    }

    /// Inclusive window of `days_back` before and `days_forward` after `today`.
    pub fn window(&self, today: NaiveDate) -> AppResult<DateWindow> {
        DateWindow::around(today, self.days_back, self.days_forward)
    }

    pub fn output_path(&self) -> PathBuf {
        expand_tilde(&self.output)
    }

    pub fn has_credentials(&self) -> bool {
        !self.server.is_empty() && !self.school.is_empty() && !self.username.is_empty()
    }

    pub fn has_caldav_credentials(&self) -> bool {
        !self.caldav_username.is_empty() && !self.caldav_password.is_empty()
    }

    pub fn pipeline_options(&self) -> AppResult<PipelineOptions> {
        let homework_time = parse_time(&self.homework_time)
            .ok_or_else(|| AppError::InvalidTime(self.homework_time.clone()))?;
        let exam_time =
            parse_time(&self.exam_time).ok_or_else(|| AppError::InvalidTime(self.exam_time.clone()))?;

        if self.homework_duration_minutes == 0 || self.exam_duration_minutes == 0 {
            return Err(AppError::Config(
                "reminder durations must be at least one minute".into(),
            ));
        }

        Ok(PipelineOptions {
            tz: self.timezone()?,
            merge_gap: TimeDelta::minutes(i64::from(self.merge_gap_minutes)),
            include_lessons: self.include_lessons,
            include_blocks: self.include_blocks,
            block_title: self.block_title.clone(),
            homework_time,
            homework_duration: TimeDelta::minutes(i64::from(self.homework_duration_minutes)),
            exam_time,
            exam_duration: TimeDelta::minutes(i64::from(self.exam_duration_minutes)),
            homework_keywords: KeywordSet::new(&self.homework_keywords),
            exam_keywords: KeywordSet::new(&self.exam_keywords),
        })
    }
}
