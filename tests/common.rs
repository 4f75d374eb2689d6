#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use std::fs;
use std::path::{Path, PathBuf};
use untiscal::config::{Config, PipelineOptions};
use untiscal::models::lesson::{NamedRef, RawLesson, RawTimestamp};

pub const TZ: Tz = chrono_tz::Europe::Berlin;

/// Binary under test, isolated from the caller's WebUntis and iCloud environment.
pub fn ucal() -> Command {
    let mut cmd = cargo_bin_cmd!("untiscal");
    for var in [
        "WEBUNTIS_SERVER",
        "WEBUNTIS_SCHOOL",
        "WEBUNTIS_USERNAME",
        "WEBUNTIS_PASSWORD",
        "WEBUNTIS_CLIENT",
        "UNTIS_STUDENT_ID",
        "UNTIS_TEACHER_ID",
        "UNTIS_CLASS_ID",
        "UNTIS_DAYS_BACK",
        "UNTIS_DAYS_FORWARD",
        "UNTIS_LOOKAHEAD_DAYS",
        "TIMEZONE",
        "ICS_OUTPUT_PATH",
        "CALDAV_URL",
        "ICLOUD_USERNAME",
        "ICLOUD_APP_PASSWORD",
        "ICLOUD_CALENDAR_NAME",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

pub fn options() -> PipelineOptions {
    Config::default().pipeline_options().expect("default options")
}

pub fn options_with_gap(minutes: u32) -> PipelineOptions {
    let cfg = Config {
        merge_gap_minutes: minutes,
        ..Config::default()
    };
    cfg.pipeline_options().expect("options")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn naive(day: NaiveDate, hm: &str) -> NaiveDateTime {
    day.and_time(NaiveTime::parse_from_str(hm, "%H:%M").expect("valid time"))
}

pub fn local(day: NaiveDate, hm: &str) -> DateTime<Tz> {
    untiscal::utils::time::localize(naive(day, hm), TZ).expect("existing local time")
}

pub fn named(name: &str) -> NamedRef {
    NamedRef {
        id: None,
        name: Some(name.to_string()),
        long_name: None,
    }
}

/// Taught lesson with a subject and no notes.
pub fn lesson(day: NaiveDate, begin: &str, end: &str, subject: &str) -> RawLesson {
    RawLesson {
        begin: Some(RawTimestamp::Local(naive(day, begin))),
        end: Some(RawTimestamp::Local(naive(day, end))),
        subjects: vec![named(subject)],
        ..RawLesson::default()
    }
}

pub fn with_note(mut raw: RawLesson, note: &str) -> RawLesson {
    raw.subst_text = Some(note.to_string());
    raw
}

pub fn cancelled(mut raw: RawLesson) -> RawLesson {
    raw.code = Some("cancelled".to_string());
    raw
}

/// Config file pointing at an explicit student so no login is needed.
pub fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("untiscal.conf");
    let yaml = format!(
        "timezone: Europe/Berlin\nstudent_id: 4711\noutput: {}\n{}",
        dir.join("out.ics").display(),
        extra
    );
    fs::write(&path, yaml).expect("write config");
    path
}

/// Small timetable dump: two taught periods, one cancelled, notes with homework and an exam.
pub fn write_dump(dir: &Path) -> PathBuf {
    let path = dir.join("lessons.json");
    let json = r#"{
  "lessons": [
    {
      "begin": "2025-03-12T08:00:00",
      "end": "2025-03-12T08:45:00",
      "subjects": [{ "name": "M", "long_name": "Mathematik" }],
      "rooms": [{ "name": "R101" }],
      "teachers": [{ "name": "MUE" }],
      "subst_text": "Hausaufgabe: S. 42 Nr. 3 bis Freitag"
    },
    {
      "begin": "2025-03-12T08:50:00",
      "end": "2025-03-12T09:35:00",
      "subjects": [{ "name": "D", "long_name": "Deutsch" }],
      "rooms": [{ "name": "R102" }],
      "info": "Klassenarbeit am 20.3."
    },
    {
      "begin": "2025-03-12T09:55:00",
      "end": "2025-03-12T10:40:00",
      "subjects": [{ "name": "E" }],
      "code": "cancelled"
    },
    {
      "begin": "2025-03-12T10:45:00",
      "end": "2025-03-12T11:30:00",
      "subjects": [{ "name": "BIO" }]
    },
    {
      "subjects": [{ "name": "broken" }]
    }
  ]
}"#;
    fs::write(&path, json).expect("write dump");
    path
}
