//! Environment overrides applied on top of the YAML configuration.

use super::Config;
use crate::errors::{AppError, AppResult};

fn parse_id(name: &str, raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::Config(format!("invalid value for {name}: {raw}")))
}

fn parse_days(name: &str, raw: &str) -> AppResult<u32> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("invalid value for {name}: {raw}")))?;
    if value < 0 {
        return Err(AppError::Config(format!("{name} must not be negative: {raw}")));
    }
    u32::try_from(value).map_err(|_| AppError::Config(format!("{name} is too large: {raw}")))
}

impl Config {
    /// Apply `WEBUNTIS_*`, `UNTIS_*` and `ICLOUD_*` overrides. `lookup` returns a variable's value.
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("WEBUNTIS_SERVER") {
            self.server = v;
        }
        if let Some(v) = get("WEBUNTIS_SCHOOL") {
            self.school = v;
        }
        if let Some(v) = get("WEBUNTIS_USERNAME") {
            self.username = v;
        }
        if let Some(v) = get("WEBUNTIS_PASSWORD") {
            self.password = v;
        }
        if let Some(v) = get("WEBUNTIS_CLIENT") {
            self.client = v;
        }
        if let Some(v) = get("TIMEZONE") {
            self.timezone = v;
        }
        if let Some(v) = get("ICS_OUTPUT_PATH") {
            self.output = v;
        }
        if let Some(v) = get("CALDAV_URL") {
            self.caldav_url = v;
        }
        if let Some(v) = get("ICLOUD_USERNAME") {
            self.caldav_username = v;
        }
        if let Some(v) = get("ICLOUD_APP_PASSWORD") {
            self.caldav_password = v;
        }
        if let Some(v) = get("ICLOUD_CALENDAR_NAME") {
            self.calendar_name = v;
        }

        if let Some(v) = get("UNTIS_STUDENT_ID") {
            self.student_id = Some(parse_id("UNTIS_STUDENT_ID", &v)?);
        }
        if let Some(v) = get("UNTIS_TEACHER_ID") {
            self.teacher_id = Some(parse_id("UNTIS_TEACHER_ID", &v)?);
        }
        if let Some(v) = get("UNTIS_CLASS_ID") {
            self.class_id = Some(parse_id("UNTIS_CLASS_ID", &v)?);
        }

        if let Some(v) = get("UNTIS_DAYS_BACK") {
            self.days_back = parse_days("UNTIS_DAYS_BACK", &v)?;
        }
        if let Some(v) = get("UNTIS_DAYS_FORWARD") {
            self.days_forward = parse_days("UNTIS_DAYS_FORWARD", &v)?;
        } else if let Some(v) = get("UNTIS_LOOKAHEAD_DAYS") {
            self.days_forward = parse_days("UNTIS_LOOKAHEAD_DAYS", &v)?;
        }

        Ok(())
    }
}
