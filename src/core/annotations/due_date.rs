//! Due-date inference from free-text notes.
//!
//! Fixed priority, first match wins: today → tomorrow → weekday name →
//! `d.m.yyyy` → `d.m.` (rolled into next year when already past).

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;
use std::sync::LazyLock;

static TODAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:today|heute)\b").expect("valid today regex"));
static TOMORROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btomorrow\b").expect("valid tomorrow regex"));
// Lower case only: the capitalized noun "Morgen" means morning.
static MORGEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bmorgen\b").expect("valid morgen regex"));
static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday|montag|dienstag|mittwoch|donnerstag|freitag|samstag|sonnabend|sonntag)(?:morgen|vormittag|mittag|nachmittag|abend)?\b",
    )
    .expect("valid weekday regex")
});
static FULL_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})\b").expect("valid full date regex")
});
static PARTIAL_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.").expect("valid partial date regex"));

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.to_lowercase().as_str() {
        "monday" | "montag" => Some(Weekday::Mon),
        "tuesday" | "dienstag" => Some(Weekday::Tue),
        "wednesday" | "mittwoch" => Some(Weekday::Wed),
        "thursday" | "donnerstag" => Some(Weekday::Thu),
        "friday" | "freitag" => Some(Weekday::Fri),
        "saturday" | "samstag" | "sonnabend" => Some(Weekday::Sat),
        "sunday" | "sonntag" => Some(Weekday::Sun),
        _ => None,
    }
}

/// "morgen" means tomorrow unless it names a time of day: "am morgen", "freitag morgen".
fn says_tomorrow(text: &str) -> bool {
    if TOMORROW_RE.is_match(text) {
        return true;
    }
    MORGEN_RE.find_iter(text).any(|m| {
        let previous = text[..m.start()]
            .split_whitespace()
            .next_back()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .unwrap_or_default();
        previous != "am" && weekday_from_name(&previous).is_none()
    })
}

/// Next `target` strictly after `base`; the same weekday resolves a week later.
pub fn next_weekday(base: NaiveDate, target: Weekday) -> Option<NaiveDate> {
    let from = base.weekday().num_days_from_monday();
    let to = target.num_days_from_monday();
    let ahead = (to + 7 - from) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    base.checked_add_days(Days::new(u64::from(ahead)))
}

fn full_date(text: &str) -> Option<NaiveDate> {
    FULL_DATE_RE.captures_iter(text).find_map(|caps| {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let raw_year = &caps[3];
        let mut year: i32 = raw_year.parse().ok()?;
        if raw_year.len() == 2 {
            year += 2000;
        }
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

fn partial_date(text: &str, base: NaiveDate) -> Option<NaiveDate> {
    PARTIAL_DATE_RE.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        // "3.1.2025" is a full date, not a partial one
        if text[whole.end()..].starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        // 29.2. may only exist in the following year
        match NaiveDate::from_ymd_opt(base.year(), month, day) {
            Some(date) if date >= base => Some(date),
            _ => NaiveDate::from_ymd_opt(base.year() + 1, month, day),
        }
    })
}

/// Infer a due date for `text` relative to the lesson day `base`.
pub fn infer_due_date(text: &str, base: NaiveDate) -> Option<NaiveDate> {
    if TODAY_RE.is_match(text) {
        return Some(base);
    }
    if says_tomorrow(text) {
        return base.succ_opt();
    }
    if let Some(caps) = WEEKDAY_RE.captures(text)
        && let Some(weekday) = weekday_from_name(&caps[1])
    {
        return next_weekday(base, weekday);
    }
    full_date(text).or_else(|| partial_date(text, base))
}
