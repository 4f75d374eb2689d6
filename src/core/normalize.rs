//! Raw lesson records → canonical `LessonDetail`.
//!
//! Every optional field has exactly one fallback chain:
//! - subject: long name → short name → `"Lesson"`
//! - rooms / teachers: long name → short name per reference, unnamed ones dropped,
//!   joined with `", "`
//! - note: substitution text, info, lesson text, notices (trimmed, empty ones dropped)

use crate::models::lesson::{LessonDetail, NamedRef, RawLesson, RawTimestamp};
use crate::utils::time::localize;
use chrono::DateTime;
use chrono_tz::Tz;

pub const SUBJECT_PLACEHOLDER: &str = "Lesson";
pub const NAME_SEPARATOR: &str = ", ";
const CANCEL_CODES: [&str; 2] = ["cancelled", "canc"];

fn resolve_timestamp(ts: Option<&RawTimestamp>, tz: Tz) -> Option<DateTime<Tz>> {
    match ts? {
        RawTimestamp::Zoned(dt) => Some(dt.with_timezone(&tz)),
        RawTimestamp::Local(naive) => localize(*naive, tz),
    }
}

fn join_names(refs: &[NamedRef]) -> String {
    refs.iter()
        .filter_map(NamedRef::display_name)
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

fn collect_note(raw: &RawLesson) -> String {
    [&raw.subst_text, &raw.info, &raw.lesson_text]
        .into_iter()
        .filter_map(|s| s.as_deref())
        .chain(raw.notices.iter().map(String::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn is_cancel_code(code: &str) -> bool {
    let code = code.trim();
    CANCEL_CODES.iter().any(|c| c.eq_ignore_ascii_case(code))
}

/// Normalize one record. `None` when begin/end cannot be resolved or `end <= begin`.
pub fn normalize_lesson(raw: &RawLesson, tz: Tz) -> Option<LessonDetail> {
    let begin = resolve_timestamp(raw.begin.as_ref(), tz)?;
    let end = resolve_timestamp(raw.end.as_ref(), tz)?;
    if end <= begin {
        return None;
    }

    let subject = raw
        .subjects
        .iter()
        .find_map(NamedRef::display_name)
        .unwrap_or(SUBJECT_PLACEHOLDER)
        .to_string();

    let code = raw.code.as_deref().map(str::trim).unwrap_or("").to_string();
    let cancelled = raw.cancelled || is_cancel_code(&code);

    Some(LessonDetail {
        begin,
        end,
        subject,
        room: join_names(&raw.rooms),
        teachers: join_names(&raw.teachers),
        code,
        note: collect_note(raw),
        cancelled,
    })
}

/// Normalize all records, drop unresolvable ones and sort for deterministic processing.
pub fn normalize_lessons(raw: &[RawLesson], tz: Tz) -> Vec<LessonDetail> {
    let mut details: Vec<LessonDetail> = raw
        .iter()
        .filter_map(|r| {
            let detail = normalize_lesson(r, tz);
            if detail.is_none() {
                log::debug!("skipping lesson without usable begin/end: {:?}", r.subjects);
            }
            detail
        })
        .collect();

    details.sort_by(|a, b| {
        (a.begin, a.end, &a.subject, &a.room).cmp(&(b.begin, b.end, &b.subject, &b.room))
    });
    details
}
