//! Canonical entities → calendar events with content-derived uids.

use crate::config::PipelineOptions;
use crate::models::block::AttendanceBlock;
use crate::models::calendar_event::{CalendarEvent, EventKind};
use crate::models::items::{ExamItem, HomeworkItem};
use crate::models::lesson::LessonDetail;
use crate::utils::time::at_time;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const UID_DOMAIN: &str = "untiscal";
const FIELD_SEPARATOR: char = '\u{1f}';

/// 128 bits of SHA-256 over the kind tag and the identifying fields.
pub fn stable_uid(kind: EventKind, fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    for field in fields {
        hasher.update([FIELD_SEPARATOR as u8]);
        hasher.update(field.as_bytes());
    }
    let hash = hasher.finalize();
    format!("{}@{}", hex::encode(&hash[..16]), UID_DOMAIN)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

pub fn lesson_event(lesson: &LessonDetail) -> CalendarEvent {
    let mut title = lesson.subject.clone();
    if !lesson.room.is_empty() {
        title.push_str(" · ");
        title.push_str(&lesson.room);
    }

    let mut notes: Vec<String> = Vec::new();
    if !lesson.teachers.is_empty() {
        notes.push(format!("Teacher: {}", lesson.teachers));
    }
    if !lesson.code.is_empty() {
        notes.push(format!("Status: {}", lesson.code));
    }
    if !lesson.note.is_empty() {
        notes.push(lesson.note.clone());
    }

    let begin = lesson.begin.to_rfc3339();
    CalendarEvent {
        uid: stable_uid(
            EventKind::Lesson,
            &[&begin, &lesson.subject, &lesson.room, &lesson.teachers],
        ),
        kind: EventKind::Lesson,
        title,
        begin: lesson.begin,
        end: lesson.end,
        location: non_empty(&lesson.room),
        description: non_empty(&notes.join("\n")),
        cancelled: lesson.cancelled,
    }
}

pub fn block_event(block: &AttendanceBlock, title: &str) -> CalendarEvent {
    let begin = block.begin.to_rfc3339();
    let end = block.end.to_rfc3339();
    CalendarEvent {
        uid: stable_uid(EventKind::Block, &[&begin, &end]),
        kind: EventKind::Block,
        title: format!("{} {}", title, block.span_label()).trim().to_string(),
        begin: block.begin,
        end: block.end,
        location: None,
        description: None,
        cancelled: false,
    }
}

pub fn homework_event(item: &HomeworkItem, opts: &PipelineOptions) -> Option<CalendarEvent> {
    let begin = at_time(item.due, opts.homework_time, opts.tz)?;
    let due = item.due.to_string();
    Some(CalendarEvent {
        uid: stable_uid(EventKind::Homework, &[&due, &item.subject, &item.text]),
        kind: EventKind::Homework,
        title: format!("Homework: {}", item.subject),
        begin,
        end: begin + opts.homework_duration,
        location: None,
        description: non_empty(&item.text),
        cancelled: false,
    })
}

pub fn exam_event(item: &ExamItem, opts: &PipelineOptions) -> Option<CalendarEvent> {
    let begin = at_time(item.due, opts.exam_time, opts.tz)?;
    let due = item.due.to_string();
    Some(CalendarEvent {
        uid: stable_uid(EventKind::Exam, &[&due, &item.subject]),
        kind: EventKind::Exam,
        title: format!("Exam: {}", item.subject),
        begin,
        end: begin + opts.exam_duration,
        location: None,
        description: non_empty(&item.note),
        cancelled: false,
    })
}

/// Everything the synthesizer turns into events.
pub struct SynthesisInput<'a> {
    pub lessons: &'a [LessonDetail],
    pub blocks: &'a [AttendanceBlock],
    pub homework: &'a [HomeworkItem],
    pub exams: &'a [ExamItem],
}

/// Build the final event set: unique by uid, ordered by `(begin, uid)`.
pub fn synthesize(input: &SynthesisInput<'_>, opts: &PipelineOptions) -> Vec<CalendarEvent> {
    let mut by_uid: BTreeMap<String, CalendarEvent> = BTreeMap::new();
    let mut add = |ev: CalendarEvent| {
        by_uid.entry(ev.uid.clone()).or_insert(ev);
    };

    if opts.include_lessons {
        input.lessons.iter().map(lesson_event).for_each(&mut add);
    }
    if opts.include_blocks {
        input
            .blocks
            .iter()
            .map(|b| block_event(b, &opts.block_title))
            .for_each(&mut add);
    }
    for item in input.homework {
        match homework_event(item, opts) {
            Some(ev) => add(ev),
            None => log::warn!("homework reminder time does not exist on {}", item.due),
        }
    }
    for item in input.exams {
        match exam_event(item, opts) {
            Some(ev) => add(ev),
            None => log::warn!("exam reminder time does not exist on {}", item.due),
        }
    }

    let mut events: Vec<CalendarEvent> = by_uid.into_values().collect();
    events.sort_by(|a, b| (a.begin, &a.uid).cmp(&(b.begin, &b.uid)));
    events
}
