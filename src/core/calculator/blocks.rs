//! Interval merge engine: taught lessons of a day → contiguous attendance blocks.

use crate::models::block::{AttendanceBlock, Interval};
use crate::models::lesson::LessonDetail;
use chrono::{NaiveDate, TimeDelta};
use std::collections::BTreeMap;

/// Merge one day's intervals. A gap equal to `gap` still merges.
pub fn merge_intervals(day: NaiveDate, intervals: &[Interval], gap: TimeDelta) -> Vec<AttendanceBlock> {
    if intervals.is_empty() {
        return Vec::new();
    }

    // -----------------------------
    // Sort by begin
    // -----------------------------
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|i| (i.begin, i.end));

    let mut blocks: Vec<AttendanceBlock> = Vec::new();

    for iv in sorted {
        match blocks.last_mut() {
            Some(last) if iv.begin - last.end <= gap => {
                if iv.end > last.end {
                    last.end = iv.end;
                }
            }
            _ => blocks.push(AttendanceBlock {
                day,
                begin: iv.begin,
                end: iv.end,
            }),
        }
    }

    blocks
}

/// Group taught lessons by local day and merge each day separately.
/// Cancelled lessons never enter the merge, so they leave a gap.
pub fn build_blocks(lessons: &[LessonDetail], gap: TimeDelta) -> BTreeMap<NaiveDate, Vec<AttendanceBlock>> {
    let mut per_day: BTreeMap<NaiveDate, Vec<Interval>> = BTreeMap::new();

    for lesson in lessons.iter().filter(|l| !l.cancelled) {
        per_day
            .entry(lesson.day())
            .or_default()
            .push(Interval::new(lesson.begin, lesson.end));
    }

    per_day
        .into_iter()
        .map(|(day, intervals)| (day, merge_intervals(day, &intervals, gap)))
        .collect()
}
