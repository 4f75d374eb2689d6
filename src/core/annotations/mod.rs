//! Homework and exam detection in lesson notes.

pub mod due_date;

use crate::models::items::{ExamItem, HomeworkItem};
use crate::models::lesson::LessonDetail;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

pub use due_date::infer_due_date;

/// Ordered, de-duplicated, lower-cased keyword list matched as substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    words: Vec<String>,
}

impl KeywordSet {
    pub fn new<S: AsRef<str>>(words: &[S]) -> Self {
        let mut seen = HashSet::new();
        let words = words
            .iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty() && seen.insert(w.clone()))
            .collect();
        Self { words }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Case-insensitive: any keyword occurring anywhere in `text` is a hit.
    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.words.iter().any(|w| lower.contains(w.as_str()))
    }

    /// Lines of `text` that contain at least one keyword, trimmed.
    pub fn matching_lines<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && self.matches(line))
            .collect()
    }
}

/// What a single note yielded. Both fields can be set at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub homework: Option<HomeworkItem>,
    pub exam: Option<ExamItem>,
}

pub struct AnnotationExtractor<'a> {
    homework_keywords: &'a KeywordSet,
    exam_keywords: &'a KeywordSet,
}

impl<'a> AnnotationExtractor<'a> {
    pub fn new(homework_keywords: &'a KeywordSet, exam_keywords: &'a KeywordSet) -> Self {
        Self {
            homework_keywords,
            exam_keywords,
        }
    }

    /// Scan one note. Homework without a recognizable due date is dropped;
    /// an exam without one is pinned to `base`.
    pub fn scan(&self, note: &str, base: NaiveDate, subject: &str) -> Annotations {
        let mut found = Annotations::default();
        if note.trim().is_empty() {
            return found;
        }

        let due = infer_due_date(note, base);

        if self.homework_keywords.matches(note) {
            match due {
                Some(due) => {
                    let lines = self.homework_keywords.matching_lines(note);
                    let text = if lines.is_empty() {
                        note.trim().to_string()
                    } else {
                        lines.join("\n")
                    };
                    found.homework = Some(HomeworkItem {
                        due,
                        subject: subject.to_string(),
                        text,
                    });
                }
                None => log::debug!("homework note for {subject} on {base} has no due date"),
            }
        }

        if self.exam_keywords.matches(note) {
            found.exam = Some(ExamItem {
                due: due.unwrap_or(base),
                subject: subject.to_string(),
                note: note.trim().to_string(),
            });
        }

        found
    }

    /// Scan every lesson (cancelled ones included) and deduplicate across the run:
    /// homework by `(due, subject, text)`, exams by `(due, subject)`, first one wins.
    pub fn extract_all(&self, lessons: &[LessonDetail]) -> (Vec<HomeworkItem>, Vec<ExamItem>) {
        let mut homework: BTreeSet<HomeworkItem> = BTreeSet::new();
        let mut exams: Vec<ExamItem> = Vec::new();
        let mut exam_keys: HashSet<(NaiveDate, String)> = HashSet::new();

        for lesson in lessons {
            let found = self.scan(&lesson.note, lesson.day(), &lesson.subject);

            if let Some(item) = found.homework {
                homework.insert(item);
            }
            if let Some(item) = found.exam
                && exam_keys.insert((item.due, item.subject.clone()))
            {
                exams.push(item);
            }
        }

        (homework.into_iter().collect(), exams)
    }
}
