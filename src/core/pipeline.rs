use crate::config::PipelineOptions;
use crate::core::annotations::AnnotationExtractor;
use crate::core::calculator::blocks::build_blocks;
use crate::core::normalize::normalize_lessons;
use crate::core::synthesize::{SynthesisInput, synthesize};
use crate::models::block::AttendanceBlock;
use crate::models::calendar_event::{CalendarEvent, EventKind};
use crate::models::items::{ExamItem, HomeworkItem};
use crate::models::lesson::{LessonDetail, RawLesson};

/// Result of one full pipeline run over a batch of raw lessons.
#[derive(Debug, Default)]
pub struct CalendarPlan {
    pub skipped: usize,
    pub lessons: Vec<LessonDetail>,
    pub blocks: Vec<AttendanceBlock>,
    pub homework: Vec<HomeworkItem>,
    pub exams: Vec<ExamItem>,
    pub events: Vec<CalendarEvent>,
}

impl CalendarPlan {
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

/// normalize → merge → extract → synthesize. Pure and deterministic.
pub fn build_plan(raw: &[RawLesson], opts: &PipelineOptions) -> CalendarPlan {
    let lessons = normalize_lessons(raw, opts.tz);
    let skipped = raw.len() - lessons.len();

    let blocks: Vec<AttendanceBlock> = build_blocks(&lessons, opts.merge_gap)
        .into_values()
        .flatten()
        .collect();

    let extractor = AnnotationExtractor::new(&opts.homework_keywords, &opts.exam_keywords);
    let (homework, exams) = extractor.extract_all(&lessons);

    let events = synthesize(
        &SynthesisInput {
            lessons: &lessons,
            blocks: &blocks,
            homework: &homework,
            exams: &exams,
        },
        opts,
    );

    log::info!(
        "pipeline: {} lessons ({} skipped), {} blocks, {} homework, {} exams, {} events",
        lessons.len(),
        skipped,
        blocks.len(),
        homework.len(),
        exams.len(),
        events.len()
    );

    CalendarPlan {
        skipped,
        lessons,
        blocks,
        homework,
        exams,
        events,
    }
}
