mod common;
use common::{date, local, options, write_dump};
use std::cell::{Cell, RefCell};
use std::fs;
use std::rc::Rc;
use tempfile::tempdir;
use untiscal::core::pipeline::build_plan;
use untiscal::errors::{AppError, AppResult};
use untiscal::export::ics::{escape_text, fold_line, render_calendar};
use untiscal::export::{CalendarSink, ExportFormat, FileSink};
use untiscal::models::calendar_event::{CalendarEvent, EventKind};
use untiscal::models::lesson::RawLesson;
use untiscal::models::scope::Scope;
use untiscal::source::retry::with_retry;
use untiscal::source::{JsonFileSource, RetryPolicy, Retrying, TimetableSource};
use untiscal::utils::date::DateWindow;

fn window() -> DateWindow {
    DateWindow::new(date(2025, 3, 10), date(2025, 3, 24)).expect("window")
}

fn sample_events() -> Vec<CalendarEvent> {
    let dir = tempdir().expect("tempdir");
    let mut source = JsonFileSource::open(&write_dump(dir.path())).expect("dump");
    let raw = source
        .fetch(&Scope::Student { id: 1 }, &window())
        .expect("lessons");
    build_plan(&raw, &options()).events
}

fn no_wait(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff_ms: 0,
        max_backoff_ms: 0,
    }
}

// ---------------------------------------------------------------
// ICS
// ---------------------------------------------------------------

#[test]
fn test_escape_text() {
    assert_eq!(escape_text("Mathe, Raum 1; Teil\\2"), "Mathe\\, Raum 1\\; Teil\\\\2");
    assert_eq!(escape_text("line one\r\nline two"), "line one\\nline two");
    assert_eq!(escape_text("plain"), "plain");
}

#[test]
fn test_short_line_is_not_folded() {
    assert_eq!(fold_line("SUMMARY:Mathe"), "SUMMARY:Mathe\r\n");
}

#[test]
fn test_long_line_is_folded_at_75_octets() {
    let line = format!("DESCRIPTION:{}", "ä".repeat(80));
    let folded = fold_line(&line);

    let physical: Vec<&str> = folded.trim_end_matches("\r\n").split("\r\n").collect();
    assert!(physical.len() > 1);
    assert!(physical.iter().all(|l| l.len() <= 75));
    assert!(physical[1..].iter().all(|l| l.starts_with(' ')));

    let unfolded: String = physical
        .iter()
        .enumerate()
        .map(|(i, l)| if i == 0 { *l } else { &l[1..] })
        .collect();
    assert_eq!(unfolded, line);
}

#[test]
fn test_calendar_document() {
    let events = sample_events();
    let ics = render_calendar(&window(), &events);

    assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
    assert!(ics.ends_with("END:VCALENDAR\r\n"));
    assert!(ics.contains("PRODID:-//untiscal//untiscal//EN\r\n"));
    assert!(ics.contains("X-WR-CALDESC:Timetable 2025-03-10 to 2025-03-24\r\n"));
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), events.len());
    assert_eq!(ics.matches("END:VEVENT").count(), events.len());
    assert!(!ics.replace("\r\n", "").contains('\n'));

    // Berlin is UTC+1 in March
    assert!(ics.contains("DTSTART:20250312T070000Z\r\n"));
    assert!(ics.contains("SUMMARY:Exam: Deutsch\r\n"));
    assert!(ics.contains("CATEGORIES:BLOCK\r\n"));
    assert_eq!(ics.matches("STATUS:CANCELLED").count(), 1);

    for ev in &events {
        assert!(ics.contains(&format!("UID:{}\r\n", ev.uid)));
    }
}

#[test]
fn test_empty_calendar_is_valid() {
    let ics = render_calendar(&window(), &[]);
    assert!(ics.contains("BEGIN:VCALENDAR"));
    assert!(!ics.contains("BEGIN:VEVENT"));
}

// ---------------------------------------------------------------
// File sink
// ---------------------------------------------------------------

#[test]
fn test_json_rendering() {
    let events = sample_events();
    let sink = FileSink::new(ExportFormat::Json, "unused.json".into(), false);
    let bytes = sink.render(&window(), &events).expect("json");

    let rows: serde_json::Value = serde_json::from_slice(&bytes).expect("valid json");
    let rows = rows.as_array().expect("array");
    assert_eq!(rows.len(), events.len());
    assert_eq!(rows[0]["date"], "2025-03-12");
    assert!(rows.iter().any(|r| r["kind"] == "exam" && r["title"] == "Exam: Deutsch"));
}

#[test]
fn test_csv_rendering() {
    let events = sample_events();
    let sink = FileSink::new(ExportFormat::Csv, "unused.csv".into(), false);
    let bytes = sink.render(&window(), &events).expect("csv");
    let text = String::from_utf8(bytes).expect("utf-8");

    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("uid,kind,date,begin,end,title,location,description,cancelled")
    );
    assert_eq!(text.matches(",homework,").count(), 1);
}

#[test]
fn test_publish_writes_file_atomically() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("cal").join("school.ics");
    let events = sample_events();

    let mut sink = FileSink::new(ExportFormat::Ics, path.clone(), false);
    sink.publish(&window(), &events).expect("published");

    let written = fs::read_to_string(&path).expect("written");
    assert_eq!(written.matches("BEGIN:VEVENT").count(), events.len());
    assert!(!dir.path().join("cal").join("school.ics.partial").exists());

    // the second publish replaces the whole content
    sink.publish(&window(), &events[..1]).expect("republished");
    let written = fs::read_to_string(&path).expect("written");
    assert_eq!(written.matches("BEGIN:VEVENT").count(), 1);
}

#[test]
fn test_publish_overwrites_with_force() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("school.json");
    fs::write(&path, "stale").expect("seed");

    let mut sink = FileSink::new(ExportFormat::Json, path.clone(), true);
    sink.publish(&window(), &[]).expect("published");
    assert_eq!(fs::read_to_string(&path).expect("written"), "[]\n");
}

// ---------------------------------------------------------------
// Retries
// ---------------------------------------------------------------

#[test]
fn test_backoff_doubles_and_is_capped() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay(1).as_millis(), 250);
    assert_eq!(policy.delay(2).as_millis(), 500);
    assert_eq!(policy.delay(3).as_millis(), 1000);
    assert_eq!(policy.delay(10).as_millis(), 2000);
    assert_eq!(RetryPolicy::with_attempts(5).max_attempts, 5);
}

#[test]
fn test_transient_error_is_retried() {
    let calls = Cell::new(0);
    let result = with_retry("test", &no_wait(3), || {
        calls.set(calls.get() + 1);
        if calls.get() < 3 {
            Err(AppError::Unavailable("busy".into()))
        } else {
            Ok(42)
        }
    });

    assert_eq!(result.expect("third attempt succeeds"), 42);
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_retries_are_bounded() {
    let calls = Cell::new(0);
    let result: AppResult<()> = with_retry("test", &no_wait(2), || {
        calls.set(calls.get() + 1);
        Err(AppError::Unavailable("down".into()))
    });

    assert!(matches!(result, Err(AppError::Unavailable(_))));
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_permanent_error_is_not_retried() {
    let calls = Cell::new(0);
    let result: AppResult<()> = with_retry("test", &no_wait(5), || {
        calls.set(calls.get() + 1);
        Err(AppError::Auth("bad credentials".into()))
    });

    assert!(matches!(result, Err(AppError::Auth(_))));
    assert_eq!(calls.get(), 1);
    assert!(!AppError::NoScope.is_transient());
    assert!(AppError::Unavailable("x".into()).is_transient());
}

/// Source whose first `failures` fetches are transient errors.
struct FlakySource {
    failures: u32,
    fetches: Rc<Cell<u32>>,
}

impl TimetableSource for FlakySource {
    fn current_identity(&mut self) -> AppResult<Option<Scope>> {
        Ok(None)
    }

    fn fetch(&mut self, _scope: &Scope, _window: &DateWindow) -> AppResult<Vec<RawLesson>> {
        self.fetches.set(self.fetches.get() + 1);
        if self.fetches.get() <= self.failures {
            return Err(AppError::Unavailable("502 from server".into()));
        }
        Ok(vec![common::lesson(date(2025, 3, 12), "08:00", "08:45", "M")])
    }
}

#[test]
fn test_retrying_source_recovers() {
    let fetches = Rc::new(Cell::new(0));
    let mut source = Retrying::new(
        FlakySource {
            failures: 2,
            fetches: Rc::clone(&fetches),
        },
        no_wait(3),
    );

    let lessons = source
        .fetch(&Scope::Class { id: 1 }, &window())
        .expect("recovered");
    assert_eq!(lessons.len(), 1);
    assert_eq!(fetches.get(), 3);
}

/// Sink failing transiently once, recording what it finally received.
struct FlakySink {
    failed: bool,
    received: Rc<RefCell<Vec<String>>>,
}

impl CalendarSink for FlakySink {
    fn publish(&mut self, _window: &DateWindow, events: &[CalendarEvent]) -> AppResult<()> {
        if !self.failed {
            self.failed = true;
            return Err(AppError::Unavailable("calendar server busy".into()));
        }
        *self.received.borrow_mut() = events.iter().map(|e| e.uid.clone()).collect();
        Ok(())
    }
}

#[test]
fn test_retrying_sink_publishes_complete_set() {
    let events = sample_events();
    let received = Rc::new(RefCell::new(Vec::new()));
    let mut sink = Retrying::new(
        FlakySink {
            failed: false,
            received: Rc::clone(&received),
        },
        no_wait(2),
    );

    sink.publish(&window(), &events).expect("published");
    assert_eq!(received.borrow().len(), events.len());
    assert!(
        events
            .iter()
            .filter(|e| e.kind == EventKind::Homework)
            .all(|e| e.begin == local(date(2025, 3, 14), "07:00"))
    );
}
