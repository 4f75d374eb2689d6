use super::build_outcome;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::sync::{SyncLogic, SyncOutcome};
use crate::errors::AppResult;
use crate::export::{CalDavSink, CalendarSink, FileSink, SyncTarget};
use crate::models::calendar_event::EventKind;
use crate::source::{RetryPolicy, Retrying};
use crate::ui::messages::{info, warning};
use crate::utils::path::expand_tilde;

fn print_summary(outcome: &SyncOutcome) {
    let plan = &outcome.plan;
    info(format!("Scope {} · window {}", outcome.scope, outcome.window));
    println!(
        "Lessons: {} ({} skipped) · Blocks: {} · Homework: {} · Exams: {} · Events: {}",
        plan.count(EventKind::Lesson),
        plan.skipped,
        plan.count(EventKind::Block),
        plan.count(EventKind::Homework),
        plan.count(EventKind::Exam),
        plan.events.len()
    );
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Sync {
        input,
        target,
        format,
        file,
        force,
        dry_run,
    } = cmd
    {
        // sinks validate their settings before anything is fetched
        let sink: Option<Box<dyn CalendarSink>> = match (*dry_run, *target) {
            (true, _) => None,
            (false, SyncTarget::File) => {
                let path = file
                    .as_deref()
                    .map(expand_tilde)
                    .unwrap_or_else(|| cfg.output_path());
                Some(Box::new(FileSink::new(*format, path, *force)))
            }
            (false, SyncTarget::Caldav) => {
                if file.is_some() {
                    warning("--file is ignored when publishing to CalDAV");
                }
                Some(Box::new(CalDavSink::from_config(cfg)?))
            }
        };

        let outcome = build_outcome(cfg, input.as_deref())?;
        print_summary(&outcome);

        let Some(sink) = sink else {
            info("Dry run: nothing written.");
            return Ok(());
        };

        let mut sink = Retrying::new(sink, RetryPolicy::with_attempts(cfg.retry_attempts));
        SyncLogic::publish(&outcome, &mut sink)?;
    }
    Ok(())
}
