use super::build_outcome;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::models::calendar_event::CalendarEvent;
use crate::utils::table::Table;

fn first_line(s: Option<&str>) -> String {
    s.and_then(|d| d.lines().next()).unwrap_or("").to_string()
}

fn event_row(ev: &CalendarEvent) -> Vec<String> {
    vec![
        ev.begin.format("%Y-%m-%d").to_string(),
        format!("{}-{}", ev.begin.format("%H:%M"), ev.end.format("%H:%M")),
        ev.kind.as_str().to_string(),
        ev.title.clone(),
        if ev.cancelled { "cancelled".into() } else { String::new() },
        first_line(ev.description.as_deref()),
    ]
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List { input, kind } = cmd {
        let outcome = build_outcome(cfg, input.as_deref())?;

        let mut table = Table::new(["Date", "Time", "Kind", "Title", "Status", "Note"]);
        for ev in outcome
            .plan
            .events
            .iter()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
        {
            table.add_row(event_row(ev));
        }

        if table.is_empty() {
            println!("No events for {}.", outcome.window);
        } else {
            print!("{}", table.render());
        }
    }
    Ok(())
}
