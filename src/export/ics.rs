//! RFC 5545 serialization of the event set.

use crate::models::calendar_event::CalendarEvent;
use crate::utils::date::DateWindow;
use chrono::{DateTime, Utc};

const PRODID: &str = "-//untiscal//untiscal//EN";
const MAX_LINE_OCTETS: usize = 75;

pub(crate) fn ics_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape a TEXT property value.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// Fold a content line at 75 octets without splitting UTF-8 sequences.
pub fn fold_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut used = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if used + len > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            used = 1;
        }
        out.push(c);
        used += len;
    }
    out.push_str("\r\n");
    out
}

fn push_prop(out: &mut String, name: &str, value: &str) {
    out.push_str(&fold_line(&format!("{name}:{value}")));
}

fn push_event(out: &mut String, ev: &CalendarEvent, stamp: &str) {
    push_prop(out, "BEGIN", "VEVENT");
    push_prop(out, "UID", &ev.uid);
    push_prop(out, "DTSTAMP", stamp);
    push_prop(out, "DTSTART", &ics_utc(ev.begin_utc()));
    push_prop(out, "DTEND", &ics_utc(ev.end_utc()));
    push_prop(out, "SUMMARY", &escape_text(&ev.title));
    if let Some(location) = &ev.location {
        push_prop(out, "LOCATION", &escape_text(location));
    }
    if let Some(description) = &ev.description {
        push_prop(out, "DESCRIPTION", &escape_text(description));
    }
    push_prop(out, "CATEGORIES", &ev.kind.as_str().to_uppercase());
    if ev.cancelled {
        push_prop(out, "STATUS", "CANCELLED");
    }
    push_prop(out, "END", "VEVENT");
}

pub fn render_calendar(window: &DateWindow, events: &[CalendarEvent]) -> String {
    let stamp = ics_utc(Utc::now());
    let mut out = String::new();

    push_prop(&mut out, "BEGIN", "VCALENDAR");
    push_prop(&mut out, "VERSION", "2.0");
    push_prop(&mut out, "PRODID", PRODID);
    push_prop(&mut out, "CALSCALE", "GREGORIAN");
    push_prop(&mut out, "X-WR-CALNAME", "Untis");
    push_prop(
        &mut out,
        "X-WR-CALDESC",
        &escape_text(&format!("Timetable {} to {}", window.start, window.end)),
    );
    for ev in events {
        push_event(&mut out, ev, &stamp);
    }
    push_prop(&mut out, "END", "VCALENDAR");

    out
}
