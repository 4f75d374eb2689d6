mod common;
use common::{TZ, date, local, options, write_dump};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use tempfile::tempdir;
use untiscal::core::pipeline::build_plan;
use untiscal::errors::{AppError, AppResult};
use untiscal::export::CalendarSink;
use untiscal::export::caldav::{
    CalDavSink, DavRequest, DavResponse, DavTransport, RemoteEvent, ical_uid, parse_multistatus,
    reconcile, resource_name,
};
use untiscal::models::calendar_event::{CalendarEvent, EventKind};
use untiscal::models::scope::Scope;
use untiscal::source::{JsonFileSource, RetryPolicy, Retrying, TimetableSource};
use untiscal::utils::date::DateWindow;

const BASE: &str = "https://caldav.example.com/";
const HOME: &str = "/123/calendars/";

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

fn event(uid: &str) -> CalendarEvent {
    CalendarEvent {
        uid: uid.to_string(),
        kind: EventKind::Exam,
        title: "Exam: Deutsch".to_string(),
        begin: local(date(2025, 3, 20), "07:30"),
        end: local(date(2025, 3, 20), "08:00"),
        location: None,
        description: None,
        cancelled: false,
    }
}

fn vevent(uid: &str) -> String {
    format!("BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:{uid}\r\nSUMMARY:old\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n")
}

fn no_wait(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff_ms: 0,
        max_backoff_ms: 0,
    }
}

// ---------------------------------------------------------------
// In-memory CalDAV server
// ---------------------------------------------------------------

#[derive(Default)]
struct FakeServer {
    /// (collection path, display name)
    calendars: Vec<(String, String)>,
    /// resource path → iCalendar body
    resources: BTreeMap<String, String>,
    /// "METHOD path" per request
    log: Vec<String>,
    /// statuses answered before any request is served
    failures: VecDeque<u16>,
    last_report: String,
}

impl FakeServer {
    fn count(&self, method: &str) -> usize {
        self.log.iter().filter(|l| l.starts_with(&format!("{method} "))).count()
    }

    fn multistatus(responses: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?><d:multistatus xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">{responses}</d:multistatus>"#
        )
    }

    fn propfind(&self, path: &str) -> DavResponse {
        let body = match path {
            "/" => Self::multistatus(
                "<d:response><d:href>/</d:href><d:propstat><d:prop>\
                 <d:current-user-principal><d:href>/123/principal/</d:href></d:current-user-principal>\
                 </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>",
            ),
            "/123/principal/" => Self::multistatus(
                "<d:response><d:href>/123/principal/</d:href><d:propstat><d:prop>\
                 <cal:calendar-home-set><d:href>/123/calendars/</d:href></cal:calendar-home-set>\
                 </d:prop></d:propstat></d:response>",
            ),
            HOME => {
                let mut responses = String::from(
                    "<d:response><d:href>/123/calendars/</d:href><d:propstat><d:prop>\
                     <d:resourcetype><d:collection/></d:resourcetype></d:prop></d:propstat></d:response>",
                );
                for (href, name) in &self.calendars {
                    responses.push_str(&format!(
                        "<d:response><d:href>{href}</d:href><d:propstat><d:prop>\
                         <d:displayname>{name}</d:displayname>\
                         <d:resourcetype><d:collection/><cal:calendar/></d:resourcetype>\
                         </d:prop></d:propstat></d:response>"
                    ));
                }
                Self::multistatus(&responses)
            }
            _ => return reply(404, ""),
        };
        reply(207, &body)
    }

    fn report(&self, path: &str) -> DavResponse {
        let responses: String = self
            .resources
            .iter()
            .filter(|(href, _)| href.starts_with(path))
            .map(|(href, ics)| {
                format!(
                    "<d:response><d:href>{href}</d:href><d:propstat><d:prop>\
                     <cal:calendar-data><![CDATA[{ics}]]></cal:calendar-data>\
                     </d:prop></d:propstat></d:response>"
                )
            })
            .collect();
        reply(207, &Self::multistatus(&responses))
    }
}

fn reply(status: u16, body: &str) -> DavResponse {
    DavResponse {
        status,
        body: body.to_string(),
    }
}

fn between<'a>(s: &'a str, open: &str, close: &str) -> &'a str {
    let start = s.find(open).map(|i| i + open.len()).unwrap_or(0);
    let end = s[start..].find(close).map(|i| start + i).unwrap_or(s.len());
    &s[start..end]
}

struct FakeTransport(Rc<RefCell<FakeServer>>);

impl DavTransport for FakeTransport {
    fn send(&mut self, request: DavRequest) -> AppResult<DavResponse> {
        let mut server = self.0.borrow_mut();
        let path = request.url.trim_start_matches(BASE.trim_end_matches('/')).to_string();
        server.log.push(format!("{} {path}", request.method));

        if let Some(status) = server.failures.pop_front() {
            return Ok(reply(status, ""));
        }

        let body = request.body.unwrap_or_default();
        Ok(match request.method {
            "PROPFIND" => server.propfind(&path),
            "MKCALENDAR" => {
                let name = between(&body, "<d:displayname>", "</d:displayname>").to_string();
                server.calendars.push((path, name));
                reply(201, "")
            }
            "REPORT" => {
                server.last_report = body;
                server.report(&path)
            }
            "PUT" => match server.resources.insert(path, body) {
                Some(_) => reply(204, ""),
                None => reply(201, ""),
            },
            "DELETE" => match server.resources.remove(&path) {
                Some(_) => reply(204, ""),
                None => reply(404, ""),
            },
            _ => reply(405, ""),
        })
    }
}

fn sink_for(server: &Rc<RefCell<FakeServer>>) -> CalDavSink<FakeTransport> {
    CalDavSink::new(FakeTransport(Rc::clone(server)), BASE, "Untis", TZ).expect("sink")
}

// ---------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------

#[test]
fn test_missing_calendar_is_created_and_filled() {
    let server = Rc::new(RefCell::new(FakeServer::default()));
    let events = sample_events();

    sink_for(&server).publish(&window(), &events).expect("published");

    let server = server.borrow();
    assert!(server.log.contains(&"MKCALENDAR /123/calendars/untis/".to_string()));
    assert_eq!(server.calendars, [("/123/calendars/untis/".to_string(), "Untis".to_string())]);
    assert_eq!(server.resources.len(), events.len());
    assert_eq!(server.count("DELETE"), 0);
    for ev in &events {
        let body = server
            .resources
            .values()
            .find(|ics| ical_uid(ics).as_deref() == Some(ev.uid.as_str()))
            .expect("event uploaded");
        assert_eq!(body.matches("BEGIN:VEVENT").count(), 1);
    }
    assert!(server.resources.keys().all(|k| k.starts_with("/123/calendars/untis/") && k.ends_with(".ics")));
}

#[test]
fn test_query_covers_window_in_local_time() {
    let server = Rc::new(RefCell::new(FakeServer::default()));
    sink_for(&server).publish(&window(), &[]).expect("published");

    // Berlin is UTC+1 until 2025-03-30
    let report = server.borrow().last_report.clone();
    assert!(report.contains(r#"start="20250309T230000Z""#));
    assert!(report.contains(r#"end="20250324T230000Z""#));
}

#[test]
fn test_republish_updates_in_place_and_removes_stale() {
    let events = sample_events();
    let collection = "/123/calendars/3f2a-calendar/";
    let kept = format!("{collection}created-elsewhere.ics");
    let stale = format!("{collection}stale.ics");

    let server = Rc::new(RefCell::new(FakeServer {
        calendars: vec![
            ("/123/calendars/work/".to_string(), "Work".to_string()),
            (collection.to_string(), "Untis".to_string()),
        ],
        ..FakeServer::default()
    }));
    {
        let mut s = server.borrow_mut();
        s.resources.insert(kept.clone(), vevent(&events[0].uid));
        s.resources.insert(stale.clone(), vevent("gone@untiscal"));
        s.resources.insert("/123/calendars/work/meeting.ics".to_string(), vevent("meeting"));
    }

    sink_for(&server).publish(&window(), &events).expect("published");

    let server = server.borrow();
    assert_eq!(server.count("MKCALENDAR"), 0);
    assert!(server.log.contains(&format!("DELETE {stale}")));
    assert!(server.log.contains(&format!("PUT {kept}")));
    assert!(!server.resources.contains_key(&stale));
    assert!(!server.resources[&kept].contains("SUMMARY:old"));
    // other calendars are left alone
    assert!(server.resources.contains_key("/123/calendars/work/meeting.ics"));
    let ours = server.resources.keys().filter(|k| k.starts_with(collection)).count();
    assert_eq!(ours, events.len());
}

#[test]
fn test_second_publish_reuses_calendar_and_changes_nothing() {
    let server = Rc::new(RefCell::new(FakeServer::default()));
    let events = sample_events();
    let mut sink = sink_for(&server);

    sink.publish(&window(), &events).expect("first");
    let before = server.borrow().resources.clone();
    sink.publish(&window(), &events).expect("second");

    let server = server.borrow();
    assert_eq!(server.count("PROPFIND"), 3);
    assert_eq!(server.count("MKCALENDAR"), 1);
    assert_eq!(server.count("DELETE"), 0);
    assert_eq!(server.resources.keys().collect::<Vec<_>>(), before.keys().collect::<Vec<_>>());
}

#[test]
fn test_empty_event_set_clears_window() {
    let server = Rc::new(RefCell::new(FakeServer::default()));
    let mut sink = sink_for(&server);

    sink.publish(&window(), &sample_events()).expect("filled");
    sink.publish(&window(), &[]).expect("cleared");

    assert!(server.borrow().resources.is_empty());
}

#[test]
fn test_busy_server_is_retried() {
    let server = Rc::new(RefCell::new(FakeServer {
        failures: VecDeque::from([503]),
        ..FakeServer::default()
    }));
    let events = sample_events();

    let err = sink_for(&server).publish(&window(), &events).unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)));
    assert!(err.is_transient());

    server.borrow_mut().failures.push_back(503);
    let mut sink = Retrying::new(sink_for(&server), no_wait(2));
    sink.publish(&window(), &events).expect("second attempt succeeds");
    assert_eq!(server.borrow().resources.len(), events.len());
}

#[test]
fn test_rejected_credentials_are_not_retried() {
    let server = Rc::new(RefCell::new(FakeServer {
        failures: VecDeque::from([401]),
        ..FakeServer::default()
    }));

    let mut sink = Retrying::new(sink_for(&server), no_wait(3));
    let err = sink.publish(&window(), &[]).unwrap_err();

    assert!(matches!(err, AppError::Auth(_)));
    assert_eq!(server.borrow().log.len(), 1);
}

#[test]
fn test_invalid_sink_settings() {
    let server = Rc::new(RefCell::new(FakeServer::default()));
    let bad_url = CalDavSink::new(FakeTransport(Rc::clone(&server)), "not a url", "Untis", TZ);
    assert!(matches!(bad_url, Err(AppError::Config(_))));

    let no_name = CalDavSink::new(FakeTransport(server), BASE, "  ", TZ);
    assert!(matches!(no_name, Err(AppError::Config(_))));
}

// ---------------------------------------------------------------
// Diff and parsing
// ---------------------------------------------------------------

#[test]
fn test_reconcile_diff() {
    let remote = vec![
        RemoteEvent {
            href: "/c/a.ics".into(),
            uid: "a@untiscal".into(),
        },
        RemoteEvent {
            href: "/c/a-copy.ics".into(),
            uid: "a@untiscal".into(),
        },
        RemoteEvent {
            href: "/c/z.ics".into(),
            uid: "z@untiscal".into(),
        },
    ];
    let events = vec![event("a@untiscal"), event("b@untiscal")];

    let plan = reconcile(&remote, &events);

    let uploads: Vec<(&str, &str)> = plan
        .uploads
        .iter()
        .map(|u| (u.href.as_str(), u.event.uid.as_str()))
        .collect();
    assert_eq!(uploads, [("/c/a.ics", "a@untiscal"), ("b-untiscal.ics", "b@untiscal")]);
    assert_eq!(plan.deletes, ["/c/a-copy.ics", "/c/z.ics"]);
    assert_eq!(resource_name("B@Untiscal"), "b-untiscal.ics");
}

#[test]
fn test_multistatus_parsing_ignores_prefixes() {
    let body = r#"<?xml version="1.0"?>
<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:response>
    <D:href>/cal/kids/</D:href>
    <D:propstat>
      <D:prop>
        <D:displayname> Kind &amp; Schule </D:displayname>
        <D:resourcetype><D:collection/><C:calendar/></D:resourcetype>
      </D:prop>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/cal/kids/e1.ics</D:href>
    <D:propstat><D:prop><C:calendar-data><![CDATA[BEGIN:VEVENT
UID:e1
END:VEVENT]]></C:calendar-data></D:prop></D:propstat>
  </D:response>
</D:multistatus>"#;

    let resources = parse_multistatus(body).expect("parsed");
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].href, "/cal/kids/");
    assert_eq!(resources[0].display_name.as_deref(), Some("Kind & Schule"));
    assert!(resources[0].is_calendar);
    assert!(!resources[1].is_calendar);
    assert_eq!(ical_uid(resources[1].calendar_data.as_deref().expect("data")).as_deref(), Some("e1"));
}

#[test]
fn test_uid_is_unfolded() {
    let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:0123456789abcdef\r\n 0123456789abcdef@untiscal\r\nEND:VEVENT\r\n";
    assert_eq!(ical_uid(ics).as_deref(), Some("0123456789abcdef0123456789abcdef@untiscal"));
    assert_eq!(ical_uid("UID;X-PARAM=1:with-param\n").as_deref(), Some("with-param"));
    assert_eq!(ical_uid("BEGIN:VEVENT\nSUMMARY:no uid\nEND:VEVENT\n"), None);
}
