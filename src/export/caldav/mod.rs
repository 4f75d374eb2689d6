//! CalDAV publishing (iCloud by default).
//!
//! The target calendar is found by display name under the account's
//! calendar home, or created with `MKCALENDAR`. Each event is its own
//! resource, written with `PUT` under a name derived from its uid; events
//! in the window whose uid is no longer produced are deleted.

mod multistatus;
mod transport;

pub use multistatus::{DavResource, ical_uid, parse_multistatus};
pub use transport::{DavRequest, DavResponse, DavTransport, HttpTransport, expect_success};

use super::CalendarSink;
use super::ics::{ics_utc, render_calendar};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::calendar_event::CalendarEvent;
use crate::ui::messages::success;
use crate::utils::date::DateWindow;
use chrono_tz::Tz;
use quick_xml::escape::escape;
use reqwest::Url;
use std::collections::HashSet;
use transport::{ICAL_CONTENT, XML_CONTENT};

const PRINCIPAL_QUERY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:"><d:prop><d:current-user-principal/></d:prop></d:propfind>"#;

const HOME_SET_QUERY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav"><d:prop><c:calendar-home-set/></d:prop></d:propfind>"#;

const CALENDARS_QUERY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:"><d:prop><d:displayname/><d:resourcetype/></d:prop></d:propfind>"#;

fn calendar_query(window: &DateWindow, tz: Tz) -> String {
    let (start, end) = window.utc_bounds(tz);
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop><c:calendar-data/></d:prop>
  <c:filter>
    <c:comp-filter name="VCALENDAR">
      <c:comp-filter name="VEVENT">
        <c:time-range start="{}" end="{}"/>
      </c:comp-filter>
    </c:comp-filter>
  </c:filter>
</c:calendar-query>"#,
        ics_utc(start),
        ics_utc(end)
    )
}

fn mkcalendar_body(name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<c:mkcalendar xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:set><d:prop>
    <d:displayname>{}</d:displayname>
    <c:supported-calendar-component-set><c:comp name="VEVENT"/></c:supported-calendar-component-set>
  </d:prop></d:set>
</c:mkcalendar>"#,
        escape(name)
    )
}

/// Path-safe form of a calendar name or uid.
fn slug(s: &str) -> String {
    let slug: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() { "untiscal".to_string() } else { slug }
}

/// Resource name for an event that does not exist on the server yet.
pub fn resource_name(uid: &str) -> String {
    format!("{}.ics", slug(uid))
}

fn join(base: &Url, href: &str) -> AppResult<Url> {
    base.join(href)
        .map_err(|e| AppError::Export(format!("invalid href {href} under {base}: {e}")))
}

/// Collections must end in `/` or relative joins replace their last segment.
fn as_collection(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// An event resource found on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEvent {
    pub href: String,
    pub uid: String,
}

#[derive(Debug)]
pub struct Upload<'a> {
    pub href: String,
    pub event: &'a CalendarEvent,
}

/// What to change on the server so the window holds exactly `events`.
#[derive(Debug)]
pub struct ReconcilePlan<'a> {
    pub uploads: Vec<Upload<'a>>,
    pub deletes: Vec<String>,
}

/// Existing resources are overwritten in place; duplicates and uids no longer
/// produced are deleted.
pub fn reconcile<'a>(remote: &[RemoteEvent], events: &'a [CalendarEvent]) -> ReconcilePlan<'a> {
    let wanted: HashSet<&str> = events.iter().map(|e| e.uid.as_str()).collect();
    let mut kept: Vec<&RemoteEvent> = Vec::new();
    let mut deletes = Vec::new();

    for r in remote {
        if wanted.contains(r.uid.as_str()) && !kept.iter().any(|k| k.uid == r.uid) {
            kept.push(r);
        } else {
            deletes.push(r.href.clone());
        }
    }

    let uploads = events
        .iter()
        .map(|event| Upload {
            href: kept
                .iter()
                .find(|k| k.uid == event.uid)
                .map(|k| k.href.clone())
                .unwrap_or_else(|| resource_name(&event.uid)),
            event,
        })
        .collect();

    ReconcilePlan { uploads, deletes }
}

pub struct CalDavSink<T: DavTransport> {
    transport: T,
    base_url: Url,
    calendar_name: String,
    tz: Tz,
    collection: Option<Url>,
}

impl CalDavSink<HttpTransport> {
    /// Build the sink from configuration. No request is sent yet.
    pub fn from_config(cfg: &Config) -> AppResult<Self> {
        if !cfg.has_caldav_credentials() {
            return Err(AppError::Config(
                "CalDAV username and app password are required (ICLOUD_USERNAME, ICLOUD_APP_PASSWORD)"
                    .into(),
            ));
        }
        let transport =
            HttpTransport::new(&cfg.caldav_username, &cfg.caldav_password, cfg.fetch_timeout_secs)?;
        Self::new(transport, &cfg.caldav_url, &cfg.calendar_name, cfg.timezone()?)
    }
}

impl<T: DavTransport> CalDavSink<T> {
    pub fn new(transport: T, base_url: &str, calendar_name: &str, tz: Tz) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid CalDAV url {base_url}: {e}")))?;
        if calendar_name.trim().is_empty() {
            return Err(AppError::Config("calendar_name must not be empty".into()));
        }
        Ok(Self {
            transport,
            base_url,
            calendar_name: calendar_name.trim().to_string(),
            tz,
            collection: None,
        })
    }

    fn exchange(&mut self, request: DavRequest) -> AppResult<DavResponse> {
        log::debug!("caldav {} {}", request.method, request.url);
        let response = self.transport.send(request.clone())?;
        expect_success(&request, response)
    }

    fn propfind(&mut self, url: &Url, depth: &'static str, query: &str) -> AppResult<Vec<DavResource>> {
        let request = DavRequest::new("PROPFIND", url.as_str())
            .depth(depth)
            .body(XML_CONTENT, query.to_string());
        parse_multistatus(&self.exchange(request)?.body)
    }

    /// Resolve principal → calendar home → calendar by name, creating it if missing.
    fn locate_calendar(&mut self) -> AppResult<Url> {
        if let Some(url) = &self.collection {
            return Ok(url.clone());
        }
        let base = self.base_url.clone();

        let principal = self
            .propfind(&base, "0", PRINCIPAL_QUERY)?
            .into_iter()
            .find_map(|r| r.principal)
            .ok_or_else(|| AppError::Export("server reported no current-user-principal".into()))?;
        let principal = join(&base, &principal)?;

        let home = self
            .propfind(&principal, "0", HOME_SET_QUERY)?
            .into_iter()
            .find_map(|r| r.home_set)
            .ok_or_else(|| AppError::Export("server reported no calendar-home-set".into()))?;
        let home = as_collection(join(&base, &home)?);

        let existing = self
            .propfind(&home, "1", CALENDARS_QUERY)?
            .into_iter()
            .find(|r| r.is_calendar && r.display_name.as_deref() == Some(self.calendar_name.as_str()));

        let url = match existing {
            Some(found) => as_collection(join(&home, &found.href)?),
            None => {
                let url = join(&home, &format!("{}/", slug(&self.calendar_name)))?;
                let request = DavRequest::new("MKCALENDAR", url.as_str())
                    .body(XML_CONTENT, mkcalendar_body(&self.calendar_name));
                self.exchange(request)?;
                log::info!("created calendar '{}' at {url}", self.calendar_name);
                url
            }
        };

        self.collection = Some(url.clone());
        Ok(url)
    }

    fn remote_events(&mut self, collection: &Url, window: &DateWindow) -> AppResult<Vec<RemoteEvent>> {
        let request = DavRequest::new("REPORT", collection.as_str())
            .depth("1")
            .body(XML_CONTENT, calendar_query(window, self.tz));
        let resources = parse_multistatus(&self.exchange(request)?.body)?;

        Ok(resources
            .into_iter()
            .filter_map(|r| {
                let uid = ical_uid(r.calendar_data.as_deref()?)?;
                Some(RemoteEvent { href: r.href, uid })
            })
            .collect())
    }

    fn delete(&mut self, url: &Url) -> AppResult<()> {
        let request = DavRequest::new("DELETE", url.as_str());
        let response = self.transport.send(request.clone())?;
        // already gone
        if response.status == 404 {
            return Ok(());
        }
        expect_success(&request, response).map(|_| ())
    }
}

impl<T: DavTransport> CalendarSink for CalDavSink<T> {
    fn publish(&mut self, window: &DateWindow, events: &[CalendarEvent]) -> AppResult<()> {
        let collection = self.locate_calendar()?;
        let remote = self.remote_events(&collection, window)?;
        let plan = reconcile(&remote, events);
        log::info!(
            "caldav: {} remote events, {} to upload, {} to delete",
            remote.len(),
            plan.uploads.len(),
            plan.deletes.len()
        );

        for href in &plan.deletes {
            let url = join(&collection, href)?;
            self.delete(&url)?;
        }
        for upload in &plan.uploads {
            let url = join(&collection, &upload.href)?;
            let body = render_calendar(window, std::slice::from_ref(upload.event));
            let request = DavRequest::new("PUT", url.as_str()).body(ICAL_CONTENT, body);
            self.exchange(request)?;
        }

        success(format!(
            "CalDAV export completed: {} events in '{}' ({} removed)",
            plan.uploads.len(),
            self.calendar_name,
            plan.deletes.len()
        ));
        Ok(())
    }
}
