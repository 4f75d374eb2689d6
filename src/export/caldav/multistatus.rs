//! WebDAV `multistatus` parsing and iCalendar UID lookup.

use crate::errors::AppResult;
use quick_xml::Reader;
use quick_xml::events::Event;

/// The properties of one `<response>` element this crate cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DavResource {
    pub href: String,
    pub display_name: Option<String>,
    pub is_calendar: bool,
    pub principal: Option<String>,
    pub home_set: Option<String>,
    pub calendar_data: Option<String>,
}

fn append(slot: &mut Option<String>, text: &str) {
    slot.get_or_insert_with(String::new).push_str(text);
}

impl DavResource {
    fn take_text(&mut self, path: &[String], text: &str) {
        let Some(leaf) = path.last() else {
            return;
        };
        let parent = path.len().checked_sub(2).map(|i| path[i].as_str());
        match (parent, leaf.as_str()) {
            (Some("current-user-principal"), "href") => append(&mut self.principal, text.trim()),
            (Some("calendar-home-set"), "href") => append(&mut self.home_set, text.trim()),
            (Some("response"), "href") => self.href.push_str(text.trim()),
            (_, "displayname") => append(&mut self.display_name, text),
            (_, "calendar-data") => append(&mut self.calendar_data, text),
            _ => {}
        }
    }
}

fn local_name(name: quick_xml::name::LocalName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).into_owned()
}

/// Parse a `207 Multi-Status` body. Namespace prefixes are ignored.
pub fn parse_multistatus(body: &str) -> AppResult<Vec<DavResource>> {
    let mut reader = Reader::from_str(body);
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<DavResource> = None;
    let mut resources = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(e.local_name());
                if name == "response" {
                    current = Some(DavResource::default());
                }
                if name == "calendar"
                    && path.last().map(String::as_str) == Some("resourcetype")
                    && let Some(res) = current.as_mut()
                {
                    res.is_calendar = true;
                }
                path.push(name);
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"calendar"
                    && path.last().map(String::as_str) == Some("resourcetype")
                    && let Some(res) = current.as_mut()
                {
                    res.is_calendar = true;
                }
            }
            Event::End(e) => {
                path.pop();
                if e.local_name().as_ref() == b"response"
                    && let Some(res) = current.take()
                {
                    resources.push(res);
                }
            }
            Event::Text(e) => {
                if let Some(res) = current.as_mut() {
                    res.take_text(&path, &e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(res) = current.as_mut() {
                    res.take_text(&path, &String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    for res in &mut resources {
        if let Some(name) = res.display_name.as_mut() {
            *name = name.trim().to_string();
        }
    }
    Ok(resources)
}

/// UID of the first component in an iCalendar document, after unfolding.
pub fn ical_uid(data: &str) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in data.lines() {
        let raw = raw.trim_end_matches('\r');
        match (raw.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(cont), Some(last)) => last.push_str(cont),
            _ => lines.push(raw.to_string()),
        }
    }

    lines.iter().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        let name = name.split(';').next()?.trim();
        if name.eq_ignore_ascii_case("UID") {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}
