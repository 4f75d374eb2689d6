//! WebUntis JSON-RPC client.
//!
//! `POST https://<server>/WebUntis/jsonrpc.do?school=<school>` with JSON-RPC 2.0
//! bodies. `authenticate` opens a session (sent back as the `JSESSIONID`
//! cookie) and reports the logged-in person; `getTimetable` returns periods
//! that only carry element ids, whose names come from `getSubjects`,
//! `getRooms` and `getTeachers` (each fetched at most once per client).

use super::TimetableSource;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::lesson::{NamedRef, RawLesson, RawTimestamp};
use crate::models::scope::Scope;
use crate::utils::date::{DateWindow, from_untis_date, to_untis_date};
use crate::utils::time::from_untis_time;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    id: String,
    method: &'a str,
    params: P,
    jsonrpc: &'static str,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResult {
    session_id: String,
    #[serde(default)]
    person_type: Option<i64>,
    #[serde(default)]
    person_id: Option<i64>,
}

/// Element reference inside a period (`su`, `ro`, `te`, `kl`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "longname")]
    pub long_name: Option<String>,
}

/// One timetable period as returned by `getTimetable`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UntisPeriod {
    pub date: i64,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub su: Vec<ElementRef>,
    #[serde(default)]
    pub ro: Vec<ElementRef>,
    #[serde(default)]
    pub te: Vec<ElementRef>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub subst_text: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub lstext: Option<String>,
    #[serde(default)]
    pub bk_remark: Option<String>,
    #[serde(default)]
    pub bk_text: Option<String>,
}

/// Master-data entry from `getSubjects` / `getRooms` / `getTeachers`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterEntry {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
}

// ============================================================================
// Name cache
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Subject,
    Room,
    Teacher,
}

impl ElementKind {
    fn rpc_method(&self) -> &'static str {
        match self {
            ElementKind::Subject => "getSubjects",
            ElementKind::Room => "getRooms",
            ElementKind::Teacher => "getTeachers",
        }
    }
}

/// Names resolved through secondary lookups, one table per element kind.
#[derive(Debug, Default)]
pub struct NameCache {
    tables: HashMap<ElementKind, HashMap<i64, NamedRef>>,
}

impl NameCache {
    pub fn is_loaded(&self, kind: ElementKind) -> bool {
        self.tables.contains_key(&kind)
    }

    pub fn insert(&mut self, kind: ElementKind, entries: Vec<MasterEntry>) {
        let table = entries
            .into_iter()
            .map(|e| {
                (
                    e.id,
                    NamedRef {
                        id: Some(e.id),
                        name: e.name,
                        long_name: e.long_name,
                    },
                )
            })
            .collect();
        self.tables.insert(kind, table);
    }

    /// Names carried by the period win; otherwise the cached master data; otherwise id only.
    pub fn resolve(&self, kind: ElementKind, element: &ElementRef) -> NamedRef {
        let inline = NamedRef {
            id: Some(element.id),
            name: element.name.clone(),
            long_name: element.long_name.clone(),
        };
        if inline.display_name().is_some() {
            return inline;
        }
        self.tables
            .get(&kind)
            .and_then(|t| t.get(&element.id))
            .cloned()
            .unwrap_or_else(|| NamedRef::with_id(element.id))
    }
}

fn needs_lookup(elements: &[ElementRef]) -> bool {
    elements.iter().any(|e| {
        e.name.as_deref().unwrap_or("").is_empty() && e.long_name.as_deref().unwrap_or("").is_empty()
    })
}

/// Map a period to the source-neutral raw lesson shape.
pub fn period_to_raw(period: &UntisPeriod, names: &NameCache) -> RawLesson {
    let day = from_untis_date(period.date);
    let at = |t: i64| {
        let time = from_untis_time(t)?;
        Some(RawTimestamp::Local(day?.and_time(time)))
    };

    let resolve_all = |kind: ElementKind, elements: &[ElementRef]| -> Vec<NamedRef> {
        elements.iter().map(|e| names.resolve(kind, e)).collect()
    };

    RawLesson {
        begin: at(period.start_time),
        end: at(period.end_time),
        subjects: resolve_all(ElementKind::Subject, &period.su),
        rooms: resolve_all(ElementKind::Room, &period.ro),
        teachers: resolve_all(ElementKind::Teacher, &period.te),
        code: period.code.clone(),
        cancelled: false,
        subst_text: period.subst_text.clone(),
        info: period.info.clone(),
        lesson_text: period.lstext.clone(),
        notices: [&period.bk_remark, &period.bk_text]
            .into_iter()
            .flatten()
            .cloned()
            .collect(),
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct WebUntisClient {
    http: Client,
    url: String,
    session_id: Option<String>,
    identity: Option<Scope>,
    names: NameCache,
    request_seq: u64,
}

impl WebUntisClient {
    /// Open a session with the credentials from `cfg`.
    pub fn login(cfg: &Config) -> AppResult<Self> {
        if !cfg.has_credentials() {
            return Err(AppError::Config(
                "WebUntis server, school and username are required".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs.max(1)))
            .user_agent(cfg.client.clone())
            .build()?;

        let mut client = Self {
            http,
            url: format!(
                "https://{}/WebUntis/jsonrpc.do?school={}",
                cfg.server.trim_end_matches('/'),
                cfg.school
            ),
            session_id: None,
            identity: None,
            names: NameCache::default(),
            request_seq: 0,
        };

        let auth: AuthResult = client
            .call(
                "authenticate",
                json!({
                    "user": cfg.username,
                    "password": cfg.password,
                    "client": cfg.client,
                }),
            )
            .map_err(|e| match e {
                AppError::Remote { message, .. } => AppError::Auth(message),
                other => other,
            })?;

        client.identity = match (auth.person_type, auth.person_id) {
            (Some(person_type), Some(person_id)) if person_type > 0 && person_id > 0 => {
                Some(Scope::Person {
                    person_type,
                    person_id,
                })
            }
            _ => None,
        };
        client.session_id = Some(auth.session_id);
        log::info!("logged in to {} as {}", cfg.server, cfg.username);

        Ok(client)
    }

    fn call<P, T>(&mut self, method: &str, params: P) -> AppResult<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        self.request_seq += 1;
        let body = RpcRequest {
            id: self.request_seq.to_string(),
            method,
            params,
            jsonrpc: "2.0",
        };

        let mut request = self.http.post(&self.url).json(&body);
        if let Some(sid) = &self.session_id {
            request = request.header(COOKIE, format!("JSESSIONID={sid}"));
        }

        log::debug!("webuntis call {method}");
        let response = request.send()?;
        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::Unavailable(format!("{method}: HTTP {status}")));
        }
        let response = response.error_for_status()?;
        let rpc: RpcResponse<T> = response.json()?;

        match (rpc.result, rpc.error) {
            (_, Some(err)) => Err(AppError::Remote {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(AppError::Other(format!("{method}: empty response"))),
        }
    }

    fn ensure_names(&mut self, kind: ElementKind) {
        if self.names.is_loaded(kind) {
            return;
        }
        let entries = match self.call::<_, Vec<MasterEntry>>(kind.rpc_method(), json!({})) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("{} unavailable, names stay unresolved: {}", kind.rpc_method(), e);
                Vec::new()
            }
        };
        self.names.insert(kind, entries);
    }

    pub fn logout(&mut self) {
        if self.session_id.is_none() {
            return;
        }
        if let Err(e) = self.call::<_, serde_json::Value>("logout", json!({})) {
            log::debug!("logout failed: {e}");
        }
        self.session_id = None;
    }
}

impl TimetableSource for WebUntisClient {
    fn current_identity(&mut self) -> AppResult<Option<Scope>> {
        Ok(self.identity)
    }

    fn fetch(&mut self, scope: &Scope, window: &DateWindow) -> AppResult<Vec<RawLesson>> {
        let periods: Vec<UntisPeriod> = self.call(
            "getTimetable",
            json!({
                "id": scope.element_id(),
                "type": scope.element_type(),
                "startDate": to_untis_date(window.start),
                "endDate": to_untis_date(window.end),
            }),
        )?;
        log::info!("fetched {} periods for {} ({})", periods.len(), scope, window);

        if periods.iter().any(|p| needs_lookup(&p.su)) {
            self.ensure_names(ElementKind::Subject);
        }
        if periods.iter().any(|p| needs_lookup(&p.ro)) {
            self.ensure_names(ElementKind::Room);
        }
        if periods.iter().any(|p| needs_lookup(&p.te)) {
            self.ensure_names(ElementKind::Teacher);
        }

        Ok(periods.iter().map(|p| period_to_raw(p, &self.names)).collect())
    }
}

impl Drop for WebUntisClient {
    fn drop(&mut self) {
        self.logout();
    }
}
