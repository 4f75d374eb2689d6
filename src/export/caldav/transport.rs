//! HTTP exchange used by the CalDAV sink, behind a trait so the protocol logic
//! runs against any server implementation.

use crate::errors::{AppError, AppResult};
use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

pub const XML_CONTENT: &str = "application/xml; charset=utf-8";
pub const ICAL_CONTENT: &str = "text/calendar; charset=utf-8";

#[derive(Debug, Clone)]
pub struct DavRequest {
    pub method: &'static str,
    pub url: String,
    pub depth: Option<&'static str>,
    pub content_type: Option<&'static str>,
    pub body: Option<String>,
}

impl DavRequest {
    pub fn new(method: &'static str, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            depth: None,
            content_type: None,
            body: None,
        }
    }

    pub fn depth(mut self, depth: &'static str) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn body(mut self, content_type: &'static str, body: String) -> Self {
        self.content_type = Some(content_type);
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone)]
pub struct DavResponse {
    pub status: u16,
    pub body: String,
}

pub trait DavTransport {
    /// Send one request. Non-2xx statuses are returned, not raised.
    fn send(&mut self, request: DavRequest) -> AppResult<DavResponse>;
}

/// Map a non-success status to the error taxonomy: throttling and 5xx are transient.
pub fn expect_success(request: &DavRequest, response: DavResponse) -> AppResult<DavResponse> {
    let status = response.status;
    let what = format!("{} {}: HTTP {status}", request.method, request.url);
    match status {
        200..=299 => Ok(response),
        401 | 403 => Err(AppError::Auth(what)),
        429 | 500..=599 => Err(AppError::Unavailable(what)),
        _ => Err(AppError::Export(what)),
    }
}

/// Basic-auth client on the blocking reqwest stack.
pub struct HttpTransport {
    http: Client,
    username: String,
    password: String,
}

impl HttpTransport {
    pub fn new(username: &str, password: &str, timeout_secs: u64) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(concat!("untiscal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl DavTransport for HttpTransport {
    fn send(&mut self, request: DavRequest) -> AppResult<DavResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| AppError::Other(format!("invalid HTTP method {}: {e}", request.method)))?;

        let mut builder = self
            .http
            .request(method, &request.url)
            .basic_auth(&self.username, Some(&self.password));
        if let Some(depth) = request.depth {
            builder = builder.header("Depth", depth);
        }
        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(DavResponse { status, body })
    }
}
