//! HTTP transport seam.
//!
//! The session never talks to `reqwest` directly. Every round-trip goes through
//! [`HttpTransport::send`], with cookies carried explicitly in the request and
//! returned explicitly in the response, so the session decides what its
//! cookie baseline is after each call.
//!
//! # design principles
//! - **No implicit cookie store** - the client is built without one
//! - **No implicit redirects** - 3xx responses come back with their
//!   `Location`, so the session sees the cookies set on every hop
//! - **One send path** - logging and error mapping live in one place
//! - **Status is data** - non-2xx responses are returned, not raised; callers
//!   decide which error a failed status maps to

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use cookie::Cookie;
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::{Client, Url, redirect};
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::utils::log_sanitizer::truncate_for_log;

/// Name → value cookie set, as sent in a `Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar(BTreeMap<String, String>);

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// `a=1; b=2`, or `None` when empty.
    pub fn header_value(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(
            self.0
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Build a jar from raw `Set-Cookie` header values. Attributes (path,
    /// expiry, flags) are dropped; unparsable headers are skipped.
    pub fn from_set_cookie<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut jar = Self::new();
        for header in headers {
            match Cookie::parse(header) {
                Ok(cookie) => jar.insert(cookie.name(), cookie.value()),
                Err(e) => log::debug!("[registro.br] Ignoring Set-Cookie: {e}"),
            }
        }
        jar
    }
}

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Request body encodings used by the registrar.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// `application/json` (login and OTP).
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` (record submission). Field order is kept.
    Form(Vec<(String, String)>),
}

/// A fully described request, cookies and headers included.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub cookies: CookieJar,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            cookies: CookieJar::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            body: RequestBody::Json(body),
            ..Self::get(url)
        }
    }

    pub fn post_form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            body: RequestBody::Form(fields),
            ..Self::get(url)
        }
    }

    /// Value of a form field, if this is a form POST.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(fields) => fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The request to send after a `status` redirect to `location`, which may
    /// be relative to this request's URL.
    ///
    /// 307 and 308 repeat the method and body; every other redirect becomes a
    /// bodiless GET.
    pub fn redirected(&self, status: u16, location: &str) -> Result<Self> {
        let url = Url::parse(&self.url)
            .and_then(|base| base.join(location))
            .map_err(|e| ProviderError::NetworkError {
                detail: format!("Invalid redirect location '{location}': {e}"),
            })?;
        let mut next = self.clone();
        next.url = url.into();
        if !matches!(status, 307 | 308) {
            next.method = Method::Get;
            next.body = RequestBody::Empty;
        }
        Ok(next)
    }
}

/// Status, body and the cookies this response set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub cookies: CookieJar,
    /// `Location` header, if any.
    pub location: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            cookies: CookieJar::new(),
            location: None,
        }
    }

    /// `status` redirect to `location`, with an empty body.
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::new(status, "")
        }
    }

    /// `200 OK` with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name, value);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Target of a followable redirect.
    pub fn redirect_location(&self) -> Option<&str> {
        if matches!(self.status, 301 | 302 | 303 | 307 | 308) {
            self.location.as_deref()
        } else {
            None
        }
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            log::error!("[registro.br] JSON parse failed: {e}");
            log::error!("[registro.br] Raw response: {}", truncate_for_log(&self.body));
            ProviderError::ParseError {
                detail: e.to_string(),
            }
        })
    }
}

/// One HTTP round-trip. Implementations must not keep cookies of their own.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// 默认连接超时（秒）
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// 默认请求超时（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client with the given timeouts, no cookie store and no
    /// redirect following.
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ProviderError::NetworkError {
                detail: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Wrap a caller-built client. It must not follow redirects or keep
    /// cookies itself.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.as_str();
        log::debug!("[registro.br] {method} {}", request.url);

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = request.cookies.header_value() {
            builder = builder.header(COOKIE, cookie);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    detail: e.to_string(),
                }
            } else {
                ProviderError::NetworkError {
                    detail: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        log::debug!("[registro.br] Response Status: {status}");

        let cookies = CookieJar::from_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!("[registro.br] Response Body: {}", truncate_for_log(&body));

        Ok(HttpResponse {
            status,
            body,
            cookies,
            location,
        })
    }
}
