//! Session configuration and endpoint layout.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http_client::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Production registrar host.
pub const DEFAULT_BASE_URL: &str = "https://registro.br";

/// Which anti-forgery scheme the login page uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiGeneration {
    /// Token in the `value` of element `#request-token`, echoed as `Request-Token`.
    #[default]
    RequestToken,
    /// Token in the `XSRF-TOKEN` cookie, echoed as `X-XSRF-TOKEN`.
    Xsrf,
}

impl ApiGeneration {
    /// Header that carries the anti-forgery token on every call.
    pub fn header_name(self) -> &'static str {
        match self {
            Self::RequestToken => "Request-Token",
            Self::Xsrf => "X-XSRF-TOKEN",
        }
    }

    /// Element id or cookie name the token is read from.
    pub fn token_source(self) -> &'static str {
        match self {
            Self::RequestToken => "request-token",
            Self::Xsrf => "XSRF-TOKEN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_generation: ApiGeneration,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_generation: ApiGeneration::default(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_api_generation(mut self, api_generation: ApiGeneration) -> Self {
        self.api_generation = api_generation;
        self
    }
}

/// Every registrar URL the session touches, derived from one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn login_page(&self) -> String {
        format!("{}/2/login", self.base)
    }

    pub fn login(&self) -> String {
        format!("{}/ajax/login", self.base)
    }

    pub fn otp(&self) -> String {
        format!("{}/ajax/token", self.base)
    }

    pub fn panel(&self) -> String {
        format!("{}/2/painel", self.base)
    }

    pub fn logout(&self) -> String {
        format!("{}/cgi-bin/nicbr/logout", self.base)
    }

    pub fn user_domains(&self, request_token: &str) -> String {
        format!(
            "{}/cgi-bin/nicbr/user_domains?request_token={}",
            self.base,
            urlencoding::encode(request_token)
        )
    }

    /// Zone page for `fqdn`. The submit URL carries no request token in the
    /// query; it travels in the form body instead.
    pub fn zone(&self, fqdn: &str, request_token: Option<&str>) -> String {
        let mut url = format!("{}/2/freedns?fqdn={}", self.base, urlencoding::encode(fqdn));
        if let Some(token) = request_token {
            url.push_str("&request_token=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }
}
