//! Authenticated registrar session.
//!
//! [`Session`] owns the cookie set and both tokens the registrar hands out:
//!
//! - the anti-forgery value echoed as a header on every call after the login
//!   page (see [`ApiGeneration`]);
//! - the post-login `request_token` required by the domain and zone endpoints.
//!
//! Login walks `Anonymous → AwaitingCredentials → [AwaitingOtp] → Authenticated`.
//! Any failure along the way resets the session to `Anonymous` with every token
//! cleared, and there is no automatic retry or re-login.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::config::{ApiGeneration, Endpoints, SessionConfig};
use crate::error::{ProviderError, Result};
use crate::html::{HtmlExtractor, RegexHtmlExtractor};
use crate::http_client::{CookieJar, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::types::{Domain, DomainsResponse};
use crate::utils::log_sanitizer::mask_secret;

/// Element id of the post-login request token on the panel page.
const PANEL_REQUEST_TOKEN_ID: &str = "request_token";

/// Id prefix of the inputs that carry wire records on the zone page.
const ZONE_RECORD_PREFIX: &str = "rr-";

/// Form field carrying the request token on record submission.
const SUBMIT_TOKEN_FIELD: &str = "request-token";

/// Redirect hops followed for one call.
const MAX_REDIRECTS: usize = 10;

/// Where the session is in the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    AwaitingCredentials,
    AwaitingOtp,
    Authenticated,
    LoggedOut,
}

/// Account user and password.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Supplies the one-time code when the registrar asks for it.
///
/// Only consulted after the credential step reports that OTP is required.
pub trait OtpSource: Send + Sync {
    fn otp_code(&self) -> Option<String>;
}

/// A code known up front, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticOtp(pub Option<String>);

impl OtpSource for StaticOtp {
    fn otp_code(&self) -> Option<String> {
        self.0.clone()
    }
}

impl<F> OtpSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn otp_code(&self) -> Option<String> {
        self()
    }
}

/// Which list a record submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Add,
    Remove,
}

impl Submission {
    /// Form key prefix: `add-rr-` or `remove-rr-`.
    pub fn field_prefix(self) -> &'static str {
        match self {
            Self::Add => "add-rr-",
            Self::Remove => "remove-rr-",
        }
    }
}

/// Reply of `/ajax/login` and `/ajax/token`.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    otp: Option<bool>,
}

impl LoginResponse {
    fn message(&self) -> String {
        self.msg
            .clone()
            .unwrap_or_else(|| "rejected by registrar".to_string())
    }
}

/// An HTTP session with the registrar.
pub struct Session {
    transport: Arc<dyn HttpTransport>,
    extractor: Arc<dyn HtmlExtractor>,
    endpoints: Endpoints,
    api_generation: ApiGeneration,
    state: AuthState,
    cookies: CookieJar,
    header_token: Option<String>,
    request_token: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoints", &self.endpoints)
            .field("api_generation", &self.api_generation)
            .field("state", &self.state)
            .field("cookies", &self.cookies.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session over a real `reqwest` client.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.connect_timeout, config.request_timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Session over any transport (tests use a scripted one).
    pub fn with_transport(config: &SessionConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            extractor: Arc::new(RegexHtmlExtractor::new()),
            endpoints: Endpoints::new(&config.base_url),
            api_generation: config.api_generation,
            state: AuthState::Anonymous,
            cookies: CookieJar::new(),
            header_token: None,
            request_token: None,
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn HtmlExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_logged(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Current cookie baseline.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    // ============ Login / logout ============

    /// Run the full login sequence.
    ///
    /// `otp` is asked for a code only if the registrar requires one. A bad
    /// password fails with [`ProviderError::AuthenticationFailed`], a bad or
    /// missing code with [`ProviderError::OtpFailed`].
    pub async fn login(&mut self, credentials: &Credentials, otp: &dyn OtpSource) -> Result<()> {
        self.reset(AuthState::Anonymous);

        match self.run_login(credentials, otp).await {
            Ok(()) => {
                log::info!("[registro.br] Logged in as {}", credentials.user);
                Ok(())
            }
            Err(e) => {
                if e.is_expected() {
                    log::warn!("[registro.br] Login failed: {e}");
                } else {
                    log::error!("[registro.br] Login failed: {e}");
                }
                self.reset(AuthState::Anonymous);
                Err(e)
            }
        }
    }

    async fn run_login(&mut self, credentials: &Credentials, otp: &dyn OtpSource) -> Result<()> {
        // Anonymous: fetch the login page and pick up the anti-forgery token.
        let url = self.endpoints.login_page();
        let page = self.exchange(HttpRequest::get(&url)).await?;
        if !page.is_success() {
            return Err(ProviderError::HttpStatus {
                status: page.status,
                url,
            });
        }
        let token = self.anti_forgery_token(&page)?;
        log::debug!(
            "[registro.br] Anti-forgery token {}",
            mask_secret(&token)
        );
        self.header_token = Some(token);
        self.state = AuthState::AwaitingCredentials;

        let body = json!({ "user": credentials.user, "password": credentials.password });
        let response = self
            .exchange(HttpRequest::post_json(self.endpoints.login(), body))
            .await?;
        if !response.is_success() {
            return Err(ProviderError::AuthenticationFailed {
                message: format!("HTTP {}", response.status),
            });
        }
        let reply: LoginResponse =
            response
                .json()
                .map_err(|e| ProviderError::AuthenticationFailed {
                    message: e.to_string(),
                })?;
        if !reply.success {
            return Err(ProviderError::AuthenticationFailed {
                message: reply.message(),
            });
        }

        if reply.otp.unwrap_or(false) {
            self.state = AuthState::AwaitingOtp;
            self.submit_otp(otp).await?;
        }

        // Authenticated: the panel page carries the request token.
        let url = self.endpoints.panel();
        let panel = self.exchange(HttpRequest::get(&url)).await?;
        if !panel.is_success() {
            return Err(ProviderError::HttpStatus {
                status: panel.status,
                url,
            });
        }
        let request_token = self
            .extractor
            .attribute_by_id(&panel.body, PANEL_REQUEST_TOKEN_ID, "value")
            .ok_or_else(|| ProviderError::TokenNotFound {
                token: PANEL_REQUEST_TOKEN_ID.to_string(),
            })?;
        self.request_token = Some(request_token);
        self.state = AuthState::Authenticated;
        Ok(())
    }

    async fn submit_otp(&mut self, otp: &dyn OtpSource) -> Result<()> {
        let code = otp
            .otp_code()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::OtpFailed {
                message: "no one-time code supplied".to_string(),
            })?;
        log::debug!("[registro.br] Submitting OTP {}", mask_secret(&code));

        let response = self
            .exchange(HttpRequest::post_json(
                self.endpoints.otp(),
                json!({ "otp": code }),
            ))
            .await?;
        if !response.is_success() {
            return Err(ProviderError::OtpFailed {
                message: format!("HTTP {}", response.status),
            });
        }
        let reply: LoginResponse = response
            .json()
            .map_err(|e| ProviderError::OtpFailed {
                message: e.to_string(),
            })?;
        if !reply.success {
            return Err(ProviderError::OtpFailed {
                message: reply.message(),
            });
        }
        Ok(())
    }

    /// Invalidate the server-side session.
    ///
    /// Only contacts the registrar when authenticated. Cookies, tokens and the
    /// logged-in flag are cleared together whatever the outcome.
    pub async fn logout(&mut self) -> Result<()> {
        let result = if self.is_logged() {
            self.exchange(HttpRequest::get(self.endpoints.logout()))
                .await
                .map(|_| ())
        } else {
            Ok(())
        };
        self.reset(AuthState::LoggedOut);
        if result.is_ok() {
            log::info!("[registro.br] Logged out");
        }
        result
    }

    // ============ Authenticated calls ============

    /// Domains of the logged-in account.
    pub async fn list_domains(&mut self) -> Result<Vec<Domain>> {
        let token = self.require_request_token()?;
        let url = self.endpoints.user_domains(&token);
        let response = self.exchange(HttpRequest::get(&url)).await?;
        if !response.is_success() {
            return Err(ProviderError::HttpStatus {
                status: response.status,
                url,
            });
        }
        let envelope: DomainsResponse = response.json()?;
        log::debug!("[registro.br] {} domain(s)", envelope.domains.len());
        Ok(envelope.domains)
    }

    /// Raw wire records of `fqdn`'s zone page, in page order.
    pub async fn fetch_zone_records(&mut self, fqdn: &str) -> Result<Vec<String>> {
        let token = self.require_request_token()?;
        let url = self.endpoints.zone(fqdn, Some(&token));
        let response = self.exchange(HttpRequest::get(&url)).await?;
        if !response.is_success() {
            return Err(ProviderError::HttpStatus {
                status: response.status,
                url,
            });
        }
        Ok(self
            .extractor
            .input_values_with_prefix(&response.body, ZONE_RECORD_PREFIX))
    }

    /// POST one add or remove list. Keys are `add-rr-<i>`/`remove-rr-<i>` with
    /// `i` the position inside `records`. An empty list is not sent.
    pub async fn submit_records(
        &mut self,
        fqdn: &str,
        kind: Submission,
        records: &[String],
    ) -> Result<()> {
        let token = self.require_request_token()?;
        if records.is_empty() {
            return Ok(());
        }

        let mut fields = Vec::with_capacity(records.len() + 1);
        fields.push((SUBMIT_TOKEN_FIELD.to_string(), token));
        fields.extend(
            records
                .iter()
                .enumerate()
                .map(|(i, record)| (format!("{}{i}", kind.field_prefix()), record.clone())),
        );

        let url = self.endpoints.zone(fqdn, None);
        log::debug!(
            "[registro.br] Submitting {} record(s) as {}*",
            records.len(),
            kind.field_prefix()
        );
        let response = self
            .exchange(HttpRequest::post_form(url, fields))
            .await
            .map_err(|e| ProviderError::SubmissionFailed {
                reason: e.to_string(),
            })?;
        if !response.is_success() {
            return Err(ProviderError::SubmissionFailed {
                reason: format!("HTTP {}", response.status),
            });
        }
        Ok(())
    }

    // ============ Internals ============

    fn require_request_token(&self) -> Result<String> {
        match (&self.state, &self.request_token) {
            (AuthState::Authenticated, Some(token)) => Ok(token.clone()),
            _ => Err(ProviderError::NotAuthenticated),
        }
    }

    /// One call, following redirects hop by hop so cookies set on a 3xx
    /// response are adopted before the next request goes out.
    async fn exchange(&mut self, mut request: HttpRequest) -> Result<HttpResponse> {
        for _ in 0..=MAX_REDIRECTS {
            let response = self.send_once(request.clone()).await?;
            let Some(location) = response.redirect_location() else {
                return Ok(response);
            };
            log::debug!(
                "[registro.br] {} redirect to {location}",
                response.status
            );
            request = request.redirected(response.status, location)?;
        }
        Err(ProviderError::NetworkError {
            detail: format!("more than {MAX_REDIRECTS} redirects from {}", request.url),
        })
    }

    /// Send with the current cookies and header, then adopt the response's
    /// cookies as the new baseline when it sets any.
    async fn send_once(&mut self, mut request: HttpRequest) -> Result<HttpResponse> {
        request.cookies = self.cookies.clone();
        if let Some(token) = &self.header_token {
            request
                .headers
                .push((self.api_generation.header_name().to_string(), token.clone()));
        }

        let response = self.transport.send(request).await?;

        if !response.cookies.is_empty() {
            self.cookies = response.cookies.clone();
            if self.api_generation == ApiGeneration::Xsrf
                && self.header_token.is_some()
                && let Some(token) = self.xsrf_cookie()
            {
                self.header_token = Some(token);
            }
        }
        Ok(response)
    }

    fn anti_forgery_token(&self, page: &HttpResponse) -> Result<String> {
        let source = self.api_generation.token_source();
        let token = match self.api_generation {
            ApiGeneration::RequestToken => {
                self.extractor.attribute_by_id(&page.body, source, "value")
            }
            ApiGeneration::Xsrf => self.xsrf_cookie(),
        };
        token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::TokenNotFound {
                token: source.to_string(),
            })
    }

    /// `XSRF-TOKEN` cookie, percent-decoded.
    fn xsrf_cookie(&self) -> Option<String> {
        let raw = self.cookies.get(ApiGeneration::Xsrf.token_source())?;
        Some(
            urlencoding::decode(raw)
                .map(std::borrow::Cow::into_owned)
                .unwrap_or_else(|_| raw.to_string()),
        )
    }

    fn reset(&mut self, state: AuthState) {
        self.state = state;
        self.cookies.clear();
        self.header_token = None;
        self.request_token = None;
    }
}
