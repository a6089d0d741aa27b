//! Scripted in-memory transport.
//!
//! Replays queued responses in order and records every request it was handed,
//! so tests can assert on exact URLs, headers, cookies and form fields.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::http_client::{HttpRequest, HttpResponse, HttpTransport, Method};

const ZONE_PATH: &str = "/2/freedns";

/// Login page carrying `token` in `#request-token`.
pub fn login_page(token: &str) -> String {
    format!(
        r#"<html><body><form><input type="hidden" id="request-token" name="request-token" value="{token}"></form></body></html>"#
    )
}

/// Panel page carrying the post-login `request_token` input.
pub fn panel_page(request_token: &str) -> String {
    format!(
        r#"<html><body><input type="hidden" id="request_token" value="{request_token}"></body></html>"#
    )
}

/// Zone page with one `rr-<i>` input per wire record.
pub fn zone_page(records: &[&str]) -> String {
    let inputs: String = records
        .iter()
        .enumerate()
        .map(|(i, r)| format!(r#"<input type="hidden" id="rr-{i}" value="{r}">"#))
        .collect();
    format!("<html><body><form id=\"zone\">{inputs}</form></body></html>")
}

#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: HttpResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(response));
    }

    pub fn push_error(&self, error: ProviderError) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(error));
    }

    /// Queue a successful login without OTP ending with `request_token`.
    pub fn push_login(&self, request_token: &str) {
        self.push(HttpResponse::ok(login_page("anti-forgery")).with_cookie("SESSION", "anon"));
        self.push(
            HttpResponse::ok(r#"{"success":true,"otp":false}"#).with_cookie("SESSION", "auth"),
        );
        self.push(HttpResponse::ok(panel_page(request_token)));
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record submissions only: POSTs to the zone endpoint. Login and OTP
    /// posts are left out.
    pub fn zone_posts(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::Post && r.url.contains(ZONE_PATH))
            .collect()
    }

    /// Responses still queued.
    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::NetworkError {
                    detail: format!("no scripted response for {url}"),
                })
            })
    }
}
