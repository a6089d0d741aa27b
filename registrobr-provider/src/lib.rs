//! # registrobr-provider
//!
//! Session, record codec and HTTP plumbing for managing DNS zones hosted on
//! [registro.br](https://registro.br).
//!
//! The registrar has no public DNS API. Zones are managed through the same
//! authenticated web session the browser uses: a login page hands out an
//! anti-forgery token, the credential (and optional OTP) step sets session
//! cookies, and every zone record travels as a pipe-delimited string.
//!
//! ## Feature Flags
//!
//! - **`native-tls`** *(default)*: Use the platform's native TLS implementation.
//! - **`rustls`**: Use rustls.
//! - **`mock`**: Export [`mock::MockTransport`], a scripted transport for tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use registrobr_provider::{codec, Credentials, Session, SessionConfig, StaticOtp};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::new(&SessionConfig::default())?;
//!     session
//!         .login(&Credentials::new("user", "password"), &StaticOtp(None))
//!         .await?;
//!
//!     for domain in session.list_domains().await? {
//!         for wire in session.fetch_zone_records(&domain.fqdn).await? {
//!             println!("{}", codec::deserialize(&wire)?);
//!         }
//!     }
//!
//!     session.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Wire format
//!
//! `ownername|TYPE|payload`, see [`codec`]. Decoding is strict: an unknown
//! type tag is [`ProviderError::UnknownRecordType`], never a silent drop.

pub mod codec;
pub mod config;
mod error;
pub mod html;
pub mod http_client;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod session;
mod types;
mod utils;

pub use error::{ProviderError, Result};

pub use config::{ApiGeneration, DEFAULT_BASE_URL, Endpoints, SessionConfig};

pub use html::{HtmlExtractor, RegexHtmlExtractor};

pub use http_client::{CookieJar, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

pub use session::{AuthState, Credentials, OtpSource, Session, StaticOtp, Submission};

pub use types::{
    Domain, MX_PRIORITY_MAX, MX_PRIORITY_MIN, Record, RecordData, RecordType, TlsaMatchingType,
    TlsaSelector, TlsaUsage,
};

pub use utils::log_sanitizer;
