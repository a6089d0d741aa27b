use serde::{Deserialize, Serialize};

/// Unified error type for every registro.br session and codec operation.
///
/// All variants are serializable for structured error reporting. Authentication
/// and OTP failures are kept apart so callers can tell a bad password from a bad
/// one-time code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    NetworkError {
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Error details.
        detail: String,
    },

    /// The server answered with a non-success status outside the login and submit flows.
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Failed to parse a response body (JSON or HTML).
    ParseError {
        /// Details about the parse failure.
        detail: String,
    },

    /// An expected anti-forgery or request token was missing from a response.
    TokenNotFound {
        /// Which token was being looked up (element id or cookie name).
        token: String,
    },

    /// The registrar rejected the user/password pair.
    AuthenticationFailed {
        /// Message returned by the registrar.
        message: String,
    },

    /// The registrar rejected (or never received) the one-time password.
    OtpFailed {
        /// Message returned by the registrar.
        message: String,
    },

    /// An authenticated operation was attempted before `login()` succeeded.
    NotAuthenticated,

    /// A wire record string could not be decoded.
    MalformedRecord {
        /// The offending wire string.
        record: String,
        /// What is wrong with it.
        detail: String,
    },

    /// The record type tag is not one of `A|AAAA|CNAME|TXT|MX|TLSA`.
    UnknownRecordType {
        /// The unrecognized tag.
        record_type: String,
    },

    /// The address does not parse as the IP version the record type requires.
    InvalidAddress {
        /// The offending address literal.
        address: String,
        /// Parser message.
        detail: String,
    },

    /// A numeric field is outside its documented range.
    OutOfRange {
        /// Field name.
        field: String,
        /// Rejected value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// An enumerated field is outside its closed set.
    InvalidEnum {
        /// Field name.
        field: String,
        /// Rejected value.
        value: i64,
        /// Accepted values.
        allowed: Vec<u8>,
    },

    /// Posting record additions or removals to the registrar failed.
    SubmissionFailed {
        /// Why the submission failed.
        reason: String,
    },
}

impl ProviderError {
    /// 是否为预期行为（用户输入、凭证错误等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. }
                | Self::OtpFailed { .. }
                | Self::NotAuthenticated
                | Self::MalformedRecord { .. }
                | Self::UnknownRecordType { .. }
                | Self::InvalidAddress { .. }
                | Self::OutOfRange { .. }
                | Self::InvalidEnum { .. }
        )
    }

    pub(crate) fn malformed(record: &str, detail: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.to_string(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { detail } => write!(f, "Network error: {detail}"),
            Self::Timeout { detail } => write!(f, "Request timeout: {detail}"),
            Self::HttpStatus { status, url } => write!(f, "HTTP {status} from {url}"),
            Self::ParseError { detail } => write!(f, "Parse error: {detail}"),
            Self::TokenNotFound { token } => write!(f, "Token '{token}' not found in response"),
            Self::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {message}")
            }
            Self::OtpFailed { message } => write!(f, "OTP verification failed: {message}"),
            Self::NotAuthenticated => write!(f, "Not authenticated, call login() first"),
            Self::MalformedRecord { record, detail } => {
                write!(f, "Malformed record '{record}': {detail}")
            }
            Self::UnknownRecordType { record_type } => {
                write!(f, "Unknown record type: {record_type}")
            }
            Self::InvalidAddress { address, detail } => {
                write!(f, "Invalid address '{address}': {detail}")
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} {value} is out of range [{min}, {max}]"),
            Self::InvalidEnum {
                field,
                value,
                allowed,
            } => write!(f, "{field} {value} must be one of {allowed:?}"),
            Self::SubmissionFailed { reason } => write!(f, "Submission failed: {reason}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;
