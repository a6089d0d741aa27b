//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

use registrobr_provider::RecordType;

// Re-export library error type
pub use registrobr_provider::ProviderError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Domain name not found in the account
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// Zone has not been fetched yet (call `zone_info` first)
    #[error("Zone not loaded: {0}")]
    ZoneNotLoaded(String),

    /// Record index outside the zone's sequence
    #[error("Record index {index} out of range (zone has {len} records)")]
    IndexOutOfRange { index: usize, len: usize },

    /// A staged addition collides with a record already present remotely
    #[error("Duplicate record: {record_type} record for '{ownername}' already exists")]
    DuplicateRecord {
        ownername: String,
        record_type: RecordType,
    },

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::DomainNotFound(_)
            | Self::ZoneNotLoaded(_)
            | Self::IndexOutOfRange { .. }
            | Self::DuplicateRecord { .. } => true,
            Self::Provider(e) => e.is_expected(),
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
