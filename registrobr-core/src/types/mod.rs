//! Core types.

mod zone;

pub use zone::{ChangeState, DeletionOutcome, PendingChanges, RecordState, Zone};

// Re-export provider types used throughout the core
pub use registrobr_provider::{Domain, Record, RecordData, RecordType};
