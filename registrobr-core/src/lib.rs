//! registro.br Core Library
//!
//! Zone-level logic on top of `registrobr-provider`:
//! - Zone Repository: domain list and per-domain record cache
//! - Reconciliation Service: staged additions and removals, and their submission
//!
//! All operations take `&mut self`; one repository serves one session and one
//! writer at a time.

pub mod error;
pub mod services;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::{ReconciliationService, ZoneRepository};
pub use types::{ChangeState, DeletionOutcome, PendingChanges, RecordState, Zone};
