//! Zone snapshot and per-record lifecycle.

use std::time::{Duration, Instant};

use serde::Serialize;

use registrobr_provider::{Record, codec};

/// Lifecycle of one record relative to the remote baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeState {
    /// Present remotely, untouched locally.
    Unchanged,
    /// Staged locally, not yet submitted.
    Add,
    /// Present remotely, staged for removal.
    Delete,
}

/// A record plus its lifecycle tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordState {
    state: ChangeState,
    record: Record,
    /// Wire string as fetched, for records that came from the remote side.
    #[serde(skip)]
    wire: Option<String>,
}

impl RecordState {
    pub(crate) fn remote(record: Record, wire: String) -> Self {
        Self {
            state: ChangeState::Unchanged,
            record,
            wire: Some(wire),
        }
    }

    pub(crate) fn staged(record: Record) -> Self {
        Self {
            state: ChangeState::Add,
            record,
            wire: None,
        }
    }

    pub fn state(&self) -> ChangeState {
        self.state
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Wire form to submit: the fetched string for remote records, the codec
    /// encoding otherwise.
    pub fn wire(&self) -> String {
        self.wire
            .clone()
            .unwrap_or_else(|| codec::serialize(&self.record))
    }

    pub(crate) fn set_state(&mut self, state: ChangeState) {
        self.state = state;
    }
}

/// What [`mark_for_deletion`](crate::services::ReconciliationService::mark_for_deletion) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// A staged addition was dropped from the sequence.
    Discarded,
    /// A remote record is now staged for removal.
    Marked,
    /// The record was already staged for removal.
    AlreadyMarked,
}

/// Add and remove lists, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PendingChanges {
    pub additions: Vec<String>,
    pub removals: Vec<String>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.additions.len() + self.removals.len()
    }
}

/// Cached records of one domain, in page order followed by staged additions.
#[derive(Debug, Clone)]
pub struct Zone {
    fqdn: String,
    records: Vec<RecordState>,
    fetched_at: Instant,
    stale: bool,
}

impl Zone {
    pub(crate) fn new(fqdn: impl Into<String>, records: Vec<RecordState>) -> Self {
        Self {
            fqdn: fqdn.into(),
            records,
            fetched_at: Instant::now(),
            stale: false,
        }
    }

    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    pub fn records(&self) -> &[RecordState] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<RecordState> {
        &mut self.records
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    pub fn is_stale(&self, max_age: Option<Duration>) -> bool {
        self.stale || max_age.is_some_and(|age| self.fetched_at.elapsed() > age)
    }

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Whether any record differs from the baseline.
    pub fn has_pending(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.state != ChangeState::Unchanged)
    }

    /// Build the add and remove lists. Positions are within each list.
    pub fn pending_changes(&self) -> PendingChanges {
        let mut changes = PendingChanges::default();
        for entry in &self.records {
            match entry.state {
                ChangeState::Add => changes.additions.push(entry.wire()),
                ChangeState::Delete => changes.removals.push(entry.wire()),
                ChangeState::Unchanged => {}
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(wire: &str) -> RecordState {
        RecordState::remote(codec::deserialize(wire).unwrap(), wire.to_string())
    }

    #[test]
    fn pending_changes_partition_by_state() {
        let mut deleted = remote("old|A|10.0.0.1");
        deleted.set_state(ChangeState::Delete);
        let zone = Zone::new(
            "example.com.br",
            vec![
                remote("www|A|1.2.3.4"),
                deleted,
                RecordState::staged(Record::txt("_test", "hello").unwrap()),
                RecordState::staged(Record::mx("", 10, "mx.example.com.br").unwrap()),
            ],
        );

        assert!(zone.has_pending());
        let changes = zone.pending_changes();
        assert_eq!(
            changes.additions,
            vec!["_test|TXT|hello", "|MX|10 mx.example.com.br"]
        );
        assert_eq!(changes.removals, vec!["old|A|10.0.0.1"]);
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn removal_uses_fetched_wire_form() {
        // trailing whitespace survives into the remove list
        let mut entry = remote("|MX|10 mx.example.com.br ");
        entry.set_state(ChangeState::Delete);
        assert_eq!(entry.wire(), "|MX|10 mx.example.com.br ");
    }

    #[test]
    fn staleness() {
        let mut zone = Zone::new("example.com.br", Vec::new());
        assert!(!zone.is_stale(None));
        assert!(!zone.is_stale(Some(Duration::from_secs(3600))));
        zone.mark_stale();
        assert!(zone.is_stale(None));
        assert!(!zone.has_pending());
        assert!(zone.pending_changes().is_empty());
    }
}
