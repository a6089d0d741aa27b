//! 本地变更暂存与提交
//!
//! Edits are staged against the cached zone and only reach the registrar on
//! [`ReconciliationService::save`], which submits the net add and remove lists
//! and then forces a refresh of the zone.

use registrobr_provider::Record;

use crate::error::{CoreError, CoreResult};
use crate::services::ZoneRepository;
use crate::types::{ChangeState, DeletionOutcome, PendingChanges, RecordState, Zone};

/// Stages record changes per domain and submits them.
#[derive(Debug)]
pub struct ReconciliationService {
    repository: ZoneRepository,
}

impl ReconciliationService {
    #[must_use]
    pub fn new(repository: ZoneRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &ZoneRepository {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut ZoneRepository {
        &mut self.repository
    }

    #[must_use]
    pub fn into_repository(self) -> ZoneRepository {
        self.repository
    }

    /// Append `record` as a staged addition. Returns its index.
    pub fn stage(&mut self, fqdn: &str, record: Record) -> CoreResult<usize> {
        let records = self.repository.zone_mut(fqdn)?.records_mut();
        log::debug!("[registro.br] Staged {record} on {fqdn}");
        records.push(RecordState::staged(record));
        Ok(records.len() - 1)
    }

    /// Stage the record at `index` for removal.
    ///
    /// A staged addition is dropped outright since it never existed remotely;
    /// every index after it shifts down by one.
    pub fn mark_for_deletion(&mut self, fqdn: &str, index: usize) -> CoreResult<DeletionOutcome> {
        let records = self.repository.zone_mut(fqdn)?.records_mut();
        let len = records.len();
        let entry = records
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange { index, len })?;

        let outcome = match entry.state() {
            ChangeState::Add => {
                records.remove(index);
                DeletionOutcome::Discarded
            }
            ChangeState::Unchanged => {
                entry.set_state(ChangeState::Delete);
                DeletionOutcome::Marked
            }
            ChangeState::Delete => DeletionOutcome::AlreadyMarked,
        };
        Ok(outcome)
    }

    /// Drop every staged addition and un-mark every deletion. Returns how many
    /// entries changed.
    pub fn discard(&mut self, fqdn: &str) -> CoreResult<usize> {
        let records = self.repository.zone_mut(fqdn)?.records_mut();
        let before = records.len();
        records.retain(|r| r.state() != ChangeState::Add);
        let mut changed = before - records.len();
        for entry in records.iter_mut() {
            if entry.state() == ChangeState::Delete {
                entry.set_state(ChangeState::Unchanged);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// The live sequence, staged entries included.
    pub fn list_pending(&self, fqdn: &str) -> CoreResult<&[RecordState]> {
        Ok(self.repository.zone(fqdn)?.records())
    }

    /// What [`save`](Self::save) would submit, without submitting.
    pub fn pending_changes(&self, fqdn: &str) -> CoreResult<PendingChanges> {
        Ok(self.repository.zone(fqdn)?.pending_changes())
    }

    /// Submit staged changes and refresh the zone.
    ///
    /// Nothing is posted if any staged addition collides with a remote
    /// record. A failed POST leaves the staged state as is; the caller may
    /// retry or [`evict`](ZoneRepository::evict) the zone. Returns what was
    /// submitted.
    pub async fn save(&mut self, fqdn: &str) -> CoreResult<PendingChanges> {
        let zone = self.repository.zone(fqdn)?;
        let changes = zone.pending_changes();
        if changes.is_empty() {
            log::debug!("[registro.br] Nothing to save for {fqdn}");
            return Ok(changes);
        }
        check_duplicates(zone)?;

        if let Err(e) = self.repository.submit(fqdn, &changes).await {
            log::error!("[registro.br] Saving {fqdn} failed: {e}");
            return Err(e);
        }
        log::info!(
            "[registro.br] Saved {fqdn}: {} added, {} removed",
            changes.additions.len(),
            changes.removals.len()
        );

        self.repository.mark_stale(fqdn);
        if let Err(e) = self.repository.zone_info(fqdn, true).await {
            // submitted edits must not be re-submitted from a stale copy
            self.repository.evict(fqdn);
            return Err(e);
        }
        Ok(changes)
    }
}

/// Reject additions whose `(ownername, type)` already exists remotely.
/// Remote records staged for removal in the same save do not count.
fn check_duplicates(zone: &Zone) -> CoreResult<()> {
    // TODO: decide with the registrar whether same-name records with different
    // values (round-robin A, several TXT) should be allowed through.
    let remote: Vec<&Record> = zone
        .records()
        .iter()
        .filter(|r| r.state() == ChangeState::Unchanged)
        .map(RecordState::record)
        .collect();

    for added in zone
        .records()
        .iter()
        .filter(|r| r.state() == ChangeState::Add)
        .map(RecordState::record)
    {
        let clash = remote.iter().any(|existing| {
            existing.record_type() == added.record_type()
                && existing
                    .ownername()
                    .eq_ignore_ascii_case(added.ownername())
        });
        if clash {
            log::warn!(
                "[registro.br] {} record for '{}' already exists on {}",
                added.record_type(),
                added.ownername(),
                zone.fqdn()
            );
            return Err(CoreError::DuplicateRecord {
                ownername: added.ownername().to_string(),
                record_type: added.record_type(),
            });
        }
    }
    Ok(())
}
