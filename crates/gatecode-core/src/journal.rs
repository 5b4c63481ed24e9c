// ── Command-center sync journal ──
//
// Once the store has been written, a failed revoke or set leaves the gate
// behind the store. The orchestrator records the missing call here; a
// reconciliation pass replays it later. Nothing is retried automatically.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{SiteId, UnitId};

/// Command-center call still owed to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncOperation {
    Revoke,
    Set,
}

/// One outstanding command-center call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSync {
    pub id: Uuid,
    pub site_id: SiteId,
    pub operation: SyncOperation,
    pub unit_ids: Vec<UnitId>,
    pub recorded_at: DateTime<Utc>,
    /// Replay attempts so far (the original failure not included).
    pub attempts: u32,
    pub last_error: String,
}

/// Ordered list of outstanding command-center calls.
#[derive(Debug, Default)]
pub struct SyncJournal {
    entries: Mutex<Vec<PendingSync>>,
}

impl SyncJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<PendingSync>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Append an outstanding call; returns its id.
    ///
    /// An identical pending call (same site, operation and units) is moved
    /// to the back with the new error instead of being queued twice, so a
    /// replay still follows the order of the latest failures.
    pub fn record(
        &self,
        site_id: SiteId,
        operation: SyncOperation,
        unit_ids: Vec<UnitId>,
        error: impl ToString,
    ) -> Uuid {
        let mut entries = self.entries();
        let existing = entries.iter().position(|e| {
            e.site_id == site_id && e.operation == operation && e.unit_ids == unit_ids
        });

        let entry = match existing {
            Some(idx) => {
                let mut entry = entries.remove(idx);
                entry.last_error = error.to_string();
                entry
            }
            None => PendingSync {
                id: Uuid::new_v4(),
                site_id,
                operation,
                unit_ids,
                recorded_at: Utc::now(),
                attempts: 0,
                last_error: error.to_string(),
            },
        };
        let id = entry.id;
        entries.push(entry);
        id
    }

    /// Every outstanding call, oldest first.
    pub fn pending(&self) -> Vec<PendingSync> {
        self.entries().clone()
    }

    pub fn pending_for_site(&self, site_id: SiteId) -> Vec<PendingSync> {
        self.entries()
            .iter()
            .filter(|e| e.site_id == site_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop an entry whose call has now gone through.
    pub fn resolve(&self, id: Uuid) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    /// Note another failed replay of `id`.
    pub fn record_failure(&self, id: Uuid, error: impl ToString) {
        if let Some(entry) = self.entries().iter_mut().find(|e| e.id == id) {
            entry.attempts += 1;
            entry.last_error = error.to_string();
        }
    }
}

/// Outcome of one reconciliation pass over a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub resolved: Vec<Uuid>,
    pub failed: Vec<Uuid>,
    /// Entries not attempted because an earlier entry for one of their
    /// units failed in this pass.
    pub deferred: Vec<Uuid>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.deferred.is_empty()
    }
}
