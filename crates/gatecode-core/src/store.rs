// ── Access code persistence ──
//
// Narrow view of the code table: read the rows for a set of units, look a
// value up across a site, and upsert a batch keyed by (code, unit, site).

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error::CollaboratorError;
use crate::model::{CodeKey, GateAccessCode, SiteId, UnitId};

/// Persistence for gate access code rows.
#[async_trait]
pub trait AccessCodeStore: Send + Sync {
    /// Every row on record for `unit_ids` at `site_id`, ordered by unit then code.
    async fn get_codes_for_units(
        &self,
        unit_ids: &[UnitId],
        site_id: SiteId,
    ) -> Result<Vec<GateAccessCode>, CollaboratorError>;

    /// Upsert `codes` by (code, unit, site). Callers supply the full desired
    /// row. Rows are applied one at a time; a failure part-way leaves the
    /// earlier rows written.
    async fn update_access_codes(
        &self,
        codes: &[GateAccessCode],
        site_id: SiteId,
    ) -> Result<(), CollaboratorError>;

    /// Every row at `site_id` carrying `access_code`, on any unit.
    async fn find_codes_by_value(
        &self,
        access_code: &str,
        site_id: SiteId,
    ) -> Result<Vec<GateAccessCode>, CollaboratorError>;
}

/// In-memory code table for tests and snapshot runs.
#[derive(Debug, Default)]
pub struct InMemoryAccessCodeStore {
    rows: DashMap<CodeKey, Arc<GateAccessCode>>,
}

impl InMemoryAccessCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table with existing rows.
    pub fn from_codes(codes: impl IntoIterator<Item = GateAccessCode>) -> Self {
        let store = Self::new();
        for code in codes {
            store.put(code);
        }
        store
    }

    fn put(&self, mut code: GateAccessCode) {
        code.clear_annotations();
        self.rows.insert(code.key(), Arc::new(code));
    }

    /// All rows, ordered by site, unit, then code value.
    pub fn snapshot(&self) -> Vec<GateAccessCode> {
        let mut rows: Vec<_> = self
            .rows
            .iter()
            .map(|r| GateAccessCode::clone(r.value()))
            .collect();
        rows.sort_by(|a, b| a.key().cmp(&b.key()));
        rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl AccessCodeStore for InMemoryAccessCodeStore {
    async fn get_codes_for_units(
        &self,
        unit_ids: &[UnitId],
        site_id: SiteId,
    ) -> Result<Vec<GateAccessCode>, CollaboratorError> {
        let mut rows: Vec<_> = self
            .rows
            .iter()
            .filter(|r| r.key().site_id == site_id && unit_ids.contains(&r.key().unit_id))
            .map(|r| GateAccessCode::clone(r.value()))
            .collect();
        rows.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(rows)
    }

    async fn update_access_codes(
        &self,
        codes: &[GateAccessCode],
        site_id: SiteId,
    ) -> Result<(), CollaboratorError> {
        for code in codes {
            if code.site_id != site_id {
                return Err(CollaboratorError::Rejected {
                    message: format!(
                        "code row for site {} in a batch for site {site_id}",
                        code.site_id
                    ),
                });
            }
            debug!(unit = %code.unit_id, state = %code.state, "upserting access code row");
            self.put(code.clone());
        }
        Ok(())
    }

    async fn find_codes_by_value(
        &self,
        access_code: &str,
        site_id: SiteId,
    ) -> Result<Vec<GateAccessCode>, CollaboratorError> {
        let mut rows: Vec<_> = self
            .rows
            .iter()
            .filter(|r| r.key().site_id == site_id && r.key().access_code == access_code)
            .map(|r| GateAccessCode::clone(r.value()))
            .collect();
        rows.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AccessCodeState, UserId};

    fn row(code: &str, unit: u64, state: AccessCodeState) -> GateAccessCode {
        GateAccessCode::with_state(code, UnitId::new(unit), UserId::new(1), SiteId::new(5), state)
    }

    #[tokio::test]
    async fn upsert_replaces_row_with_same_key() {
        let store = InMemoryAccessCodeStore::from_codes([row("1111", 1, AccessCodeState::Active)]);
        store
            .update_access_codes(&[row("1111", 1, AccessCodeState::Remove)], SiteId::new(5))
            .await
            .unwrap();

        let rows = store.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, AccessCodeState::Remove);
    }

    #[tokio::test]
    async fn same_value_on_other_unit_is_a_separate_row() {
        let store = InMemoryAccessCodeStore::from_codes([
            row("1111", 1, AccessCodeState::Active),
            row("1111", 2, AccessCodeState::Active),
        ]);
        assert_eq!(store.len(), 2);

        let hits = store.find_codes_by_value("1111", SiteId::new(5)).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(
            store
                .find_codes_by_value("1111", SiteId::new(6))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn codes_for_units_are_scoped_and_ordered() {
        let store = InMemoryAccessCodeStore::from_codes([
            row("2222", 1, AccessCodeState::Removed),
            row("1111", 1, AccessCodeState::Active),
            row("3333", 2, AccessCodeState::Active),
        ]);
        let rows = store
            .get_codes_for_units(&[UnitId::new(1)], SiteId::new(5))
            .await
            .unwrap();
        let values: Vec<_> = rows.iter().map(|r| r.access_code.as_str()).collect();
        assert_eq!(values, ["1111", "2222"]);
    }

    #[tokio::test]
    async fn rejects_rows_for_another_site_after_applying_earlier_rows() {
        let store = InMemoryAccessCodeStore::new();
        let mut foreign = row("9999", 1, AccessCodeState::Setup);
        foreign.site_id = SiteId::new(6);

        let err = store
            .update_access_codes(
                &[row("1111", 1, AccessCodeState::Setup), foreign],
                SiteId::new(5),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Rejected { .. }));
        assert_eq!(store.len(), 1);
    }
}
