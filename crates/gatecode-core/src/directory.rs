// ── User & unit directory ──
//
// Read-only lookups the eligibility checks depend on. The production
// directory lives behind the excluded CRUD layer; this crate only needs
// the two queries below.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::CollaboratorError;
use crate::model::{BusinessUser, SiteId, Unit, UnitId, UserId};

/// Answers "who is this user" and "what state is this unit in".
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up a business user. Missing users return
    /// [`CollaboratorError::NotFound`].
    async fn get_user_by_id(&self, user_id: UserId) -> Result<BusinessUser, CollaboratorError>;

    /// Look up a unit scoped to a site. Missing units return
    /// [`CollaboratorError::NotFound`].
    async fn get_unit_by_id(
        &self,
        unit_id: UnitId,
        site_id: SiteId,
    ) -> Result<Unit, CollaboratorError>;
}

/// In-memory directory for tests and snapshot runs.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: DashMap<UserId, BusinessUser>,
    units: DashMap<(SiteId, UnitId), Unit>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub fn upsert_user(&self, user: BusinessUser) {
        self.users.insert(user.user_id, user);
    }

    /// Insert or replace a unit.
    pub fn upsert_unit(&self, unit: Unit) {
        self.units.insert((unit.site_id, unit.unit_id), unit);
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<BusinessUser, CollaboratorError> {
        self.users
            .get(&user_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CollaboratorError::not_found("user", user_id))
    }

    async fn get_unit_by_id(
        &self,
        unit_id: UnitId,
        site_id: SiteId,
    ) -> Result<Unit, CollaboratorError> {
        self.units
            .get(&(site_id, unit_id))
            .map(|r| r.value().clone())
            .ok_or_else(|| CollaboratorError::not_found("unit", unit_id))
    }
}
