// Shared collaborator doubles for the orchestrator integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use gatecode_core::{
    AccessCodeEditActivity, AccessCodeOptions, AccessCodeOrchestrator, AccessCodeStore,
    ActivityLog, BusinessUser, Claims, CodePolicy, CollaboratorError, Collaborators,
    CommandCenter, CommandCenterFactory, Directory, GateAccessCode, InMemoryAccessCodeStore,
    InMemoryDirectory, RentalState, SiteId, Unit, UnitId, UserId,
};

pub const SITE: SiteId = SiteId::new(5);
pub const USER: UserId = UserId::new(10);
pub const ACTOR: UserId = UserId::new(1);
pub const NEIGHBOUR: UserId = UserId::new(11);
pub const UNIT: UnitId = UnitId::new(100);
pub const OTHER_UNIT: UnitId = UnitId::new(200);
pub const COMPANY: &str = "company-a";

pub fn claims() -> Claims {
    Claims {
        company_uuid: COMPANY.into(),
        current_site: SITE,
        current_site_uuid: "site-uuid-5".into(),
        user_id: ACTOR,
    }
}

pub fn code(value: &str, unit: UnitId, state: gatecode_core::AccessCodeState) -> GateAccessCode {
    GateAccessCode::with_state(value, unit, USER, SITE, state)
}

/// A code held by another tenant.
pub fn neighbour_code(
    value: &str,
    unit: UnitId,
    state: gatecode_core::AccessCodeState,
) -> GateAccessCode {
    GateAccessCode::with_state(value, unit, NEIGHBOUR, SITE, state)
}

// ── Store ────────────────────────────────────────────────────────────

/// In-memory store that records every write batch and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryAccessCodeStore,
    pub updates: Mutex<Vec<Vec<GateAccessCode>>>,
    pub reads: Mutex<usize>,
    /// Fail the n-th update call (1-based).
    pub fail_update_call: Mutex<Option<usize>>,
    pub fail_reads: Mutex<bool>,
    pub fail_lookups: Mutex<bool>,
    update_calls: Mutex<usize>,
}

impl RecordingStore {
    pub fn with_codes(codes: impl IntoIterator<Item = GateAccessCode>) -> Self {
        Self {
            inner: InMemoryAccessCodeStore::from_codes(codes),
            ..Self::default()
        }
    }

    pub fn update_batches(&self) -> Vec<Vec<GateAccessCode>> {
        self.updates.lock().unwrap().clone()
    }

    pub fn snapshot(&self) -> Vec<GateAccessCode> {
        self.inner.snapshot()
    }

    pub fn fail_update(&self, call: usize) {
        *self.fail_update_call.lock().unwrap() = Some(call);
    }
}

#[async_trait]
impl AccessCodeStore for RecordingStore {
    async fn get_codes_for_units(
        &self,
        unit_ids: &[UnitId],
        site_id: SiteId,
    ) -> Result<Vec<GateAccessCode>, CollaboratorError> {
        *self.reads.lock().unwrap() += 1;
        if *self.fail_reads.lock().unwrap() {
            return Err(CollaboratorError::unavailable("code table offline"));
        }
        self.inner.get_codes_for_units(unit_ids, site_id).await
    }

    async fn update_access_codes(
        &self,
        codes: &[GateAccessCode],
        site_id: SiteId,
    ) -> Result<(), CollaboratorError> {
        let call = {
            let mut calls = self.update_calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if *self.fail_update_call.lock().unwrap() == Some(call) {
            return Err(CollaboratorError::unavailable("write rejected"));
        }
        self.updates.lock().unwrap().push(codes.to_vec());
        self.inner.update_access_codes(codes, site_id).await
    }

    async fn find_codes_by_value(
        &self,
        access_code: &str,
        site_id: SiteId,
    ) -> Result<Vec<GateAccessCode>, CollaboratorError> {
        if *self.fail_lookups.lock().unwrap() {
            return Err(CollaboratorError::unavailable("code table offline"));
        }
        self.inner.find_codes_by_value(access_code, site_id).await
    }
}

// ── Command center ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Revoke(SiteId, Vec<UnitId>),
    Set(SiteId, Vec<UnitId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behaviour {
    #[default]
    Succeed,
    Fail,
    Hang,
    Delay(Duration),
}

#[derive(Default)]
struct ScriptState {
    calls: Vec<Call>,
    revoke: Behaviour,
    set: Behaviour,
}

/// Command center (and factory) that records calls and follows a script.
#[derive(Clone, Default)]
pub struct ScriptedCommandCenter {
    state: Arc<Mutex<ScriptState>>,
    site: Option<SiteId>,
}

impl ScriptedCommandCenter {
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn on_revoke(&self, behaviour: Behaviour) {
        self.state.lock().unwrap().revoke = behaviour;
    }

    pub fn on_set(&self, behaviour: Behaviour) {
        self.state.lock().unwrap().set = behaviour;
    }

    async fn perform(&self, call: Call, behaviour: Behaviour) -> Result<(), CollaboratorError> {
        self.state.lock().unwrap().calls.push(call);
        match behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => Err(CollaboratorError::unavailable("controller unreachable")),
            Behaviour::Hang => std::future::pending().await,
            Behaviour::Delay(d) => {
                tokio::time::sleep(d).await;
                Ok(())
            }
        }
    }

    fn site(&self) -> SiteId {
        self.site.unwrap_or(SiteId::new(0))
    }
}

#[async_trait]
impl CommandCenter for ScriptedCommandCenter {
    async fn revoke_access_codes(
        &self,
        unit_ids: &[UnitId],
        options: &AccessCodeOptions,
    ) -> Result<(), CollaboratorError> {
        assert!(options.is_empty());
        let behaviour = self.state.lock().unwrap().revoke;
        self.perform(Call::Revoke(self.site(), unit_ids.to_vec()), behaviour)
            .await
    }

    async fn set_access_codes(
        &self,
        unit_ids: &[UnitId],
        options: &AccessCodeOptions,
    ) -> Result<(), CollaboratorError> {
        assert!(options.is_empty());
        let behaviour = self.state.lock().unwrap().set;
        self.perform(Call::Set(self.site(), unit_ids.to_vec()), behaviour)
            .await
    }
}

impl CommandCenterFactory for ScriptedCommandCenter {
    fn client_for(&self, site_id: SiteId, _cancel: &CancellationToken) -> Arc<dyn CommandCenter> {
        Arc::new(Self {
            state: Arc::clone(&self.state),
            site: Some(site_id),
        })
    }
}

// ── Activity log ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingActivity {
    pub entries: Mutex<Vec<AccessCodeEditActivity>>,
    pub fail: Mutex<bool>,
}

impl RecordingActivity {
    pub fn entries(&self) -> Vec<AccessCodeEditActivity> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityLog for RecordingActivity {
    async fn record_access_code_edit(
        &self,
        activity: &AccessCodeEditActivity,
    ) -> Result<(), CollaboratorError> {
        if *self.fail.lock().unwrap() {
            return Err(CollaboratorError::unavailable("activity table offline"));
        }
        self.entries.lock().unwrap().push(activity.clone());
        Ok(())
    }
}

// ── Directory ────────────────────────────────────────────────────────

/// Directory whose lookups always fail with a non-"not found" error.
pub struct UnavailableDirectory;

#[async_trait]
impl Directory for UnavailableDirectory {
    async fn get_user_by_id(&self, _: UserId) -> Result<BusinessUser, CollaboratorError> {
        Err(CollaboratorError::unavailable("directory offline"))
    }

    async fn get_unit_by_id(&self, _: UnitId, _: SiteId) -> Result<Unit, CollaboratorError> {
        Err(CollaboratorError::unavailable("directory offline"))
    }
}

/// Directory that answers unit lookups with a unit from another site.
pub struct MisroutedDirectory;

#[async_trait]
impl Directory for MisroutedDirectory {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<BusinessUser, CollaboratorError> {
        Ok(BusinessUser {
            user_id,
            company_uuid: COMPANY.into(),
            sites: vec![SITE.to_string()],
        })
    }

    async fn get_unit_by_id(&self, unit_id: UnitId, _: SiteId) -> Result<Unit, CollaboratorError> {
        Ok(Unit {
            unit_id,
            site_id: SiteId::new(99),
            rental_state: RentalState::Rented,
        })
    }
}

pub fn seeded_directory() -> InMemoryDirectory {
    let directory = InMemoryDirectory::new();
    directory.upsert_user(BusinessUser {
        user_id: USER,
        company_uuid: COMPANY.into(),
        sites: vec!["3".into(), SITE.to_string()],
    });
    for unit_id in [UNIT, OTHER_UNIT] {
        directory.upsert_unit(Unit {
            unit_id,
            site_id: SITE,
            rental_state: RentalState::Rented,
        });
    }
    directory
}

// ── Harness ──────────────────────────────────────────────────────────

pub struct Harness {
    pub directory: Arc<InMemoryDirectory>,
    pub store: Arc<RecordingStore>,
    pub command_center: ScriptedCommandCenter,
    pub activity: Arc<RecordingActivity>,
    pub orchestrator: AccessCodeOrchestrator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_codes(Vec::<GateAccessCode>::new())
    }

    pub fn with_codes(codes: impl IntoIterator<Item = GateAccessCode>) -> Self {
        let directory = Arc::new(seeded_directory());
        let store = Arc::new(RecordingStore::with_codes(codes));
        let command_center = ScriptedCommandCenter::default();
        let activity = Arc::new(RecordingActivity::default());
        let orchestrator = AccessCodeOrchestrator::new(
            Collaborators {
                directory: directory.clone(),
                store: store.clone(),
                command_centers: Arc::new(command_center.clone()),
                activity: activity.clone(),
            },
            CodePolicy::default(),
        );
        Self {
            directory,
            store,
            command_center,
            activity,
            orchestrator,
        }
    }

    /// Orchestrator over a custom directory; the other doubles are fresh.
    pub fn with_directory(directory: Arc<dyn Directory>) -> (Self, AccessCodeOrchestrator) {
        let harness = Self::new();
        let orchestrator = AccessCodeOrchestrator::new(
            Collaborators {
                directory,
                store: harness.store.clone(),
                command_centers: Arc::new(harness.command_center.clone()),
                activity: harness.activity.clone(),
            },
            CodePolicy::default(),
        );
        (harness, orchestrator)
    }

    pub fn set_rental_state(&self, unit_id: UnitId, state: RentalState) {
        self.directory.upsert_unit(Unit {
            unit_id,
            site_id: SITE,
            rental_state: state,
        });
    }

    pub fn nothing_written(&self) -> bool {
        self.store.update_batches().is_empty() && self.command_center.calls().is_empty()
    }
}
