// ── Access code orchestrator ──
//
// Drives one unit's code change: validate, diff against the codes on record,
// write removals then the new code, then revoke and set at the command
// center. The store is always written ahead of the gate. A command-center
// failure after the store write leaves an entry in the sync journal for
// `reconcile` to replay.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::activity::ActivityLog;
use crate::command_center::{AccessCodeOptions, CommandCenter, CommandCenterFactory};
use crate::context::RequestContext;
use crate::directory::Directory;
use crate::error::{CollaboratorError, CoreError, ValidationError};
use crate::journal::{PendingSync, ReconcileReport, SyncJournal, SyncOperation};
use crate::lock::UnitLocks;
use crate::model::{
    AccessCodeState, BusinessUser, GateAccessCode, SiteId, TransitionError, UnitId, UserId,
    ValidationReason,
};
use crate::store::AccessCodeStore;
use crate::validator::{AccessCodeValidator, CodePolicy};

/// Everything the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn Directory>,
    pub store: Arc<dyn AccessCodeStore>,
    pub command_centers: Arc<dyn CommandCenterFactory>,
    pub activity: Arc<dyn ActivityLog>,
}

/// Result of a successful [`AccessCodeOrchestrator::update_unit_access_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The code was already live on the unit; nothing was written.
    Unchanged,
    /// The new code was stored and pushed to the gate.
    Updated {
        /// Rows rewritten to `remove`.
        superseded: Vec<GateAccessCode>,
        /// Units passed to the revoke call (empty when it was skipped).
        revoked_units: Vec<UnitId>,
    },
}

impl UpdateOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// What step 3 decided for a unit's existing codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Supersession {
    AlreadyLive,
    Replace {
        to_remove: Vec<GateAccessCode>,
        revoke_units: Vec<UnitId>,
    },
}

/// Classify the codes on record against `desired`.
///
/// A live row already carrying `desired` wins outright. Otherwise every
/// supersedable row is rewritten to `remove`; settled rows are left alone.
/// Revoke units keep first-seen order without repeats.
pub(crate) fn plan_supersession(
    existing: &[GateAccessCode],
    desired: &str,
) -> Result<Supersession, TransitionError> {
    let mut to_remove = Vec::new();
    let mut revoke_units: Vec<UnitId> = Vec::new();

    for code in existing {
        if code.state.is_active_equivalent() && code.access_code == desired {
            return Ok(Supersession::AlreadyLive);
        }
        if code.state.is_supersedable() {
            let mut superseded = code.clone();
            superseded.clear_annotations();
            superseded.transition_to(AccessCodeState::Remove)?;
            to_remove.push(superseded);
            if !revoke_units.contains(&code.unit_id) {
                revoke_units.push(code.unit_id);
            }
        }
    }

    Ok(Supersession::Replace {
        to_remove,
        revoke_units,
    })
}

/// Request-scoped coordinator for access code changes.
///
/// Holds no per-request state; the unit lock registry and the sync journal
/// are the only things shared between requests.
pub struct AccessCodeOrchestrator {
    pub(crate) directory: Arc<dyn Directory>,
    pub(crate) store: Arc<dyn AccessCodeStore>,
    pub(crate) command_centers: Arc<dyn CommandCenterFactory>,
    pub(crate) activity: Arc<dyn ActivityLog>,
    validator: AccessCodeValidator,
    locks: UnitLocks,
    journal: SyncJournal,
}

impl AccessCodeOrchestrator {
    pub fn new(collaborators: Collaborators, policy: CodePolicy) -> Self {
        let validator = AccessCodeValidator::new(policy, Arc::clone(&collaborators.store));
        Self {
            directory: collaborators.directory,
            store: collaborators.store,
            command_centers: collaborators.command_centers,
            activity: collaborators.activity,
            validator,
            locks: UnitLocks::new(),
            journal: SyncJournal::new(),
        }
    }

    pub fn validator(&self) -> &AccessCodeValidator {
        &self.validator
    }

    /// Command-center calls still owed to the gate.
    pub fn journal(&self) -> &SyncJournal {
        &self.journal
    }

    // ── Eligibility ──────────────────────────────────────────────────

    /// Resolve `user_id` and check it may act for `company_uuid` at `site_id`.
    ///
    /// The company check runs before the site check.
    pub async fn validate_user(
        &self,
        user_id: UserId,
        company_uuid: &str,
        site_id: SiteId,
        ctx: &RequestContext,
    ) -> Result<BusinessUser, CoreError> {
        let user = ctx
            .run(self.directory.get_user_by_id(user_id))
            .await
            .map_err(|source| {
                if source.is_not_found() {
                    CoreError::UserNotFound { user_id }
                } else {
                    CoreError::UserLookup { user_id, source }
                }
            })?;

        if user.company_uuid != company_uuid {
            debug!(user = %user_id, "user belongs to another company");
            return Err(CoreError::UserNotInCompany { user_id });
        }
        if !user.has_site(site_id) {
            debug!(user = %user_id, site = %site_id, "user not associated with site");
            return Err(CoreError::UserSiteMismatch { user_id, site_id });
        }
        Ok(user)
    }

    /// Check `unit_id` exists at `site_id` and is not in a blocking state.
    pub async fn validate_unit(
        &self,
        unit_id: UnitId,
        site_id: SiteId,
        ctx: &RequestContext,
    ) -> Result<(), CoreError> {
        let unit = ctx
            .run(self.directory.get_unit_by_id(unit_id, site_id))
            .await
            .map_err(|source| CoreError::UnitNotFound {
                unit_id,
                site_id,
                source,
            })?;

        if unit.site_id != site_id {
            return Err(CoreError::UnitSiteMismatch { unit_id, site_id });
        }
        if unit.rental_state.is_blocking() {
            debug!(unit = %unit_id, state = %unit.rental_state, "unit is locked");
            return Err(CoreError::UnitLocked {
                unit_id,
                state: unit.rental_state,
            });
        }
        Ok(())
    }

    // ── Code update ──────────────────────────────────────────────────

    /// Make `desired` the live code for `unit_id`.
    ///
    /// Holds the unit's lock from the first read to the last command-center
    /// call. Errors from step 4 onward may leave the store changed; see
    /// [`CoreError::store_may_have_changed`].
    pub async fn update_unit_access_code(
        &self,
        unit_id: UnitId,
        user_id: UserId,
        site_id: SiteId,
        desired: &str,
        ctx: &RequestContext,
    ) -> Result<UpdateOutcome, CoreError> {
        let _guard = self.locks.acquire(site_id, unit_id, ctx).await?;

        // 1. Validate the candidate
        let candidate = self
            .validate_candidate(unit_id, user_id, site_id, desired, ctx)
            .await?;

        // 2. Codes on record
        let existing = ctx
            .run(self.store.get_codes_for_units(&[unit_id], site_id))
            .await
            .map_err(|source| CoreError::CodeLookup { unit_id, source })?;
        debug!(unit = %unit_id, existing = existing.len(), "loaded codes on record");

        // 3. Diff
        let plan = plan_supersession(&existing, desired).map_err(|e| {
            CoreError::IllegalTransition {
                unit_id,
                from: e.from,
                to: e.to,
            }
        })?;
        let (to_remove, revoke_units) = match plan {
            Supersession::AlreadyLive => {
                debug!(unit = %unit_id, "code already live, nothing to do");
                return Ok(UpdateOutcome::Unchanged);
            }
            Supersession::Replace {
                to_remove,
                revoke_units,
            } => (to_remove, revoke_units),
        };

        // 4. Mark superseded codes for removal
        if !to_remove.is_empty() {
            ctx.run(self.store.update_access_codes(&to_remove, site_id))
                .await
                .map_err(|source| CoreError::OldCodeUpdate { unit_id, source })?;
            debug!(unit = %unit_id, count = to_remove.len(), "superseded codes marked remove");
        }

        // 5. Persist the new code
        ctx.run(
            self.store
                .update_access_codes(std::slice::from_ref(&candidate), site_id),
        )
        .await
        .map_err(|source| CoreError::NewCodeUpdate { unit_id, source })?;

        // 6–8. Push to the gate
        let command_center = self.command_centers.client_for(site_id, ctx.cancel_token());
        let options = AccessCodeOptions::new();

        if !revoke_units.is_empty() {
            let revoked = ctx
                .run(command_center.revoke_access_codes(&revoke_units, &options))
                .await;
            if let Err(source) = revoked {
                warn!(
                    unit = %unit_id,
                    site = %site_id,
                    error = %source,
                    "revoke failed after store update; gate is behind the store"
                );
                self.journal
                    .record(site_id, SyncOperation::Revoke, revoke_units.clone(), &source);
                self.journal
                    .record(site_id, SyncOperation::Set, vec![unit_id], &source);
                return Err(CoreError::RevokeFailed {
                    unit_id,
                    revoked_units: revoke_units,
                    source,
                });
            }
        }

        if let Err(source) = ctx
            .run(command_center.set_access_codes(&[unit_id], &options))
            .await
        {
            warn!(
                unit = %unit_id,
                site = %site_id,
                error = %source,
                "set failed after store update; gate is behind the store"
            );
            self.journal
                .record(site_id, SyncOperation::Set, vec![unit_id], &source);
            return Err(CoreError::SetFailed { unit_id, source });
        }

        info!(
            unit = %unit_id,
            site = %site_id,
            superseded = to_remove.len(),
            "access code updated"
        );
        Ok(UpdateOutcome::Updated {
            superseded: to_remove,
            revoked_units: revoke_units,
        })
    }

    async fn validate_candidate(
        &self,
        unit_id: UnitId,
        user_id: UserId,
        site_id: SiteId,
        desired: &str,
        ctx: &RequestContext,
    ) -> Result<GateAccessCode, CoreError> {
        let candidate = GateAccessCode::new_setup(desired, unit_id, user_id, site_id);
        let mut checked = self
            .validator
            .validate(vec![candidate], ctx)
            .await
            .map_err(|source| CoreError::ValidationInternal { unit_id, source })?;
        let mut candidate = checked.pop().ok_or(CoreError::ValidationInternal {
            unit_id,
            source: ValidationError::EmptyBatch,
        })?;

        if !candidate.is_valid {
            if candidate.has_reason(ValidationReason::DuplicateCode) {
                return Err(CoreError::DuplicateAccessCode { unit_id });
            }
            return Err(CoreError::InvalidAccessCode {
                unit_id,
                reasons: candidate.validation_reasons,
            });
        }
        candidate.clear_annotations();
        Ok(candidate)
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Replay journaled command-center calls for `site_id`, oldest first.
    ///
    /// Successful calls leave the journal. A failed call keeps its entry
    /// and holds back later entries touching the same units; once the
    /// request is cancelled the remaining entries are deferred untouched.
    pub async fn reconcile(&self, site_id: SiteId, ctx: &RequestContext) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let pending = self.journal.pending_for_site(site_id);
        if pending.is_empty() {
            return report;
        }

        let command_center = self.command_centers.client_for(site_id, ctx.cancel_token());
        let mut blocked: HashSet<UnitId> = HashSet::new();
        let mut aborted = false;

        for entry in pending {
            if aborted || entry.unit_ids.iter().any(|u| blocked.contains(u)) {
                report.deferred.push(entry.id);
                continue;
            }

            match self.replay(command_center.as_ref(), &entry, ctx).await {
                Ok(()) => {
                    self.journal.resolve(entry.id);
                    info!(
                        site = %site_id,
                        operation = %entry.operation,
                        units = ?entry.unit_ids,
                        "journaled command-center call replayed"
                    );
                    report.resolved.push(entry.id);
                }
                Err(err) if err.is_aborted() => {
                    aborted = true;
                    report.deferred.push(entry.id);
                }
                Err(err) => {
                    warn!(
                        site = %site_id,
                        operation = %entry.operation,
                        error = %err,
                        "journaled command-center call failed again"
                    );
                    self.journal.record_failure(entry.id, &err);
                    blocked.extend(entry.unit_ids.iter().copied());
                    report.failed.push(entry.id);
                }
            }
        }
        report
    }

    async fn replay(
        &self,
        command_center: &dyn CommandCenter,
        entry: &PendingSync,
        ctx: &RequestContext,
    ) -> Result<(), CollaboratorError> {
        let mut units = entry.unit_ids.clone();
        units.sort();
        let mut guards = Vec::with_capacity(units.len());
        for unit in units {
            let guard = self
                .locks
                .acquire(entry.site_id, unit, ctx)
                .await
                .map_err(|_| CollaboratorError::Cancelled)?;
            guards.push(guard);
        }

        let options = AccessCodeOptions::new();
        match entry.operation {
            SyncOperation::Revoke => {
                ctx.run(command_center.revoke_access_codes(&entry.unit_ids, &options))
                    .await
            }
            SyncOperation::Set => {
                ctx.run(command_center.set_access_codes(&entry.unit_ids, &options))
                    .await
            }
        }
    }
}
