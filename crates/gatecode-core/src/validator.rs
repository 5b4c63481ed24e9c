// ── Access code validator ──
//
// Classifies a candidate batch: structural checks against the site's code
// policy, then duplicate detection within the batch and against live codes
// held by other users on other units. A tenant may reuse one code across
// their own units. Never writes.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::ValidationError;
use crate::model::{GateAccessCode, SiteId, UnitId, UserId, ValidationReason};
use crate::store::AccessCodeStore;

/// Structural rules for access code values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodePolicy {
    pub min_length: usize,
    pub max_length: usize,
    /// Only ASCII digits (keypads). When false, ASCII letters are accepted too.
    pub digits_only: bool,
}

impl Default for CodePolicy {
    fn default() -> Self {
        Self {
            min_length: 4,
            max_length: 8,
            digits_only: true,
        }
    }
}

/// A [`CodePolicy`] whose bounds contradict each other.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid access code policy: {0}")]
pub struct PolicyError(String);

impl CodePolicy {
    /// Reject policies no code could ever satisfy.
    pub fn validated(self) -> Result<Self, PolicyError> {
        if self.min_length == 0 {
            return Err(PolicyError("min_length must be at least 1".into()));
        }
        if self.min_length > self.max_length {
            return Err(PolicyError(format!(
                "min_length {} exceeds max_length {}",
                self.min_length, self.max_length
            )));
        }
        Ok(self)
    }

    /// Structural reasons `code` violates this policy (empty when it complies).
    pub fn check(&self, code: &str) -> Vec<ValidationReason> {
        if code.is_empty() {
            return vec![ValidationReason::Empty];
        }

        let mut reasons = Vec::new();
        let len = code.chars().count();
        if len < self.min_length {
            reasons.push(ValidationReason::TooShort);
        } else if len > self.max_length {
            reasons.push(ValidationReason::TooLong);
        }

        let allowed = |c: char| {
            if self.digits_only {
                c.is_ascii_digit()
            } else {
                c.is_ascii_alphanumeric()
            }
        };
        if !code.chars().all(allowed) {
            reasons.push(ValidationReason::DisallowedCharacter);
        }
        reasons
    }
}

/// Stateless rule checker; reads the store only for duplicate lookups.
#[derive(Clone)]
pub struct AccessCodeValidator {
    policy: CodePolicy,
    store: Arc<dyn AccessCodeStore>,
}

impl AccessCodeValidator {
    pub fn new(policy: CodePolicy, store: Arc<dyn AccessCodeStore>) -> Self {
        Self { policy, store }
    }

    pub fn policy(&self) -> &CodePolicy {
        &self.policy
    }

    /// Annotate every candidate in `batch` and hand the batch back.
    ///
    /// Candidates that pass are marked valid; the rest carry at least one
    /// reason. Only infrastructure problems return `Err`.
    pub async fn validate(
        &self,
        mut batch: Vec<GateAccessCode>,
        ctx: &RequestContext,
    ) -> Result<Vec<GateAccessCode>, ValidationError> {
        if batch.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }

        let mut first_claim: HashMap<(SiteId, String), (UnitId, UserId)> = HashMap::new();
        let mut live_elsewhere: HashMap<(SiteId, String), Vec<GateAccessCode>> = HashMap::new();

        for candidate in &mut batch {
            candidate.clear_annotations();
            for reason in self.policy.check(&candidate.access_code) {
                candidate.flag(reason);
            }
            if !candidate.validation_reasons.is_empty() {
                continue;
            }

            let key = (candidate.site_id, candidate.access_code.clone());

            match first_claim.get(&key) {
                Some(&(unit, user)) if unit != candidate.unit_id && user != candidate.user_id => {
                    candidate.flag(ValidationReason::DuplicateCode);
                }
                Some(_) => {}
                None => {
                    first_claim.insert(key.clone(), (candidate.unit_id, candidate.user_id));
                }
            }

            if !live_elsewhere.contains_key(&key) {
                let rows = ctx
                    .run(
                        self.store
                            .find_codes_by_value(&candidate.access_code, candidate.site_id),
                    )
                    .await
                    .map_err(ValidationError::Lookup)?;
                live_elsewhere.insert(key.clone(), rows);
            }
            let collides = live_elsewhere.get(&key).is_some_and(|rows| {
                rows.iter().any(|r| {
                    r.unit_id != candidate.unit_id
                        && r.user_id != candidate.user_id
                        && r.state.is_active_equivalent()
                })
            });
            if collides {
                candidate.flag(ValidationReason::DuplicateCode);
            }

            if candidate.validation_reasons.is_empty() {
                candidate.mark_valid();
            } else {
                debug!(
                    unit = %candidate.unit_id,
                    reasons = ?candidate.validation_reasons,
                    "access code candidate rejected"
                );
            }
        }

        Ok(batch)
    }
}
