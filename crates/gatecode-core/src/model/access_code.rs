// ── Gate access code domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

use super::ids::{SiteId, UnitId, UserId};

/// Lifecycle state of a gate access code row.
///
/// Wire names are the lowercase variant names (`"setup"`, `"removing"`, ...).
/// The core only writes `Setup` (new codes) and `Remove` (superseded codes);
/// every other transition is driven by the command center and merely
/// observed here.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccessCodeState {
    Setup,
    Active,
    Pending,
    Inactive,
    Removed,
    Removing,
    Overlocking,
    Overlocked,
    Remove,
}

impl AccessCodeState {
    /// Live on the gate, or on its way there.
    pub const fn is_active_equivalent(self) -> bool {
        matches!(self, Self::Active | Self::Setup | Self::Pending)
    }

    /// Terminal or already in flight at the command center. Rows in these
    /// states are never re-targeted for removal.
    pub const fn is_settled(self) -> bool {
        matches!(
            self,
            Self::Inactive | Self::Removed | Self::Removing | Self::Overlocking | Self::Overlocked
        )
    }

    /// May be marked `remove` when a newer code is requested for the unit.
    pub const fn is_supersedable(self) -> bool {
        !self.is_settled()
    }

    /// States reachable from `self` in one step (excluding `self`).
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Setup => &[Self::Active, Self::Pending, Self::Remove],
            Self::Pending => &[Self::Active, Self::Setup, Self::Remove],
            Self::Active => &[Self::Remove, Self::Overlocking, Self::Inactive],
            Self::Remove => &[Self::Removing],
            Self::Removing => &[Self::Removed],
            Self::Overlocking => &[Self::Overlocked],
            Self::Overlocked => &[Self::Active],
            Self::Removed | Self::Inactive => &[Self::Setup],
        }
    }

    /// Whether `self -> next` is a legal transition. Staying put is always legal.
    pub fn can_transition_to(self, next: Self) -> bool {
        self == next || self.allowed_transitions().contains(&next)
    }
}

/// Rejected state change on a [`GateAccessCode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal access code transition {from} -> {to}")]
pub struct TransitionError {
    pub from: AccessCodeState,
    pub to: AccessCodeState,
}

/// Why a candidate code was flagged invalid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValidationReason {
    /// The value is already live on another unit at the same site.
    DuplicateCode,
    Empty,
    TooShort,
    TooLong,
    DisallowedCharacter,
}

/// Identity of a code row for upsert decisions: (value, unit, site).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodeKey {
    pub site_id: SiteId,
    pub unit_id: UnitId,
    pub access_code: String,
}

/// One access code issued to a user for a unit.
///
/// `is_valid` and `validation_reasons` are per-pass annotations written by
/// the validator; they are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateAccessCode {
    pub access_code: String,
    pub unit_id: UnitId,
    pub user_id: UserId,
    pub site_id: SiteId,
    pub state: AccessCodeState,
    #[serde(skip)]
    pub is_valid: bool,
    #[serde(skip)]
    pub validation_reasons: Vec<ValidationReason>,
}

impl GateAccessCode {
    /// A freshly requested code in state `setup`.
    pub fn new_setup(
        access_code: impl Into<String>,
        unit_id: UnitId,
        user_id: UserId,
        site_id: SiteId,
    ) -> Self {
        Self::with_state(access_code, unit_id, user_id, site_id, AccessCodeState::Setup)
    }

    pub fn with_state(
        access_code: impl Into<String>,
        unit_id: UnitId,
        user_id: UserId,
        site_id: SiteId,
        state: AccessCodeState,
    ) -> Self {
        Self {
            access_code: access_code.into(),
            unit_id,
            user_id,
            site_id,
            state,
            is_valid: false,
            validation_reasons: Vec::new(),
        }
    }

    pub fn key(&self) -> CodeKey {
        CodeKey {
            site_id: self.site_id,
            unit_id: self.unit_id,
            access_code: self.access_code.clone(),
        }
    }

    /// Move to `next`, enforcing the lifecycle transition table.
    pub fn transition_to(&mut self, next: AccessCodeState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub fn mark_valid(&mut self) {
        self.is_valid = true;
        self.validation_reasons.clear();
    }

    /// Flag the code invalid for `reason` (recorded once).
    pub fn flag(&mut self, reason: ValidationReason) {
        self.is_valid = false;
        if !self.validation_reasons.contains(&reason) {
            self.validation_reasons.push(reason);
        }
    }

    pub fn has_reason(&self, reason: ValidationReason) -> bool {
        self.validation_reasons.contains(&reason)
    }

    /// Drop the per-pass validation annotations.
    pub fn clear_annotations(&mut self) {
        self.is_valid = false;
        self.validation_reasons.clear();
    }
}
