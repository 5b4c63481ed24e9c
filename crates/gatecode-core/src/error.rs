// ── Core error types ──
//
// Every collaborator failure is wrapped with the step and unit it happened
// on. The `Display` text of `CoreError` is safe to hand to an HTTP caller:
// collaborator detail lives only in the `#[source]` chain.

use thiserror::Error;

use crate::model::{AccessCodeState, RentalState, SiteId, UnitId, UserId, ValidationReason};

// ── Collaborator errors ──────────────────────────────────────────────

/// Failure reported by a directory, store, command center or activity log.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("request rejected: {message}")]
    Rejected { message: String },

    #[error("backend unavailable: {message}")]
    Unavailable { message: String },

    #[error("call cancelled by caller")]
    Cancelled,

    #[error("call exceeded the request deadline")]
    Timeout,

    #[error(transparent)]
    CommandCenter(gatecode_api::Error),
}

impl CollaboratorError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::CommandCenter(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Aborted by the caller's cancellation token or deadline.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout)
    }
}

impl From<gatecode_api::Error> for CollaboratorError {
    fn from(err: gatecode_api::Error) -> Self {
        match err {
            gatecode_api::Error::Cancelled => Self::Cancelled,
            gatecode_api::Error::Timeout { .. } => Self::Timeout,
            other => Self::CommandCenter(other),
        }
    }
}

// ── Validator errors ─────────────────────────────────────────────────

/// Infrastructure failure of a validation pass (not an invalid code).
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no access codes provided")]
    EmptyBatch,

    #[error("duplicate lookup failed")]
    Lookup(#[source] CollaboratorError),
}

// ── Error classification ─────────────────────────────────────────────

/// Coarse disposition of a [`CoreError`], one per HTTP status class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    Infrastructure,
}

impl ErrorKind {
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Infrastructure => 500,
        }
    }

    /// Only infrastructure failures are worth retrying from the caller side.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Infrastructure)
    }
}

// ── Core error ───────────────────────────────────────────────────────

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Request errors ───────────────────────────────────────────────
    #[error("missing or invalid session")]
    Unauthorized,

    #[error("Invalid UUID: {value}")]
    InvalidReference { field: &'static str, value: String },

    // ── Eligibility errors ───────────────────────────────────────────
    #[error("user not found")]
    UserNotFound { user_id: UserId },

    #[error("internal server error looking up user")]
    UserLookup {
        user_id: UserId,
        #[source]
        source: CollaboratorError,
    },

    #[error("user not found in company")]
    UserNotInCompany { user_id: UserId },

    #[error("invalid user, missing association with target site")]
    UserSiteMismatch { user_id: UserId, site_id: SiteId },

    /// Any failed unit lookup, missing or not.
    #[error("unit not found")]
    UnitNotFound {
        unit_id: UnitId,
        site_id: SiteId,
        #[source]
        source: CollaboratorError,
    },

    #[error("invalid unit, missing association with target site")]
    UnitSiteMismatch { unit_id: UnitId, site_id: SiteId },

    #[error("access code changes not allowed - unit in {state}")]
    UnitLocked { unit_id: UnitId, state: RentalState },

    // ── Code errors ──────────────────────────────────────────────────
    #[error("duplicate access code")]
    DuplicateAccessCode { unit_id: UnitId },

    #[error("invalid access code")]
    InvalidAccessCode {
        unit_id: UnitId,
        reasons: Vec<ValidationReason>,
    },

    // ── Infrastructure errors (one per orchestration step) ───────────
    #[error("internal server error during validation")]
    ValidationInternal {
        unit_id: UnitId,
        #[source]
        source: ValidationError,
    },

    #[error("internal server error reading access codes for unit {unit_id}")]
    CodeLookup {
        unit_id: UnitId,
        #[source]
        source: CollaboratorError,
    },

    #[error("internal server error marking previous access codes for removal on unit {unit_id}")]
    OldCodeUpdate {
        unit_id: UnitId,
        #[source]
        source: CollaboratorError,
    },

    #[error("internal server error saving the new access code for unit {unit_id}")]
    NewCodeUpdate {
        unit_id: UnitId,
        #[source]
        source: CollaboratorError,
    },

    #[error("failed to revoke previous access codes for unit {unit_id}")]
    RevokeFailed {
        unit_id: UnitId,
        revoked_units: Vec<UnitId>,
        #[source]
        source: CollaboratorError,
    },

    #[error("failed to set access codes for unit {unit_id}")]
    SetFailed {
        unit_id: UnitId,
        #[source]
        source: CollaboratorError,
    },

    #[error("illegal access code transition {from} -> {to} on unit {unit_id}")]
    IllegalTransition {
        unit_id: UnitId,
        from: AccessCodeState,
        to: AccessCodeState,
    },

    #[error("request cancelled while waiting for unit {unit_id}")]
    Cancelled { unit_id: UnitId },

    #[error("recording activity failed")]
    ActivityRecordFailed {
        #[source]
        source: CollaboratorError,
    },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::InvalidReference { .. } | Self::InvalidAccessCode { .. } => {
                ErrorKind::BadRequest
            }
            Self::UserNotInCompany { .. }
            | Self::UserSiteMismatch { .. }
            | Self::UnitSiteMismatch { .. }
            | Self::UnitLocked { .. } => ErrorKind::Forbidden,
            Self::UserNotFound { .. } | Self::UnitNotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateAccessCode { .. } => ErrorKind::Conflict,
            Self::UserLookup { .. }
            | Self::ValidationInternal { .. }
            | Self::CodeLookup { .. }
            | Self::OldCodeUpdate { .. }
            | Self::NewCodeUpdate { .. }
            | Self::RevokeFailed { .. }
            | Self::SetFailed { .. }
            | Self::IllegalTransition { .. }
            | Self::Cancelled { .. }
            | Self::ActivityRecordFailed { .. } => ErrorKind::Infrastructure,
        }
    }

    /// HTTP status the request surface answers with.
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Whether local storage may already reflect part of the request.
    ///
    /// True from the first store write onward; callers must not assume an
    /// error left the unit untouched.
    pub fn store_may_have_changed(&self) -> bool {
        matches!(
            self,
            Self::OldCodeUpdate { .. }
                | Self::NewCodeUpdate { .. }
                | Self::RevokeFailed { .. }
                | Self::SetFailed { .. }
        )
    }
}
