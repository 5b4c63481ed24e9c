// gatecode-core: Access code lifecycle between the edit request surface,
// the code store and the command center.

pub mod activity;
pub mod command_center;
pub mod config;
pub mod context;
pub mod directory;
pub mod edit;
pub mod error;
pub mod journal;
pub mod lock;
pub mod model;
pub mod orchestrator;
pub mod store;
pub mod validator;

// ── Primary re-exports ──────────────────────────────────────────────
pub use activity::{AccessCodeEditActivity, ActivityKind, ActivityLog, TracingActivityLog};
pub use command_center::{
    AccessCodeOptions, CommandCenter, CommandCenterFactory, HttpCommandCenter,
    HttpCommandCenterFactory, LoggingCommandCenter,
};
pub use config::{CommandCenterConfig, TlsVerification};
pub use context::RequestContext;
pub use directory::{Directory, InMemoryDirectory};
pub use edit::{AccessCodeEditRequest, EditReport, ResolvedEdit};
pub use error::{CollaboratorError, CoreError, ErrorKind, ValidationError};
pub use journal::{PendingSync, ReconcileReport, SyncJournal, SyncOperation};
pub use lock::{UnitGuard, UnitLocks};
pub use orchestrator::{AccessCodeOrchestrator, Collaborators, UpdateOutcome};
pub use store::{AccessCodeStore, InMemoryAccessCodeStore};
pub use validator::{AccessCodeValidator, CodePolicy, PolicyError};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AccessCodeState, BusinessUser, Claims, CodeKey, GateAccessCode, RentalState, SiteId,
    TransitionError, Unit, UnitId, UserId, ValidationReason,
};
