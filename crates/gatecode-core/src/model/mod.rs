// ── Domain model ──

pub mod access_code;
pub mod ids;
pub mod unit;
pub mod user;

pub use access_code::{
    AccessCodeState, CodeKey, GateAccessCode, TransitionError, ValidationReason,
};
pub use ids::{SiteId, UnitId, UserId};
pub use unit::{RentalState, Unit};
pub use user::{BusinessUser, Claims};
