// Command-center API client modules
//
// The controller exposes two site-scoped operations, revoke and set, each
// taking a list of unit ids. Responses are wrapped in the standard
// `{ meta: { rc, msg }, data: [...] }` envelope.

pub mod client;
pub mod models;

pub use client::CommandCenterClient;
pub use models::{AccessCodeOptions, UnitAck};
