//! Async client for gate command-center controllers.
//!
//! The command center is the controller that programs physical gate keypads.
//! This crate speaks its HTTP API and nothing else: it knows how to revoke
//! and set the access codes on record for a list of units at one site, and
//! how to unwrap the `{ meta: { rc, msg }, data: [...] }` response envelope.
//!
//! - **[`CommandCenterClient`]** — site-scoped client, constructed per request
//!   with the caller's [`CancellationToken`](tokio_util::sync::CancellationToken).
//! - **[`TransportConfig`]** — shared TLS / timeout / user-agent settings.
//! - **[`AccessCodeOptions`]** — opaque flag set passed through to the controller.
//! - **[`Error`]** — every failure mode of the wire layer.

pub mod command_center;
pub mod error;
pub mod transport;

pub use command_center::{AccessCodeOptions, CommandCenterClient, UnitAck};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
