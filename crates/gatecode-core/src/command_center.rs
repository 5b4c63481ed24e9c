// ── Command center boundary ──
//
// The orchestrator only ever asks a command center to revoke or set the
// codes on record for a list of units. Vendor integrations implement
// `CommandCenter`; `CommandCenterFactory` hands out one per site per request.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use gatecode_api::{CommandCenterClient, UnitAck};

pub use gatecode_api::AccessCodeOptions;

use crate::config::CommandCenterConfig;
use crate::error::CollaboratorError;
use crate::model::{SiteId, UnitId};

/// Physical access-control subsystem for one site.
#[async_trait]
pub trait CommandCenter: Send + Sync {
    async fn revoke_access_codes(
        &self,
        unit_ids: &[UnitId],
        options: &AccessCodeOptions,
    ) -> Result<(), CollaboratorError>;

    async fn set_access_codes(
        &self,
        unit_ids: &[UnitId],
        options: &AccessCodeOptions,
    ) -> Result<(), CollaboratorError>;
}

/// Builds a site-scoped [`CommandCenter`] bound to a request's cancellation.
pub trait CommandCenterFactory: Send + Sync {
    fn client_for(&self, site_id: SiteId, cancel: &CancellationToken) -> Arc<dyn CommandCenter>;
}

fn raw_ids(unit_ids: &[UnitId]) -> Vec<u64> {
    unit_ids.iter().map(|u| u.get()).collect()
}

// ── HTTP command center ──────────────────────────────────────────────

/// [`CommandCenter`] backed by the `gatecode-api` HTTP client.
pub struct HttpCommandCenter {
    client: CommandCenterClient,
}

impl HttpCommandCenter {
    pub fn new(client: CommandCenterClient) -> Self {
        Self { client }
    }
}

fn log_acks(operation: &str, site: u64, acks: &[UnitAck]) {
    for ack in acks {
        tracing::debug!(
            operation,
            site,
            unit = ack.unit_id,
            status = ack.status.as_deref().unwrap_or("unknown"),
            "command center acknowledged unit"
        );
    }
}

#[async_trait]
impl CommandCenter for HttpCommandCenter {
    async fn revoke_access_codes(
        &self,
        unit_ids: &[UnitId],
        options: &AccessCodeOptions,
    ) -> Result<(), CollaboratorError> {
        let acks = self
            .client
            .revoke_access_codes(&raw_ids(unit_ids), options)
            .await?;
        log_acks("revoke", self.client.site_id(), &acks);
        Ok(())
    }

    async fn set_access_codes(
        &self,
        unit_ids: &[UnitId],
        options: &AccessCodeOptions,
    ) -> Result<(), CollaboratorError> {
        let acks = self
            .client
            .set_access_codes(&raw_ids(unit_ids), options)
            .await?;
        log_acks("set", self.client.site_id(), &acks);
        Ok(())
    }
}

/// Hands out [`HttpCommandCenter`]s that share one connection pool.
pub struct HttpCommandCenterFactory {
    root: CommandCenterClient,
}

impl HttpCommandCenterFactory {
    pub fn new(config: &CommandCenterConfig) -> Result<Self, CollaboratorError> {
        let root = CommandCenterClient::new(
            config.url.clone(),
            0,
            config.api_key.as_ref(),
            &config.transport(),
            CancellationToken::new(),
        )?;
        Ok(Self { root })
    }

    /// Wrap an existing client; its HTTP pool and base URL are reused.
    pub fn from_client(root: CommandCenterClient) -> Self {
        Self { root }
    }
}

impl CommandCenterFactory for HttpCommandCenterFactory {
    fn client_for(&self, site_id: SiteId, cancel: &CancellationToken) -> Arc<dyn CommandCenter> {
        let client = self.root.for_site(site_id.get(), cancel.clone());
        Arc::new(HttpCommandCenter::new(client))
    }
}

// ── Dry-run command center ───────────────────────────────────────────

/// Logs revoke / set calls instead of touching hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCommandCenter {
    site_id: Option<SiteId>,
}

impl LoggingCommandCenter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommandCenter for LoggingCommandCenter {
    async fn revoke_access_codes(
        &self,
        unit_ids: &[UnitId],
        options: &AccessCodeOptions,
    ) -> Result<(), CollaboratorError> {
        info!(site = ?self.site_id, ?unit_ids, ?options, "dry run: would revoke access codes");
        Ok(())
    }

    async fn set_access_codes(
        &self,
        unit_ids: &[UnitId],
        options: &AccessCodeOptions,
    ) -> Result<(), CollaboratorError> {
        info!(site = ?self.site_id, ?unit_ids, ?options, "dry run: would set access codes");
        Ok(())
    }
}

impl CommandCenterFactory for LoggingCommandCenter {
    fn client_for(&self, site_id: SiteId, _cancel: &CancellationToken) -> Arc<dyn CommandCenter> {
        Arc::new(Self {
            site_id: Some(site_id),
        })
    }
}
