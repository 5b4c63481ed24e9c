//! Full access code edit against a JSON snapshot.
//!
//! The snapshot seeds an in-memory directory and code store; the edit then
//! runs the same orchestration a request handler would, against the real
//! command center or a logging stand-in under `--dry-run`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use gatecode_core::{
    AccessCodeEditRequest, AccessCodeOrchestrator, BusinessUser, Claims, CollaboratorError,
    Collaborators, CommandCenterFactory, GateAccessCode, HttpCommandCenterFactory,
    InMemoryAccessCodeStore, InMemoryDirectory, LoggingCommandCenter, RequestContext, SiteId,
    TracingActivityLog, Unit, UserId,
};

use crate::cli::{EditArgs, GlobalOpts};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

/// Users, units and code rows the edit runs against.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<BusinessUser>,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub codes: Vec<GateAccessCode>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn directory(&self) -> InMemoryDirectory {
        let directory = InMemoryDirectory::new();
        for user in &self.users {
            directory.upsert_user(user.clone());
        }
        for unit in &self.units {
            directory.upsert_unit(unit.clone());
        }
        directory
    }
}

#[derive(Tabled)]
struct CodeRow {
    #[tabled(rename = "Unit")]
    unit: u64,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "User")]
    user: u64,
}

impl From<&GateAccessCode> for CodeRow {
    fn from(c: &GateAccessCode) -> Self {
        Self {
            unit: c.unit_id.get(),
            code: c.access_code.clone(),
            state: c.state.to_string(),
            user: c.user_id.get(),
        }
    }
}

pub async fn handle(args: EditArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile_site = cfg
        .profile(global.profile.as_deref())
        .ok()
        .and_then(|(_, p)| p.default_site());
    let site = util::resolve_site(args.site, profile_site)?;
    let policy = cfg.code_policy()?;
    let timeout = global.timeout.unwrap_or(cfg.defaults.timeout);

    let snapshot = Snapshot::load(&args.snapshot)?;
    let store = Arc::new(InMemoryAccessCodeStore::from_codes(
        snapshot.codes.iter().cloned(),
    ));

    let command_centers: Arc<dyn CommandCenterFactory> = if args.dry_run {
        Arc::new(LoggingCommandCenter::new())
    } else {
        let resolved = config::resolve_command_center(global)?;
        let factory = HttpCommandCenterFactory::new(&resolved.command_center).map_err(|e| {
            collaborator_error(e, resolved.command_center.url.as_str(), &resolved.profile_name)
        })?;
        Arc::new(factory)
    };

    let orchestrator = AccessCodeOrchestrator::new(
        Collaborators {
            directory: Arc::new(snapshot.directory()),
            store: store.clone(),
            command_centers,
            activity: Arc::new(TracingActivityLog),
        },
        policy,
    );

    let claims = Claims {
        company_uuid: args.company,
        current_site: site,
        current_site_uuid: site.to_string(),
        user_id: UserId::new(args.actor),
    };
    let request = AccessCodeEditRequest {
        user_id: args.user,
        unit_ids: args.units,
        access_code: args.code,
        ..AccessCodeEditRequest::default()
    };
    let ctx = RequestContext::with_cancel(util::interrupt_token())
        .with_timeout(Duration::from_secs(timeout));

    let result = orchestrator
        .edit_access_codes(Some(&claims), &request, &ctx)
        .await;

    for pending in orchestrator.journal().pending() {
        tracing::warn!(
            operation = %pending.operation,
            units = ?pending.unit_ids,
            "command center not updated; rerun `gatecode {}` for these units",
            pending.operation
        );
    }

    let store_changed = match &result {
        Ok(_) => true,
        Err(e) => e.store_may_have_changed(),
    };
    if args.write && store_changed {
        let updated = Snapshot {
            codes: store.snapshot(),
            ..snapshot
        };
        updated.save(&args.snapshot)?;
    }

    let report = result?;
    let touched: Vec<GateAccessCode> = store
        .snapshot()
        .into_iter()
        .filter(|c| c.site_id == site && report.updated.contains(&c.unit_id))
        .collect();

    let out = output::render_list(&global.output, &touched, |c| CodeRow::from(c), |c| {
        format!("{}\t{}\t{}", c.unit_id, c.access_code, c.state)
    })?;
    output::print_output(&out, global.quiet);

    if !report.unchanged.is_empty() {
        tracing::info!(units = ?report.unchanged, "code already live, nothing sent");
    }
    Ok(())
}

fn collaborator_error(err: CollaboratorError, url: &str, profile: &str) -> CliError {
    match err {
        CollaboratorError::CommandCenter(api) => CliError::from_api(api, url, profile),
        other => CliError::CommandCenter {
            message: other.to_string(),
        },
    }
}
