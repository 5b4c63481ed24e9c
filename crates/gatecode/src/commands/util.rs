//! Shared helpers for command handlers.

use std::io::IsTerminal;

use tokio_util::sync::CancellationToken;

use gatecode_core::SiteId;

use crate::error::CliError;

/// Pick the explicit `--site`, falling back to the profile's site.
pub fn resolve_site(explicit: Option<u64>, profile_site: Option<SiteId>) -> Result<SiteId, CliError> {
    explicit
        .map(SiteId::new)
        .or(profile_site)
        .ok_or_else(|| CliError::Validation {
            field: "site".into(),
            reason: "pass --site or set `site` on the profile".into(),
        })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// A token that fires on Ctrl-C so in-flight calls stop at the next boundary.
pub fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight calls");
            on_interrupt.cancel();
        }
    });
    cancel
}
