//! CLI configuration -- thin wrapper around `gatecode_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--command-center, --api-key, etc.).

use std::time::Duration;

use secrecy::SecretString;

use gatecode_core::{CommandCenterConfig, SiteId, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use gatecode_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config, store_api_key,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Command-center connection settings plus the profile they came from.
pub struct Resolved {
    pub profile_name: String,
    pub command_center: CommandCenterConfig,
    pub default_site: Option<SiteId>,
}

/// Build a `CommandCenterConfig` from the config file, profile, and CLI overrides.
pub fn resolve_command_center(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    // If a profile exists, use it with CLI flag overrides
    if let Some(profile) = cfg.profiles.get(&profile_name) {
        let command_center = resolve_profile(profile, &profile_name, &cfg.defaults, global)?;
        return Ok(Resolved {
            profile_name,
            command_center,
            default_site: profile.default_site(),
        });
    }

    // No profile found -- try to build from CLI flags / env vars alone
    let url_str = global
        .command_center
        .as_deref()
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;

    let mut command_center = CommandCenterConfig::new(parse_url(url_str)?);
    command_center.api_key = global.api_key.clone().map(SecretString::from);
    if global.insecure {
        command_center.tls = TlsVerification::DangerAcceptInvalid;
    }
    command_center.timeout = Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout));

    Ok(Resolved {
        profile_name,
        command_center,
        default_site: None,
    })
}

/// Translate a `Profile` + global flags into a `CommandCenterConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<CommandCenterConfig, CliError> {
    let mut resolved =
        gatecode_config::profile_to_command_center_config(profile, profile_name, defaults)?;

    // 1. Command-center URL (flag > env > profile)
    if let Some(ref url_str) = global.command_center {
        resolved.url = parse_url(url_str)?;
    }

    // 2. API key (flag > profile chain)
    if let Some(ref key) = global.api_key {
        resolved.api_key = Some(SecretString::from(key.clone()));
    }

    // 3. TLS verification
    if global.insecure {
        resolved.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 4. Timeout
    if let Some(secs) = global.timeout {
        resolved.timeout = Duration::from_secs(secs);
    }

    Ok(resolved)
}

fn parse_url(url_str: &str) -> Result<url::Url, CliError> {
    url_str.parse().map_err(|_| CliError::Validation {
        field: "command_center".into(),
        reason: format!("invalid URL: {url_str}"),
    })
}
