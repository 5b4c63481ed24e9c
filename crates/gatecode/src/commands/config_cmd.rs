//! Config subcommand handlers.

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let _ = writeln!(out);
    let _ = writeln!(out, "[access_codes]");
    let _ = writeln!(out, "min_length = {}", cfg.access_codes.min_length);
    let _ = writeln!(out, "max_length = {}", cfg.access_codes.max_length);
    let _ = writeln!(out, "digits_only = {}", cfg.access_codes.digits_only);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "command_center = \"{}\"", p.command_center);
        if let Some(site) = p.site {
            let _ = writeln!(out, "site = {site}");
        }
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Read an API key from the terminal without echo.
fn prompt_api_key() -> Result<String, CliError> {
    let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }
    Ok(key)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            // Never print plaintext keys, whatever the output format.
            let mut redacted = cfg.clone();
            for profile in redacted.profiles.values_mut() {
                if profile.api_key.is_some() {
                    profile.api_key = Some("****".into());
                }
            }
            let out = output::render_single(
                &global.output,
                &redacted,
                format_config_redacted,
                |_| "config".into(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init => init(),

        ConfigCommand::SetApiKey => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let key = prompt_api_key()?;
            config::store_api_key(&profile_name, &key)?;
            eprintln!("✓ API key stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("gatecode configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Command-center URL
    let command_center: String = Input::new()
        .with_prompt("Command-center URL")
        .default("https://cc.example.com".into())
        .interact_text()
        .map_err(prompt_err)?;
    if command_center.parse::<url::Url>().is_err() {
        return Err(CliError::Validation {
            field: "command_center".into(),
            reason: format!("invalid URL: {command_center}"),
        });
    }

    // 3. Default site
    let site: u64 = Input::new()
        .with_prompt("Default site id")
        .interact_text()
        .map_err(prompt_err)?;

    // 4. API key and where to keep it
    let key = prompt_api_key()?;
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the API key?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let api_key = if selection == 0 {
        config::store_api_key(&profile_name, &key)?;
        eprintln!("   ✓ API key stored in system keyring");
        None
    } else {
        Some(key)
    };

    // 5. Merge into the existing config
    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            command_center,
            site: Some(site),
            api_key,
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(profile_name.clone());

    let path = config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: gatecode set --unit <UNIT_ID>");

    Ok(())
}
