//! Direct command-center calls: revoke and set.

use serde::Serialize;
use tabled::Tabled;

use gatecode_api::{AccessCodeOptions, CommandCenterClient, UnitAck};

use crate::cli::{GlobalOpts, UnitsArgs};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Revoke,
    Set,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Revoke => "revoke",
            Self::Set => "set",
        }
    }
}

#[derive(Serialize)]
struct AckView {
    site_id: u64,
    #[serde(flatten)]
    ack: UnitAck,
}

#[derive(Tabled)]
struct AckRow {
    #[tabled(rename = "Site")]
    site: u64,
    #[tabled(rename = "Unit")]
    unit: u64,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&AckView> for AckRow {
    fn from(v: &AckView) -> Self {
        Self {
            site: v.site_id,
            unit: v.ack.unit_id,
            status: v.ack.status.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

pub async fn handle(op: Operation, args: UnitsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve_command_center(global)?;
    let site = util::resolve_site(args.site, resolved.default_site)?;
    let cc = &resolved.command_center;
    let url = cc.url.to_string();

    if op == Operation::Revoke {
        let prompt = format!(
            "Revoke access codes for {} unit(s) at site {site}?",
            args.units.len()
        );
        if !util::confirm(&prompt, "revoke", global.yes)? {
            return Ok(());
        }
    }

    let options = args
        .options
        .into_iter()
        .fold(AccessCodeOptions::new(), |opts, flag| opts.with_flag(flag));

    let client = CommandCenterClient::new(
        cc.url.clone(),
        site.get(),
        cc.api_key.as_ref(),
        &cc.transport(),
        util::interrupt_token(),
    )
    .map_err(|e| CliError::from_api(e, &url, &resolved.profile_name))?;

    tracing::debug!(operation = op.as_str(), %site, units = ?args.units, "calling command center");
    let acks = match op {
        Operation::Revoke => client.revoke_access_codes(&args.units, &options).await,
        Operation::Set => client.set_access_codes(&args.units, &options).await,
    }
    .map_err(|e| CliError::from_api(e, &url, &resolved.profile_name))?;

    let views: Vec<AckView> = acks
        .into_iter()
        .map(|ack| AckView {
            site_id: site.get(),
            ack,
        })
        .collect();
    let out = output::render_list(&global.output, &views, |v| AckRow::from(v), |v| {
        v.ack.unit_id.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
