//! Structural policy check for candidate codes.

use serde::Serialize;
use tabled::Tabled;

use gatecode_core::ValidationReason;

use crate::cli::{CheckArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct CheckResult {
    code: String,
    valid: bool,
    reasons: Vec<ValidationReason>,
}

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Verdict")]
    verdict: String,
    #[tabled(rename = "Reasons")]
    reasons: String,
}

pub fn handle(args: CheckArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let policy = config::load_config_or_default().code_policy()?;
    let color = output::should_color(&global.color);

    let results: Vec<CheckResult> = args
        .codes
        .into_iter()
        .map(|code| {
            let reasons = policy.check(&code);
            CheckResult {
                valid: reasons.is_empty(),
                code,
                reasons,
            }
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &results,
        |r| CheckRow {
            code: r.code.clone(),
            verdict: output::verdict(if r.valid { "valid" } else { "rejected" }, r.valid, color),
            reasons: r
                .reasons
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        },
        |r| format!("{}\t{}", r.code, if r.valid { "valid" } else { "rejected" }),
    )?;
    output::print_output(&out, global.quiet);

    let rejected = results.iter().filter(|r| !r.valid).count();
    if rejected > 0 {
        return Err(CliError::Validation {
            field: "code".into(),
            reason: format!("{rejected} of {} code(s) rejected", results.len()),
        });
    }
    Ok(())
}
