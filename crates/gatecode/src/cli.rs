//! Clap derive structures for the `gatecode` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gatecode -- drive gate access code lifecycles from the command line
#[derive(Debug, Parser)]
#[command(
    name = "gatecode",
    version,
    about = "Manage gate access codes for self-storage sites",
    long_about = "Operator CLI for gate access codes.\n\n\
        Talks to a site's command center directly (revoke, set), checks codes\n\
        against the configured policy, and runs full edits against a JSON\n\
        snapshot of users, units and codes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Command-center profile to use
    #[arg(long, short = 'p', env = "GATECODE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Command-center URL (overrides profile)
    #[arg(long, short = 'c', env = "GATECODE_COMMAND_CENTER", global = true)]
    pub command_center: Option<String>,

    /// Command-center API key
    #[arg(long, env = "GATECODE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GATECODE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "GATECODE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "GATECODE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Revoke the codes programmed for units at the command center
    Revoke(UnitsArgs),

    /// Program the codes on record for units into the gate
    Set(UnitsArgs),

    /// Check codes against the configured access code policy
    Check(CheckArgs),

    /// Run a full access code edit against a JSON snapshot
    Edit(EditArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command center ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UnitsArgs {
    /// Site id (defaults to the profile's site)
    #[arg(long, short = 's')]
    pub site: Option<u64>,

    /// Unit id (repeatable)
    #[arg(long = "unit", short = 'u', required = true, num_args = 1..)]
    pub units: Vec<u64>,

    /// Opaque option flag forwarded to the controller (repeatable)
    #[arg(long = "option")]
    pub options: Vec<String>,
}

// ── Check ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Codes to check
    #[arg(required = true)]
    pub codes: Vec<String>,
}

// ── Edit ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EditArgs {
    /// JSON snapshot with `users`, `units` and `codes`
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Site the edit runs against (defaults to the profile's site)
    #[arg(long, short = 's')]
    pub site: Option<u64>,

    /// Company the acting session belongs to
    #[arg(long)]
    pub company: String,

    /// Acting operator's user id
    #[arg(long, default_value = "0")]
    pub actor: u64,

    /// Tenant whose code is being edited
    #[arg(long)]
    pub user: u64,

    /// Unit id (repeatable)
    #[arg(long = "unit", short = 'u', required = true, num_args = 1..)]
    pub units: Vec<u64>,

    /// New access code
    #[arg(long)]
    pub code: String,

    /// Log command-center calls instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Write the resulting codes back into the snapshot file
    #[arg(long)]
    pub write: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Create initial config file with guided setup
    Init,

    /// Store the active profile's API key in the system keyring
    SetApiKey,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
