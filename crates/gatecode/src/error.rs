//! CLI error types with miette diagnostics.
//!
//! Maps core, config and wire errors into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use gatecode_config::ConfigError;
use gatecode_core::{CoreError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to command center at {url}")]
    #[diagnostic(
        code(gatecode::connection_failed),
        help(
            "Check that the command center is running and reachable.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: gatecode_api::Error,
    },

    #[error("TLS certificate verification failed for {url}")]
    #[diagnostic(
        code(gatecode::tls_error),
        help(
            "The command center is using a self-signed certificate.\n\
             Use --insecure (-k) to accept it, or configure ca_cert in your profile."
        )
    )]
    TlsError { url: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(gatecode::auth_failed),
        help(
            "Verify the command-center API key.\n\
             Run: gatecode config set-api-key --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(gatecode::no_credentials),
        help(
            "Configure credentials with: gatecode config init\n\
             Or set the GATECODE_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Access code lifecycle ────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(gatecode::not_found))]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(gatecode::forbidden),
        help("The user, unit and session site must all agree, and the unit must not be locked.")
    )]
    Forbidden { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(gatecode::conflict),
        help("Another tenant already holds this code at the site. Pick a different one.")
    )]
    Conflict { message: String },

    #[error("{message}")]
    #[diagnostic(code(gatecode::operation_failed))]
    OperationFailed {
        message: String,
        #[source]
        source: CoreError,
    },

    // ── Command center ───────────────────────────────────────────────
    #[error("Command center error: {message}")]
    #[diagnostic(code(gatecode::command_center))]
    CommandCenter { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gatecode::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(gatecode::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: gatecode config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(gatecode::no_config),
        help(
            "Create one with: gatecode config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(gatecode::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(gatecode::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(gatecode::timeout),
        help("Increase timeout with --timeout or check command-center responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot: {0}")]
    #[diagnostic(code(gatecode::json), help("Check the snapshot file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Map a wire error from a direct command-center call.
    pub fn from_api(err: gatecode_api::Error, url: &str, profile: &str) -> Self {
        use gatecode_api::Error as Api;

        match err {
            Api::Authentication { .. } | Api::Http { status: 401 | 403, .. } => Self::AuthFailed {
                profile: profile.into(),
            },
            Api::Tls(_) => Self::TlsError { url: url.into() },
            Api::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            Api::Transport(e) if e.is_timeout() => Self::Timeout { seconds: 0 },
            Api::Transport(e) if e.is_connect() => Self::ConnectionFailed {
                url: url.into(),
                source: Api::Transport(e),
            },
            Api::EmptyUnitList { operation } => Self::Validation {
                field: "unit".into(),
                reason: format!("at least one unit is required for {operation}"),
            },
            Api::InvalidUrl(e) => Self::Validation {
                field: "command_center".into(),
                reason: e.to_string(),
            },
            Api::CommandCenter { message } => Self::CommandCenter { message },
            other => Self::CommandCenter {
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Unauthorized => Self::AuthFailed {
                profile: "current".into(),
            },
            ErrorKind::BadRequest => Self::Validation {
                field: "request".into(),
                reason: describe_bad_request(&err),
            },
            ErrorKind::Forbidden => Self::Forbidden { message },
            ErrorKind::NotFound => Self::NotFound { message },
            ErrorKind::Conflict => Self::Conflict { message },
            ErrorKind::Infrastructure => Self::OperationFailed {
                message,
                source: err,
            },
        }
    }
}

fn describe_bad_request(err: &CoreError) -> String {
    match err {
        CoreError::InvalidAccessCode { reasons, .. } => {
            let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();
            format!("{err} ({})", reasons.join(", "))
        }
        other => other.to_string(),
    }
}
