use thiserror::Error;

/// Top-level error type for the `gatecode-api` crate.
///
/// Covers every failure mode of the command-center wire layer:
/// authentication, transport, envelope decoding and caller cancellation.
/// `gatecode-core` folds these into its collaborator error.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The controller rejected the API key or the key is missing.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The caller cancelled the request before the controller answered.
    #[error("Request cancelled by caller")]
    Cancelled,

    // ── Command center ──────────────────────────────────────────────
    /// Error reported inside the `{meta: {rc, msg}}` envelope.
    #[error("Command center error: {message}")]
    CommandCenter { message: String },

    /// Non-success HTTP status without a parseable envelope.
    #[error("Command center returned HTTP {status}")]
    Http { status: u16, body: String },

    /// Revoke or set was called with no units.
    #[error("No units specified for {operation}")]
    EmptyUnitList { operation: &'static str },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }
}
