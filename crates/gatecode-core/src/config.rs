// ── Runtime command-center configuration ──
//
// These types describe *how* to reach a command center. They carry
// credential data and connection tuning, but never touch disk.
// `gatecode-config` builds a `CommandCenterConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use gatecode_api::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed lab controllers).
    DangerAcceptInvalid,
}

/// Configuration for reaching one command center.
#[derive(Debug, Clone)]
pub struct CommandCenterConfig {
    /// Controller URL (e.g., `https://cc.example.com`).
    pub url: Url,
    /// API key sent as `X-API-KEY`, if the controller requires one.
    pub api_key: Option<SecretString>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl CommandCenterConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            api_key: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Translate into the api crate's transport settings.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
