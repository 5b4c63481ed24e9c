// Command-center HTTP client
//
// Wraps `reqwest::Client` with site-scoped URL construction, envelope
// unwrapping and caller cancellation. One client is built per site per
// request; the HTTP connection pool lives in the shared `reqwest::Client`.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use super::models::{AccessCodeOptions, ApiResponse, UnitAck, UnitsRequest};
use crate::error::Error;
use crate::transport::TransportConfig;

const API_KEY_HEADER: &str = "X-API-KEY";

/// Site-scoped client for the command-center controller.
///
/// Every call races the client's cancellation token; once the token fires,
/// in-flight requests are dropped and [`Error::Cancelled`] is returned.
pub struct CommandCenterClient {
    http: reqwest::Client,
    base_url: Url,
    site_id: u64,
    timeout_secs: u64,
    cancel: CancellationToken,
}

impl CommandCenterClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// The `base_url` is the controller root (e.g. `https://cc.example.com`).
    /// When an API key is given it is sent as `X-API-KEY` on every request.
    pub fn new(
        base_url: Url,
        site_id: u64,
        api_key: Option<&SecretString>,
        transport: &TransportConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let mut value =
                HeaderValue::from_str(key.expose_secret()).map_err(|_| Error::Authentication {
                    message: "API key contains characters not allowed in a header".into(),
                })?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }
        let http = transport.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            base_url,
            site_id,
            timeout_secs: transport.timeout_secs(),
            cancel,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Use this to share one connection pool across many per-request
    /// clients, or to point at a mock server in tests.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        site_id: u64,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            http,
            base_url,
            site_id,
            timeout_secs: 0,
            cancel,
        }
    }

    /// Re-scope to another site and cancellation token, sharing this
    /// client's connection pool, base URL and timeout.
    pub fn for_site(&self, site_id: u64, cancel: CancellationToken) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            site_id,
            timeout_secs: self.timeout_secs,
            cancel,
        }
    }

    /// The site this client is scoped to.
    pub fn site_id(&self) -> u64 {
        self.site_id
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Revoke the access codes currently programmed for `unit_ids`.
    pub async fn revoke_access_codes(
        &self,
        unit_ids: &[u64],
        options: &AccessCodeOptions,
    ) -> Result<Vec<UnitAck>, Error> {
        self.post_units("revoke", unit_ids, options).await
    }

    /// Program the access codes on record for `unit_ids` into the gate.
    pub async fn set_access_codes(
        &self,
        unit_ids: &[u64],
        options: &AccessCodeOptions,
    ) -> Result<Vec<UnitAck>, Error> {
        self.post_units("set", unit_ids, options).await
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a site-scoped URL: `{base}/api/v1/sites/{site}/{path}`
    pub(crate) fn site_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/api/v1/sites/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.site_id,
            path
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn post_units(
        &self,
        operation: &'static str,
        unit_ids: &[u64],
        options: &AccessCodeOptions,
    ) -> Result<Vec<UnitAck>, Error> {
        if unit_ids.is_empty() {
            return Err(Error::EmptyUnitList { operation });
        }

        let url = self.site_url(&format!("access-codes/{operation}"))?;
        debug!(site = self.site_id, ?unit_ids, "POST {}", url);

        let body = UnitsRequest { unit_ids, options };
        let send = self.http.post(url).json(&body).send();

        let resp = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Error::Cancelled),
            resp = send => resp.map_err(|e| self.map_transport(e))?,
        };

        self.parse_envelope(resp).await
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() && self.timeout_secs > 0 {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Parse the `{ meta, data }` envelope, returning `data` on success
    /// or an `Error::CommandCenter` if `meta.rc != "ok"`.
    async fn parse_envelope<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<Vec<T>, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("controller rejected credentials (HTTP {})", status.as_u16()),
            });
        }

        let body = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Error::Cancelled),
            body = resp.text() => body.map_err(Error::Transport)?,
        };

        let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(Error::Http {
                    status: status.as_u16(),
                    body,
                });
            }
            Err(e) => {
                return Err(Error::Deserialization {
                    message: e.to_string(),
                    body,
                });
            }
        };

        match envelope.meta.rc.as_str() {
            "ok" => Ok(envelope.data),
            _ => Err(Error::CommandCenter {
                message: envelope
                    .meta
                    .msg
                    .unwrap_or_else(|| format!("rc={}", envelope.meta.rc)),
            }),
        }
    }
}
