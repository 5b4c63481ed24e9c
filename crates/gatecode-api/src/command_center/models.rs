// Wire types for the command-center API.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Opaque flags forwarded to the controller with revoke / set calls.
///
/// Serialized as a sorted JSON array of strings. New flags are added as
/// values, so the client signatures never change when the controller
/// learns a new option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessCodeOptions(BTreeSet<String>);

impl AccessCodeOptions {
    /// An empty flag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style flag insertion.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.0.insert(flag.into());
        self
    }

    /// Insert a flag. Returns `true` if it was not already present.
    pub fn insert(&mut self, flag: impl Into<String>) -> bool {
        self.0.insert(flag.into())
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.0.contains(flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Request body shared by the revoke and set endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UnitsRequest<'a> {
    pub unit_ids: &'a [u64],
    pub options: &'a AccessCodeOptions,
}

/// Standard `{ meta, data }` response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub meta: ApiMeta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMeta {
    pub rc: String,
    #[serde(default)]
    pub msg: Option<String>,
}

/// Per-unit acknowledgement returned by the controller.
///
/// The controller queues hardware programming asynchronously; `status`
/// is its own description of the queued job (e.g. `"queued"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitAck {
    pub unit_id: u64,
    #[serde(default)]
    pub status: Option<String>,
}
