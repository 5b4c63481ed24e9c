// ── Directory users and caller claims ──

use serde::{Deserialize, Serialize};

use super::ids::{SiteId, UserId};

/// A business user from the directory.
///
/// `sites` holds the decimal string form of every site the user is
/// associated with, in directory order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessUser {
    pub user_id: UserId,
    pub company_uuid: String,
    #[serde(default)]
    pub sites: Vec<String>,
}

impl BusinessUser {
    /// Whether `site` appears in the user's site list.
    pub fn has_site(&self, site: SiteId) -> bool {
        let wanted = site.to_string();
        self.sites.iter().any(|s| *s == wanted)
    }
}

/// Authenticated caller context, produced per request by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub company_uuid: String,
    pub current_site: SiteId,
    pub current_site_uuid: String,
    pub user_id: UserId,
}
