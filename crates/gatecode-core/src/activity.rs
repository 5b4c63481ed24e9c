// ── Activity recording ──
//
// One entry per successful edit request, written after every targeted unit
// has been updated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CollaboratorError;
use crate::model::{Claims, UnitId, UserId};

/// Kind of activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ActivityKind {
    UserAccessCodeEdit,
}

/// An access-code edit performed on behalf of `target_user` by `actor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCodeEditActivity {
    pub kind: ActivityKind,
    pub actor: UserId,
    pub target_user: UserId,
    pub company_uuid: String,
    pub site_uuid: String,
    pub unit_ids: Vec<UnitId>,
    pub recorded_at: DateTime<Utc>,
}

impl AccessCodeEditActivity {
    pub fn new(claims: &Claims, target_user: UserId, unit_ids: Vec<UnitId>) -> Self {
        Self {
            kind: ActivityKind::UserAccessCodeEdit,
            actor: claims.user_id,
            target_user,
            company_uuid: claims.company_uuid.clone(),
            site_uuid: claims.current_site_uuid.clone(),
            unit_ids,
            recorded_at: Utc::now(),
        }
    }
}

/// Sink for user activity entries.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record_access_code_edit(
        &self,
        activity: &AccessCodeEditActivity,
    ) -> Result<(), CollaboratorError>;
}

/// Emits each activity as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActivityLog;

#[async_trait]
impl ActivityLog for TracingActivityLog {
    async fn record_access_code_edit(
        &self,
        activity: &AccessCodeEditActivity,
    ) -> Result<(), CollaboratorError> {
        info!(
            kind = %activity.kind,
            actor = %activity.actor,
            target_user = %activity.target_user,
            site_uuid = %activity.site_uuid,
            units = ?activity.unit_ids,
            at = %activity.recorded_at.to_rfc3339(),
            "user activity recorded"
        );
        Ok(())
    }
}
