// ── Access code edit request ──
//
// The one operation exposed to the HTTP layer: validate the acting user
// once, then validate and update each targeted unit in order, stopping at
// the first failure. Units already updated stay updated.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::activity::AccessCodeEditActivity;
use crate::context::RequestContext;
use crate::error::CoreError;
use crate::model::{Claims, UnitId, UserId};
use crate::orchestrator::AccessCodeOrchestrator;

/// Body of an access code edit request.
///
/// The user may be given by numeric id or by its string reference; the
/// reference wins when both are present. Unit references are appended to
/// the numeric unit list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCodeEditRequest {
    #[serde(rename = "userId", default)]
    pub user_id: u64,
    #[serde(rename = "userUuid", default, skip_serializing_if = "String::is_empty")]
    pub user_uuid: String,
    #[serde(rename = "unitID", default)]
    pub unit_ids: Vec<u64>,
    #[serde(rename = "unitUUIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub unit_uuids: Vec<String>,
    #[serde(rename = "accessCode")]
    pub access_code: String,
}

/// An edit request with every reference turned into a numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEdit {
    pub user_id: UserId,
    pub unit_ids: Vec<UnitId>,
    pub access_code: String,
}

fn parse_reference(field: &'static str, raw: &str) -> Result<u64, CoreError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| CoreError::InvalidReference {
            field,
            value: raw.to_owned(),
        })
}

impl AccessCodeEditRequest {
    /// Turn user and unit references into ids.
    pub fn resolve(&self) -> Result<ResolvedEdit, CoreError> {
        let user_id = if self.user_uuid.is_empty() {
            self.user_id
        } else {
            parse_reference("userUuid", &self.user_uuid)?
        };

        let mut unit_ids: Vec<UnitId> = self.unit_ids.iter().copied().map(UnitId::new).collect();
        for raw in &self.unit_uuids {
            unit_ids.push(UnitId::new(parse_reference("unitUUIDs", raw)?));
        }

        Ok(ResolvedEdit {
            user_id: UserId::new(user_id),
            unit_ids,
            access_code: self.access_code.clone(),
        })
    }
}

/// What a successful edit did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditReport {
    pub user_id: UserId,
    /// Units whose code was written and pushed to the gate.
    pub updated: Vec<UnitId>,
    /// Units that already carried the code.
    pub unchanged: Vec<UnitId>,
}

impl AccessCodeOrchestrator {
    /// Apply an edit request on behalf of the caller in `claims`.
    ///
    /// Missing claims are rejected before anything is looked up. Unit id 0
    /// stands for "no unit" and is skipped. The activity entry is recorded
    /// only after every unit succeeded.
    pub async fn edit_access_codes(
        &self,
        claims: Option<&Claims>,
        request: &AccessCodeEditRequest,
        ctx: &RequestContext,
    ) -> Result<EditReport, CoreError> {
        let claims = claims.ok_or(CoreError::Unauthorized)?;
        let edit = request.resolve()?;
        let site_id = claims.current_site;

        let user = self
            .validate_user(edit.user_id, &claims.company_uuid, site_id, ctx)
            .await?;

        let mut report = EditReport {
            user_id: user.user_id,
            updated: Vec::new(),
            unchanged: Vec::new(),
        };

        for unit_id in edit.unit_ids.iter().copied() {
            if unit_id.get() == 0 {
                debug!("skipping empty unit reference");
                continue;
            }
            self.validate_unit(unit_id, site_id, ctx).await?;
            let outcome = self
                .update_unit_access_code(unit_id, user.user_id, site_id, &edit.access_code, ctx)
                .await?;
            if outcome.is_unchanged() {
                report.unchanged.push(unit_id);
            } else {
                report.updated.push(unit_id);
            }
        }

        let touched: Vec<UnitId> = report
            .updated
            .iter()
            .chain(&report.unchanged)
            .copied()
            .collect();
        let activity = AccessCodeEditActivity::new(claims, user.user_id, touched);
        ctx.run(self.activity.record_access_code_edit(&activity))
            .await
            .map_err(|source| CoreError::ActivityRecordFailed { source })?;

        info!(
            user = %user.user_id,
            site = %site_id,
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            "access code edit applied"
        );
        Ok(report)
    }
}
