// handlers/elevated/bulk.rs - bulk status changes and team assignment
//
// Ids are de-duplicated, unknown ids are reported back in `not_found`, and
// every matched user gets its own audit entry. The updates and the audit
// entries commit together.

use axum::extract::State;
use serde::Serialize;
use tracing::info;

use super::users::ensure_teams_exist;
use crate::api::AppState;
use crate::audit::{actions, AuditEvent};
use crate::database::models::ProfilePatch;
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiResponse, ApiResult};
use crate::types::UserId;
use crate::validation::{BulkStatusRequest, BulkTeamsRequest, ValidatedJson};

#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub updated_count: usize,
    pub user_ids: Vec<UserId>,
    pub not_found: Vec<UserId>,
}

/// PATCH /api/admin/users/bulk
pub async fn bulk_update_status(
    State(state): State<AppState>,
    admin: AdminUser,
    ValidatedJson(body): ValidatedJson<BulkStatusRequest>,
) -> ApiResult<BulkResult> {
    let status = body
        .status()
        .ok_or_else(|| ApiError::invalid_field("status", "Invalid status"))?;
    let patch = ProfilePatch {
        status: Some(status),
        ..Default::default()
    };
    let result = apply_bulk(
        &state,
        &admin,
        body.user_ids(),
        patch,
        actions::BULK_USER_STATUS_UPDATE,
        &body.reason,
    )
    .await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/admin/users/bulk/teams
pub async fn bulk_assign_teams(
    State(state): State<AppState>,
    admin: AdminUser,
    ValidatedJson(body): ValidatedJson<BulkTeamsRequest>,
) -> ApiResult<BulkResult> {
    let teams = body.team_names();
    ensure_teams_exist(&state, &teams).await?;
    let patch = ProfilePatch {
        team_affiliations: Some(teams),
        ..Default::default()
    };
    let result = apply_bulk(
        &state,
        &admin,
        body.user_ids(),
        patch,
        actions::BULK_TEAM_ASSIGNMENT,
        &body.reason,
    )
    .await?;
    Ok(ApiResponse::success(result))
}

async fn apply_bulk(
    state: &AppState,
    admin: &AdminUser,
    requested: Vec<UserId>,
    patch: ProfilePatch,
    action: &'static str,
    reason: &str,
) -> Result<BulkResult, ApiError> {
    let existing = state.profiles.existing_profile_ids(&requested).await?;
    if existing.is_empty() {
        return Err(ApiError::not_found("None of the requested users exist"));
    }

    let mut uow = state.store.begin().await?;
    let updated = uow.update_profiles(&existing, &patch).await?;
    let changes = patch.to_changes();
    let events = updated
        .iter()
        .map(|id| {
            AuditEvent::new(admin.id(), action, id.clone(), changes.clone()).reason(Some(reason.trim().to_string()))
        })
        .collect();
    state.audit.log_bulk_events(uow.as_mut(), events).await?;
    uow.commit().await?;

    let not_found: Vec<UserId> = requested.into_iter().filter(|id| !updated.contains(id)).collect();
    info!(
        "{} by {}: {} updated, {} not found",
        action,
        admin.id(),
        updated.len(),
        not_found.len()
    );
    Ok(BulkResult {
        updated_count: updated.len(),
        user_ids: updated,
        not_found,
    })
}
