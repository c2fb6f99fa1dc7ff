// handlers/elevated/users.rs - /api/admin/users and /api/admin/users/:user_id

use axum::extract::{Path, State};
use serde_json::{json, Value};
use tracing::info;

use crate::api::AppState;
use crate::audit::{actions, AuditEvent};
use crate::database::models::{Pagination, Profile, ProfilePatch};
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiResponse, ApiResult};
use crate::validation::{AssignTeamsRequest, UpdateUserRequest, UserListQuery, ValidatedJson, ValidatedQuery};

async fn require_profile(state: &AppState, user_id: &str) -> Result<Profile, ApiError> {
    state
        .profiles
        .find_profile(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// GET /api/admin/users - filter by status, clearance level and codename
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedQuery(params): ValidatedQuery<UserListQuery>,
) -> ApiResult<Value> {
    let query = params.to_query();
    let page = state.profiles.list_profiles(&query).await?;
    let pagination = Pagination::new(query.page, page.total);

    Ok(ApiResponse::success(json!({
        "users": page.items,
        "total": pagination.total,
        "page": pagination.page,
        "limit": pagination.limit,
        "total_pages": pagination.total_pages,
    })))
}

/// GET /api/admin/users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> ApiResult<Profile> {
    Ok(ApiResponse::success(require_profile(&state, &user_id).await?))
}

/// PATCH /api/admin/users/:user_id - status and/or clearance level
pub async fn update_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Profile> {
    let patch = ProfilePatch {
        status: body.status(),
        clearance_level: body.clearance_level,
        ..Default::default()
    };
    if patch.is_empty() {
        return Err(ApiError::bad_request("At least one of status or clearance_level is required"));
    }
    require_profile(&state, &user_id).await?;

    let mut uow = state.store.begin().await?;
    let updated = uow
        .update_profile(&user_id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    state
        .audit
        .log_event(
            uow.as_mut(),
            AuditEvent::new(admin.id(), actions::USER_UPDATE, user_id.clone(), patch.to_changes())
                .reason(body.reason.clone()),
        )
        .await?;
    uow.commit().await?;

    info!("User {} updated by {}", user_id, admin.id());
    Ok(ApiResponse::success(updated))
}

/// GET /api/admin/users/:user_id/teams
pub async fn get_user_teams(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> ApiResult<Value> {
    let profile = require_profile(&state, &user_id).await?;
    Ok(ApiResponse::success(json!({
        "user_id": profile.id,
        "teams": profile.team_affiliations,
    })))
}

/// POST /api/admin/users/:user_id/teams - replace team affiliations
pub async fn assign_user_teams(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<AssignTeamsRequest>,
) -> ApiResult<Value> {
    let teams = body.team_names();
    require_profile(&state, &user_id).await?;
    ensure_teams_exist(&state, &teams).await?;

    let patch = ProfilePatch {
        team_affiliations: Some(teams),
        ..Default::default()
    };
    let mut uow = state.store.begin().await?;
    let updated = uow
        .update_profile(&user_id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    state
        .audit
        .log_event(
            uow.as_mut(),
            AuditEvent::new(admin.id(), actions::USER_TEAMS_UPDATE, user_id.clone(), patch.to_changes())
                .reason(body.reason.clone()),
        )
        .await?;
    uow.commit().await?;

    Ok(ApiResponse::success(json!({
        "user_id": updated.id,
        "teams": updated.team_affiliations,
    })))
}

/// 400 naming every team that does not exist
pub(crate) async fn ensure_teams_exist(state: &AppState, teams: &[String]) -> Result<(), ApiError> {
    let unknown = state.teams.unknown_team_names(teams).await?;
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ApiError::invalid_field("teams", format!("Unknown teams: {}", unknown.join(", "))))
    }
}
