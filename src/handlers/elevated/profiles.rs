// handlers/elevated/profiles.rs - /api/profile/:user_id (admin)

use axum::extract::{Path, State};

use crate::api::AppState;
use crate::audit::{actions, AuditEvent};
use crate::database::models::Profile;
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiResponse, ApiResult};
use crate::validation::{AdminProfileUpdateRequest, ValidatedJson};

/// GET /api/profile/:user_id
pub async fn get_profile(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> ApiResult<Profile> {
    let profile = state
        .profiles
        .find_profile(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(ApiResponse::success(profile))
}

/// PATCH /api/profile/:user_id - unlike the self variant, may set codename,
/// status and clearance level
pub async fn update_profile(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<AdminProfileUpdateRequest>,
) -> ApiResult<Profile> {
    let patch = body.to_patch();
    if patch.is_empty() {
        return Err(ApiError::bad_request("No profile fields supplied"));
    }
    if state.profiles.find_profile(&user_id).await?.is_none() {
        return Err(ApiError::not_found("Profile not found"));
    }

    let mut uow = state.store.begin().await?;
    let updated = uow
        .update_profile(&user_id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    state
        .audit
        .log_event(
            uow.as_mut(),
            AuditEvent::new(admin.id(), actions::PROFILE_UPDATE, user_id.clone(), patch.to_changes())
                .reason(body.reason.clone()),
        )
        .await?;
    uow.commit().await?;

    Ok(ApiResponse::success(updated))
}
