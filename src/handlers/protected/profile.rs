// handlers/protected/profile.rs - /api/profile and /api/profile/avatar handlers

use axum::extract::{multipart::MultipartRejection, Multipart, State};
use chrono::Utc;
use tracing::{info, warn};

use crate::api::AppState;
use crate::audit::{actions, AuditEvent};
use crate::database::models::{Profile, ProfilePatch};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::storage::avatar_key;
use crate::validation::{UpdateOwnProfileRequest, ValidatedJson};

const AVATAR_FIELDS: [&str; 2] = ["avatar", "file"];

async fn own_profile(state: &AppState, user: &AuthUser) -> Result<Profile, ApiError> {
    state
        .profiles
        .find_profile(&user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))
}

/// GET /api/profile
pub async fn get_profile(State(state): State<AppState>, user: AuthUser) -> ApiResult<Profile> {
    Ok(ApiResponse::success(own_profile(&state, &user).await?))
}

/// PATCH /api/profile - preferences, accessibility settings and theme only
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<UpdateOwnProfileRequest>,
) -> ApiResult<Profile> {
    let patch = body.to_patch();
    if patch.is_empty() {
        return Err(ApiError::bad_request("No profile fields supplied"));
    }

    let mut uow = state.store.begin().await?;
    let updated = uow
        .update_profile(&user.user_id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    uow.commit().await?;

    Ok(ApiResponse::success(updated))
}

struct AvatarUpload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn read_avatar(multipart: &mut Multipart, max_bytes: usize) -> Result<AvatarUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if !field.name().map_or(false, |name| AVATAR_FIELDS.contains(&name)) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::invalid_field("avatar", "Avatar must be an image file"));
        }
        let filename = field.file_name().unwrap_or("avatar").to_string();
        let bytes = field.bytes().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
        if bytes.is_empty() {
            return Err(ApiError::invalid_field("avatar", "Avatar file is empty"));
        }
        if bytes.len() > max_bytes {
            return Err(ApiError::invalid_field(
                "avatar",
                format!("Avatar must be at most {} bytes", max_bytes),
            ));
        }
        return Ok(AvatarUpload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::invalid_field("avatar", "An image file is required"))
}

/// POST /api/profile/avatar - multipart upload in field `avatar` (or `file`)
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Profile> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let profile = own_profile(&state, &user).await?;
    let upload = read_avatar(&mut multipart, state.config.storage.max_avatar_bytes).await?;

    let key = avatar_key(
        &user.user_id,
        Utc::now().timestamp_millis(),
        &upload.filename,
        &upload.content_type,
    );
    let url = state.avatars.put(&key, upload.bytes, &upload.content_type).await?;

    let patch = ProfilePatch {
        avatar_url: Some(Some(url)),
        ..Default::default()
    };
    let updated = match save_avatar_change(&state, &user, &patch, actions::AVATAR_UPLOAD).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Err(cleanup) = state.avatars.remove(&key).await {
                warn!("Failed to remove orphaned avatar {}: {}", key, cleanup);
            }
            return Err(e);
        }
    };

    if let Some(previous) = profile.avatar_url.as_deref().and_then(|u| state.avatars.key_from_url(u)) {
        if previous != key {
            if let Err(e) = state.avatars.remove(&previous).await {
                warn!("Failed to remove replaced avatar {}: {}", previous, e);
            }
        }
    }

    info!("Avatar uploaded for {} ({})", user.user_id, key);
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/profile/avatar
pub async fn delete_avatar(State(state): State<AppState>, user: AuthUser) -> ApiResult<Profile> {
    let profile = own_profile(&state, &user).await?;
    let url = profile
        .avatar_url
        .as_deref()
        .ok_or_else(|| ApiError::not_found("No avatar to delete"))?;

    let patch = ProfilePatch {
        avatar_url: Some(None),
        ..Default::default()
    };
    let updated = save_avatar_change(&state, &user, &patch, actions::AVATAR_DELETE).await?;

    // the object goes only once the cleared URL is committed
    match state.avatars.key_from_url(url) {
        Some(key) => {
            if let Err(e) = state.avatars.remove(&key).await {
                warn!("Failed to remove deleted avatar {}: {}", key, e);
            }
        }
        None => warn!("Avatar URL for {} is not managed storage: {}", user.user_id, url),
    }
    Ok(ApiResponse::success(updated))
}

async fn save_avatar_change(
    state: &AppState,
    user: &AuthUser,
    patch: &ProfilePatch,
    action: &'static str,
) -> Result<Profile, ApiError> {
    let mut uow = state.store.begin().await?;
    let updated = uow
        .update_profile(&user.user_id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    state
        .audit
        .log_event(
            uow.as_mut(),
            AuditEvent::new(&user.user_id, action, user.user_id.clone(), patch.to_changes()),
        )
        .await?;
    uow.commit().await?;
    Ok(updated)
}
