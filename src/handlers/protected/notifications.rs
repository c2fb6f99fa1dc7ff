// handlers/protected/notifications.rs - the caller's own notifications

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::database::models::{Notification, Pagination};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::validation::{parse_uuid, NotificationListQuery, ValidatedQuery};

/// GET /api/notifications - newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(params): ValidatedQuery<NotificationListQuery>,
) -> ApiResult<Value> {
    let query = params.to_query();
    let page = state.notifications.list_notifications(&user.user_id, &query).await?;

    Ok(ApiResponse::success(json!({
        "notifications": page.items,
        "pagination": Pagination::new(query.page, page.total),
    })))
}

/// PATCH /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Notification> {
    let id = parse_uuid("id", &id)?;
    // someone else's notification is indistinguishable from a missing one
    let notification = state
        .notifications
        .mark_notification_read(id, &user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;
    Ok(ApiResponse::success(notification))
}
