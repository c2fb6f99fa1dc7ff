// handlers/protected/comments.rs - /api/tickets/:id/comments handlers

use axum::extract::{Path, State};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::api::AppState;
use crate::database::models::{Comment, Notification, Pagination};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::resolve_mentions;
use crate::validation::{parse_uuid, CommentListQuery, CreateCommentRequest, ValidatedJson, ValidatedQuery};

async fn require_ticket(state: &AppState, raw_id: &str) -> Result<Uuid, ApiError> {
    let id = parse_uuid("id", raw_id)?;
    match state.tickets.find_ticket(id).await? {
        Some(_) => Ok(id),
        None => Err(ApiError::not_found("Ticket not found")),
    }
}

/// GET /api/tickets/:id/comments - top-level comments, or replies to `parent_id`
pub async fn list_comments(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    ValidatedQuery(params): ValidatedQuery<CommentListQuery>,
) -> ApiResult<Value> {
    let ticket_id = require_ticket(&state, &id).await?;
    let query = params.to_query();
    let page = state.comments.list_comments(ticket_id, &query).await?;

    Ok(ApiResponse::success(json!({
        "comments": page.items,
        "pagination": Pagination::new(query.page, page.total),
    })))
}

/// POST /api/tickets/:id/comments - add a comment and notify mentioned heroes
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<CreateCommentRequest>,
) -> ApiResult<Comment> {
    let ticket_id = require_ticket(&state, &id).await?;

    if let Some(parent_id) = body.parent_id {
        let parent = state
            .comments
            .find_comment(parent_id)
            .await?
            .filter(|c| c.ticket_id == ticket_id)
            .ok_or_else(|| ApiError::not_found("Parent comment not found"))?;
        if parent.parent_id.is_some() {
            return Err(ApiError::invalid_field(
                "parent_id",
                "Replies can only be attached to top-level comments",
            ));
        }
    }

    let mentioned = resolve_mentions(&body.content, body.mentioned_heroes.as_deref());
    let recipients = state.profiles.existing_profile_ids(&mentioned).await?;

    let comment = Comment {
        id: Uuid::new_v4(),
        ticket_id,
        parent_id: body.parent_id,
        author_id: user.user_id.clone(),
        content: body.content.clone(),
        mentioned_heroes: mentioned,
        created_at: Utc::now(),
    };
    let notifications: Vec<Notification> = recipients
        .into_iter()
        .map(|recipient| Notification::mention(recipient, user.user_id.clone(), ticket_id, comment.id))
        .collect();

    let mut uow = state.store.begin().await?;
    uow.insert_comment(&comment).await?;
    uow.insert_notifications(&notifications).await?;
    uow.commit().await?;

    debug!(
        "Comment {} on ticket {} notified {} hero(es)",
        comment.id,
        ticket_id,
        notifications.len()
    );
    Ok(ApiResponse::created(comment))
}
