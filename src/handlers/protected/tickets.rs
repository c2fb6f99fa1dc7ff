// handlers/protected/tickets.rs - /api/tickets handlers

use axum::extract::{Path, State};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::AppState;
use crate::audit::{actions, AuditEvent};
use crate::database::models::{Pagination, Ticket, TicketPatch};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::{Role, TicketStatus};
use crate::validation::{parse_uuid, CreateTicketRequest, TicketListQuery, UpdateTicketRequest, ValidatedJson, ValidatedQuery};

/// GET /api/tickets - filtered, sorted, paginated ticket list
pub async fn list_tickets(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidatedQuery(params): ValidatedQuery<TicketListQuery>,
) -> ApiResult<Value> {
    let query = params.to_query();
    let page = state.tickets.list_tickets(&query).await?;

    Ok(ApiResponse::success(json!({
        "tickets": page.items,
        "pagination": Pagination::new(query.page, page.total),
    })))
}

/// POST /api/tickets - open a new ticket as the caller
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateTicketRequest>,
) -> ApiResult<Ticket> {
    let ticket_type = body
        .ticket_type()
        .ok_or_else(|| ApiError::invalid_field("type", "Ticket type is required"))?;
    let now = Utc::now();
    let ticket = Ticket {
        id: Uuid::new_v4(),
        title: body.title.trim().to_string(),
        description: body.description.clone(),
        priority: body.priority(),
        status: TicketStatus::New,
        ticket_type,
        location: body.location.clone().map(Into::into),
        related_mission_id: body.related_mission_id,
        related_equipment_id: body.related_equipment_id,
        assigned_to: None,
        created_by: user.user_id.clone(),
        metadata: body.metadata.clone().unwrap_or_else(|| json!({})),
        created_at: now,
        updated_at: now,
    };

    state.tickets.create_ticket(&ticket).await?;
    info!("Ticket {} created by {} ({})", ticket.id, ticket.created_by, ticket.priority);

    Ok(ApiResponse::created(ticket))
}

/// GET /api/tickets/:id
pub async fn get_ticket(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Ticket> {
    let id = parse_uuid("id", &id)?;
    let ticket = state
        .tickets
        .find_ticket(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ticket not found"))?;
    Ok(ApiResponse::success(ticket))
}

/// PATCH /api/tickets/:id - status, priority or assignee change
pub async fn update_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateTicketRequest>,
) -> ApiResult<Ticket> {
    let id = parse_uuid("id", &id)?;
    let ticket = state
        .tickets
        .find_ticket(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ticket not found"))?;

    if !may_edit_ticket(&state, &user, &ticket).await? {
        return Err(ApiError::forbidden("Only the creator, the assignee or support staff may update this ticket"));
    }

    let patch = TicketPatch {
        status: body.status(),
        priority: body.priority(),
        assigned_to: body.assigned_to.as_ref().map(|a| a.trim().to_string()),
    };
    if patch.is_empty() {
        return Err(ApiError::bad_request("At least one of status, priority or assigned_to is required"));
    }
    if let Some(next) = patch.status {
        if !ticket.status.can_transition_to(next) {
            return Err(ApiError::invalid_field(
                "status",
                format!("Cannot move a ticket from {} to {}", ticket.status, next),
            ));
        }
    }
    if let Some(assignee) = &patch.assigned_to {
        if state.profiles.find_profile(assignee).await?.is_none() {
            return Err(ApiError::invalid_field("assigned_to", format!("Unknown user: {}", assignee)));
        }
    }

    let mut uow = state.store.begin().await?;
    let updated = uow
        .update_ticket(id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Ticket not found"))?;
    state
        .audit
        .log_event(
            uow.as_mut(),
            AuditEvent::new(&user.user_id, actions::TICKET_UPDATE, id.to_string(), patch.to_changes()),
        )
        .await?;
    uow.commit().await?;

    Ok(ApiResponse::success(updated))
}

async fn may_edit_ticket(state: &AppState, user: &AuthUser, ticket: &Ticket) -> Result<bool, ApiError> {
    if ticket.created_by == user.user_id || ticket.assigned_to.as_deref() == Some(user.user_id.as_str()) {
        return Ok(true);
    }
    let privileged = state.profiles.find_profile(&user.user_id).await?.map_or(false, |p| {
        matches!(p.role, Role::Support | Role::Admin) || p.clearance_level >= state.config.security.admin_clearance
    });
    Ok(privileged)
}
