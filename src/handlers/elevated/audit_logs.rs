// handlers/elevated/audit_logs.rs - GET /api/admin/audit-logs

use axum::extract::State;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::database::models::Pagination;
use crate::middleware::{AdminUser, ApiResponse, ApiResult};
use crate::validation::{AuditLogListQuery, ValidatedQuery};

/// Newest first, optionally narrowed by actor, target or action
pub async fn list_audit_logs(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedQuery(params): ValidatedQuery<AuditLogListQuery>,
) -> ApiResult<Value> {
    let query = params.to_query();
    let page = state.audit_logs.list_audit_logs(&query).await?;

    Ok(ApiResponse::success(json!({
        "audit_logs": page.items,
        "pagination": Pagination::new(query.page, page.total),
    })))
}
