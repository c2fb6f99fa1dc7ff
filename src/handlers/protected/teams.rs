// handlers/protected/teams.rs - GET /api/teams

use axum::extract::State;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

pub async fn list_teams(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Value> {
    let teams = state.teams.list_teams().await?;
    Ok(ApiResponse::success(json!({ "teams": teams })))
}
