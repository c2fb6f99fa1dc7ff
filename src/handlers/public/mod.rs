// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service banner and liveness probe. Everything else lives under /api and
// requires a session.

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::api::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "CAPE HQ API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Ticketing and hero management for superhero support operations",
        "endpoints": {
            "tickets": "/api/tickets[/:id[/comments]] (authenticated)",
            "profile": "/api/profile, /api/profile/avatar (authenticated)",
            "teams": "/api/teams (authenticated)",
            "notifications": "/api/notifications (authenticated)",
            "admin": "/api/admin/users/*, /api/admin/audit-logs, /api/profile/:user_id (admin clearance)",
        }
    }))
}

/// GET /health - store connectivity check
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "status": "degraded",
                    "timestamp": now
                })),
            )
        }
    }
}
