//! Application state and route table.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::audit::AuditLogger;
use crate::auth::JwtSessionProvider;
use crate::config::AppConfig;
use crate::database::{
    AuditRepository, CommentRepository, NotificationRepository, ProfileRepository, Store, TeamRepository,
    TicketRepository,
};
use crate::handlers::{elevated, protected, public};
use crate::storage::AvatarStorage;

/// Everything a handler can reach. Built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<JwtSessionProvider>,
    pub audit: AuditLogger,
    pub store: Arc<dyn Store>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub teams: Arc<dyn TeamRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub audit_logs: Arc<dyn AuditRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub avatars: Arc<dyn AvatarStorage>,
}

impl AppState {
    /// Wire every capability to the same backing store
    pub fn new<S>(config: AppConfig, store: Arc<S>, avatars: Arc<dyn AvatarStorage>) -> Self
    where
        S: Store
            + ProfileRepository
            + TeamRepository
            + TicketRepository
            + CommentRepository
            + AuditRepository
            + NotificationRepository
            + 'static,
    {
        let sessions = Arc::new(JwtSessionProvider::from_config(&config.security));
        let audit = AuditLogger::new(config.security.enable_audit_logging);
        Self {
            config: Arc::new(config),
            sessions,
            audit,
            store: store.clone(),
            profiles: store.clone(),
            teams: store.clone(),
            tickets: store.clone(),
            comments: store.clone(),
            audit_logs: store.clone(),
            notifications: store,
            avatars,
        }
    }
}

pub fn router(state: AppState) -> Router {
    // multipart framing on top of the largest accepted image
    let avatar_body_limit = state.config.storage.max_avatar_bytes + 64 * 1024;

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(ticket_routes())
        .merge(profile_routes(avatar_body_limit))
        .merge(admin_routes())
        .with_state(state)
}

fn ticket_routes() -> Router<AppState> {
    use protected::{comments, notifications, teams, tickets};

    Router::new()
        .route("/api/tickets", get(tickets::list_tickets).post(tickets::create_ticket))
        .route("/api/tickets/:id", get(tickets::get_ticket).patch(tickets::update_ticket))
        .route(
            "/api/tickets/:id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/api/teams", get(teams::list_teams))
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/:id/read", patch(notifications::mark_read))
}

fn profile_routes(avatar_body_limit: usize) -> Router<AppState> {
    use elevated::profiles as admin_profiles;
    use protected::profile;

    Router::new()
        .route("/api/profile", get(profile::get_profile).patch(profile::update_profile))
        .route(
            "/api/profile/avatar",
            post(profile::upload_avatar)
                .delete(profile::delete_avatar)
                .layer(DefaultBodyLimit::max(avatar_body_limit)),
        )
        .route(
            "/api/profile/:user_id",
            get(admin_profiles::get_profile).patch(admin_profiles::update_profile),
        )
}

fn admin_routes() -> Router<AppState> {
    use elevated::{audit_logs, bulk, users};

    Router::new()
        .route("/api/admin/users", get(users::list_users))
        .route("/api/admin/users/bulk", patch(bulk::bulk_update_status))
        .route("/api/admin/users/bulk/teams", post(bulk::bulk_assign_teams))
        .route("/api/admin/users/:user_id", get(users::get_user).patch(users::update_user))
        .route(
            "/api/admin/users/:user_id/teams",
            get(users::get_user_teams).post(users::assign_user_teams),
        )
        .route("/api/admin/audit-logs", get(audit_logs::list_audit_logs))
}
