//! Fixtures for exercising the router against the in-memory store.

use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::api::{router, AppState};
use crate::auth::AuthError;
use crate::config::AppConfig;
use crate::database::models::{Profile, Team, Ticket};
use crate::database::MemoryStore;
use crate::storage::MemoryAvatarStorage;
use crate::types::{Priority, Role, TicketStatus, TicketType};

/// A fully wired application over in-memory backends, with direct access
/// to those backends for seeding and assertions
#[derive(Clone)]
pub struct TestApp {
    pub store: MemoryStore,
    pub avatars: MemoryAvatarStorage,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::development())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = MemoryStore::new();
        let avatars = MemoryAvatarStorage::new(config.storage.avatar_base_url.clone());
        let state = AppState::new(config, Arc::new(store.clone()), Arc::new(avatars.clone()));
        Self { store, avatars, state }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bearer token for `user_id`, signed with the app's session secret
    pub fn token(&self, user_id: &str) -> Result<String, AuthError> {
        self.state.sessions.issue(user_id, None)
    }

    pub async fn seed_profile(&self, id: &str, codename: &str, clearance_level: i32) -> Profile {
        let mut profile = Profile::new(id, codename);
        profile.clearance_level = clearance_level;
        if clearance_level >= self.state.config.security.admin_clearance {
            profile.role = Role::Admin;
        }
        self.store.insert_profile(profile.clone()).await;
        profile
    }

    pub async fn seed_team(&self, name: &str) -> Team {
        let team = Team::new(name);
        self.store.insert_team(team.clone()).await;
        team
    }

    pub async fn seed_ticket(&self, created_by: &str, title: &str, priority: Priority) -> Ticket {
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{} (seeded)", title),
            priority,
            status: TicketStatus::New,
            ticket_type: TicketType::Mission,
            location: None,
            related_mission_id: None,
            related_equipment_id: None,
            assigned_to: None,
            created_by: created_by.to_string(),
            metadata: json!({}),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_ticket(ticket.clone()).await;
        ticket
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
