//! Audit logging for state-changing actions.
//!
//! Entries are appended through the caller's unit of work, so they commit or
//! roll back together with the mutation they describe.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::AuditLogEntry;
use crate::database::{DatabaseError, UnitOfWork};
use crate::types::UserId;

pub mod actions {
    pub const TICKET_UPDATE: &str = "ticket_update";
    pub const USER_UPDATE: &str = "user_update";
    pub const USER_TEAMS_UPDATE: &str = "user_teams_update";
    pub const BULK_USER_STATUS_UPDATE: &str = "bulk_user_status_update";
    pub const BULK_TEAM_ASSIGNMENT: &str = "bulk_team_assignment";
    pub const PROFILE_UPDATE: &str = "profile_update";
    pub const AVATAR_UPLOAD: &str = "avatar_upload";
    pub const AVATAR_DELETE: &str = "avatar_delete";
}

/// An audit entry before it is stamped with an id and timestamp
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub actor_id: UserId,
    pub action: &'static str,
    pub target_id: String,
    pub changes: Value,
    pub reason: Option<String>,
}

impl AuditEvent {
    pub fn new(actor_id: &str, action: &'static str, target_id: impl Into<String>, changes: Value) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            action,
            target_id: target_id.into(),
            changes,
            reason: None,
        }
    }

    pub fn reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    fn into_entry(self) -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            actor_id: self.actor_id,
            action: self.action.to_string(),
            target_id: self.target_id,
            changes: self.changes,
            reason: self.reason,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AuditLogger {
    mirror_to_log: bool,
}

impl AuditLogger {
    pub fn new(mirror_to_log: bool) -> Self {
        Self { mirror_to_log }
    }

    pub async fn log_event(&self, uow: &mut dyn UnitOfWork, event: AuditEvent) -> Result<(), DatabaseError> {
        self.log_bulk_events(uow, vec![event]).await
    }

    /// One entry per event; bulk operations pass one event per affected target
    pub async fn log_bulk_events(&self, uow: &mut dyn UnitOfWork, events: Vec<AuditEvent>) -> Result<(), DatabaseError> {
        if events.is_empty() {
            return Ok(());
        }
        let entries: Vec<AuditLogEntry> = events.into_iter().map(AuditEvent::into_entry).collect();
        uow.append_audit(&entries).await?;

        if self.mirror_to_log {
            for entry in &entries {
                tracing::info!(
                    target: "audit",
                    actor_id = %entry.actor_id,
                    action = %entry.action,
                    target_id = %entry.target_id,
                    reason = entry.reason.as_deref().unwrap_or(""),
                    "audit event recorded"
                );
            }
        }
        Ok(())
    }
}
