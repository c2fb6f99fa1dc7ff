use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::UserId;

use super::page::PageRequest;

/// Append-only record of who changed what, when and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: UserId,
    pub action: String,
    pub target_id: String,
    pub changes: Value,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub page: PageRequest,
    pub actor_id: Option<UserId>,
    pub target_id: Option<String>,
    pub action: Option<String>,
}
