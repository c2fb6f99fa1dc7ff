use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UserId;

use super::page::PageRequest;

/// Ticket comment. Replies point at a top-level comment through `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: UserId,
    pub content: String,
    pub mentioned_heroes: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub page: PageRequest,
    /// `None` lists top-level comments only
    pub parent_id: Option<Uuid>,
}
