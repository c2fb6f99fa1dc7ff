use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{NotificationType, UserId};

use super::page::PageRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: UserId,
    pub sender_id: UserId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub ticket_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Unread mention notification for a freshly created comment
    pub fn mention(recipient_id: UserId, sender_id: UserId, ticket_id: Uuid, comment_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            sender_id,
            notification_type: NotificationType::Mention,
            ticket_id: Some(ticket_id),
            comment_id: Some(comment_id),
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotificationQuery {
    pub page: PageRequest,
    pub unread_only: bool,
}
