//! Raw PostgreSQL rows. Enum columns are stored as TEXT and parsed here, so a
//! bad value surfaces as `DatabaseError::Corrupt` instead of a panic.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{AuditLogEntry, Comment, Location, Notification, Profile, Team, Ticket};

fn parse<T>(value: &str) -> Result<T, DatabaseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| DatabaseError::Corrupt(e.to_string()))
}

#[derive(Debug, FromRow)]
pub struct ProfileRow {
    pub id: String,
    pub codename: String,
    pub role: String,
    pub status: String,
    pub clearance_level: i32,
    pub team_affiliations: Vec<String>,
    pub notification_preferences: Value,
    pub accessibility_settings: Value,
    pub theme: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DatabaseError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            role: parse(&row.role)?,
            status: parse(&row.status)?,
            theme: row.theme.as_deref().map(parse).transpose()?,
            id: row.id,
            codename: row.codename,
            clearance_level: row.clearance_level,
            team_affiliations: row.team_affiliations,
            notification_preferences: row.notification_preferences,
            accessibility_settings: row.accessibility_settings,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct TicketRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    #[sqlx(rename = "type")]
    pub ticket_type: String,
    pub location: Option<Value>,
    pub related_mission_id: Option<Uuid>,
    pub related_equipment_id: Option<Uuid>,
    pub assigned_to: Option<String>,
    pub created_by: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = DatabaseError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let location = row
            .location
            .filter(|v| !v.is_null())
            .map(serde_json::from_value::<Location>)
            .transpose()
            .map_err(|e| DatabaseError::Corrupt(format!("ticket location: {}", e)))?;
        Ok(Ticket {
            priority: parse(&row.priority)?,
            status: parse(&row.status)?,
            ticket_type: parse(&row.ticket_type)?,
            location,
            id: row.id,
            title: row.title,
            description: row.description,
            related_mission_id: row.related_mission_id,
            related_equipment_id: row.related_equipment_id,
            assigned_to: row.assigned_to,
            created_by: row.created_by,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: String,
    pub content: String,
    pub mentioned_heroes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            ticket_id: row.ticket_id,
            parent_id: row.parent_id,
            author_id: row.author_id,
            content: row.content,
            mentioned_heroes: row.mentioned_heroes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct TeamRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub actor_id: String,
    pub action: String,
    pub target_id: String,
    pub changes: Value,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogRow> for AuditLogEntry {
    fn from(row: AuditLogRow) -> Self {
        AuditLogEntry {
            id: row.id,
            actor_id: row.actor_id,
            action: row.action,
            target_id: row.target_id,
            changes: row.changes,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub recipient_id: String,
    pub sender_id: String,
    #[sqlx(rename = "type")]
    pub notification_type: String,
    pub ticket_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DatabaseError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            notification_type: parse(&row.notification_type)?,
            id: row.id,
            recipient_id: row.recipient_id,
            sender_id: row.sender_id,
            ticket_id: row.ticket_id,
            comment_id: row.comment_id,
            read: row.read,
            created_at: row.created_at,
        })
    }
}
