//! Capability traits the handlers are written against.
//!
//! Each handler only sees the narrow read trait it needs. Every mutation goes
//! through a [`UnitOfWork`] so that the change and its audit rows commit or
//! roll back together.

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    AuditLogEntry, AuditQuery, Comment, CommentQuery, Notification, NotificationQuery, Page, Profile,
    ProfilePatch, ProfileQuery, Team, Ticket, TicketPatch, TicketQuery,
};
use crate::types::UserId;

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_profile(&self, id: &str) -> Result<Option<Profile>, DatabaseError>;

    async fn list_profiles(&self, query: &ProfileQuery) -> Result<Page<Profile>, DatabaseError>;

    /// The subset of `ids` naming existing profiles, in request order
    async fn existing_profile_ids(&self, ids: &[UserId]) -> Result<Vec<UserId>, DatabaseError>;
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn list_teams(&self) -> Result<Vec<Team>, DatabaseError>;

    /// Names from `names` that do not match any team
    async fn unknown_team_names(&self, names: &[String]) -> Result<Vec<String>, DatabaseError>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn list_tickets(&self, query: &TicketQuery) -> Result<Page<Ticket>, DatabaseError>;

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, DatabaseError>;

    async fn create_ticket(&self, ticket: &Ticket) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn list_comments(&self, ticket_id: Uuid, query: &CommentQuery) -> Result<Page<Comment>, DatabaseError>;

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, DatabaseError>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Newest entries first
    async fn list_audit_logs(&self, query: &AuditQuery) -> Result<Page<AuditLogEntry>, DatabaseError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn list_notifications(
        &self,
        recipient_id: &str,
        query: &NotificationQuery,
    ) -> Result<Page<Notification>, DatabaseError>;

    /// `None` when the notification does not exist or belongs to someone else
    async fn mark_notification_read(
        &self,
        id: Uuid,
        recipient_id: &str,
    ) -> Result<Option<Notification>, DatabaseError>;
}

/// A set of writes that becomes visible only on `commit`.
/// Dropping it without committing discards every write.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn update_profile(&mut self, id: &str, patch: &ProfilePatch) -> Result<Option<Profile>, DatabaseError>;

    /// Applies the same patch to every existing id; returns the ids updated
    async fn update_profiles(&mut self, ids: &[UserId], patch: &ProfilePatch) -> Result<Vec<UserId>, DatabaseError>;

    async fn update_ticket(&mut self, id: Uuid, patch: &TicketPatch) -> Result<Option<Ticket>, DatabaseError>;

    async fn insert_comment(&mut self, comment: &Comment) -> Result<(), DatabaseError>;

    async fn insert_notifications(&mut self, notifications: &[Notification]) -> Result<(), DatabaseError>;

    async fn append_audit(&mut self, entries: &[AuditLogEntry]) -> Result<(), DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}
