//! In-process store used by `--memory` mode and the test suite.
//!
//! A unit of work holds the write lock for its whole lifetime and mutates a
//! scratch copy of the state, which replaces the live state on commit.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    AuditLogEntry, AuditQuery, Comment, CommentQuery, Notification, NotificationQuery, Page, Profile,
    ProfilePatch, ProfileQuery, Team, Ticket, TicketPatch, TicketQuery,
};
use crate::database::repository::{
    AuditRepository, CommentRepository, NotificationRepository, ProfileRepository, Store, TeamRepository,
    TicketRepository, UnitOfWork,
};
use crate::filter::SortDirection;
use crate::types::{TicketSort, UserId};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    profiles: BTreeMap<UserId, Profile>,
    teams: Vec<Team>,
    tickets: BTreeMap<Uuid, Ticket>,
    comments: Vec<Comment>,
    notifications: Vec<Notification>,
    audit_logs: Vec<AuditLogEntry>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    fail_audit_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.state.write().await.profiles.insert(profile.id.clone(), profile);
    }

    pub async fn insert_team(&self, team: Team) {
        self.state.write().await.teams.push(team);
    }

    pub async fn insert_ticket(&self, ticket: Ticket) {
        self.state.write().await.tickets.insert(ticket.id, ticket);
    }

    pub async fn audit_logs(&self) -> Vec<AuditLogEntry> {
        self.state.read().await.audit_logs.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.read().await.notifications.clone()
    }

    pub async fn comments(&self) -> Vec<Comment> {
        self.state.read().await.comments.clone()
    }

    /// Make every subsequent audit append fail, simulating an audit store outage
    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit_writes.store(fail, Ordering::SeqCst);
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn search_term(search: &Option<String>) -> Option<&str> {
    search.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find_profile(&self, id: &str) -> Result<Option<Profile>, DatabaseError> {
        Ok(self.state.read().await.profiles.get(id).cloned())
    }

    async fn list_profiles(&self, query: &ProfileQuery) -> Result<Page<Profile>, DatabaseError> {
        let state = self.state.read().await;
        let term = search_term(&query.search);
        let mut matched: Vec<Profile> = state
            .profiles
            .values()
            .filter(|p| query.status.map_or(true, |s| p.status == s))
            .filter(|p| query.clearance_level.map_or(true, |c| p.clearance_level == c))
            .filter(|p| term.map_or(true, |t| contains_ci(&p.codename, t)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.codename.cmp(&b.codename).then_with(|| a.id.cmp(&b.id)));
        Ok(Page::slice(matched, query.page))
    }

    async fn existing_profile_ids(&self, ids: &[UserId]) -> Result<Vec<UserId>, DatabaseError> {
        let state = self.state.read().await;
        Ok(ids.iter().filter(|id| state.profiles.contains_key(*id)).cloned().collect())
    }
}

#[async_trait]
impl TeamRepository for MemoryStore {
    async fn list_teams(&self) -> Result<Vec<Team>, DatabaseError> {
        let mut teams = self.state.read().await.teams.clone();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    async fn unknown_team_names(&self, names: &[String]) -> Result<Vec<String>, DatabaseError> {
        let state = self.state.read().await;
        let known: HashSet<&str> = state.teams.iter().map(|t| t.name.as_str()).collect();
        Ok(names.iter().filter(|n| !known.contains(n.as_str())).cloned().collect())
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn list_tickets(&self, query: &TicketQuery) -> Result<Page<Ticket>, DatabaseError> {
        let state = self.state.read().await;
        let term = search_term(&query.search);
        let mut matched: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .filter(|t| query.priority.map_or(true, |p| t.priority == p))
            .filter(|t| query.ticket_type.map_or(true, |k| t.ticket_type == k))
            .filter(|t| term.map_or(true, |s| contains_ci(&t.title, s) || contains_ci(&t.description, s)))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let primary = match query.sort {
                TicketSort::CreatedAt => a.created_at.cmp(&b.created_at),
                TicketSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                TicketSort::Priority => a.priority.cmp(&b.priority),
            };
            let primary = match query.order {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(Page::slice(matched, query.page))
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, DatabaseError> {
        Ok(self.state.read().await.tickets.get(&id).cloned())
    }

    async fn create_ticket(&self, ticket: &Ticket) -> Result<(), DatabaseError> {
        self.state.write().await.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn list_comments(&self, ticket_id: Uuid, query: &CommentQuery) -> Result<Page<Comment>, DatabaseError> {
        let state = self.state.read().await;
        let mut matched: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.ticket_id == ticket_id && c.parent_id == query.parent_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(Page::slice(matched, query.page))
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, DatabaseError> {
        Ok(self.state.read().await.comments.iter().find(|c| c.id == id).cloned())
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn list_audit_logs(&self, query: &AuditQuery) -> Result<Page<AuditLogEntry>, DatabaseError> {
        let state = self.state.read().await;
        let mut matched: Vec<AuditLogEntry> = state
            .audit_logs
            .iter()
            .filter(|e| query.actor_id.as_ref().map_or(true, |a| &e.actor_id == a))
            .filter(|e| query.target_id.as_ref().map_or(true, |t| &e.target_id == t))
            .filter(|e| query.action.as_ref().map_or(true, |a| &e.action == a))
            .cloned()
            .collect();
        // latest insert first among identical timestamps
        matched.reverse();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::slice(matched, query.page))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn list_notifications(
        &self,
        recipient_id: &str,
        query: &NotificationQuery,
    ) -> Result<Page<Notification>, DatabaseError> {
        let state = self.state.read().await;
        let mut matched: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .filter(|n| !query.unread_only || !n.read)
            .cloned()
            .collect();
        matched.reverse();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::slice(matched, query.page))
    }

    async fn mark_notification_read(
        &self,
        id: Uuid,
        recipient_id: &str,
    ) -> Result<Option<Notification>, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
            .map(|n| {
                n.read = true;
                n.clone()
            }))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DatabaseError> {
        let guard = self.state.clone().write_owned().await;
        let scratch = (*guard).clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            scratch,
            fail_audit_writes: self.fail_audit_writes.load(Ordering::SeqCst),
        }))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

struct MemoryUnitOfWork {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    scratch: MemoryState,
    fail_audit_writes: bool,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn update_profile(&mut self, id: &str, patch: &ProfilePatch) -> Result<Option<Profile>, DatabaseError> {
        Ok(self.scratch.profiles.get_mut(id).map(|profile| {
            patch.apply(profile);
            profile.clone()
        }))
    }

    async fn update_profiles(&mut self, ids: &[UserId], patch: &ProfilePatch) -> Result<Vec<UserId>, DatabaseError> {
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(profile) = self.scratch.profiles.get_mut(id) {
                patch.apply(profile);
                updated.push(id.clone());
            }
        }
        Ok(updated)
    }

    async fn update_ticket(&mut self, id: Uuid, patch: &TicketPatch) -> Result<Option<Ticket>, DatabaseError> {
        Ok(self.scratch.tickets.get_mut(&id).map(|ticket| {
            patch.apply(ticket);
            ticket.clone()
        }))
    }

    async fn insert_comment(&mut self, comment: &Comment) -> Result<(), DatabaseError> {
        self.scratch.comments.push(comment.clone());
        Ok(())
    }

    async fn insert_notifications(&mut self, notifications: &[Notification]) -> Result<(), DatabaseError> {
        self.scratch.notifications.extend_from_slice(notifications);
        Ok(())
    }

    async fn append_audit(&mut self, entries: &[AuditLogEntry]) -> Result<(), DatabaseError> {
        if self.fail_audit_writes {
            return Err(DatabaseError::QueryError("audit_logs is unavailable".to_string()));
        }
        self.scratch.audit_logs.extend_from_slice(entries);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let MemoryUnitOfWork { mut guard, scratch, .. } = *self;
        *guard = scratch;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::PageRequest;
    use crate::types::UserStatus;

    async fn store_with_heroes() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_profile(Profile::new("u1", "Nightwing")).await;
        store.insert_profile(Profile::new("u2", "Starfire")).await;
        store
    }

    #[tokio::test]
    async fn uncommitted_work_is_discarded() {
        let store = store_with_heroes().await;
        {
            let mut uow = store.begin().await.unwrap();
            let patch = ProfilePatch {
                status: Some(UserStatus::Mia),
                ..Default::default()
            };
            uow.update_profile("u1", &patch).await.unwrap();
        }
        let profile = store.find_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn committed_work_is_visible() {
        let store = store_with_heroes().await;
        let mut uow = store.begin().await.unwrap();
        let patch = ProfilePatch {
            status: Some(UserStatus::Inactive),
            ..Default::default()
        };
        let updated = uow
            .update_profiles(&["u1".into(), "ghost".into(), "u2".into()], &patch)
            .await
            .unwrap();
        assert_eq!(updated, vec!["u1".to_string(), "u2".to_string()]);
        uow.commit().await.unwrap();

        let page = store
            .list_profiles(&ProfileQuery {
                page: PageRequest::new(1, 25),
                status: Some(UserStatus::Inactive),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn audit_outage_fails_the_append() {
        let store = store_with_heroes().await;
        store.fail_audit_writes(true);
        let mut uow = store.begin().await.unwrap();
        assert!(uow.append_audit(&[]).await.is_err());
    }

    #[tokio::test]
    async fn unknown_team_names_are_reported() {
        let store = MemoryStore::new();
        store.insert_team(Team::new("Titans")).await;
        let unknown = store
            .unknown_team_names(&["Titans".into(), "Legion".into()])
            .await
            .unwrap();
        assert_eq!(unknown, vec!["Legion".to_string()]);
    }
}
