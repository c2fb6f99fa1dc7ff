use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    AuditLogEntry, AuditQuery, Comment, CommentQuery, Notification, NotificationQuery, Page, Profile,
    ProfilePatch, ProfileQuery, Team, Ticket, TicketPatch, TicketQuery,
};
use crate::database::query_builder::QueryBuilder;
use crate::database::repository::{
    AuditRepository, CommentRepository, NotificationRepository, ProfileRepository, Store, TeamRepository,
    TicketRepository, UnitOfWork,
};
use crate::database::rows::{AuditLogRow, CommentRow, NotificationRow, ProfileRow, TeamRow, TicketRow};
use crate::filter::{Filter, SortDirection, SqlParam};
use crate::types::{Priority, TicketSort, UserId};

const SCHEMA: &str = include_str!("../../sql/schema.sql");

const UPDATE_PROFILES: &str = r#"
UPDATE profiles SET
    codename = COALESCE($2, codename),
    status = COALESCE($3, status),
    clearance_level = COALESCE($4, clearance_level),
    team_affiliations = COALESCE($5, team_affiliations),
    notification_preferences = COALESCE($6, notification_preferences),
    accessibility_settings = COALESCE($7, accessibility_settings),
    theme = COALESCE($8, theme),
    avatar_url = CASE WHEN $9 THEN $10 ELSE avatar_url END,
    updated_at = NOW()
WHERE id = ANY($1)
RETURNING *
"#;

/// PostgreSQL-backed store over a single pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    max_limit: u32,
}

impl PgStore {
    pub fn new(pool: PgPool, max_limit: u32) -> Self {
        Self { pool, max_limit }
    }

    /// Apply `sql/schema.sql`; every statement is idempotent
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        let statements = SCHEMA
            .split(';')
            .map(|stmt| {
                stmt.lines()
                    .filter(|line| !line.trim_start().starts_with("--"))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|stmt| !stmt.trim().is_empty());
        let mut applied = 0;
        for statement in statements {
            sqlx::query(&statement).execute(&self.pool).await?;
            applied += 1;
        }
        info!("Schema ensured ({} statements)", applied);
        Ok(())
    }

    fn filter(&self, table: &str) -> Result<Filter, DatabaseError> {
        let mut filter = Filter::new(table)?;
        filter.max_limit(self.max_limit);
        Ok(filter)
    }
}

fn rows_into<R, T>(rows: Vec<R>) -> Result<Vec<T>, DatabaseError>
where
    T: TryFrom<R, Error = DatabaseError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn text<T: ToString>(value: &Option<T>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn find_profile(&self, id: &str) -> Result<Option<Profile>, DatabaseError> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn list_profiles(&self, query: &ProfileQuery) -> Result<Page<Profile>, DatabaseError> {
        let mut filter = self.filter("profiles")?;
        if let Some(status) = query.status {
            filter.where_eq("status", SqlParam::Text(status.to_string()))?;
        }
        if let Some(level) = query.clearance_level {
            filter.where_eq("clearance_level", SqlParam::Int(i64::from(level)))?;
        }
        if let Some(term) = &query.search {
            filter.search(&["codename"], term)?;
        }
        filter.order("codename", SortDirection::Asc).order("id", SortDirection::Asc);
        filter.limit(query.page.limit, Some(query.page.offset()))?;

        let (rows, total) = QueryBuilder::<ProfileRow>::new(filter).select_page(&self.pool).await?;
        Ok(Page {
            items: rows_into(rows)?,
            total,
        })
    }

    async fn existing_profile_ids(&self, ids: &[UserId]) -> Result<Vec<UserId>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let found: Vec<String> = sqlx::query_scalar("SELECT id FROM profiles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.iter().filter(|id| found.contains(id)).cloned().collect())
    }
}

#[async_trait]
impl TeamRepository for PgStore {
    async fn list_teams(&self) -> Result<Vec<Team>, DatabaseError> {
        let rows = sqlx::query_as::<_, TeamRow>("SELECT * FROM teams ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn unknown_team_names(&self, names: &[String]) -> Result<Vec<String>, DatabaseError> {
        if names.is_empty() {
            return Ok(vec![]);
        }
        let known: Vec<String> = sqlx::query_scalar("SELECT name FROM teams WHERE name = ANY($1)")
            .bind(names)
            .fetch_all(&self.pool)
            .await?;
        Ok(names.iter().filter(|n| !known.contains(n)).cloned().collect())
    }
}

#[async_trait]
impl TicketRepository for PgStore {
    async fn list_tickets(&self, query: &TicketQuery) -> Result<Page<Ticket>, DatabaseError> {
        let mut filter = self.filter("tickets")?;
        if let Some(status) = query.status {
            filter.where_eq("status", SqlParam::Text(status.to_string()))?;
        }
        if let Some(priority) = query.priority {
            filter.where_eq("priority", SqlParam::Text(priority.to_string()))?;
        }
        if let Some(ticket_type) = query.ticket_type {
            filter.where_eq("type", SqlParam::Text(ticket_type.to_string()))?;
        }
        if let Some(term) = &query.search {
            filter.search(&["title", "description"], term)?;
        }
        match query.sort {
            TicketSort::Priority => {
                filter.order_ranked("priority", Priority::SEVERITY_ORDER, query.order);
            }
            other => {
                filter.order(other.column(), query.order);
            }
        }
        if query.sort != TicketSort::CreatedAt {
            filter.order("created_at", SortDirection::Desc);
        }
        filter.order("id", SortDirection::Asc);
        filter.limit(query.page.limit, Some(query.page.offset()))?;

        let (rows, total) = QueryBuilder::<TicketRow>::new(filter).select_page(&self.pool).await?;
        Ok(Page {
            items: rows_into(rows)?,
            total,
        })
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, DatabaseError> {
        let row = sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Ticket::try_from).transpose()
    }

    async fn create_ticket(&self, ticket: &Ticket) -> Result<(), DatabaseError> {
        let location = ticket
            .location
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        sqlx::query(
            r#"INSERT INTO tickets (id, title, description, priority, status, type, location,
                related_mission_id, related_equipment_id, assigned_to, created_by, metadata, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"#,
        )
        .bind(ticket.id)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(ticket.ticket_type.as_str())
        .bind(location)
        .bind(ticket.related_mission_id)
        .bind(ticket.related_equipment_id)
        .bind(&ticket.assigned_to)
        .bind(&ticket.created_by)
        .bind(&ticket.metadata)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn list_comments(&self, ticket_id: Uuid, query: &CommentQuery) -> Result<Page<Comment>, DatabaseError> {
        let mut filter = self.filter("ticket_comments")?;
        filter.where_eq("ticket_id", SqlParam::Uuid(ticket_id))?;
        match query.parent_id {
            Some(parent_id) => filter.where_eq("parent_id", SqlParam::Uuid(parent_id))?,
            None => filter.where_null("parent_id")?,
        };
        filter.order("created_at", SortDirection::Asc).order("id", SortDirection::Asc);
        filter.limit(query.page.limit, Some(query.page.offset()))?;

        let (rows, total) = QueryBuilder::<CommentRow>::new(filter).select_page(&self.pool).await?;
        Ok(Page {
            items: rows.into_iter().map(Comment::from).collect(),
            total,
        })
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, DatabaseError> {
        let row = sqlx::query_as::<_, CommentRow>("SELECT * FROM ticket_comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Comment::from))
    }
}

#[async_trait]
impl AuditRepository for PgStore {
    async fn list_audit_logs(&self, query: &AuditQuery) -> Result<Page<AuditLogEntry>, DatabaseError> {
        let mut filter = self.filter("audit_logs")?;
        if let Some(actor_id) = &query.actor_id {
            filter.where_eq("actor_id", SqlParam::Text(actor_id.clone()))?;
        }
        if let Some(target_id) = &query.target_id {
            filter.where_eq("target_id", SqlParam::Text(target_id.clone()))?;
        }
        if let Some(action) = &query.action {
            filter.where_eq("action", SqlParam::Text(action.clone()))?;
        }
        filter.order("created_at", SortDirection::Desc);
        filter.limit(query.page.limit, Some(query.page.offset()))?;

        let (rows, total) = QueryBuilder::<AuditLogRow>::new(filter).select_page(&self.pool).await?;
        Ok(Page {
            items: rows.into_iter().map(AuditLogEntry::from).collect(),
            total,
        })
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn list_notifications(
        &self,
        recipient_id: &str,
        query: &NotificationQuery,
    ) -> Result<Page<Notification>, DatabaseError> {
        let mut filter = self.filter("notifications")?;
        filter.where_eq("recipient_id", SqlParam::Text(recipient_id.to_string()))?;
        if query.unread_only {
            filter.where_eq("read", SqlParam::Bool(false))?;
        }
        filter.order("created_at", SortDirection::Desc);
        filter.limit(query.page.limit, Some(query.page.offset()))?;

        let (rows, total) = QueryBuilder::<NotificationRow>::new(filter).select_page(&self.pool).await?;
        Ok(Page {
            items: rows_into(rows)?,
            total,
        })
    }

    async fn mark_notification_read(
        &self,
        id: Uuid,
        recipient_id: &str,
    ) -> Result<Option<Notification>, DatabaseError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND recipient_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Notification::try_from).transpose()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DatabaseError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

/// A single SQL transaction; rolled back by sqlx when dropped uncommitted
struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    async fn patch_profiles(&mut self, ids: &[UserId], patch: &ProfilePatch) -> Result<Vec<ProfileRow>, DatabaseError> {
        let (clear_avatar, avatar_url) = match &patch.avatar_url {
            Some(url) => (true, url.clone()),
            None => (false, None),
        };
        let rows = sqlx::query_as::<_, ProfileRow>(UPDATE_PROFILES)
            .bind(ids)
            .bind(&patch.codename)
            .bind(text(&patch.status))
            .bind(patch.clearance_level)
            .bind(&patch.team_affiliations)
            .bind(&patch.notification_preferences)
            .bind(&patch.accessibility_settings)
            .bind(text(&patch.theme))
            .bind(clear_avatar)
            .bind(avatar_url)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn update_profile(&mut self, id: &str, patch: &ProfilePatch) -> Result<Option<Profile>, DatabaseError> {
        let rows = self.patch_profiles(&[id.to_string()], patch).await?;
        rows.into_iter().next().map(Profile::try_from).transpose()
    }

    async fn update_profiles(&mut self, ids: &[UserId], patch: &ProfilePatch) -> Result<Vec<UserId>, DatabaseError> {
        let rows = self.patch_profiles(ids, patch).await?;
        Ok(ids
            .iter()
            .filter(|id| rows.iter().any(|row| &row.id == *id))
            .cloned()
            .collect())
    }

    async fn update_ticket(&mut self, id: Uuid, patch: &TicketPatch) -> Result<Option<Ticket>, DatabaseError> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"UPDATE tickets SET
                status = COALESCE($2, status),
                priority = COALESCE($3, priority),
                assigned_to = COALESCE($4, assigned_to),
                updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(text(&patch.status))
        .bind(text(&patch.priority))
        .bind(&patch.assigned_to)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Ticket::try_from).transpose()
    }

    async fn insert_comment(&mut self, comment: &Comment) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"INSERT INTO ticket_comments (id, ticket_id, parent_id, author_id, content, mentioned_heroes, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(comment.id)
        .bind(comment.ticket_id)
        .bind(comment.parent_id)
        .bind(&comment.author_id)
        .bind(&comment.content)
        .bind(&comment.mentioned_heroes)
        .bind(comment.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_notifications(&mut self, notifications: &[Notification]) -> Result<(), DatabaseError> {
        for n in notifications {
            sqlx::query(
                r#"INSERT INTO notifications (id, recipient_id, sender_id, type, ticket_id, comment_id, read, created_at)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
            )
            .bind(n.id)
            .bind(&n.recipient_id)
            .bind(&n.sender_id)
            .bind(n.notification_type.as_str())
            .bind(n.ticket_id)
            .bind(n.comment_id)
            .bind(n.read)
            .bind(n.created_at)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn append_audit(&mut self, entries: &[AuditLogEntry]) -> Result<(), DatabaseError> {
        for entry in entries {
            sqlx::query(
                r#"INSERT INTO audit_logs (id, actor_id, action, target_id, changes, reason, created_at)
                   VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
            )
            .bind(entry.id)
            .bind(&entry.actor_id)
            .bind(&entry.action)
            .bind(&entry.target_id)
            .bind(&entry.changes)
            .bind(&entry.reason)
            .bind(entry.created_at)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }
}
