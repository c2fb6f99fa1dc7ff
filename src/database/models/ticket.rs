use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::filter::SortDirection;
use crate::types::{Priority, TicketSort, TicketStatus, TicketType, UserId};

use super::page::PageRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TicketStatus,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub location: Option<Location>,
    pub related_mission_id: Option<Uuid>,
    pub related_equipment_id: Option<Uuid>,
    pub assigned_to: Option<UserId>,
    pub created_by: UserId,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a ticket update may touch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self == &TicketPatch::default()
    }

    /// JSON form of the patch for audit `changes`
    pub fn to_changes(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn apply(&self, ticket: &mut Ticket) {
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(priority) = self.priority {
            ticket.priority = priority;
        }
        if let Some(assignee) = &self.assigned_to {
            ticket.assigned_to = Some(assignee.clone());
        }
        ticket.updated_at = Utc::now();
    }
}

/// Ticket list filters, sort and page
#[derive(Debug, Clone)]
pub struct TicketQuery {
    pub page: PageRequest,
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub ticket_type: Option<TicketType>,
    /// Case-insensitive substring over title and description
    pub search: Option<String>,
    pub sort: TicketSort,
    pub order: SortDirection,
}

impl Default for TicketQuery {
    fn default() -> Self {
        Self {
            page: PageRequest::default(),
            status: None,
            priority: None,
            ticket_type: None,
            search: None,
            sort: TicketSort::CreatedAt,
            order: SortDirection::Desc,
        }
    }
}
