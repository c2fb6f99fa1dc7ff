use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::rules::{
    non_blank, valid_json_object, valid_order, valid_priority, valid_sort, valid_ticket_status, valid_ticket_type,
};
use crate::database::models::{CommentQuery, Location, PageRequest, TicketQuery};
use crate::filter::SortDirection;
use crate::types::{Priority, TicketSort, TicketStatus, TicketType, UserId};

fn default_page() -> u32 {
    1
}

fn default_ticket_limit() -> u32 {
    10
}

fn default_comment_limit() -> u32 {
    25
}

// Values reaching these helpers have already passed validation.
fn parsed<E: std::str::FromStr>(value: &Option<String>) -> Option<E> {
    value.as_deref().and_then(|v| v.parse().ok())
}

#[derive(Debug, Deserialize, Validate)]
pub struct TicketListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be >= 1"))]
    pub page: u32,

    #[serde(default = "default_ticket_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: u32,

    #[validate(custom(function = "valid_ticket_status"))]
    pub status: Option<String>,

    #[validate(custom(function = "valid_priority"))]
    pub priority: Option<String>,

    #[serde(rename = "type")]
    #[validate(custom(function = "valid_ticket_type"))]
    pub ticket_type: Option<String>,

    #[validate(length(max = 200, message = "Search must be at most 200 characters"))]
    pub search: Option<String>,

    #[validate(custom(function = "valid_sort"))]
    pub sort: Option<String>,

    #[validate(custom(function = "valid_order"))]
    pub order: Option<String>,
}

impl TicketListQuery {
    pub fn to_query(&self) -> TicketQuery {
        TicketQuery {
            page: PageRequest::new(self.page, self.limit),
            status: parsed(&self.status),
            priority: parsed(&self.priority),
            ticket_type: parsed(&self.ticket_type),
            search: self.search.clone(),
            sort: parsed(&self.sort).unwrap_or(TicketSort::CreatedAt),
            order: parsed(&self.order).unwrap_or(SortDirection::Desc),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,

    #[validate(length(max = 500, message = "Address must be at most 500 characters"))]
    pub address: Option<String>,
}

impl From<LocationInput> for Location {
    fn from(input: LocationInput) -> Self {
        Location {
            latitude: input.latitude,
            longitude: input.longitude,
            address: input.address,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = "non_blank")
    )]
    pub title: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 5000, message = "Description must be 1-5000 characters"),
        custom(function = "non_blank")
    )]
    pub description: String,

    #[validate(custom(function = "valid_priority"))]
    pub priority: Option<String>,

    #[serde(default, rename = "type")]
    #[validate(custom(function = "valid_ticket_type"))]
    pub ticket_type: String,

    #[validate(nested)]
    pub location: Option<LocationInput>,

    pub related_mission_id: Option<Uuid>,

    pub related_equipment_id: Option<Uuid>,

    #[validate(custom(function = "valid_json_object"))]
    pub metadata: Option<Value>,
}

impl CreateTicketRequest {
    pub fn priority(&self) -> Priority {
        parsed(&self.priority).unwrap_or_default()
    }

    pub fn ticket_type(&self) -> Option<TicketType> {
        self.ticket_type.parse().ok()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTicketRequest {
    #[validate(custom(function = "valid_ticket_status"))]
    pub status: Option<String>,

    #[validate(custom(function = "valid_priority"))]
    pub priority: Option<String>,

    #[validate(length(min = 1, max = 128, message = "assigned_to must be a user id"))]
    pub assigned_to: Option<UserId>,
}

impl UpdateTicketRequest {
    pub fn status(&self) -> Option<TicketStatus> {
        parsed(&self.status)
    }

    pub fn priority(&self) -> Option<Priority> {
        parsed(&self.priority)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be >= 1"))]
    pub page: u32,

    #[serde(default = "default_comment_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: u32,

    pub parent_id: Option<Uuid>,
}

impl CommentListQuery {
    pub fn to_query(&self) -> CommentQuery {
        CommentQuery {
            page: PageRequest::new(self.page, self.limit),
            parent_id: self.parent_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 5000, message = "Content must be 1-5000 characters"),
        custom(function = "non_blank")
    )]
    pub content: String,

    pub parent_id: Option<Uuid>,

    #[validate(length(max = 100, message = "At most 100 heroes can be mentioned"))]
    pub mentioned_heroes: Option<Vec<UserId>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_defaults_apply() {
        let q: TicketListQuery = serde_json::from_value(json!({})).unwrap();
        assert!(q.validate().is_ok());
        let query = q.to_query();
        assert_eq!(query.page, PageRequest::new(1, 10));
        assert_eq!(query.sort, TicketSort::CreatedAt);
        assert_eq!(query.order, SortDirection::Desc);
    }

    #[test]
    fn list_parses_enums_case_insensitively() {
        let q: TicketListQuery = serde_json::from_value(json!({
            "status": "in_progress", "sort": "priority", "order": "asc", "limit": 50
        }))
        .unwrap();
        assert!(q.validate().is_ok());
        let query = q.to_query();
        assert_eq!(query.status, Some(TicketStatus::InProgress));
        assert_eq!(query.sort, TicketSort::Priority);
        assert_eq!(query.order, SortDirection::Asc);
    }

    #[test]
    fn limit_over_100_is_rejected() {
        let q: TicketListQuery = serde_json::from_value(json!({"limit": 101})).unwrap();
        assert!(q.validate().is_err());
    }

    #[test]
    fn create_defaults_priority_to_beta() {
        let req: CreateTicketRequest = serde_json::from_value(json!({
            "title": "Reactor leak", "description": "Sector 7", "type": "equipment"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.priority(), Priority::Beta);
        assert_eq!(req.ticket_type(), Some(TicketType::Equipment));
    }

    #[test]
    fn metadata_must_be_an_object() {
        let req: CreateTicketRequest = serde_json::from_value(json!({
            "title": "t", "description": "d", "type": "MISSION", "metadata": [1, 2]
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
