use serde::Deserialize;
use validator::Validate;

use super::rules::{dedup_ids, non_blank, valid_team_names, valid_user_ids, valid_user_status};
use crate::database::models::{AuditQuery, NotificationQuery, PageRequest, ProfileQuery};
use crate::types::{UserId, UserStatus};

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    25
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be >= 1"))]
    pub page: u32,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: u32,

    #[validate(custom(function = "valid_user_status"))]
    pub status: Option<String>,

    #[validate(range(min = 1, max = 10, message = "Clearance level must be between 1 and 10"))]
    pub clearance_level: Option<i32>,

    #[validate(length(max = 100, message = "Search must be at most 100 characters"))]
    pub search: Option<String>,
}

impl UserListQuery {
    pub fn to_query(&self) -> ProfileQuery {
        ProfileQuery {
            page: PageRequest::new(self.page, self.limit),
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            clearance_level: self.clearance_level,
            search: self.search.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "valid_user_status"))]
    pub status: Option<String>,

    #[validate(range(min = 1, max = 10, message = "Clearance level must be between 1 and 10"))]
    pub clearance_level: Option<i32>,

    #[validate(
        length(min = 1, max = 500, message = "Reason must be 1-500 characters"),
        custom(function = "non_blank")
    )]
    pub reason: Option<String>,
}

impl UpdateUserRequest {
    pub fn status(&self) -> Option<UserStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignTeamsRequest {
    #[serde(default)]
    #[validate(custom(function = "valid_team_names"))]
    pub teams: Vec<String>,

    #[validate(
        length(min = 1, max = 500, message = "Reason must be 1-500 characters"),
        custom(function = "non_blank")
    )]
    pub reason: Option<String>,
}

impl AssignTeamsRequest {
    pub fn team_names(&self) -> Vec<String> {
        dedup_ids(&self.teams)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkStatusRequest {
    #[serde(default)]
    #[validate(custom(function = "valid_user_ids"))]
    pub user_ids: Vec<UserId>,

    #[serde(default)]
    #[validate(custom(function = "valid_user_status"))]
    pub status: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 500, message = "Reason must be 1-500 characters"),
        custom(function = "non_blank")
    )]
    pub reason: String,
}

impl BulkStatusRequest {
    pub fn user_ids(&self) -> Vec<UserId> {
        dedup_ids(&self.user_ids)
    }

    pub fn status(&self) -> Option<UserStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkTeamsRequest {
    #[serde(default)]
    #[validate(custom(function = "valid_user_ids"))]
    pub user_ids: Vec<UserId>,

    #[serde(default)]
    #[validate(custom(function = "valid_team_names"))]
    pub teams: Vec<String>,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 500, message = "Reason must be 1-500 characters"),
        custom(function = "non_blank")
    )]
    pub reason: String,
}

impl BulkTeamsRequest {
    pub fn user_ids(&self) -> Vec<UserId> {
        dedup_ids(&self.user_ids)
    }

    pub fn team_names(&self) -> Vec<String> {
        dedup_ids(&self.teams)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AuditLogListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be >= 1"))]
    pub page: u32,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: u32,

    pub actor_id: Option<UserId>,

    pub target_id: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Action must be 1-64 characters"))]
    pub action: Option<String>,
}

impl AuditLogListQuery {
    pub fn to_query(&self) -> AuditQuery {
        AuditQuery {
            page: PageRequest::new(self.page, self.limit),
            actor_id: self.actor_id.clone(),
            target_id: self.target_id.clone(),
            action: self.action.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NotificationListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be >= 1"))]
    pub page: u32,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: u32,

    #[serde(default)]
    pub unread_only: bool,
}

impl NotificationListQuery {
    pub fn to_query(&self) -> NotificationQuery {
        NotificationQuery {
            page: PageRequest::new(self.page, self.limit),
            unread_only: self.unread_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::field_errors;
    use serde_json::json;

    #[test]
    fn bulk_status_requires_every_field() {
        let req: BulkStatusRequest = serde_json::from_value(json!({})).unwrap();
        let errors = field_errors(&req.validate().unwrap_err());
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["reason", "status", "user_ids"]);
    }

    #[test]
    fn bulk_status_accepts_lower_case_status() {
        let req: BulkStatusRequest = serde_json::from_value(json!({
            "user_ids": ["u1", "u2", "u1"], "status": "inactive", "reason": "policy sweep"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.status(), Some(UserStatus::Inactive));
        assert_eq!(req.user_ids(), vec!["u1".to_string(), "u2".to_string()]);
    }

    #[test]
    fn clearance_is_bounded() {
        let req: UpdateUserRequest = serde_json::from_value(json!({"clearance_level": 11})).unwrap();
        assert!(req.validate().is_err());
        let req: UpdateUserRequest = serde_json::from_value(json!({"clearance_level": 10})).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn team_assignment_needs_a_team() {
        let req: AssignTeamsRequest = serde_json::from_value(json!({"teams": []})).unwrap();
        assert!(req.validate().is_err());
    }
}
