use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::rules::{non_blank, valid_json_object, valid_theme, valid_user_status};
use crate::database::models::ProfilePatch;

/// Fields a user may change on their own profile. Anything else, such as
/// `clearance_level` or `status`, is rejected outright.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateOwnProfileRequest {
    #[validate(custom(function = "valid_json_object"))]
    pub notification_preferences: Option<Value>,

    #[validate(custom(function = "valid_json_object"))]
    pub accessibility_settings: Option<Value>,

    #[validate(custom(function = "valid_theme"))]
    pub theme: Option<String>,
}

impl UpdateOwnProfileRequest {
    pub fn to_patch(&self) -> ProfilePatch {
        ProfilePatch {
            notification_preferences: self.notification_preferences.clone(),
            accessibility_settings: self.accessibility_settings.clone(),
            theme: self.theme.as_deref().and_then(|t| t.parse().ok()),
            ..Default::default()
        }
    }
}

/// Admin edit of another user's profile
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AdminProfileUpdateRequest {
    #[validate(
        length(min = 1, max = 100, message = "Codename must be 1-100 characters"),
        custom(function = "non_blank")
    )]
    pub codename: Option<String>,

    #[validate(custom(function = "valid_user_status"))]
    pub status: Option<String>,

    #[validate(range(min = 1, max = 10, message = "Clearance level must be between 1 and 10"))]
    pub clearance_level: Option<i32>,

    #[validate(custom(function = "valid_json_object"))]
    pub notification_preferences: Option<Value>,

    #[validate(custom(function = "valid_json_object"))]
    pub accessibility_settings: Option<Value>,

    #[validate(custom(function = "valid_theme"))]
    pub theme: Option<String>,

    #[validate(
        length(min = 1, max = 500, message = "Reason must be 1-500 characters"),
        custom(function = "non_blank")
    )]
    pub reason: Option<String>,
}

impl AdminProfileUpdateRequest {
    pub fn to_patch(&self) -> ProfilePatch {
        ProfilePatch {
            codename: self.codename.as_ref().map(|c| c.trim().to_string()),
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            clearance_level: self.clearance_level,
            notification_preferences: self.notification_preferences.clone(),
            accessibility_settings: self.accessibility_settings.clone(),
            theme: self.theme.as_deref().and_then(|t| t.parse().ok()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Theme;
    use serde_json::json;

    #[test]
    fn self_update_cannot_touch_clearance() {
        let result = serde_json::from_value::<UpdateOwnProfileRequest>(json!({"clearance_level": 10}));
        assert!(result.is_err());
    }

    #[test]
    fn self_update_maps_restricted_fields() {
        let req: UpdateOwnProfileRequest =
            serde_json::from_value(json!({"theme": "DARK", "notification_preferences": {"email": false}})).unwrap();
        assert!(req.validate().is_ok());
        let patch = req.to_patch();
        assert_eq!(patch.theme, Some(Theme::Dark));
        assert!(patch.status.is_none());
        assert!(patch.clearance_level.is_none());
    }
}
