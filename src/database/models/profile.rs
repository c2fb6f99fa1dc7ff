use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Role, Theme, UserId, UserStatus};

use super::page::PageRequest;

/// A hero, support agent or administrator as stored in `profiles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub codename: String,
    pub role: Role,
    pub status: UserStatus,
    pub clearance_level: i32,
    pub team_affiliations: Vec<String>,
    pub notification_preferences: Value,
    pub accessibility_settings: Value,
    pub theme: Option<Theme>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// New active profile with default settings
    pub fn new(id: impl Into<UserId>, codename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            codename: codename.into(),
            role: Role::Hero,
            status: UserStatus::Active,
            clearance_level: 1,
            team_affiliations: Vec::new(),
            notification_preferences: Value::Object(Default::default()),
            accessibility_settings: Value::Object(Default::default()),
            theme: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile update. Serializes to exactly the fields being applied,
/// which is what lands in the audit log `changes` column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clearance_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_affiliations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_preferences: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility_settings: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    /// `Some(None)` clears the avatar
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self == &ProfilePatch::default()
    }

    /// JSON form of the patch for audit `changes`
    pub fn to_changes(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn apply(&self, profile: &mut Profile) {
        if let Some(codename) = &self.codename {
            profile.codename = codename.clone();
        }
        if let Some(status) = self.status {
            profile.status = status;
        }
        if let Some(level) = self.clearance_level {
            profile.clearance_level = level;
        }
        if let Some(teams) = &self.team_affiliations {
            profile.team_affiliations = teams.clone();
        }
        if let Some(prefs) = &self.notification_preferences {
            profile.notification_preferences = prefs.clone();
        }
        if let Some(settings) = &self.accessibility_settings {
            profile.accessibility_settings = settings.clone();
        }
        if let Some(theme) = self.theme {
            profile.theme = Some(theme);
        }
        if let Some(avatar_url) = &self.avatar_url {
            profile.avatar_url = avatar_url.clone();
        }
        profile.updated_at = Utc::now();
    }
}

/// Admin user listing filters
#[derive(Debug, Clone, Default)]
pub struct ProfileQuery {
    pub page: PageRequest,
    pub status: Option<UserStatus>,
    pub clearance_level: Option<i32>,
    /// Case-insensitive codename substring
    pub search: Option<String>,
}
