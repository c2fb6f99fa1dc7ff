use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Role, UserId};

/// The signed-in user as the identity provider describes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form user metadata; `role` is cached here once resolved
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SessionUser {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
            metadata: Map::new(),
        }
    }

    /// Role cached in metadata, ignoring values that are not a known role
    pub fn metadata_role(&self) -> Option<Role> {
        self.metadata.get("role")?.as_str()?.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: SessionUser,
}

impl Session {
    pub fn new(user: SessionUser, access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user,
        }
    }
}

/// Auth state changes pushed by the identity provider
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    UserUpdated(Session),
    SignedOut,
}

impl SessionEvent {
    /// Session in effect after this event
    pub fn into_session(self) -> Option<Session> {
        match self {
            SessionEvent::SignedIn(s) | SessionEvent::TokenRefreshed(s) | SessionEvent::UserUpdated(s) => Some(s),
            SessionEvent::SignedOut => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_role_parses_known_roles_only() {
        let mut user = SessionUser::new("u1");
        assert_eq!(user.metadata_role(), None);

        user.metadata.insert("role".into(), json!("support"));
        assert_eq!(user.metadata_role(), Some(Role::Support));

        user.metadata.insert("role".into(), json!("SIDEKICK"));
        assert_eq!(user.metadata_role(), None);
    }
}
