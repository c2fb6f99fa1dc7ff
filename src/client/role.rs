use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::identity::IdentityProvider;
use super::session::Session;
use super::ClientError;
use crate::types::Role;

/// Where the role comes from when session metadata does not carry one
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// `Ok(None)` when the user has no profile
    async fn role_for(&self, session: &Session) -> Result<Option<Role>, ClientError>;
}

/// Dashboard role for a session.
///
/// Order: the `role` cached in session metadata, then the profile record
/// (written back into metadata so the next lookup is local), then HERO.
/// Lookup and write-back failures are logged and fall through.
pub async fn resolve_role(session: &Session, identity: &dyn IdentityProvider, profiles: &dyn RoleSource) -> Role {
    if let Some(role) = session.user.metadata_role() {
        return role;
    }

    match profiles.role_for(session).await {
        Ok(Some(role)) => {
            if let Err(e) = identity
                .update_user_metadata("role", Value::String(role.as_str().to_string()))
                .await
            {
                warn!("Could not cache role for {}: {}", session.user.id, e);
            }
            role
        }
        Ok(None) => {
            debug!("No profile for {}, defaulting role", session.user.id);
            Role::default()
        }
        Err(e) => {
            warn!("Role lookup failed for {}: {}", session.user.id, e);
            Role::default()
        }
    }
}
