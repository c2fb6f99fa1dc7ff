use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::identity::IdentityProvider;
use super::role::{resolve_role, RoleSource};
use super::session::{Session, SessionUser};
use crate::types::Role;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Loading,
    Unauthenticated,
    Authenticated { user: SessionUser, role: Role },
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            AuthState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            AuthState::Authenticated { role, .. } => Some(*role),
            _ => None,
        }
    }
}

/// Called after every auth event so server-rendered views pick up the change
pub trait RouteRefresh: Send + Sync {
    fn refresh(&self);
}

impl<F> RouteRefresh for F
where
    F: Fn() + Send + Sync,
{
    fn refresh(&self) {
        self()
    }
}

/// Live view of the session and role.
///
/// Starts in `Loading`, settles after one session fetch, then follows the
/// identity provider's events. Dropping it stops the listener.
pub struct AuthContext {
    state: watch::Receiver<AuthState>,
    listener: Option<JoinHandle<()>>,
}

impl AuthContext {
    /// Must be called inside a tokio runtime
    pub fn mount(
        identity: Arc<dyn IdentityProvider>,
        roles: Arc<dyn RoleSource>,
        refresh: Arc<dyn RouteRefresh>,
    ) -> Self {
        let (tx, rx) = watch::channel(AuthState::Loading);
        // subscribe before the first fetch so an early sign-in is not missed
        let mut events = identity.subscribe();

        let listener = tokio::spawn(async move {
            let initial = match identity.get_session().await {
                Ok(session) => session,
                Err(e) => {
                    warn!("Initial session fetch failed: {}", e);
                    None
                }
            };
            tx.send_replace(derive_state(initial, identity.as_ref(), roles.as_ref()).await);

            loop {
                let session = match events.recv().await {
                    Ok(event) => {
                        debug!("Auth event: {:?}", event);
                        event.into_session()
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Missed {} auth events, refetching session", skipped);
                        identity.get_session().await.ok().flatten()
                    }
                    Err(RecvError::Closed) => break,
                };
                tx.send_replace(derive_state(session, identity.as_ref(), roles.as_ref()).await);
                refresh.refresh();
            }
        });

        Self {
            state: rx,
            listener: Some(listener),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    /// Stop listening. Same as dropping the handle.
    pub fn unmount(self) {}
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

async fn derive_state(session: Option<Session>, identity: &dyn IdentityProvider, roles: &dyn RoleSource) -> AuthState {
    match session {
        None => AuthState::Unauthenticated,
        Some(session) => {
            let role = resolve_role(&session, identity, roles).await;
            // pick up the role written back into the provider's metadata
            let user = match identity.get_session().await {
                Ok(Some(stored)) if stored.user.id == session.user.id => stored.user,
                _ => session.user,
            };
            AuthState::Authenticated { user, role }
        }
    }
}
