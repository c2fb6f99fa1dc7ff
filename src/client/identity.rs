use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use super::session::{Session, SessionEvent};
use super::ClientError;

/// The hosted identity service as seen by a client
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_session(&self) -> Result<Option<Session>, ClientError>;

    /// Set one key of the signed-in user's metadata
    async fn update_user_metadata(&self, key: &str, value: Value) -> Result<(), ClientError>;

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// In-process identity provider: holds one session and broadcasts
/// sign-in/sign-out. Metadata writes do not emit events.
pub struct LocalIdentity {
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl LocalIdentity {
    pub fn new() -> Self {
        Self::from_session(None)
    }

    pub fn with_session(session: Session) -> Self {
        Self::from_session(Some(session))
    }

    fn from_session(session: Option<Session>) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            session: RwLock::new(session),
            events,
        }
    }

    pub async fn sign_in(&self, session: Session) {
        *self.session.write().await = Some(session.clone());
        // no listeners is fine
        let _ = self.events.send(SessionEvent::SignedIn(session));
    }

    pub async fn sign_out(&self) {
        *self.session.write().await = None;
        let _ = self.events.send(SessionEvent::SignedOut);
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn get_session(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.session.read().await.clone())
    }

    async fn update_user_metadata(&self, key: &str, value: Value) -> Result<(), ClientError> {
        let mut guard = self.session.write().await;
        let session = guard.as_mut().ok_or(ClientError::NoSession)?;
        session.user.metadata.insert(key.to_string(), value);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
