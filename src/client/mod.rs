//! Client-side session handling for dashboards and CLI tools.
//!
//! [`AuthContext`] tracks the current session and the caller's dashboard role.
//! The identity backend, the profile lookup used for role resolution, and the
//! route refresh hook are all passed in explicitly.

pub mod api;
pub mod context;
pub mod identity;
pub mod role;
pub mod session;

use thiserror::Error;

pub use api::ApiClient;
pub use context::{AuthContext, AuthState, RouteRefresh};
pub use identity::{IdentityProvider, LocalIdentity};
pub use role::{resolve_role, RoleSource};
pub use session::{Session, SessionEvent, SessionUser};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no active session")]
    NoSession,

    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },
}
