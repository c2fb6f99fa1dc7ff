use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use tracing::{debug, warn};

use crate::api::AppState;
use crate::auth::Claims;
use crate::database::models::Profile;
use crate::error::ApiError;
use crate::types::{Role, UserId};

/// Caller identity from a valid bearer session. Extracting it is `require_auth`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    /// Role cached in the session metadata, if any
    pub role: Option<Role>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_jwt_from_headers(&parts.headers).map_err(ApiError::unauthorized)?;

        let claims = state.sessions.verify(&token).map_err(|e| {
            debug!("Rejected session token: {}", e);
            ApiError::unauthorized("Invalid or expired session")
        })?;

        Ok(AuthUser::from(claims))
    }
}

/// An authenticated caller whose profile clearance meets the admin threshold.
/// Extracting it is `require_admin`; it rejects before any handler work runs.
#[derive(Clone, Debug)]
pub struct AdminUser {
    pub user: AuthUser,
    pub profile: Profile,
}

impl AdminUser {
    pub fn id(&self) -> &str {
        &self.user.user_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let required = state.config.security.admin_clearance;

        match state.profiles.find_profile(&user.user_id).await? {
            Some(profile) if profile.clearance_level >= required => Ok(AdminUser { user, profile }),
            Some(profile) => {
                warn!(
                    "Admin access denied for {} (clearance {} < {})",
                    user.user_id, profile.clearance_level, required
                );
                Err(ApiError::forbidden("Insufficient clearance level"))
            }
            None => {
                warn!("Admin access denied for {} (no profile)", user.user_id);
                Err(ApiError::forbidden("Insufficient clearance level"))
            }
        }
    }
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Authentication required".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty session token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_required() {
        let mut headers = HeaderMap::new();
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }
}
