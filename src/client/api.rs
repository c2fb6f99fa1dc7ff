use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::role::RoleSource;
use super::session::Session;
use super::ClientError;
use crate::database::models::Profile;
use crate::types::Role;

/// Thin reqwest client for the CAPE HQ API
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn get(&self, path: &str, token: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.http.get(self.base_url.join(path)?).bearer_auth(token))
    }

    /// The caller's own profile; `None` when it does not exist yet
    pub async fn profile(&self, token: &str) -> Result<Option<Profile>, ClientError> {
        let response = self.get("/api/profile", token)?.send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    pub async fn list_tickets(&self, token: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let response = self.get("/api/tickets", token)?.query(query).send().await?;
        read_json(response).await
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        let response = self.http.get(self.base_url.join("/health")?).send().await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
        .to_string();
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RoleSource for ApiClient {
    async fn role_for(&self, session: &Session) -> Result<Option<Role>, ClientError> {
        Ok(self.profile(&session.access_token).await?.map(|p| p.role))
    }
}
