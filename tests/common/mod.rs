#![allow(dead_code)]

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};

use cape_hq::testing::TestApp;

/// One server per test: its own in-memory store on its own port
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub app: TestApp,
    client: Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_app(TestApp::new()).await
    }

    pub async fn spawn_app(app: TestApp) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let router = app.router();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            port,
            base_url,
            app,
            client: Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token(&self, user_id: &str) -> String {
        self.app.token(user_id).expect("failed to issue test token")
    }

    pub fn anonymous(&self) -> &Client {
        &self.client
    }

    pub fn get(&self, path: &str, user_id: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(self.token(user_id))
    }

    pub fn post(&self, path: &str, user_id: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(self.token(user_id))
    }

    pub fn patch(&self, path: &str, user_id: &str) -> RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(self.token(user_id))
    }

    pub fn delete(&self, path: &str, user_id: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(self.token(user_id))
    }
}
