use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use clap::Parser;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cape_hq::api::{router, AppState};
use cape_hq::config::AppConfig;
use cape_hq::database::{DatabaseManager, MemoryStore, PgStore};
use cape_hq::storage::{LocalAvatarStorage, MemoryAvatarStorage};

#[derive(Parser)]
#[command(name = "cape-hq")]
#[command(about = "CAPE HQ API server")]
#[command(version)]
struct Cli {
    #[arg(long, env = "CAPE_HQ_PORT", help = "Port to listen on (overrides config)")]
    port: Option<u16>,

    #[arg(long, help = "Run against in-memory stores; nothing is persisted")]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cape_hq=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in {:?} mode", config.environment);
    }
    info!("Starting CAPE HQ in {:?} mode", config.environment);

    let avatar_dir = config.storage.avatar_dir.clone();
    let avatar_mount = url::Url::parse(&config.storage.avatar_base_url)
        .map(|u| u.path().trim_end_matches('/').to_string())
        .unwrap_or_default();

    let (state, serve_avatars) = if cli.memory || config.database.url.is_none() {
        warn!("Using in-memory store; data is lost on shutdown");
        let avatars = Arc::new(MemoryAvatarStorage::new(config.storage.avatar_base_url.clone()));
        (AppState::new(config.clone(), Arc::new(MemoryStore::new()), avatars), false)
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to PostgreSQL")?;
        let store = PgStore::new(pool, config.pagination.max_limit);
        if config.database.auto_migrate {
            store.ensure_schema().await.context("failed to apply schema")?;
            info!("Database schema is up to date");
        }
        let avatars = Arc::new(LocalAvatarStorage::new(
            avatar_dir.clone(),
            config.storage.avatar_base_url.clone(),
        ));
        (AppState::new(config.clone(), Arc::new(store), avatars), true)
    };

    let mut app = router(state);
    if serve_avatars && avatar_mount.starts_with('/') && avatar_mount.len() > 1 {
        app = app.nest_service(&avatar_mount, ServeDir::new(&avatar_dir));
    }
    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config)),
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("CAPE HQ listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if !config.is_production() && config.security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
