use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use cape_hq::auth::JwtSessionProvider;
use cape_hq::client::{ApiClient, AuthContext, AuthState, LocalIdentity, Session, SessionUser};
use cape_hq::config::AppConfig;
use cape_hq::types::Role;

#[derive(Parser)]
#[command(name = "cape")]
#[command(about = "CAPE HQ CLI - talk to a CAPE HQ server")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, env = "CAPE_HQ_URL", default_value = "http://localhost:3000")]
    server: String,

    #[arg(long, global = true, help = "Output in JSON format")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Check server health")]
    Health,

    #[command(about = "Issue a development session token from the local JWT_SECRET")]
    Token {
        user_id: String,
        #[arg(long)]
        role: Option<Role>,
    },

    #[command(about = "Resolve the signed-in user and their dashboard role")]
    Whoami {
        #[arg(long, env = "CAPE_HQ_USER")]
        user: String,
        #[arg(long, env = "CAPE_HQ_TOKEN")]
        token: String,
    },

    #[command(about = "List tickets")]
    Tickets {
        #[arg(long, env = "CAPE_HQ_TOKEN")]
        token: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Health => {
            let health = ApiClient::new(&cli.server)?.health().await?;
            print(cli.json, &health, |v| format!("Server status: {}", v["status"].as_str().unwrap_or("unknown")))
        }
        Commands::Token { user_id, role } => {
            let config = AppConfig::from_env();
            let token = JwtSessionProvider::from_config(&config.security)
                .issue(&user_id, role)
                .context("failed to issue token")?;
            print(cli.json, &json!({ "user_id": user_id, "token": token }), |v| {
                v["token"].as_str().unwrap_or_default().to_string()
            })
        }
        Commands::Whoami { user, token } => {
            let api = Arc::new(ApiClient::new(&cli.server)?);
            let identity = Arc::new(LocalIdentity::with_session(Session::new(SessionUser::new(user), token)));
            let context = AuthContext::mount(identity, api, Arc::new(|| {}));

            let mut state = context.watch();
            let settled = state
                .wait_for(|s| !s.is_loading())
                .await
                .context("auth context stopped before settling")?
                .clone();
            context.unmount();

            let body = match settled {
                AuthState::Authenticated { user, role } => json!({ "user_id": user.id, "role": role }),
                _ => json!({ "user_id": null, "role": null }),
            };
            print(cli.json, &body, |v| {
                format!(
                    "{} ({})",
                    v["user_id"].as_str().unwrap_or("not signed in"),
                    v["role"].as_str().unwrap_or("-")
                )
            })
        }
        Commands::Tickets {
            token,
            status,
            priority,
            search,
            page,
            limit,
        } => {
            let mut query = vec![("page", page.to_string()), ("limit", limit.to_string())];
            query.extend(status.map(|s| ("status", s)));
            query.extend(priority.map(|p| ("priority", p)));
            query.extend(search.map(|s| ("search", s)));

            let listing = ApiClient::new(&cli.server)?.list_tickets(&token, &query).await?;
            print(cli.json, &listing, |v| {
                let tickets = v["tickets"].as_array().cloned().unwrap_or_default();
                if tickets.is_empty() {
                    return "No tickets".to_string();
                }
                tickets
                    .iter()
                    .map(|t| {
                        format!(
                            "{}  {:<6} {:<11} {}",
                            t["id"].as_str().unwrap_or_default(),
                            t["priority"].as_str().unwrap_or_default(),
                            t["status"].as_str().unwrap_or_default(),
                            t["title"].as_str().unwrap_or_default()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

fn print(json_output: bool, value: &Value, text: impl Fn(&Value) -> String) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text(value));
    }
    Ok(())
}
