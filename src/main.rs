use std::net::SocketAddr;

mod admin;
mod app;
mod auth;
mod config;
mod error;
mod resumes;
mod state;
mod store;

use crate::admin::services::run_startup_bootstrap;
use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "resume_vault=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let (app_state, pg) = AppState::init(config).await?;
    run_startup_bootstrap(app_state.store.as_ref(), &app_state.config.admin).await;

    app::serve(app::build_app(app_state), addr).await?;

    if let Some(pg) = pg {
        pg.close().await;
        tracing::info!("database pool closed");
    }
    Ok(())
}
