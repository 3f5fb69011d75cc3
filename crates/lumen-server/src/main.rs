mod cleanup;
mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use lumen_api::routes::api_router;
use lumen_api::token::TokenManager;
use lumen_api::{AppState, AppStateInner};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumen=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = lumen_db::Database::open(&PathBuf::from(&config.db_path))?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        tokens: TokenManager::new(&config.jwt_secret, config.jwt_expiry_hours),
        ai: lumen_ai::AiService::new(&config.openrouter_api_key, &config.openrouter_model)?,
        mailer: lumen_mail::Mailer::new(
            &config.mail_endpoint,
            &config.mail_api_key,
            &config.mail_from,
        )?,
    });

    tokio::spawn(cleanup::run_cleanup_loop(
        state.clone(),
        config.cleanup_interval_secs,
    ));

    let app = api_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Lumen server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
