//! REST surface of the Lumen journal backend: handlers, auth middleware,
//! the response envelope, and router assembly.

pub mod ai;
pub mod auth;
pub mod error;
pub mod extract;
pub mod journal;
pub mod middleware;
pub mod routes;
pub mod stats;
pub mod token;

use std::sync::Arc;

use tracing::error;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: lumen_db::Database,
    pub tokens: token::TokenManager,
    pub ai: lumen_ai::AiService,
    pub mailer: lumen_mail::Mailer,
}

/// Run a blocking database closure off the async runtime. Storage failures
/// surface as `INTERNAL_ERROR` untransformed; retrying is the caller's
/// decision, never done here.
pub(crate) async fn with_db<T, F>(state: AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&lumen_db::Database) -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("database task failed")
        })?
        .map_err(|e| {
            error!("database error: {:#}", e);
            ApiError::internal("database error")
        })
}
