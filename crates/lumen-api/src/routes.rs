use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;

use crate::middleware::require_auth;
use crate::{AppState, ai, auth, journal, stats};

/// Assemble the full API router. Public routes carry no credential; every
/// protected route sits behind the JWT middleware.
pub fn api_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/email/send-code", post(auth::send_code))
        .route("/api/auth/email/verify", post(auth::verify_code))
        .route("/api/ai/wisdom", post(ai::wisdom))
        .route("/api/ai/summary", post(ai::summary))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/journal/list", get(journal::list_entries))
        .route("/api/journal/create", post(journal::create_entry))
        .route("/api/journal/sync", post(journal::sync_entries))
        .route(
            "/api/journal/{id}",
            get(journal::get_entry)
                .put(journal::update_entry)
                .delete(journal::delete_entry),
        )
        .route("/api/stats", get(stats::get_stats))
        .route("/api/stats/sync", post(stats::sync_stats))
        .route("/api/ai/topics", post(ai::topics))
        .route("/api/ai/review", post(ai::review))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
