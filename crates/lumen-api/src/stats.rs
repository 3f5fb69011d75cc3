use axum::{Extension, extract::State, response::IntoResponse};
use chrono::Utc;

use lumen_db::parse_ts;
use lumen_types::api::{StatsPayload, SyncStatsPayload, SyncStatsRequest};
use lumen_types::models::UserStats;

use crate::error::{ApiError, ok};
use crate::extract::Json;
use crate::token::Claims;
use crate::{AppState, with_db};

/// GET /api/stats
///
/// Users who have not written anything yet get a zeroed payload, not a 404.
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let stats = with_db(state, move |db| db.get_stats(user_id))
        .await?
        .unwrap_or_else(|| UserStats::empty(user_id, Utc::now()));
    Ok(ok(StatsPayload { stats }))
}

/// POST /api/stats/sync
///
/// Accepts a whole-row snapshot computed client-side while offline and
/// replaces the server row with it.
pub async fn sync_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SyncStatsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let last_entry_date = req
        .last_entry_date
        .as_deref()
        .and_then(|raw| parse_ts(raw).ok());

    let snapshot = UserStats {
        user_id: claims.sub,
        total_entries: req.total_entries,
        gratitude_count: req.gratitude_count,
        philosophy_count: req.philosophy_count,
        free_note_count: req.free_note_count,
        current_streak: req.current_streak,
        longest_streak: req.longest_streak.max(req.current_streak),
        last_entry_date,
        updated_at: Utc::now(),
    };

    let stats = with_db(state, move |db| db.upsert_stats(&snapshot)).await?;

    Ok(ok(SyncStatsPayload {
        stats,
        synced_at: Utc::now(),
    }))
}
