use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use lumen_db::entries::NewEntry;
use lumen_db::parse_ts;
use lumen_types::api::{
    EntryPayload, EntryUpload, ListEntriesPayload, SyncEntriesPayload, SyncEntriesRequest,
    UpdateEntryRequest,
};
use lumen_types::models::JournalEntry;

use crate::error::{ApiError, created, ok};
use crate::extract::{Json, Path, Query};
use crate::token::Claims;
use crate::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/journal/list
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.clamp(1, 200);
    let offset = query.offset.max(0);
    let user_id = claims.sub;

    let (entries, total) =
        with_db(state, move |db| db.list_entries_page(user_id, limit, offset)).await?;

    Ok(ok(ListEntriesPayload {
        entries,
        total,
        limit,
        offset,
    }))
}

/// POST /api/journal/create
///
/// Inserts the entry, then drives the stats engine with the current server
/// time. A stats failure is logged and does not roll back the created entry;
/// the client retrying a failed create would duplicate the entry otherwise.
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<EntryUpload>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::invalid("content is required"));
    }

    let user_id = claims.sub;
    let new = upload_to_new_entry(user_id, req);
    let source = new.source.clone();

    let entry = with_db(state.clone(), move |db| db.create_entry(new)).await?;

    let stats_result =
        tokio::task::spawn_blocking(move || state.db.record_entry(user_id, &source, Utc::now()))
            .await;
    match stats_result {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!("stats update failed for user {}: {:#}", user_id, e),
        Err(e) => warn!("stats task join error: {}", e),
    }

    Ok(created(EntryPayload { entry }))
}

/// GET /api/journal/{id}
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = fetch_owned_entry(state, id, claims.sub).await?;
    Ok(ok(EntryPayload { entry }))
}

/// PUT /api/journal/{id}
///
/// Overwrites only the fields the client actually sent non-empty.
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut entry = fetch_owned_entry(state.clone(), id, claims.sub).await?;

    if !req.topic.is_empty() {
        entry.topic = req.topic;
    }
    if !req.content.is_empty() {
        entry.content = req.content;
    }
    if !req.masters_summary.is_empty() {
        entry.masters_summary = req.masters_summary;
    }

    let to_save = entry.clone();
    let updated_at = with_db(state, move |db| db.update_entry(&to_save)).await?;
    entry.updated_at = updated_at;

    Ok(ok(EntryPayload { entry }))
}

/// DELETE /api/journal/{id}
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    fetch_owned_entry(state.clone(), id, claims.sub).await?;
    with_db(state, move |db| db.delete_entry(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/journal/sync
///
/// The offline-sync reconciler. Uploaded entries are upserted one at a time
/// by `(user_id, local_id)`; the batch is deliberately not one transaction —
/// a failure midway keeps what was already committed and the `uploaded`
/// count covers only the entries applied before it. Entries with an empty
/// `local_id` have no key to match on replay and degrade to insert-only.
///
/// The response carries every entry whose server update time is strictly
/// after `since`, or the user's full entry set when `since` is absent or
/// unparseable (first sync from a fresh device).
pub async fn sync_entries(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SyncEntriesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let uploads = req.entries;
    let since = req.since.as_deref().and_then(|raw| parse_ts(raw).ok());

    let (uploaded, entries) = with_db(state, move |db| {
        let mut uploaded = 0usize;
        for upload in uploads {
            let new = upload_to_new_entry(user_id, upload);
            let result = if new.local_id.is_empty() {
                db.create_entry(new)
            } else {
                db.upsert_entry(new)
            };
            match result {
                Ok(_) => uploaded += 1,
                Err(e) => {
                    warn!(
                        "sync upsert failed for user {} after {} entries: {:#}",
                        user_id, uploaded, e
                    );
                    break;
                }
            }
        }

        let entries = match since {
            Some(since) => db.entries_since(user_id, since)?,
            None => db.list_entries(user_id)?,
        };
        Ok((uploaded, entries))
    })
    .await?;

    Ok(ok(SyncEntriesPayload {
        entries,
        synced_at: Utc::now(),
        uploaded,
    }))
}

/// Fetch an entry and enforce ownership: absent ids are `NOT_FOUND`, other
/// users' entries are `FORBIDDEN` without leaking their content.
async fn fetch_owned_entry(
    state: AppState,
    id: i64,
    user_id: i64,
) -> Result<JournalEntry, ApiError> {
    let entry = with_db(state, move |db| db.get_entry(id))
        .await?
        .ok_or_else(|| ApiError::not_found("entry not found"))?;
    if entry.user_id != user_id {
        return Err(ApiError::forbidden("not the owner of this entry"));
    }
    Ok(entry)
}

fn upload_to_new_entry(user_id: i64, upload: EntryUpload) -> NewEntry {
    let created_at = upload
        .created_at
        .as_deref()
        .and_then(|raw| parse_ts(raw).ok())
        .unwrap_or_else(Utc::now);

    NewEntry {
        user_id,
        local_id: upload.local_id,
        source: upload.source.as_str().to_string(),
        topic: upload.topic,
        content: upload.content,
        masters_summary: upload.masters_summary,
        time_of_day: upload.time_of_day,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use lumen_types::models::Source;

    fn upload(created_at: Option<&str>) -> EntryUpload {
        EntryUpload {
            local_id: "l1".into(),
            source: Source::Free,
            topic: String::new(),
            content: "text".into(),
            masters_summary: String::new(),
            time_of_day: String::new(),
            created_at: created_at.map(str::to_string),
        }
    }

    #[test]
    fn client_timestamp_is_honored_when_parseable() {
        let new = upload_to_new_entry(1, upload(Some("2026-02-01T08:30:00Z")));
        assert_eq!(new.created_at, "2026-02-01T08:30:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_now() {
        let before = Utc::now();
        let new = upload_to_new_entry(1, upload(Some("last tuesday")));
        assert!(new.created_at >= before);
    }
}
