use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{JournalEntry, ReviewKind, SageWisdom, Source, User, UserStats};

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessagePayload {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: User,
}

// -- Journal --

/// One client-authored entry, used both for direct creation and as an item
/// of a sync batch. `created_at` is an RFC 3339 string; anything
/// unparseable falls back to server time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpload {
    #[serde(default)]
    pub local_id: String,
    pub source: Source,
    #[serde(default)]
    pub topic: String,
    pub content: String,
    #[serde(default)]
    pub masters_summary: String,
    #[serde(default)]
    pub time_of_day: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub masters_summary: String,
}

#[derive(Debug, Serialize)]
pub struct ListEntriesPayload {
    pub entries: Vec<JournalEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct EntryPayload {
    pub entry: JournalEntry,
}

#[derive(Debug, Deserialize)]
pub struct SyncEntriesRequest {
    pub entries: Vec<EntryUpload>,
    #[serde(default)]
    pub since: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEntriesPayload {
    pub entries: Vec<JournalEntry>,
    pub synced_at: DateTime<Utc>,
    /// How many uploaded entries were applied in this call.
    pub uploaded: usize,
}

// -- Stats --

#[derive(Debug, Serialize)]
pub struct StatsPayload {
    pub stats: UserStats,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatsRequest {
    #[serde(default)]
    pub total_entries: i64,
    #[serde(default)]
    pub gratitude_count: i64,
    #[serde(default)]
    pub philosophy_count: i64,
    #[serde(default)]
    pub free_note_count: i64,
    #[serde(default)]
    pub current_streak: i64,
    #[serde(default)]
    pub longest_streak: i64,
    #[serde(default)]
    pub last_entry_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatsPayload {
    pub stats: UserStats,
    pub synced_at: DateTime<Utc>,
}

// -- AI --

#[derive(Debug, Deserialize)]
pub struct WisdomRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WisdomPayload {
    pub wisdoms: Vec<SageWisdom>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub topic: String,
    pub content: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryPayload {
    pub summaries: Vec<SageWisdom>,
}

#[derive(Debug, Deserialize)]
pub struct TopicsRequest {
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopicsPayload {
    pub topics: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(rename = "type")]
    pub kind: ReviewKind,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewPayload {
    #[serde(rename = "type")]
    pub kind: ReviewKind,
    pub content: String,
}
