use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user. Created on the first successful email verification,
/// updated (name, last sign-in) on subsequent logins, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// Stable external identifier, independent of the surrogate id.
    pub open_id: String,
    pub email: Option<String>,
    pub name: String,
    pub login_method: String,
    pub last_signed_in: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which journaling mode an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Gratitude,
    Philosophy,
    Free,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Gratitude => "gratitude",
            Source::Philosophy => "philosophy",
            Source::Free => "free",
        }
    }
}

/// A journal entry.
///
/// `created_at` is client-supplied and authoritative for ordering;
/// `updated_at` is server-assigned and authoritative for sync cursors.
/// `(user_id, local_id)` identifies an entry across devices when `local_id`
/// is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: i64,
    pub user_id: i64,
    pub local_id: String,
    pub source: String,
    pub topic: String,
    pub content: String,
    /// Opaque serialized sage-summary blob; the server never interprets it.
    pub masters_summary: String,
    pub time_of_day: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user aggregate counters, maintained incrementally by the stats
/// engine on every entry creation. Per-source counts sum to the total;
/// `longest_streak >= current_streak` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: i64,
    pub total_entries: i64,
    pub gratitude_count: i64,
    pub philosophy_count: i64,
    pub free_note_count: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_entry_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    /// Zeroed payload returned for users who have not written anything yet.
    pub fn empty(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            total_entries: 0,
            gratitude_count: 0,
            philosophy_count: 0,
            free_note_count: 0,
            current_streak: 0,
            longest_streak: 0,
            last_entry_date: None,
            updated_at: now,
        }
    }
}

/// One sage's reflective message, as returned by the AI endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SageWisdom {
    pub sage: String,
    pub emoji: String,
    pub message: String,
}

/// Lens for the long-form journal review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewKind {
    Consciousness,
    Growth,
    Relationships,
    Attention,
}

impl ReviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::Consciousness => "consciousness",
            ReviewKind::Growth => "growth",
            ReviewKind::Relationships => "relationships",
            ReviewKind::Attention => "attention",
        }
    }
}
