use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use lumen_types::models::JournalEntry;

use crate::{Database, fmt_ts, trunc_ts, ts_col};

/// Fields for an entry being inserted or upserted. `created_at` has already
/// been normalized by the caller (client value when parseable, server time
/// otherwise); `updated_at` is always assigned here.
pub struct NewEntry {
    pub user_id: i64,
    pub local_id: String,
    pub source: String,
    pub topic: String,
    pub content: String,
    pub masters_summary: String,
    pub time_of_day: String,
    pub created_at: DateTime<Utc>,
}

const ENTRY_COLUMNS: &str =
    "id, user_id, local_id, source, topic, content, masters_summary, time_of_day, created_at, updated_at";

impl Database {
    pub fn create_entry(&self, mut new: NewEntry) -> Result<JournalEntry> {
        new.created_at = trunc_ts(new.created_at);
        self.with_conn_mut(|conn| {
            let now = trunc_ts(Utc::now());
            conn.execute(
                "INSERT INTO journal_entries
                     (user_id, local_id, source, topic, content, masters_summary, time_of_day, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    new.user_id,
                    new.local_id,
                    new.source,
                    new.topic,
                    new.content,
                    new.masters_summary,
                    new.time_of_day,
                    fmt_ts(new.created_at),
                    fmt_ts(now),
                ],
            )?;
            let id = conn.last_insert_rowid();
            Ok(JournalEntry {
                id,
                user_id: new.user_id,
                local_id: new.local_id,
                source: new.source,
                topic: new.topic,
                content: new.content,
                masters_summary: new.masters_summary,
                time_of_day: new.time_of_day,
                created_at: new.created_at,
                updated_at: now,
            })
        })
    }

    /// Insert-or-update keyed by `(user_id, local_id)`. A matching row keeps
    /// its server id and has its mutable fields overwritten; otherwise a new
    /// row is inserted. Callers must not pass an empty `local_id`.
    pub fn upsert_entry(&self, mut new: NewEntry) -> Result<JournalEntry> {
        new.created_at = trunc_ts(new.created_at);
        let existing = self.with_conn(|conn| {
            let id: Option<i64> = conn
                .query_row(
                    "SELECT id FROM journal_entries WHERE user_id = ?1 AND local_id = ?2",
                    rusqlite::params![new.user_id, new.local_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })?;

        match existing {
            None => self.create_entry(new),
            Some(id) => self.with_conn_mut(|conn| {
                let now = trunc_ts(Utc::now());
                conn.execute(
                    "UPDATE journal_entries
                     SET source = ?2, topic = ?3, content = ?4, masters_summary = ?5,
                         time_of_day = ?6, created_at = ?7, updated_at = ?8
                     WHERE id = ?1",
                    rusqlite::params![
                        id,
                        new.source,
                        new.topic,
                        new.content,
                        new.masters_summary,
                        new.time_of_day,
                        fmt_ts(new.created_at),
                        fmt_ts(now),
                    ],
                )?;
                Ok(JournalEntry {
                    id,
                    user_id: new.user_id,
                    local_id: new.local_id,
                    source: new.source,
                    topic: new.topic,
                    content: new.content,
                    masters_summary: new.masters_summary,
                    time_of_day: new.time_of_day,
                    created_at: new.created_at,
                    updated_at: now,
                })
            }),
        }
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<JournalEntry>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], row_to_entry).optional()?;
            Ok(row)
        })
    }

    /// All of a user's entries, newest first by creation time.
    pub fn list_entries(&self, user_id: i64) -> Result<Vec<JournalEntry>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM journal_entries
                 WHERE user_id = ?1 ORDER BY created_at DESC"
            );
            collect_entries(conn, &sql, rusqlite::params![user_id])
        })
    }

    pub fn list_entries_page(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<JournalEntry>, i64)> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM journal_entries WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM journal_entries
                 WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
            );
            let entries = collect_entries(conn, &sql, rusqlite::params![user_id, limit, offset])?;
            Ok((entries, total))
        })
    }

    /// Entries whose server update time is strictly greater than `since`.
    pub fn entries_since(&self, user_id: i64, since: DateTime<Utc>) -> Result<Vec<JournalEntry>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM journal_entries
                 WHERE user_id = ?1 AND updated_at > ?2 ORDER BY created_at DESC"
            );
            collect_entries(conn, &sql, rusqlite::params![user_id, fmt_ts(since)])
        })
    }

    /// The newest entries, for AI analysis of recent writing.
    pub fn recent_entries(&self, user_id: i64, limit: i64) -> Result<Vec<JournalEntry>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM journal_entries
                 WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2"
            );
            collect_entries(conn, &sql, rusqlite::params![user_id, limit])
        })
    }

    /// Overwrite an entry's mutable fields; returns the new update time.
    pub fn update_entry(&self, entry: &JournalEntry) -> Result<DateTime<Utc>> {
        self.with_conn_mut(|conn| {
            let now = trunc_ts(Utc::now());
            conn.execute(
                "UPDATE journal_entries
                 SET topic = ?2, content = ?3, masters_summary = ?4, updated_at = ?5
                 WHERE id = ?1",
                rusqlite::params![
                    entry.id,
                    entry.topic,
                    entry.content,
                    entry.masters_summary,
                    fmt_ts(now),
                ],
            )?;
            Ok(now)
        })
    }

    pub fn delete_entry(&self, id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM journal_entries WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn collect_entries(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<JournalEntry>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, row_to_entry)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<JournalEntry> {
    Ok(JournalEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        local_id: row.get(2)?,
        source: row.get(3)?,
        topic: row.get(4)?,
        content: row.get(5)?,
        masters_summary: row.get(6)?,
        time_of_day: row.get(7)?,
        created_at: ts_col(row, 8)?,
        updated_at: ts_col(row, 9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::NewUser;

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .create_user(
                NewUser {
                    open_id: "email_test".into(),
                    email: "test@example.com".into(),
                    name: "Test".into(),
                    login_method: "email".into(),
                },
                Utc::now(),
            )
            .unwrap();
        (db, user.id)
    }

    fn entry(user_id: i64, local_id: &str, content: &str, created_at: DateTime<Utc>) -> NewEntry {
        NewEntry {
            user_id,
            local_id: local_id.to_string(),
            source: "gratitude".to_string(),
            topic: "morning pages".to_string(),
            content: content.to_string(),
            masters_summary: String::new(),
            time_of_day: "morning".to_string(),
            created_at,
        }
    }

    #[test]
    fn upsert_is_idempotent_per_local_id() {
        let (db, user_id) = setup();
        let now = Utc::now();

        let first = db.upsert_entry(entry(user_id, "device-a-1", "v1", now)).unwrap();
        let second = db.upsert_entry(entry(user_id, "device-a-1", "v2", now)).unwrap();

        assert_eq!(first.id, second.id);
        let all = db.list_entries(user_id).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "v2");
    }

    #[test]
    fn upsert_does_not_cross_users() {
        let (db, user_a) = setup();
        let user_b = db
            .create_user(
                NewUser {
                    open_id: "email_other".into(),
                    email: "other@example.com".into(),
                    name: "Other".into(),
                    login_method: "email".into(),
                },
                Utc::now(),
            )
            .unwrap()
            .id;

        let now = Utc::now();
        db.upsert_entry(entry(user_a, "shared-local", "a's entry", now)).unwrap();
        db.upsert_entry(entry(user_b, "shared-local", "b's entry", now)).unwrap();

        assert_eq!(db.list_entries(user_a).unwrap().len(), 1);
        assert_eq!(db.list_entries(user_b).unwrap().len(), 1);
    }

    #[test]
    fn entries_since_filters_strictly() {
        let (db, user_id) = setup();
        let base = Utc::now();

        let older = db.create_entry(entry(user_id, "e1", "old", base)).unwrap();
        let newer = db.create_entry(entry(user_id, "e2", "new", base)).unwrap();

        // Boundary is strict: nothing updated exactly at `since` comes back.
        let at_newer = db.entries_since(user_id, newer.updated_at).unwrap();
        assert!(at_newer.is_empty());

        let before_all = db
            .entries_since(user_id, older.updated_at - chrono::Duration::seconds(1))
            .unwrap();
        assert_eq!(before_all.len(), 2);
    }

    #[test]
    fn list_is_newest_first_and_paginated() {
        let (db, user_id) = setup();
        let base = Utc::now();
        for i in 0..5 {
            db.create_entry(entry(
                user_id,
                &format!("e{i}"),
                &format!("entry {i}"),
                base + chrono::Duration::hours(i),
            ))
            .unwrap();
        }

        let (page, total) = db.list_entries_page(user_id, 2, 0).unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "entry 4");

        let (rest, _) = db.list_entries_page(user_id, 10, 4).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].content, "entry 0");
    }

    #[test]
    fn empty_local_id_rows_are_independent_inserts() {
        let (db, user_id) = setup();
        let now = Utc::now();
        db.create_entry(entry(user_id, "", "one", now)).unwrap();
        db.create_entry(entry(user_id, "", "two", now)).unwrap();
        assert_eq!(db.list_entries(user_id).unwrap().len(), 2);
    }

    #[test]
    fn update_bumps_updated_at_only() {
        let (db, user_id) = setup();
        let created = db
            .create_entry(entry(user_id, "e1", "before", Utc::now()))
            .unwrap();

        let mut edited = created.clone();
        edited.content = "after".to_string();
        let new_updated = db.update_entry(&edited).unwrap();
        assert!(new_updated >= created.updated_at);

        let fetched = db.get_entry(created.id).unwrap().unwrap();
        assert_eq!(fetched.content, "after");
        assert_eq!(fetched.created_at, created.created_at);
    }
}
