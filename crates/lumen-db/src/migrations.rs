use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            open_id         TEXT NOT NULL UNIQUE,
            email           TEXT UNIQUE,
            name            TEXT NOT NULL,
            login_method    TEXT NOT NULL,
            last_signed_in  TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS journal_entries (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            local_id        TEXT NOT NULL DEFAULT '',
            source          TEXT NOT NULL,
            topic           TEXT NOT NULL DEFAULT '',
            content         TEXT NOT NULL,
            masters_summary TEXT NOT NULL DEFAULT '',
            time_of_day     TEXT NOT NULL DEFAULT '',
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_entries_user_created
            ON journal_entries(user_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_entries_user_local
            ON journal_entries(user_id, local_id);

        CREATE INDEX IF NOT EXISTS idx_entries_user_updated
            ON journal_entries(user_id, updated_at);

        CREATE TABLE IF NOT EXISTS user_stats (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id          INTEGER NOT NULL UNIQUE REFERENCES users(id),
            total_entries    INTEGER NOT NULL DEFAULT 0,
            gratitude_count  INTEGER NOT NULL DEFAULT 0,
            philosophy_count INTEGER NOT NULL DEFAULT 0,
            free_note_count  INTEGER NOT NULL DEFAULT 0,
            current_streak   INTEGER NOT NULL DEFAULT 0,
            longest_streak   INTEGER NOT NULL DEFAULT 0,
            last_entry_at    TEXT,
            updated_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS email_verifications (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            email       TEXT NOT NULL,
            code        TEXT NOT NULL,
            expires_at  TEXT NOT NULL,
            used        INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_verifications_email
            ON email_verifications(email);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
