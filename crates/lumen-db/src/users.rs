use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use lumen_types::models::User;

use crate::{Database, fmt_ts, trunc_ts, ts_col};

/// Fields for a user being created on first successful verification.
pub struct NewUser {
    pub open_id: String,
    pub email: String,
    pub name: String,
    pub login_method: String,
}

impl Database {
    pub fn create_user(&self, new: NewUser, now: DateTime<Utc>) -> Result<User> {
        let now = trunc_ts(now);
        self.with_conn_mut(|conn| {
            let ts = fmt_ts(now);
            conn.execute(
                "INSERT INTO users (open_id, email, name, login_method, last_signed_in, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?5)",
                rusqlite::params![new.open_id, new.email, new.name, new.login_method, ts],
            )?;
            let id = conn.last_insert_rowid();
            Ok(User {
                id,
                open_id: new.open_id,
                email: Some(new.email),
                name: new.name,
                login_method: new.login_method,
                last_signed_in: now,
                created_at: now,
                updated_at: now,
            })
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", rusqlite::params![id]))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", rusqlite::params![email]))
    }

    /// Record a successful login: bump last-signed-in and, when the client
    /// supplied a name, overwrite the stored one.
    pub fn record_sign_in(&self, id: i64, name: Option<&str>, now: DateTime<Utc>) -> Result<()> {
        let now = trunc_ts(now);
        self.with_conn_mut(|conn| {
            let ts = fmt_ts(now);
            match name {
                Some(name) => conn.execute(
                    "UPDATE users SET name = ?2, last_signed_in = ?3, updated_at = ?3 WHERE id = ?1",
                    rusqlite::params![id, name, ts],
                )?,
                None => conn.execute(
                    "UPDATE users SET last_signed_in = ?2, updated_at = ?2 WHERE id = ?1",
                    rusqlite::params![id, ts],
                )?,
            };
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, filter: &str, params: impl rusqlite::Params) -> Result<Option<User>> {
    let sql = format!(
        "SELECT id, open_id, email, name, login_method, last_signed_in, created_at, updated_at
         FROM users WHERE {filter}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt
        .query_row(params, |row| {
            Ok(User {
                id: row.get(0)?,
                open_id: row.get(1)?,
                email: row.get(2)?,
                name: row.get(3)?,
                login_method: row.get(4)?,
                last_signed_in: ts_col(row, 5)?,
                created_at: ts_col(row, 6)?,
                updated_at: ts_col(row, 7)?,
            })
        })
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> NewUser {
        NewUser {
            open_id: format!("email_{email}"),
            email: email.to_string(),
            name: "Quinn".to_string(),
            login_method: "email".to_string(),
        }
    }

    #[test]
    fn create_and_fetch_by_email() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_user(user("quinn@example.com"), Utc::now()).unwrap();

        let fetched = db.get_user_by_email("quinn@example.com").unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.open_id, created.open_id);
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn sign_in_updates_name_and_timestamp() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_user(user("quinn@example.com"), Utc::now()).unwrap();

        let later = created.last_signed_in + chrono::Duration::hours(3);
        db.record_sign_in(created.id, Some("Quinn R."), later).unwrap();

        let fetched = db.get_user_by_id(created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Quinn R.");
        assert_eq!(fetched.last_signed_in, later);
    }

    #[test]
    fn sign_in_without_name_keeps_existing() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_user(user("quinn@example.com"), Utc::now()).unwrap();

        db.record_sign_in(created.id, None, Utc::now()).unwrap();
        let fetched = db.get_user_by_id(created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Quinn");
    }
}
