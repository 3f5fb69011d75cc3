use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension;

use crate::{Database, fmt_ts, trunc_ts};

/// How long a verification code stays valid.
pub const CODE_TTL_MINUTES: i64 = 5;

impl Database {
    /// Stage a fresh verification code for an email. All earlier codes for
    /// the same address are invalidated in the same transaction, so only the
    /// most recently mailed code can ever verify.
    pub fn create_verification(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<()> {
        let now = trunc_ts(now);
        let expires_at = now + Duration::minutes(CODE_TTL_MINUTES);
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM email_verifications WHERE email = ?1",
                [email],
            )?;
            tx.execute(
                "INSERT INTO email_verifications (email, code, expires_at, used, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                rusqlite::params![email, code, fmt_ts(expires_at), fmt_ts(now)],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Atomically check `(email, code)` and mark it used. Returns whether the
    /// code was valid; expired, already-used, and unknown codes are all just
    /// `false` so callers cannot distinguish the failure modes.
    pub fn consume_verification(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<bool> {
        let now = trunc_ts(now);
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let id: Option<i64> = tx
                .query_row(
                    "SELECT id FROM email_verifications
                     WHERE email = ?1 AND code = ?2 AND used = 0 AND expires_at > ?3",
                    rusqlite::params![email, code, fmt_ts(now)],
                    |row| row.get(0),
                )
                .optional()?;

            let valid = match id {
                None => false,
                Some(id) => {
                    tx.execute(
                        "UPDATE email_verifications SET used = 1 WHERE id = ?1",
                        [id],
                    )?;
                    true
                }
            };
            tx.commit()?;
            Ok(valid)
        })
    }

    /// Drop codes past their expiry; used by the periodic cleanup task.
    pub fn delete_expired_verifications(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM email_verifications WHERE expires_at < ?1",
                [fmt_ts(trunc_ts(now))],
            )?;
            Ok(deleted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_code_verifies_once() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.create_verification("a@example.com", "123456", now).unwrap();

        assert!(db.consume_verification("a@example.com", "123456", now).unwrap());
        // Second use of the same code fails.
        assert!(!db.consume_verification("a@example.com", "123456", now).unwrap());
    }

    #[test]
    fn wrong_code_and_wrong_email_fail() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.create_verification("a@example.com", "123456", now).unwrap();

        assert!(!db.consume_verification("a@example.com", "654321", now).unwrap());
        assert!(!db.consume_verification("b@example.com", "123456", now).unwrap());
        // The real code is still live after failed attempts.
        assert!(db.consume_verification("a@example.com", "123456", now).unwrap());
    }

    #[test]
    fn codes_expire_after_ttl() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.create_verification("a@example.com", "123456", now).unwrap();

        let late = now + Duration::minutes(CODE_TTL_MINUTES) + Duration::seconds(1);
        assert!(!db.consume_verification("a@example.com", "123456", late).unwrap());
    }

    #[test]
    fn new_code_invalidates_prior_ones() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.create_verification("a@example.com", "111111", now).unwrap();
        db.create_verification("a@example.com", "222222", now).unwrap();

        assert!(!db.consume_verification("a@example.com", "111111", now).unwrap());
        assert!(db.consume_verification("a@example.com", "222222", now).unwrap());
    }

    #[test]
    fn cleanup_removes_only_expired_rows() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.create_verification("old@example.com", "111111", now - Duration::minutes(30))
            .unwrap();
        db.create_verification("new@example.com", "222222", now).unwrap();

        let deleted = db.delete_expired_verifications(now).unwrap();
        assert_eq!(deleted, 1);
        assert!(db.consume_verification("new@example.com", "222222", now).unwrap());
    }
}
