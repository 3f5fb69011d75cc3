use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use lumen_types::models::UserStats;

use crate::{Database, fmt_ts, opt_ts_col, trunc_ts, ts_col};

/// Streak transition for one entry-creation event.
///
/// `Δdays = floor((event_time − last_entry) / 24h)`: zero or negative means
/// the same calendar period (unchanged), exactly one means a consecutive day
/// (increment), anything larger breaks the streak (reset to 1). The longest
/// streak is folded in after the transition.
///
/// This fold is order-sensitive: replaying events non-chronologically gives
/// wrong streaks. Callers are expected to record events in creation order.
pub fn advance_streak(
    last_entry: DateTime<Utc>,
    event_time: DateTime<Utc>,
    current: i64,
    longest: i64,
) -> (i64, i64) {
    let elapsed_days = (event_time - last_entry).num_days();
    let current = if elapsed_days <= 0 {
        current
    } else if elapsed_days == 1 {
        current + 1
    } else {
        1
    };
    (current, longest.max(current))
}

impl Database {
    pub fn get_stats(&self, user_id: i64) -> Result<Option<UserStats>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT user_id, total_entries, gratitude_count, philosophy_count,
                            free_note_count, current_streak, longest_streak, last_entry_at, updated_at
                     FROM user_stats WHERE user_id = ?1",
                    [user_id],
                    row_to_stats,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Fold one entry-creation event into the user's stats row, creating the
    /// row lazily on the first entry. The whole read-modify-write runs in one
    /// transaction under the connection mutex, so concurrent creations cannot
    /// lose updates.
    pub fn record_entry(
        &self,
        user_id: i64,
        source: &str,
        event_time: DateTime<Utc>,
    ) -> Result<UserStats> {
        let event_time = trunc_ts(event_time);
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing = tx
                .query_row(
                    "SELECT user_id, total_entries, gratitude_count, philosophy_count,
                            free_note_count, current_streak, longest_streak, last_entry_at, updated_at
                     FROM user_stats WHERE user_id = ?1",
                    [user_id],
                    row_to_stats,
                )
                .optional()?;

            let stats = match existing {
                None => {
                    let mut stats = UserStats {
                        user_id,
                        total_entries: 1,
                        gratitude_count: 0,
                        philosophy_count: 0,
                        free_note_count: 0,
                        current_streak: 1,
                        longest_streak: 1,
                        last_entry_date: Some(event_time),
                        updated_at: event_time,
                    };
                    bump_source(&mut stats, source);
                    tx.execute(
                        "INSERT INTO user_stats
                             (user_id, total_entries, gratitude_count, philosophy_count,
                              free_note_count, current_streak, longest_streak, last_entry_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                        rusqlite::params![
                            stats.user_id,
                            stats.total_entries,
                            stats.gratitude_count,
                            stats.philosophy_count,
                            stats.free_note_count,
                            stats.current_streak,
                            stats.longest_streak,
                            fmt_ts(event_time),
                            fmt_ts(event_time),
                        ],
                    )?;
                    stats
                }
                Some(mut stats) => {
                    stats.total_entries += 1;
                    bump_source(&mut stats, source);

                    let (current, longest) = match stats.last_entry_date {
                        Some(last) => advance_streak(
                            last,
                            event_time,
                            stats.current_streak,
                            stats.longest_streak,
                        ),
                        // A client-pushed row may carry no last-entry time;
                        // keep the streak rather than inventing a transition.
                        None => {
                            let current = stats.current_streak.max(1);
                            (current, stats.longest_streak.max(current))
                        }
                    };
                    stats.current_streak = current;
                    stats.longest_streak = longest;
                    stats.last_entry_date = Some(event_time);
                    stats.updated_at = event_time;

                    tx.execute(
                        "UPDATE user_stats
                         SET total_entries = ?2, gratitude_count = ?3, philosophy_count = ?4,
                             free_note_count = ?5, current_streak = ?6, longest_streak = ?7,
                             last_entry_at = ?8, updated_at = ?9
                         WHERE user_id = ?1",
                        rusqlite::params![
                            stats.user_id,
                            stats.total_entries,
                            stats.gratitude_count,
                            stats.philosophy_count,
                            stats.free_note_count,
                            stats.current_streak,
                            stats.longest_streak,
                            fmt_ts(event_time),
                            fmt_ts(event_time),
                        ],
                    )?;
                    stats
                }
            };

            tx.commit()?;
            Ok(stats)
        })
    }

    /// Replace the whole stats row with a client-pushed snapshot (the
    /// offline stats-sync path), creating it if absent.
    pub fn upsert_stats(&self, stats: &UserStats) -> Result<UserStats> {
        let now = trunc_ts(Utc::now());
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO user_stats
                     (user_id, total_entries, gratitude_count, philosophy_count,
                      free_note_count, current_streak, longest_streak, last_entry_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(user_id) DO UPDATE SET
                     total_entries = excluded.total_entries,
                     gratitude_count = excluded.gratitude_count,
                     philosophy_count = excluded.philosophy_count,
                     free_note_count = excluded.free_note_count,
                     current_streak = excluded.current_streak,
                     longest_streak = excluded.longest_streak,
                     last_entry_at = excluded.last_entry_at,
                     updated_at = excluded.updated_at",
                rusqlite::params![
                    stats.user_id,
                    stats.total_entries,
                    stats.gratitude_count,
                    stats.philosophy_count,
                    stats.free_note_count,
                    stats.current_streak,
                    stats.longest_streak,
                    stats.last_entry_date.map(|t| fmt_ts(trunc_ts(t))),
                    fmt_ts(now),
                ],
            )?;
            Ok(UserStats {
                last_entry_date: stats.last_entry_date.map(trunc_ts),
                updated_at: now,
                ..stats.clone()
            })
        })
    }
}

fn bump_source(stats: &mut UserStats, source: &str) {
    match source {
        "gratitude" => stats.gratitude_count += 1,
        "philosophy" => stats.philosophy_count += 1,
        "free" => stats.free_note_count += 1,
        // Unrecognized sources still count toward the total.
        _ => {}
    }
}

fn row_to_stats(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserStats> {
    Ok(UserStats {
        user_id: row.get(0)?,
        total_entries: row.get(1)?,
        gratitude_count: row.get(2)?,
        philosophy_count: row.get(3)?,
        free_note_count: row.get(4)?,
        current_streak: row.get(5)?,
        longest_streak: row.get(6)?,
        last_entry_date: opt_ts_col(row, 7)?,
        updated_at: ts_col(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::NewUser;
    use chrono::{Duration, TimeZone};

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .create_user(
                NewUser {
                    open_id: "email_stats".into(),
                    email: "stats@example.com".into(),
                    name: "Stats".into(),
                    login_method: "email".into(),
                },
                Utc::now(),
            )
            .unwrap();
        (db, user.id)
    }

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn streak_transition_table() {
        let base = day(0);
        // Same day: unchanged.
        assert_eq!(advance_streak(base, base + Duration::hours(6), 3, 5), (3, 5));
        // Earlier event (out of order): treated as same period.
        assert_eq!(advance_streak(base, base - Duration::hours(30), 3, 5), (3, 5));
        // Next day: increment.
        assert_eq!(advance_streak(base, base + Duration::hours(25), 3, 5), (4, 5));
        // Increment past the previous longest.
        assert_eq!(advance_streak(base, base + Duration::hours(25), 5, 5), (6, 6));
        // Gap: reset, longest preserved.
        assert_eq!(advance_streak(base, base + Duration::days(3), 4, 7), (1, 7));
    }

    #[test]
    fn n_consecutive_days_give_streak_n() {
        let (db, user_id) = setup();
        for n in 0..7 {
            let stats = db.record_entry(user_id, "gratitude", day(n)).unwrap();
            assert_eq!(stats.current_streak, n + 1);
            assert_eq!(stats.longest_streak, n + 1);
        }
    }

    #[test]
    fn gap_resets_current_and_keeps_longest() {
        let (db, user_id) = setup();
        for n in 0..4 {
            db.record_entry(user_id, "free", day(n)).unwrap();
        }
        let stats = db.record_entry(user_id, "free", day(6)).unwrap();
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 4);
    }

    #[test]
    fn same_day_repeats_leave_streak_unchanged() {
        let (db, user_id) = setup();
        db.record_entry(user_id, "gratitude", day(0)).unwrap();
        db.record_entry(user_id, "gratitude", day(1)).unwrap();
        for hours in [1, 4, 9] {
            let stats = db
                .record_entry(user_id, "gratitude", day(1) + Duration::hours(hours))
                .unwrap();
            assert_eq!(stats.current_streak, 2);
            assert_eq!(stats.longest_streak, 2);
        }
    }

    #[test]
    fn per_source_counts_sum_to_total() {
        let (db, user_id) = setup();
        db.record_entry(user_id, "gratitude", day(0)).unwrap();
        db.record_entry(user_id, "gratitude", day(0)).unwrap();
        let stats = db.record_entry(user_id, "philosophy", day(0)).unwrap();

        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.gratitude_count, 2);
        assert_eq!(stats.philosophy_count, 1);
        assert_eq!(stats.free_note_count, 0);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 1);
    }

    #[test]
    fn unrecognized_source_bumps_total_only() {
        let (db, user_id) = setup();
        let stats = db.record_entry(user_id, "dream", day(0)).unwrap();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(
            stats.gratitude_count + stats.philosophy_count + stats.free_note_count,
            0
        );
    }

    #[test]
    fn no_stats_row_until_first_entry() {
        let (db, user_id) = setup();
        assert!(db.get_stats(user_id).unwrap().is_none());
        db.record_entry(user_id, "free", day(0)).unwrap();
        assert!(db.get_stats(user_id).unwrap().is_some());
    }

    #[test]
    fn client_pushed_snapshot_replaces_row() {
        let (db, user_id) = setup();
        db.record_entry(user_id, "free", day(0)).unwrap();

        let pushed = UserStats {
            user_id,
            total_entries: 42,
            gratitude_count: 20,
            philosophy_count: 12,
            free_note_count: 10,
            current_streak: 3,
            longest_streak: 9,
            last_entry_date: Some(day(10)),
            updated_at: Utc::now(),
        };
        db.upsert_stats(&pushed).unwrap();

        let stored = db.get_stats(user_id).unwrap().unwrap();
        assert_eq!(stored.total_entries, 42);
        assert_eq!(stored.longest_streak, 9);
        assert_eq!(stored.last_entry_date, Some(day(10)));
    }
}
