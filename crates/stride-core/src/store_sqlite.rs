//! SQLite-backed progression store.
//!
//! Single connection behind an async mutex, with every statement run on
//! the blocking pool. WAL journal mode keeps readers off the writers'
//! backs. The version check rides in the UPDATE's WHERE clause and the
//! award uniqueness in the table's primary key, so both per-account CAS
//! and exactly-once awards hold across processes, not just tasks.

use crate::account::{AccountRecord, BadgeAward};
use crate::error::StrideError;
use crate::store::{ProgressStore, RankingRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

impl From<rusqlite::Error> for StrideError {
    fn from(e: rusqlite::Error) -> Self {
        StrideError::StoreUnavailable(e.to_string())
    }
}

/// Durable store at `<state dir>/progress.db`.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database file, applying pragmas and schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StrideError> {
        let path: PathBuf = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("Opening progression database at {}", path.display());

        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StrideError> {
            let conn = Connection::open(&path)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(conn)
        })
        .await
        .map_err(|e| StrideError::StoreUnavailable(e.to_string()))??;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// In-memory database for tests.
    pub async fn open_in_memory() -> Result<Self, StrideError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, R>(&self, f: F) -> Result<R, StrideError>
    where
        F: FnOnce(&Connection) -> Result<R, StrideError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(|e| StrideError::StoreUnavailable(e.to_string()))?
    }

    async fn initialize_schema(&self) -> Result<(), StrideError> {
        self.with_conn(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS accounts (
                    account_id      TEXT PRIMARY KEY,
                    display_name    TEXT NOT NULL,
                    created_at      TEXT NOT NULL,
                    points          INTEGER NOT NULL DEFAULT 0,
                    level           INTEGER NOT NULL DEFAULT 1,
                    streak          INTEGER NOT NULL DEFAULT 0,
                    last_activity   TEXT,
                    units_completed INTEGER NOT NULL DEFAULT 0,
                    perfect_scores  INTEGER NOT NULL DEFAULT 0,
                    camps_completed INTEGER NOT NULL DEFAULT 0,
                    ai_sessions     INTEGER NOT NULL DEFAULT 0,
                    version         INTEGER NOT NULL DEFAULT 0
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_accounts_points
                 ON accounts(points DESC)",
                [],
            )?;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS badge_awards (
                    account_id TEXT NOT NULL,
                    badge_id   TEXT NOT NULL,
                    earned_at  TEXT NOT NULL,
                    PRIMARY KEY (account_id, badge_id)
                )",
                [],
            )?;
            Ok(())
        })
        .await
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AccountRecord> {
    Ok(AccountRecord {
        account_id: row.get(0)?,
        display_name: row.get(1)?,
        created_at: row.get::<_, DateTime<Utc>>(2)?,
        points: row.get::<_, i64>(3)? as u64,
        level: row.get::<_, i64>(4)? as u32,
        streak: row.get::<_, i64>(5)? as u32,
        last_activity: row.get::<_, Option<DateTime<Utc>>>(6)?,
        units_completed: row.get::<_, i64>(7)? as u64,
        perfect_scores: row.get::<_, i64>(8)? as u64,
        camps_completed: row.get::<_, i64>(9)? as u64,
        ai_sessions: row.get::<_, i64>(10)? as u64,
        version: row.get::<_, i64>(11)? as u64,
    })
}

const RECORD_COLUMNS: &str = "account_id, display_name, created_at, points, level, streak, \
     last_activity, units_completed, perfect_scores, camps_completed, ai_sessions, version";

#[async_trait]
impl ProgressStore for SqliteStore {
    async fn create_account(&self, record: AccountRecord) -> Result<(), StrideError> {
        self.with_conn(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO accounts (account_id, display_name, created_at, points,
                     level, streak, last_activity, units_completed, perfect_scores,
                     camps_completed, ai_sessions, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.account_id,
                    record.display_name,
                    record.created_at,
                    record.points as i64,
                    record.level as i64,
                    record.streak as i64,
                    record.last_activity,
                    record.units_completed as i64,
                    record.perfect_scores as i64,
                    record.camps_completed as i64,
                    record.ai_sessions as i64,
                    record.version as i64,
                ],
            )?;
            if inserted == 0 {
                return Err(StrideError::InvalidInput(format!(
                    "account already exists: {}",
                    record.account_id
                )));
            }
            Ok(())
        })
        .await
    }

    async fn load(&self, account_id: &str) -> Result<Option<AccountRecord>, StrideError> {
        let account_id = account_id.to_string();
        self.with_conn(move |conn| {
            let record = conn
                .query_row(
                    &format!("SELECT {RECORD_COLUMNS} FROM accounts WHERE account_id = ?1"),
                    params![account_id],
                    record_from_row,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn update_if_version(
        &self,
        record: &AccountRecord,
        expected_version: u64,
    ) -> Result<bool, StrideError> {
        let record = record.clone();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE accounts
                 SET display_name = ?1, points = ?2, level = ?3, streak = ?4,
                     last_activity = ?5, units_completed = ?6, perfect_scores = ?7,
                     camps_completed = ?8, ai_sessions = ?9, version = ?10
                 WHERE account_id = ?11 AND version = ?12",
                params![
                    record.display_name,
                    record.points as i64,
                    record.level as i64,
                    record.streak as i64,
                    record.last_activity,
                    record.units_completed as i64,
                    record.perfect_scores as i64,
                    record.camps_completed as i64,
                    record.ai_sessions as i64,
                    record.version as i64,
                    record.account_id,
                    expected_version as i64,
                ],
            )?;
            Ok(changed == 1)
        })
        .await
    }

    async fn insert_award(&self, award: &BadgeAward) -> Result<bool, StrideError> {
        let award = award.clone();
        self.with_conn(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO badge_awards (account_id, badge_id, earned_at)
                 VALUES (?1, ?2, ?3)",
                params![award.account_id, award.badge_id, award.earned_at],
            )?;
            Ok(inserted == 1)
        })
        .await
    }

    async fn awards_for(&self, account_id: &str) -> Result<Vec<BadgeAward>, StrideError> {
        let account_id = account_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT account_id, badge_id, earned_at FROM badge_awards
                 WHERE account_id = ?1 ORDER BY earned_at",
            )?;
            let awards = stmt
                .query_map(params![account_id], |row| {
                    Ok(BadgeAward {
                        account_id: row.get(0)?,
                        badge_id: row.get(1)?,
                        earned_at: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(awards)
        })
        .await
    }

    async fn ranking_rows(&self) -> Result<Vec<RankingRow>, StrideError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT account_id, display_name, points, level, streak, created_at
                 FROM accounts",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(RankingRow {
                        account_id: row.get(0)?,
                        display_name: row.get(1)?,
                        points: row.get::<_, i64>(2)? as u64,
                        level: row.get::<_, i64>(3)? as u32,
                        streak: row.get::<_, i64>(4)? as u32,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn account_count(&self) -> Result<u64, StrideError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
