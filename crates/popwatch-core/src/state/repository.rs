//! `SQLite` storage for known-UID state.

use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::model::{KnownUidStore, KnownUids};
use crate::Result;

/// Repository for per-mailbox known-UID state.
pub struct SqliteStateRepository {
    pool: SqlitePool,
}

impl SqliteStateRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS known_uids (
                mailbox TEXT PRIMARY KEY,
                initialized INTEGER NOT NULL DEFAULT 0,
                uids_json TEXT NOT NULL DEFAULT '[]',
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load the state for a mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored UID list is corrupt.
    pub async fn get(&self, mailbox: &str) -> Result<KnownUids> {
        let row = sqlx::query(
            r"
            SELECT initialized, uids_json
            FROM known_uids
            WHERE mailbox = ?
            ",
        )
        .bind(mailbox)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(KnownUids::new());
        };

        let uids_json: String = row.get("uids_json");
        let uids: BTreeSet<String> = serde_json::from_str(&uids_json)?;
        Ok(KnownUids {
            initialized: row.get::<i64, _>("initialized") != 0,
            uids,
        })
    }

    /// Store the state for a mailbox, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn put(&self, mailbox: &str, state: &KnownUids) -> Result<()> {
        let uids_json = serde_json::to_string(&state.uids)?;

        sqlx::query(
            r"
            INSERT INTO known_uids (mailbox, initialized, uids_json, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(mailbox) DO UPDATE SET
                initialized = excluded.initialized,
                uids_json = excluded.uids_json,
                updated_at = excluded.updated_at
            ",
        )
        .bind(mailbox)
        .bind(i64::from(state.initialized))
        .bind(&uids_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(mailbox, known = state.len(), "Saved known UIDs");
        Ok(())
    }

    /// Forget everything stored for a mailbox.
    ///
    /// The next cycle for it behaves like a first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn reset(&self, mailbox: &str) -> Result<()> {
        sqlx::query("DELETE FROM known_uids WHERE mailbox = ?")
            .bind(mailbox)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl KnownUidStore for SqliteStateRepository {
    async fn load(&self, mailbox: &str) -> Result<KnownUids> {
        self.get(mailbox).await
    }

    async fn save(&self, mailbox: &str, state: &KnownUids) -> Result<()> {
        self.put(mailbox, state).await
    }
}
