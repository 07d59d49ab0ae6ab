//! SQLite storage with connection pooling and migrations
//!
//! Query modules:
//! - `corrections` - Corrected/imported examples and shown predictions
//!
//! The seed corpus is compiled in and never written to the database; only the
//! examples accumulated over the system's lifetime are stored.

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::debug;

use crate::error::Result;

mod corrections;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// SQLite `CURRENT_TIMESTAMP` text as UTC, falling back to now
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Pooled SQLite handle holding accumulated examples
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Filesystem path, kept for status output
    db_path: String,
}

impl Database {
    /// Open (or create) a database file and apply migrations
    pub fn new(path: &str) -> Result<Self> {
        // Per-connection settings
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA busy_timeout = 5000;")
        });
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;
        debug!("Opened database {}", path);

        Ok(db)
    }

    /// Filesystem path of the database
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` so every pooled connection
    /// sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "tally_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Leftover from an earlier run
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Borrow a pooled connection
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Create tables and indexes if missing
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the writer appending corrections
            PRAGMA journal_mode = WAL;

            -- Examples accumulated after the seed corpus (append-only)
            CREATE TABLE IF NOT EXISTS corrected_examples (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT 'correction',  -- correction, import
                shown_category TEXT,                        -- what the user saw, if known
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_corrected_category ON corrected_examples(category);

            -- Last prediction shown per description (baseline for feedback)
            CREATE TABLE IF NOT EXISTS shown_predictions (
                description TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                raw_category TEXT NOT NULL,
                confidence REAL NOT NULL,
                shown_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
