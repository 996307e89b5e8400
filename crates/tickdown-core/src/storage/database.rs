//! SQLite-based persistence.
//!
//! Provides persistent storage for:
//! - Finished and abandoned countdown runs
//! - Run statistics
//! - Key-value store for application state (recent durations live here)

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, StorageError};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Counted down to zero.
    Finished,
    /// Reset before reaching zero.
    Abandoned,
}

impl RunOutcome {
    fn as_str(self) -> &'static str {
        match self {
            RunOutcome::Finished => "finished",
            RunOutcome::Abandoned => "abandoned",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "finished" => RunOutcome::Finished,
            _ => RunOutcome::Abandoned,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    /// Configured length of the run.
    pub duration_secs: u64,
    /// Seconds actually counted down before the run ended.
    pub elapsed_secs: u64,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total_runs: u64,
    pub finished_runs: u64,
    pub abandoned_runs: u64,
    pub total_elapsed_secs: u64,
}

/// SQLite database for run storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/tickdown/tickdown.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("tickdown.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS runs (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                duration_secs INTEGER NOT NULL,
                elapsed_secs  INTEGER NOT NULL DEFAULT 0,
                outcome       TEXT NOT NULL,
                started_at    TEXT NOT NULL,
                ended_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_runs_ended_at ON runs(ended_at);",
        )?;
        Ok(())
    }

    /// Record a run that has ended.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_run(
        &self,
        duration_secs: u64,
        elapsed_secs: u64,
        outcome: RunOutcome,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT INTO runs (duration_secs, elapsed_secs, outcome, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                duration_secs,
                elapsed_secs,
                outcome.as_str(),
                started_at.to_rfc3339(),
                ended_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent runs first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, duration_secs, elapsed_secs, outcome, started_at, ended_at
             FROM runs
             ORDER BY ended_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut runs = Vec::new();
        for row in rows {
            let (id, duration_secs, elapsed_secs, outcome, started_at, ended_at) = row?;
            runs.push(RunRecord {
                id,
                duration_secs,
                elapsed_secs,
                outcome: RunOutcome::parse(&outcome),
                started_at: parse_timestamp(&started_at)?,
                ended_at: parse_timestamp(&ended_at)?,
            });
        }
        Ok(runs)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub fn run_stats(&self) -> Result<RunStats, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT outcome, COUNT(*), COALESCE(SUM(elapsed_secs), 0)
             FROM runs
             GROUP BY outcome",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let mut stats = RunStats::default();
        for row in rows {
            let (outcome, count, elapsed) = row?;
            stats.total_runs += count;
            stats.total_elapsed_secs += elapsed;
            match RunOutcome::parse(&outcome) {
                RunOutcome::Finished => stats.finished_runs += count,
                RunOutcome::Abandoned => stats.abandoned_runs += count,
            }
        }
        Ok(stats)
    }

    /// Get a value from the kv store.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are not an error.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt {
            key: "runs".into(),
            message: e.to_string(),
        })
}
