//! SQLite-backed outcome store.
//!
//! The store lives at `~/.mailtrace/outcomes.db` and is what makes resume
//! idempotent: each row's outcome is written once per run and read back on
//! the next run to decide the skip rule.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::driver::{OutcomeSink, RowOutcome};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to create {0}")]
    CreateDir(PathBuf),
    #[error("home directory not found")]
    HomeDirNotFound,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS outcomes (
    row_idx     INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL DEFAULT '',
    status      TEXT NOT NULL DEFAULT '',
    alternates  TEXT NOT NULL DEFAULT '',
    confidence  TEXT NOT NULL DEFAULT '',
    updated_at  TEXT NOT NULL
);
";

pub struct OutcomeStore {
    conn: Connection,
}

impl OutcomeStore {
    /// Open (or create) the store at the default path.
    pub fn open() -> Result<Self, StoreError> {
        Self::open_at(Self::default_path()?)
    }

    /// Open a store at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|_| StoreError::CreateDir(parent.to_path_buf()))?;
            }
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn default_path() -> Result<PathBuf, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::HomeDirNotFound)?;
        Ok(home.join(".mailtrace").join("outcomes.db"))
    }

    pub fn get(&self, row: usize) -> Result<Option<RowOutcome>, StoreError> {
        self.conn
            .query_row(
                "SELECT email, status, alternates, confidence FROM outcomes WHERE row_idx = ?1",
                params![row as i64],
                |r| {
                    Ok(RowOutcome {
                        email: r.get(0)?,
                        status: r.get(1)?,
                        alternates: r.get(2)?,
                        confidence: r.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
    }

    pub fn put(&self, row: usize, name: &str, outcome: &RowOutcome) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO outcomes (row_idx, name, email, status, alternates, confidence, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(row_idx) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                status = excluded.status,
                alternates = excluded.alternates,
                confidence = excluded.confidence,
                updated_at = excluded.updated_at",
            params![
                row as i64,
                name,
                outcome.email,
                outcome.status,
                outcome.alternates,
                outcome.confidence,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// All stored rows in row order.
    pub fn all(&self) -> Result<Vec<(usize, String, RowOutcome)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT row_idx, name, email, status, alternates, confidence
             FROM outcomes ORDER BY row_idx",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)? as usize,
                r.get::<_, String>(1)?,
                RowOutcome {
                    email: r.get(2)?,
                    status: r.get(3)?,
                    alternates: r.get(4)?,
                    confidence: r.get(5)?,
                },
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl OutcomeSink for OutcomeStore {
    fn prior(&self, row: usize) -> Option<RowOutcome> {
        self.get(row).ok().flatten()
    }

    fn write(&mut self, row: usize, name: &str, outcome: &RowOutcome) -> Result<(), String> {
        self.put(row, name, outcome).map_err(|e| e.to_string())
    }
}
