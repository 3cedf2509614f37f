//! SQLite-backed store for spawn point records, their detections, and the
//! altitude cache.
//!
//! The database lives at `~/.spawnscan/spawnscan.db` unless the config names
//! another path. Classification reads detections and writes records here;
//! the scanner that produces detections writes through the same schema.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub mod types;
pub use types::*;

pub mod detections;
pub mod spawnpoints;

pub struct SpawnDb {
    conn: Connection,
}

impl SpawnDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Open (or create) the database at `~/.spawnscan/spawnscan.db` and apply the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL lets the scanner keep writing detections while a round reads.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        log::debug!("Opened spawn point store at {}", path.display());
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.spawnscan/spawnscan.db`.
    pub fn default_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".spawnscan").join("spawnscan.db"))
    }
}

/// Epoch seconds as stored in `scan_time` / `last_scanned` columns.
fn to_epoch(t: &DateTime<Utc>) -> i64 {
    t.timestamp()
}

fn from_epoch(idx: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Integer,
            format!("timestamp {secs} out of range").into(),
        )
    })
}

// =============================================================================
// Shared test utilities
// =============================================================================
