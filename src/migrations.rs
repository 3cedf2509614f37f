//! Schema setup for the spawn point store.
//!
//! The whole schema is one baseline script, embedded at compile time. The
//! `schema_version` table records that it was applied; a database stamped
//! by a newer build is refused rather than guessed at.

use rusqlite::{Connection, OptionalExtension};

/// Version written by [`BASELINE`].
pub const SCHEMA_VERSION: i32 = 1;

const BASELINE: &str = include_str!("migrations/001_baseline.sql");

/// Stamped version, 0 for a database that has never been set up.
fn stored_version(conn: &Connection) -> Result<i32, String> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()
        .map_err(|e| format!("Failed to inspect schema: {}", e))?
        .is_some();
    if !has_table {
        return Ok(0);
    }
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| format!("Failed to read schema version: {}", e))
}

/// Bring `conn` up to [`SCHEMA_VERSION`]. Returns true when the baseline was
/// applied, false when the database was already current.
pub fn run_migrations(conn: &Connection) -> Result<bool, String> {
    let version = stored_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(format!(
            "Database schema version ({}) is newer than this build of spawnscan supports ({}). \
             Please update spawnscan.",
            version, SCHEMA_VERSION
        ));
    }
    if version == SCHEMA_VERSION {
        return Ok(false);
    }

    conn.execute_batch(BASELINE)
        .map_err(|e| format!("Schema v{} failed: {}", SCHEMA_VERSION, e))?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )
    .map_err(|e| format!("Failed to record schema v{}: {}", SCHEMA_VERSION, e))?;

    log::info!("Applied schema v{}", SCHEMA_VERSION);
    Ok(true)
}
