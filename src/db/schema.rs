//! Database schema definitions.

use crate::error::{DbError, DbResult};
use rusqlite::{Connection, OptionalExtension};

/// Current schema version for migrations.
pub const SCHEMA_VERSION: u32 = 1;

/// Initializes the database schema.
///
/// # Errors
///
/// Returns `DbError::Sqlite` if schema creation fails.
/// Returns `DbError::Migration` if the file was written by a newer schema.
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- One row per observed file, keyed by absolute path
        CREATE TABLE IF NOT EXISTS files (
            id INTEGER PRIMARY KEY,
            path TEXT NOT NULL UNIQUE,
            filename TEXT NOT NULL,
            filename_norm TEXT NOT NULL,
            ext TEXT NOT NULL DEFAULT '',
            mtime INTEGER NOT NULL DEFAULT 0,
            size INTEGER NOT NULL DEFAULT 0,
            is_dir INTEGER NOT NULL DEFAULT 0,
            seen_gen INTEGER NOT NULL DEFAULT 0
        );

        -- Shortlist predicate
        CREATE INDEX IF NOT EXISTS idx_files_filename_norm ON files(filename_norm);

        -- Extension filter
        CREATE INDEX IF NOT EXISTS idx_files_ext ON files(ext);

        -- Recency ordering
        CREATE INDEX IF NOT EXISTS idx_files_mtime ON files(mtime);

        -- Generation sweep
        CREATE INDEX IF NOT EXISTS idx_files_seen_gen ON files(seen_gen);

        -- Schema version and last committed generation
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        ) WITHOUT ROWID;
        "#,
    )?;

    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_info WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match stored.as_deref().map(str::parse::<u32>) {
        None => {
            conn.execute(
                "INSERT INTO schema_info (key, value) VALUES ('version', ?1)",
                [SCHEMA_VERSION.to_string()],
            )?;
        }
        Some(Ok(v)) if v <= SCHEMA_VERSION => {}
        Some(Ok(v)) => {
            return Err(DbError::Migration(format!(
                "database schema v{v} is newer than supported v{SCHEMA_VERSION}"
            )));
        }
        Some(Err(e)) => {
            return Err(DbError::Migration(format!("unreadable schema version: {e}")));
        }
    }

    Ok(())
}
