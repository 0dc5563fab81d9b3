//! `SQLite` PRAGMA configuration for the catalog.

use crate::error::DbResult;
use rusqlite::Connection;

/// Executes a single SQL statement that may return rows (PRAGMAs).
fn exec_stmt(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    conn.prepare(sql)?.query([])?.next()?;
    Ok(())
}

/// Applies PRAGMA settings (raw rusqlite version).
///
/// Used by [`PragmaCustomizer`] on every pool connection.
/// Returns raw `rusqlite::Result` for compatibility with r2d2's error types.
pub fn apply_pragmas_raw(conn: &Connection) -> rusqlite::Result<()> {
    // WAL lets readers keep the last committed snapshot during a pass
    exec_stmt(conn, "PRAGMA journal_mode = WAL")?;
    exec_stmt(conn, "PRAGMA synchronous = NORMAL")?;
    // 8MB page cache
    exec_stmt(conn, "PRAGMA cache_size = -8000")?;
    // 64MB memory-mapped I/O for faster reads
    exec_stmt(conn, "PRAGMA mmap_size = 67108864")?;
    // A second indexing pass waits this long for the write lock
    exec_stmt(conn, "PRAGMA busy_timeout = 5000")?;
    exec_stmt(conn, "PRAGMA foreign_keys = ON")?;
    exec_stmt(conn, "PRAGMA temp_store = MEMORY")?;

    Ok(())
}

/// Applies the catalog PRAGMA settings.
///
/// # Errors
///
/// Returns `DbError::Sqlite` if any PRAGMA statement fails.
pub fn apply_pragmas(conn: &Connection) -> DbResult<()> {
    apply_pragmas_raw(conn)?;
    Ok(())
}

/// Refreshes query planner statistics after a committed pass.
///
/// `PRAGMA optimize` only re-analyzes tables whose shape changed
/// noticeably, so it is cheap to run after every pass.
pub fn refresh_planner_stats(conn: &Connection) -> rusqlite::Result<()> {
    exec_stmt(conn, "PRAGMA optimize")
}

/// r2d2 hook that applies [`apply_pragmas_raw`] to each new connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct PragmaCustomizer;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        apply_pragmas_raw(conn)
    }
}
