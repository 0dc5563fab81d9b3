//! Persisted catalog: the `files` table with connection pooling.
//!
//! Writes happen only through a [`CatalogWriter`], which wraps one whole
//! reconciliation pass in a single `BEGIN IMMEDIATE` transaction. Readers
//! (WAL mode) keep seeing the previous committed snapshot until it commits.

mod pragmas;
mod schema;

pub use pragmas::{apply_pragmas, refresh_planner_stats, PragmaCustomizer};
pub use schema::{init_schema, SCHEMA_VERSION};

use crate::error::{DbError, DbResult};
use crate::types::Generation;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::ToSql;
use rusqlite::{OptionalExtension, Row};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Columns selected for every [`FileRecord`], in `FileRecord::from_row` order.
const RECORD_COLUMNS: &str = "path, filename, filename_norm, ext, mtime, size, is_dir, seen_gen";

/// One filesystem entry as observed by a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedFile {
    /// Absolute, cleaned path (identity key)
    pub path: String,
    /// Final path component, case preserved
    pub filename: String,
    /// `normalize(filename)`
    pub filename_norm: String,
    /// Lowercase extension without the dot, empty if none
    pub ext: String,
    /// Modification time, seconds since epoch
    pub mtime: i64,
    /// Size in bytes
    pub size: i64,
    pub is_dir: bool,
}

/// A row of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: String,
    pub filename: String,
    pub filename_norm: String,
    pub ext: String,
    pub mtime: i64,
    pub size: i64,
    pub is_dir: bool,
    pub seen_gen: Generation,
}

impl FileRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            filename: row.get(1)?,
            filename_norm: row.get(2)?,
            ext: row.get(3)?,
            mtime: row.get(4)?,
            size: row.get(5)?,
            is_dir: row.get(6)?,
            seen_gen: Generation::new(row.get(7)?),
        })
    }
}

/// Catalog-wide counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub file_count: u64,
    pub last_generation: Option<Generation>,
}

/// Database handle with connection pooling.
///
/// Uses r2d2 because `rusqlite::Connection` is NOT Sync.
/// The pool manages thread-safe access to `SQLite` connections.
///
/// Thread-safe (Send + Sync) via r2d2's internal synchronization.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens or creates a database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if connection pool creation fails.
    /// Returns `DbError::Sqlite` or `DbError::Migration` if schema
    /// initialization fails.
    pub fn open(path: &Path) -> DbResult<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(4)
            .min_idle(Some(1))
            .connection_customizer(Box::new(PragmaCustomizer))
            .build(manager)?;

        {
            let conn = pool.get()?;
            init_schema(&conn)?;
        }

        Ok(Self { pool })
    }

    /// Creates an in-memory database (for testing).
    ///
    /// Pool size is 1 because every in-memory connection is a separate
    /// database; a pass therefore blocks readers until it finishes.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if connection pool creation fails.
    /// Returns `DbError::Sqlite` if schema initialization fails.
    pub fn in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(PragmaCustomizer))
            .build(manager)?;

        {
            let conn = pool.get()?;
            init_schema(&conn)?;
        }

        Ok(Self { pool })
    }

    /// Gets a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if no connection is available within the timeout.
    pub fn conn(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(DbError::from)
    }

    /// Starts a reconciliation pass.
    ///
    /// Takes SQLite's write lock immediately and allocates the pass's
    /// generation inside the same transaction, so two passes can never
    /// share an id or interleave their sweeps.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Locked` if another pass holds the write lock past
    /// the busy timeout.
    /// Returns `DbError::Pool` / `DbError::Sqlite` on store failures.
    pub fn begin_pass(&self) -> DbResult<CatalogWriter> {
        let conn = self.conn()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(DbError::from_begin)?;

        // From here on, dropping the writer rolls back.
        let mut writer = CatalogWriter {
            conn,
            generation: Generation::new(0),
            finished: false,
        };

        let last = read_last_generation(&writer.conn)?;
        let generation = Generation::next_after(last, crate::unix_now());
        writer.conn.execute(
            r"
            INSERT INTO schema_info (key, value) VALUES ('generation', ?1)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            [generation.as_i64().to_string()],
        )?;
        writer.generation = generation;

        tracing::debug!(%generation, "Started reconciliation pass");
        Ok(writer)
    }

    /// Pulls shortlist candidates.
    ///
    /// Returns non-directory records whose `filename_norm` contains any of
    /// `patterns`, restricted to `extensions` when that set is non-empty,
    /// newest first, at most `limit` rows. Rows with equal mtime come back
    /// in path order.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if no connection is available.
    /// Returns `DbError::Sqlite` if the query fails.
    pub fn shortlist_by_substring(
        &self,
        patterns: &[&str],
        extensions: &BTreeSet<String>,
        limit: usize,
    ) -> DbResult<Vec<FileRecord>> {
        let mut unique: Vec<&str> = Vec::with_capacity(patterns.len());
        for p in patterns {
            if !p.is_empty() && !unique.contains(p) {
                unique.push(*p);
            }
        }
        if unique.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut params: Vec<Box<dyn ToSql>> = Vec::with_capacity(unique.len() + extensions.len() + 1);
        let mut clauses = Vec::with_capacity(unique.len());
        for p in &unique {
            params.push(Box::new((*p).to_string()));
            clauses.push(format!("instr(filename_norm, ?{}) > 0", params.len()));
        }
        let mut sql = format!(
            "SELECT {RECORD_COLUMNS} FROM files WHERE ({}) AND is_dir = 0",
            clauses.join(" OR ")
        );

        if !extensions.is_empty() {
            let mut placeholders = Vec::with_capacity(extensions.len());
            for ext in extensions {
                params.push(Box::new(ext.clone()));
                placeholders.push(format!("?{}", params.len()));
            }
            sql.push_str(&format!(" AND ext IN ({})", placeholders.join(",")));
        }

        params.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
        sql.push_str(&format!(
            " ORDER BY mtime DESC, path ASC LIMIT ?{}",
            params.len()
        ));

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let records = stmt
            .query_map(param_refs.as_slice(), FileRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Gets a record by path.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if no connection is available.
    /// Returns `DbError::Sqlite` if the query fails (other than no rows).
    pub fn get_record(&self, path: &str) -> DbResult<Option<FileRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM files WHERE path = ?1"),
                [path],
                FileRecord::from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Gets every record, ordered by path.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if no connection is available.
    /// Returns `DbError::Sqlite` if the query fails.
    pub fn all_records(&self) -> DbResult<Vec<FileRecord>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {RECORD_COLUMNS} FROM files ORDER BY path"))?;
        let records = stmt
            .query_map([], FileRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Gets total file count.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if no connection is available.
    /// Returns `DbError::Sqlite` if the query fails.
    pub fn file_count(&self) -> DbResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Gets the generation of the last committed pass, if any.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if no connection is available.
    /// Returns `DbError::Sqlite` if the query fails.
    pub fn last_generation(&self) -> DbResult<Option<Generation>> {
        let conn = self.conn()?;
        read_last_generation(&conn)
    }

    /// Gets catalog-wide counters.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if no connection is available.
    /// Returns `DbError::Sqlite` if a query fails.
    pub fn stats(&self) -> DbResult<CatalogStats> {
        Ok(CatalogStats {
            file_count: self.file_count()?,
            last_generation: self.last_generation()?,
        })
    }
}

fn read_last_generation(conn: &rusqlite::Connection) -> DbResult<Option<Generation>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_info WHERE key = 'generation'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .map(|id| Some(Generation::new(id)))
            .map_err(|e| DbError::Migration(format!("unreadable generation '{v}': {e}"))),
    }
}

/// Write side of one reconciliation pass.
///
/// All upserts and the sweep run inside one transaction. Nothing becomes
/// visible to readers until [`CatalogWriter::commit`]; dropping the writer
/// without committing rolls the whole pass back.
pub struct CatalogWriter {
    conn: PooledConnection<SqliteConnectionManager>,
    generation: Generation,
    finished: bool,
}

impl CatalogWriter {
    /// The generation allocated to this pass.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Inserts or replaces a file by path, overwriting every derived field
    /// and stamping it with `generation`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Sqlite` if the statement fails.
    pub fn upsert(&self, file: &ObservedFile, generation: Generation) -> DbResult<()> {
        let mut stmt = self.conn.prepare_cached(
            r"
            INSERT INTO files (path, filename, filename_norm, ext, mtime, size, is_dir, seen_gen)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(path) DO UPDATE SET
                filename = excluded.filename,
                filename_norm = excluded.filename_norm,
                ext = excluded.ext,
                mtime = excluded.mtime,
                size = excluded.size,
                is_dir = excluded.is_dir,
                seen_gen = excluded.seen_gen
            ",
        )?;
        stmt.execute(rusqlite::params![
            &file.path,
            &file.filename,
            &file.filename_norm,
            &file.ext,
            file.mtime,
            file.size,
            file.is_dir,
            generation.as_i64(),
        ])?;
        Ok(())
    }

    /// Deletes every record not stamped with `generation`.
    ///
    /// Must run after all upserts of the pass. Returns the number of rows
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Sqlite` if the delete fails.
    pub fn sweep_older_than(&self, generation: Generation) -> DbResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM files WHERE seen_gen <> ?1",
            [generation.as_i64()],
        )?;
        Ok(removed)
    }

    /// Commits the pass, making the new snapshot visible.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Sqlite` if the commit fails; the transaction is
    /// then rolled back and the previous snapshot stays intact.
    pub fn commit(mut self) -> DbResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;

        if let Err(e) = refresh_planner_stats(&self.conn) {
            tracing::debug!("Planner statistics refresh failed: {e}");
        }
        Ok(())
    }

    /// Abandons the pass, keeping the previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Sqlite` if the rollback fails.
    pub fn rollback(mut self) -> DbResult<()> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for CatalogWriter {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!("Rollback of unfinished pass failed: {e}");
            }
        }
    }
}

// Compile-time assertion for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Database>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalize;

    fn observed(path: &str, mtime: i64) -> ObservedFile {
        let filename = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ObservedFile {
            path: path.to_string(),
            filename_norm: normalize::normalize(&filename),
            ext: normalize::ext_lower(&filename),
            filename,
            mtime,
            size: 10,
            is_dir: false,
        }
    }

    fn seed(db: &Database, files: &[ObservedFile]) -> Generation {
        let writer = db.begin_pass().unwrap();
        let generation = writer.generation();
        for f in files {
            writer.upsert(f, generation).unwrap();
        }
        writer.sweep_older_than(generation).unwrap();
        writer.commit().unwrap();
        generation
    }

    fn no_ext() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.file_count().unwrap(), 0);
        assert_eq!(db.last_generation().unwrap(), None);
    }

    #[test]
    fn test_upsert_and_get() {
        let db = Database::in_memory().unwrap();
        let generation = seed(&db, &[observed("/docs/Tax_Return.PDF", 100)]);

        let record = db.get_record("/docs/Tax_Return.PDF").unwrap().unwrap();
        assert_eq!(record.filename, "Tax_Return.PDF");
        assert_eq!(record.filename_norm, "tax return pdf");
        assert_eq!(record.ext, "pdf");
        assert_eq!(record.mtime, 100);
        assert!(!record.is_dir);
        assert_eq!(record.seen_gen, generation);
        assert_eq!(db.last_generation().unwrap(), Some(generation));
    }

    #[test]
    fn test_get_record_not_found() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_record("/nope").unwrap().is_none());
    }

    #[test]
    fn test_upsert_updates_existing_in_place() {
        let db = Database::in_memory().unwrap();
        seed(&db, &[observed("/a/notes.txt", 1)]);
        let second = seed(&db, &[observed("/a/notes.txt", 2)]);

        assert_eq!(db.file_count().unwrap(), 1);
        let record = db.get_record("/a/notes.txt").unwrap().unwrap();
        assert_eq!(record.mtime, 2);
        assert_eq!(record.seen_gen, second);
    }

    #[test]
    fn test_generations_strictly_increase() {
        let db = Database::in_memory().unwrap();
        let g1 = seed(&db, &[]);
        let g2 = seed(&db, &[]);
        let g3 = seed(&db, &[]);
        assert!(g1 < g2 && g2 < g3);
    }

    #[test]
    fn test_sweep_removes_unseen_rows() {
        let db = Database::in_memory().unwrap();
        seed(&db, &[observed("/a/keep.txt", 1), observed("/a/gone.txt", 1)]);

        let writer = db.begin_pass().unwrap();
        let generation = writer.generation();
        writer.upsert(&observed("/a/keep.txt", 1), generation).unwrap();
        assert_eq!(writer.sweep_older_than(generation).unwrap(), 1);
        writer.commit().unwrap();

        let paths: Vec<_> = db.all_records().unwrap().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/a/keep.txt".to_string()]);
    }

    #[test]
    fn test_rollback_keeps_previous_snapshot() {
        let db = Database::in_memory().unwrap();
        let first = seed(&db, &[observed("/a/one.txt", 1)]);

        let writer = db.begin_pass().unwrap();
        let generation = writer.generation();
        writer.upsert(&observed("/a/two.txt", 1), generation).unwrap();
        writer.sweep_older_than(generation).unwrap();
        writer.rollback().unwrap();

        let records = db.all_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "/a/one.txt");
        assert_eq!(records[0].seen_gen, first);
        assert_eq!(db.last_generation().unwrap(), Some(first));
    }

    #[test]
    fn test_dropped_writer_rolls_back() {
        let db = Database::in_memory().unwrap();
        seed(&db, &[observed("/a/one.txt", 1)]);

        {
            let writer = db.begin_pass().unwrap();
            writer.sweep_older_than(writer.generation()).unwrap();
        }

        assert_eq!(db.file_count().unwrap(), 1);
    }

    #[test]
    fn test_shortlist_matches_any_pattern() {
        let db = Database::in_memory().unwrap();
        seed(
            &db,
            &[
                observed("/d/budget_2024.xlsx", 3),
                observed("/d/annual-report.pdf", 2),
                observed("/d/holiday.jpg", 1),
            ],
        );

        let hits = db
            .shortlist_by_substring(&["budget report", "budget", "report"], &no_ext(), 10)
            .unwrap();
        let names: Vec<_> = hits.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["budget_2024.xlsx", "annual-report.pdf"]);
    }

    #[test]
    fn test_shortlist_orders_by_mtime_and_caps() {
        let db = Database::in_memory().unwrap();
        let files: Vec<_> = (0..20)
            .map(|i| observed(&format!("/d/report_{i:02}.txt"), i))
            .collect();
        seed(&db, &files);

        let hits = db.shortlist_by_substring(&["report"], &no_ext(), 5).unwrap();
        assert_eq!(hits.len(), 5);
        let mtimes: Vec<_> = hits.iter().map(|r| r.mtime).collect();
        assert_eq!(mtimes, vec![19, 18, 17, 16, 15]);
    }

    #[test]
    fn test_shortlist_extension_filter() {
        let db = Database::in_memory().unwrap();
        seed(
            &db,
            &[observed("/d/invoice.pdf", 1), observed("/d/invoice.png", 2)],
        );

        let exts: BTreeSet<String> = ["pdf".to_string()].into();
        let hits = db.shortlist_by_substring(&["invoice"], &exts, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ext, "pdf");
    }

    #[test]
    fn test_shortlist_is_literal_not_like() {
        let db = Database::in_memory().unwrap();
        seed(&db, &[observed("/d/abc.txt", 1)]);

        // LIKE would treat % as a wildcard.
        let hits = db.shortlist_by_substring(&["a%c"], &no_ext(), 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_shortlist_skips_directories() {
        let db = Database::in_memory().unwrap();
        let mut dir = observed("/d/reports", 5);
        dir.is_dir = true;
        seed(&db, &[dir, observed("/d/reports.txt", 1)]);

        let hits = db.shortlist_by_substring(&["reports"], &no_ext(), 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "/d/reports.txt");
    }

    #[test]
    fn test_shortlist_empty_patterns() {
        let db = Database::in_memory().unwrap();
        seed(&db, &[observed("/d/a.txt", 1)]);
        assert!(db.shortlist_by_substring(&[], &no_ext(), 10).unwrap().is_empty());
        assert!(db.shortlist_by_substring(&[""], &no_ext(), 10).unwrap().is_empty());
    }

    #[test]
    fn test_stats() {
        let db = Database::in_memory().unwrap();
        let generation = seed(&db, &[observed("/d/a.txt", 1), observed("/d/b.txt", 1)]);
        let stats = db.stats().unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.last_generation, Some(generation));
    }
}
