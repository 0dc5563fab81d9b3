//! Common test utilities for findex integration tests.
//!
//! Provides `TestEnv`: a temp directory tree plus a catalog, with helpers
//! to create files at chosen mtimes and run passes over the tree.

#![allow(dead_code)] // Test utilities may not all be used in every test file

use findex::db::Database;
use findex::services::{IndexConfig, IndexReport, Indexer, QueryOptions, Ranker, SearchHit};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

pub const DAY: i64 = 86_400;

/// A complete test environment with all services wired together.
pub struct TestEnv {
    pub dir: TempDir,
    pub db: Arc<Database>,
}

impl TestEnv {
    /// Creates an empty tree with an in-memory catalog.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let db = Arc::new(Database::in_memory().expect("Failed to create in-memory database"));
        Self { dir, db }
    }

    /// Creates an empty tree with a file-backed catalog (WAL, pooled).
    ///
    /// The catalog lives in its own temp directory so passes over the tree
    /// never see it.
    pub fn with_file_db() -> (Self, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let db_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Arc::new(
            Database::open(&db_dir.path().join("index.db")).expect("Failed to open database"),
        );
        (Self { dir, db }, db_dir)
    }

    /// Gets the full path to an entry in the tree.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// The catalog key of an entry in the tree.
    pub fn key(&self, name: &str) -> String {
        self.path(name).to_string_lossy().into_owned()
    }

    /// Writes a file, creating parent directories.
    pub fn write_file(&self, name: &str, content: &str) {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write test file");
    }

    /// Writes a file and sets its mtime to `mtime` unix seconds.
    pub fn write_file_at(&self, name: &str, mtime: i64) {
        self.write_file(name, name);
        self.set_mtime(name, mtime);
    }

    /// Sets an existing file's mtime.
    pub fn set_mtime(&self, name: &str, mtime: i64) {
        let time = UNIX_EPOCH + Duration::from_secs(u64::try_from(mtime).expect("mtime >= 0"));
        fs::File::options()
            .write(true)
            .open(self.path(name))
            .and_then(|f| f.set_modified(time))
            .expect("Failed to set mtime");
    }

    /// Index config rooted at the tree.
    pub fn config(&self) -> IndexConfig {
        IndexConfig {
            roots: vec![self.dir.path().to_path_buf()],
            ..IndexConfig::default()
        }
    }

    /// Runs one pass with `config`.
    pub fn index_with(&self, config: IndexConfig) -> IndexReport {
        Indexer::new(Arc::clone(&self.db), config)
            .index(None)
            .expect("Failed to index")
    }

    /// Runs one pass over the tree with default settings.
    pub fn index_all(&self) -> IndexReport {
        self.index_with(self.config())
    }

    /// Sorted catalog keys.
    pub fn catalog_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self
            .db
            .all_records()
            .expect("Failed to read catalog")
            .into_iter()
            .map(|r| r.path)
            .collect();
        paths.sort();
        paths
    }

    /// Runs a query with default options as of `now`.
    pub fn search_at(&self, query: &str, now: i64) -> Vec<SearchHit> {
        self.search_with(query, &QueryOptions::default(), now)
    }

    pub fn search_with(&self, query: &str, opts: &QueryOptions, now: i64) -> Vec<SearchHit> {
        Ranker::new(Arc::clone(&self.db))
            .search_at(query, opts, now)
            .expect("Search failed")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Current unix seconds.
pub fn now() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs();
    i64::try_from(secs).expect("fits in i64")
}
