//! Error types for findex.
//!
//! Uses thiserror for ergonomic error handling with proper
//! error chain propagation. Per-entry traversal failures never
//! appear here: the reconciler swallows them at the entry level.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum FindexError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Picker error: {0}")]
    Picker(#[from] PickerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Catalog (durable store) errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Database is locked by another indexing pass")]
    Locked,
}

/// Ranking and query-surface errors.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("query required")]
    EmptyQuery,

    #[error("invalid time window '{0}' (use 24h, 7d, 2w)")]
    InvalidWindow(String),

    #[error("invalid time window unit '{0}' (use h, d, or w)")]
    InvalidWindowUnit(char),
}

/// Reconciliation errors.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("no roots provided")]
    NoRoots,

    #[error("none of the configured roots could be read ({} skipped)", skipped.len())]
    NoUsableRoots { skipped: Vec<PathBuf> },
}

/// Interactive selector errors.
#[derive(Error, Debug)]
pub enum PickerError {
    #[error("{program} not found. Install it (e.g. `brew install {program}`) and retry")]
    NotInstalled { program: &'static str },

    #[error("picker failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for top-level operations.
pub type Result<T> = std::result::Result<T, FindexError>;

/// Result type alias for database operations.
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Result type alias for search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Result type alias for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

// Error code implementations for machine-readable error responses
impl FindexError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(e) => e.code(),
            Self::Search(e) => e.code(),
            Self::Index(e) => e.code(),
            Self::Picker(e) => e.code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// True for errors caused by caller input rather than the environment.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Search(_)
                | Self::Index(IndexError::NoRoots)
        )
    }
}

impl DbError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "SQLITE_ERROR",
            Self::Pool(_) => "POOL_ERROR",
            Self::Migration(_) => "MIGRATION_ERROR",
            Self::Locked => "DB_LOCKED",
        }
    }

    /// Maps SQLITE_BUSY / SQLITE_LOCKED to [`DbError::Locked`].
    pub(crate) fn from_begin(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
                Self::Locked
            }
            _ => Self::Sqlite(err),
        }
    }
}

impl SearchError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "EMPTY_QUERY",
            Self::InvalidWindow(_) => "INVALID_WINDOW",
            Self::InvalidWindowUnit(_) => "INVALID_WINDOW_UNIT",
        }
    }
}

impl IndexError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoRoots => "NO_ROOTS",
            Self::NoUsableRoots { .. } => "NO_USABLE_ROOTS",
        }
    }
}

impl PickerError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInstalled { .. } => "PICKER_NOT_INSTALLED",
            Self::Io(_) => "PICKER_IO_ERROR",
        }
    }
}
