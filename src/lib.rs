//! findex: fast filename index and search.
//!
//! This library keeps a persisted snapshot of the filenames under a set of
//! roots and ranks them against free-text queries:
//! - Generation-stamped reconciliation (mark, then sweep) in one transaction
//! - Substring shortlist pulled newest-first from SQLite
//! - Multi-signal scoring (substring, tokens, prefix, trigrams, recency)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 findex CLI                   │
//! │   index · q · open · reveal · stats         │
//! └───────┬─────────────────────────┬───────────┘
//!         │ write path              │ read path
//! ┌───────▼────────┐       ┌────────▼──────────┐
//! │    Indexer     │       │      Ranker       │
//! │ walk + sweep   │       │ shortlist + score │
//! └───────┬────────┘       └────────┬──────────┘
//!         │      ┌────────────┐     │
//!         └──────► normalize  ◄─────┘
//!         │      └────────────┘     │
//! ┌───────▼─────────────────────────▼───────────┐
//! │        SQLite catalog (WAL, r2d2 pool)       │
//! └──────────────────────────────────────────────┘
//! ```

pub mod db;
pub mod error;
pub mod fmt;
pub mod services;
pub mod tools;
pub mod types;

pub use error::{FindexError, Result};
pub use types::{Generation, Score};

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Computes the default database path, `~/.findex/index.db`.
///
/// # Errors
///
/// Returns `FindexError::Config` if the home directory cannot be determined.
pub fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| FindexError::Config("could not determine home directory".into()))?;
    Ok(home.join(".findex").join("index.db"))
}

/// Current wall-clock time in unix seconds.
#[must_use]
pub fn unix_now() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    i64::try_from(secs).unwrap_or(i64::MAX)
}
