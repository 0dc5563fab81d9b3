//! The `stats` command.

use crate::db::Database;
use serde::Serialize;
use std::path::Path;

/// Output for the stats command.
#[derive(Debug, Serialize)]
pub struct StatsOutput {
    /// Catalog file location
    pub db_path: String,
    /// On-disk size of the main database file, if it exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_bytes: Option<u64>,
    pub file_count: u64,
    /// Generation of the last committed pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_generation: Option<i64>,
}

/// Executes the stats command.
///
/// # Errors
///
/// Returns a `DbError` if the catalog cannot be read.
pub fn execute_stats(db: &Database, db_path: &Path) -> crate::error::Result<StatsOutput> {
    let stats = db.stats()?;
    Ok(StatsOutput {
        db_path: db_path.display().to_string(),
        db_bytes: std::fs::metadata(db_path).ok().map(|m| m.len()),
        file_count: stats.file_count,
        last_generation: stats.last_generation.map(|g| g.as_i64()),
    })
}

/// Renders a byte count for humans.
#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for u in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = u;
    }
    format!("{value:.1} {unit}")
}
