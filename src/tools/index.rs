//! The `index` command: one reconciliation pass over the configured roots.

use crate::db::Database;
use crate::services::indexer::{default_ignore_dirs, IndexProgress, ProgressCallback};
use crate::services::{IndexConfig, Indexer};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Root indexed when none is given.
pub const DEFAULT_ROOT: &str = "~";

/// Input for the index command.
#[derive(Debug, Clone, Default)]
pub struct IndexInput {
    /// Roots to scan; empty means the home directory
    pub roots: Vec<PathBuf>,
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    /// Extension allow-set (empty = any)
    pub extensions: BTreeSet<String>,
    /// Directory names pruned in addition to the built-in list
    pub extra_ignore_dirs: Vec<String>,
}

/// Output for the index command.
#[derive(Debug, Serialize)]
pub struct IndexOutput {
    /// Generation stamped on every observed file
    pub generation: i64,
    /// Files written during the pass
    pub files_indexed: usize,
    /// Stale entries removed by the sweep
    pub files_removed: usize,
    pub roots_scanned: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roots_skipped: Vec<String>,
    pub elapsed_ms: u64,
}

/// Executes the index command.
///
/// # Errors
///
/// Returns `IndexError::NoUsableRoots` if every root is unusable, or a
/// `DbError` if the pass could not be written. Either way the catalog is
/// left as it was before the pass.
pub fn execute_index(db: Arc<Database>, input: IndexInput) -> crate::error::Result<IndexOutput> {
    let roots = if input.roots.is_empty() {
        vec![PathBuf::from(DEFAULT_ROOT)]
    } else {
        input.roots
    };

    let mut ignore_dirs = default_ignore_dirs();
    ignore_dirs.extend(
        input
            .extra_ignore_dirs
            .into_iter()
            .filter(|d| !d.trim().is_empty()),
    );

    let config = IndexConfig {
        roots,
        include_hidden: input.include_hidden,
        follow_symlinks: input.follow_symlinks,
        ignore_dirs,
        only_extensions: input.extensions,
        ..IndexConfig::default()
    };

    let progress_cb: Option<ProgressCallback> = Some(Box::new(|p: IndexProgress| {
        tracing::debug!(
            files = p.files_upserted,
            root = %p.current_root.display(),
            "Indexing progress"
        );
    }));

    let report = Indexer::new(db, config).index(progress_cb)?;

    let display = |paths: &[PathBuf]| -> Vec<String> {
        paths.iter().map(|p| p.display().to_string()).collect()
    };

    Ok(IndexOutput {
        generation: report.generation.as_i64(),
        files_indexed: report.files_upserted,
        files_removed: report.files_swept,
        roots_scanned: display(&report.roots_scanned),
        roots_skipped: display(&report.roots_skipped),
        elapsed_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
    })
}
