//! Generation-swept filename indexer.
//!
//! Each pass walks the configured roots, upserts every eligible file
//! stamped with a fresh generation, then deletes all rows that still carry
//! an older one. Deletions, renames and moved roots fall out of the sweep;
//! there is no separate diff against the previous listing. The whole pass
//! is one transaction, so readers see either the old or the new snapshot.

use crate::db::{Database, ObservedFile};
use crate::error::{FindexError, IndexError};
use crate::services::normalize::{ext_lower, normalize};
use crate::types::Generation;
use ahash::AHashSet;
use ignore::{DirEntry, WalkBuilder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Directory names pruned by default.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "Library",
    "Caches",
    ".Trash",
    ".Trash-1000",
    ".DS_Store",
];

/// Default number of upserts between progress callbacks.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Progress callback type.
pub type ProgressCallback = Box<dyn Fn(IndexProgress) + Send + Sync>;

/// Indexing progress information.
#[derive(Debug, Clone)]
pub struct IndexProgress {
    pub files_upserted: usize,
    pub current_root: PathBuf,
}

/// Configuration for indexing.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Roots to walk, before `~`/`$VAR` expansion
    pub roots: Vec<PathBuf>,
    /// Include dot-files and dot-directories
    pub include_hidden: bool,
    /// Index symlinked files and descend into symlinked directories
    pub follow_symlinks: bool,
    /// Directory basenames whose subtrees are skipped entirely
    pub ignore_dirs: AHashSet<String>,
    /// Only index these extensions (empty = all files)
    pub only_extensions: BTreeSet<String>,
    /// Upserts between progress callbacks
    pub batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            include_hidden: false,
            follow_symlinks: false,
            ignore_dirs: default_ignore_dirs(),
            only_extensions: BTreeSet::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// The default ignore set as an owned set.
#[must_use]
pub fn default_ignore_dirs() -> AHashSet<String> {
    DEFAULT_IGNORE_DIRS.iter().map(|d| (*d).to_string()).collect()
}

/// Outcome of one committed pass.
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub generation: Generation,
    /// Files upserted (observed) in this pass
    pub files_upserted: usize,
    /// Rows deleted by the sweep
    pub files_swept: usize,
    /// Roots that were walked, after expansion
    pub roots_scanned: Vec<PathBuf>,
    /// Roots that did not exist or could not be read
    pub roots_skipped: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Entry filter shared with the walker threads.
#[derive(Clone)]
struct TraversalPolicy {
    include_hidden: bool,
    ignore_dirs: Arc<AHashSet<String>>,
}

impl TraversalPolicy {
    /// Returns false to skip an entry (and prune it, for directories).
    fn admits(&self, entry: &DirEntry) -> bool {
        // The traversal root is never filtered.
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        if is_dir && self.ignore_dirs.contains(&*name) {
            return false;
        }
        self.include_hidden || !name.starts_with('.')
    }
}

/// Filename indexer over a set of roots.
pub struct Indexer {
    db: Arc<Database>,
    config: IndexConfig,
}

impl Indexer {
    /// Creates an indexer.
    ///
    /// A zero batch size or an empty ignore set falls back to the defaults.
    pub fn new(db: Arc<Database>, mut config: IndexConfig) -> Self {
        if config.batch_size == 0 {
            config.batch_size = DEFAULT_BATCH_SIZE;
        }
        if config.ignore_dirs.is_empty() {
            config.ignore_dirs = default_ignore_dirs();
        }
        Self { db, config }
    }

    /// The effective configuration.
    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Runs one reconciliation pass.
    ///
    /// Unreadable entries are skipped silently; missing or unlistable roots
    /// are logged and reported in [`IndexReport::roots_skipped`].
    ///
    /// # Errors
    ///
    /// Returns `IndexError::NoRoots` if no roots are configured.
    /// Returns `IndexError::NoUsableRoots` if every root was skipped; the
    /// pass is rolled back.
    /// Returns `FindexError::Database` if the store fails (including
    /// `DbError::Locked` when another pass is running); the pass is rolled
    /// back and the previous snapshot stays intact.
    pub fn index(&self, progress: Option<ProgressCallback>) -> Result<IndexReport, FindexError> {
        if self.config.roots.is_empty() {
            return Err(IndexError::NoRoots.into());
        }

        let start = Instant::now();
        let writer = self.db.begin_pass()?;
        let generation = writer.generation();

        let policy = TraversalPolicy {
            include_hidden: self.config.include_hidden,
            ignore_dirs: Arc::new(self.config.ignore_dirs.clone()),
        };

        let mut files_upserted = 0usize;
        let mut roots_scanned = Vec::new();
        let mut roots_skipped = Vec::new();

        for raw in &self.config.roots {
            let root = expand_root(raw);

            if let Err(e) = probe_root(&root) {
                tracing::warn!("Skipping root {}: {e}", root.display());
                roots_skipped.push(root);
                continue;
            }

            let policy = policy.clone();
            let walker = WalkBuilder::new(&root)
                .standard_filters(false)
                .follow_links(self.config.follow_symlinks)
                .filter_entry(move |entry| policy.admits(entry))
                .build();

            for result in walker {
                let entry = match result {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::debug!("Skipping unreadable entry: {err}");
                        continue;
                    }
                };

                let Some(file) = self.observe(&entry) else {
                    continue;
                };

                writer.upsert(&file, generation)?;
                files_upserted += 1;

                if files_upserted % self.config.batch_size == 0 {
                    if let Some(ref cb) = progress {
                        cb(IndexProgress {
                            files_upserted,
                            current_root: root.clone(),
                        });
                    }
                }
            }

            roots_scanned.push(root);
        }

        if roots_scanned.is_empty() {
            writer.rollback()?;
            return Err(IndexError::NoUsableRoots {
                skipped: roots_skipped,
            }
            .into());
        }

        let files_swept = writer.sweep_older_than(generation)?;
        writer.commit()?;

        let report = IndexReport {
            generation,
            files_upserted,
            files_swept,
            roots_scanned,
            roots_skipped,
            elapsed: start.elapsed(),
        };

        tracing::info!(
            %generation,
            upserted = report.files_upserted,
            swept = report.files_swept,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Index pass committed"
        );

        Ok(report)
    }

    /// Turns a walker entry into a row, or `None` if policy skips it.
    ///
    /// Directories are traversal nodes only and never become rows.
    fn observe(&self, entry: &DirEntry) -> Option<ObservedFile> {
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            return None;
        }

        let filename = entry.file_name().to_string_lossy().into_owned();
        let ext = ext_lower(&filename);
        if !self.config.only_extensions.is_empty() && !self.config.only_extensions.contains(&ext) {
            return None;
        }

        if entry.path_is_symlink() && !self.config.follow_symlinks {
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(err) => {
                tracing::debug!("Skipping {}: {err}", entry.path().display());
                return None;
            }
        };
        let modified = match metadata.modified() {
            Ok(t) => t,
            Err(err) => {
                tracing::debug!("Skipping {}: {err}", entry.path().display());
                return None;
            }
        };

        Some(ObservedFile {
            path: entry.path().to_string_lossy().into_owned(),
            filename_norm: normalize(&filename),
            filename,
            ext,
            mtime: unix_seconds(modified),
            size: i64::try_from(metadata.len()).unwrap_or(i64::MAX),
            is_dir: false,
        })
    }
}

/// Checks that a root exists and, if it is a directory, can be listed.
fn probe_root(root: &Path) -> std::io::Result<()> {
    if std::fs::metadata(root)?.is_dir() {
        std::fs::read_dir(root)?;
    }
    Ok(())
}

/// Seconds since the epoch, negative for times before it.
fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

/// Expands `$VAR`, `${VAR}` and a leading `~`, then makes the path absolute
/// and lexically clean.
#[must_use]
pub fn expand_root(raw: &Path) -> PathBuf {
    let expanded = expand_env(&raw.to_string_lossy());
    let expanded = expand_home(&expanded);
    let absolute = std::path::absolute(&expanded).unwrap_or(expanded);
    clean_path(&absolute)
}

fn expand_home(p: &str) -> PathBuf {
    if p == "~" || p.starts_with("~/") || p.starts_with("~\\") {
        if let Some(home) = dirs::home_dir() {
            return if p.len() == 1 { home } else { home.join(&p[2..]) };
        }
    }
    PathBuf::from(p)
}

/// Replaces `$NAME` and `${NAME}` with environment values (unset = empty).
fn expand_env(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let mut name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            let mut closed = false;
            for n in chars.by_ref() {
                if n == '}' {
                    closed = true;
                    break;
                }
                name.push(n);
            }
            if !closed {
                out.push_str("${");
                out.push_str(&name);
                continue;
            }
        } else {
            while let Some(&n) = chars.peek() {
                if n.is_ascii_alphanumeric() || n == '_' {
                    name.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                out.push('$');
                continue;
            }
        }

        out.push_str(&std::env::var(&name).unwrap_or_default());
    }

    out
}

/// Removes `.` components and folds `..` without touching the filesystem.
fn clean_path(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in p.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                );
                if at_root {
                    if out.as_os_str().is_empty() {
                        out.push("..");
                    }
                } else if out.components().next_back() == Some(Component::ParentDir) {
                    out.push("..");
                } else {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    dunce::simplified(&out).to_path_buf()
}
