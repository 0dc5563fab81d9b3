//! findex: fast local filename search.
//!
//! Usage:
//!   findex index [--root <dir>]...   # Reconcile the catalog with disk
//!   findex q <query...>              # Ranked matches, newest first
//!   findex open <query...>           # Pick a match with fzf and open it
//!   findex reveal <query...>         # Pick a match and show it in the file manager
//!   findex stats                     # Catalog summary

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use findex::db::Database;
use findex::services::indexer::expand_root;
use findex::services::Ranker;
use findex::tools::{self, OpenAction};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "findex")]
#[command(about = "Fast local filename search")]
#[command(version)]
struct Cli {
    /// Catalog path (default: ~/.findex/index.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Extension shorthands shared by every command.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Only PDFs
    #[arg(long)]
    pdf: bool,

    /// Only images (png, jpg, jpeg, heic, webp, gif, tiff)
    #[arg(long)]
    img: bool,

    /// Only this extension (repeatable, leading dot optional)
    #[arg(long = "ext", value_name = "EXT")]
    ext: Vec<String>,
}

impl FilterArgs {
    fn extensions(&self) -> std::collections::BTreeSet<String> {
        tools::extension_filter(self.pdf, self.img, &self.ext)
    }
}

#[derive(Args, Debug)]
struct PickArgs {
    /// Maximum candidates offered to the picker
    #[arg(short, long, default_value = "80")]
    limit: usize,

    /// Only files modified within this window (e.g. 24h, 7d, 2w)
    #[arg(long, value_name = "WINDOW")]
    since: Option<String>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Search query
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan roots and reconcile the catalog
    Index {
        /// Directory to scan (repeatable, default: ~)
        #[arg(long = "root", value_name = "DIR")]
        roots: Vec<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Include hidden files and directories
        #[arg(long)]
        hidden: bool,

        /// Follow symbolic links
        #[arg(long)]
        follow: bool,

        /// Extra directory name to skip (repeatable)
        #[arg(long = "ignore-dir", value_name = "NAME")]
        ignore_dirs: Vec<String>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the catalog
    Q {
        /// Maximum results
        #[arg(short, long, default_value = "30")]
        limit: usize,

        /// Only files modified within this window (e.g. 24h, 7d, 2w)
        #[arg(long, value_name = "WINDOW")]
        since: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Emit JSON
        #[arg(long)]
        json: bool,

        /// Search query
        #[arg(trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// Pick a match and open it
    Open(PickArgs),

    /// Pick a match and reveal it in the file manager
    Reveal(PickArgs),

    /// Catalog statistics
    Stats {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "findex=debug"
    } else if cli.quiet {
        "findex=warn"
    } else {
        "findex=info"
    };
    // Logs go to stderr so stdout stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let color = !cli.no_color && std::io::stdout().is_terminal();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "findex", &mut std::io::stdout());
        return Ok(());
    }

    let db_path = match cli.db {
        Some(p) => expand_root(&p),
        None => findex::default_db_path()?,
    };
    let database = Arc::new(open_database(&db_path)?);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Index {
            roots,
            filters,
            hidden,
            follow,
            ignore_dirs,
            json,
        } => {
            let input = tools::IndexInput {
                roots,
                include_hidden: hidden,
                follow_symlinks: follow,
                extensions: filters.extensions(),
                extra_ignore_dirs: ignore_dirs,
            };
            let result = tools::execute_index(Arc::clone(&database), input)?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            } else {
                findex::fmt::fmt_index(&mut out, &result, color)?;
            }
        }

        Commands::Q {
            limit,
            since,
            filters,
            json,
            query,
        } => {
            let input = tools::SearchInput {
                query: query.join(" "),
                limit,
                since,
                extensions: filters.extensions(),
            };
            let result = tools::execute_search(&Ranker::new(database), input)?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            } else if result.results.is_empty() {
                findex::fmt::fmt_no_matches(&mut out, color)?;
            } else {
                findex::fmt::fmt_search(&mut out, &result, color)?;
            }
        }

        Commands::Open(args) => pick_and_open(&database, args, OpenAction::Open, &mut out, color)?,
        Commands::Reveal(args) => {
            pick_and_open(&database, args, OpenAction::Reveal, &mut out, color)?;
        }

        Commands::Stats { json } => {
            let result = tools::execute_stats(&database, &db_path)?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            } else {
                findex::fmt::fmt_stats(&mut out, &result, color)?;
            }
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn open_database(path: &Path) -> anyhow::Result<Database> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Database::open(path).with_context(|| format!("opening catalog {}", path.display()))
}

fn pick_and_open(
    database: &Arc<Database>,
    args: PickArgs,
    action: OpenAction,
    out: &mut impl Write,
    color: bool,
) -> anyhow::Result<()> {
    let input = tools::SearchInput {
        query: args.query.join(" "),
        limit: args.limit,
        since: args.since,
        extensions: args.filters.extensions(),
    };
    let result = tools::execute_search(&Ranker::new(Arc::clone(database)), input)?;
    if result.results.is_empty() {
        findex::fmt::fmt_no_matches(out, color)?;
        return Ok(());
    }

    let paths: Vec<String> = result.results.into_iter().map(|h| h.path).collect();
    match tools::pick(&paths)? {
        Some(choice) => tools::open_path(action, Path::new(&choice)),
        None => tracing::debug!("Picker dismissed"),
    }
    Ok(())
}
