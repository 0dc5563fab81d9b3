//! Human-friendly CLI output formatters.
//!
//! Each `fmt_*` function formats one command's output for terminal display.
//! When `color` is true, ANSI escape codes are emitted via `owo_colors`.

use crate::tools::{human_bytes, IndexOutput, SearchOutput, StatsOutput};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::time::Duration;

// ── search ──────────────────────────────────────────────────────────────────

/// Prints one `score  path` line per hit, in rank order.
pub fn fmt_search(w: &mut impl Write, out: &SearchOutput, color: bool) -> io::Result<()> {
    for hit in &out.results {
        if color {
            writeln!(w, "{}  {}", format_args!("{:.2}", hit.score).dimmed(), hit.path.bold())?;
        } else {
            writeln!(w, "{:.2}  {}", hit.score, hit.path)?;
        }
    }
    Ok(())
}

/// Message printed when a query command finds nothing.
pub fn fmt_no_matches(w: &mut impl Write, color: bool) -> io::Result<()> {
    if color {
        writeln!(w, "{}", "No matches.".dimmed())
    } else {
        writeln!(w, "No matches.")
    }
}

// ── index ───────────────────────────────────────────────────────────────────

/// Renders an elapsed time the way people read it: `340ms`, `2.512s`, `1m04s`.
#[must_use]
pub fn human_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.3}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

/// Prints the pass summary and any skipped roots.
pub fn fmt_index(w: &mut impl Write, out: &IndexOutput, color: bool) -> io::Result<()> {
    let elapsed = human_duration(Duration::from_millis(out.elapsed_ms));
    if color {
        write!(
            w,
            "Indexed {} files in {}",
            out.files_indexed.bold(),
            elapsed.green()
        )?;
    } else {
        write!(w, "Indexed {} files in {}", out.files_indexed, elapsed)?;
    }
    if out.files_removed > 0 {
        write!(w, " ({} removed)", out.files_removed)?;
    }
    writeln!(w)?;

    for root in &out.roots_skipped {
        if color {
            writeln!(w, "{} {}", "skipped:".yellow(), root)?;
        } else {
            writeln!(w, "skipped: {root}")?;
        }
    }
    Ok(())
}

// ── stats ───────────────────────────────────────────────────────────────────

/// Prints catalog location, size, file count and last generation.
pub fn fmt_stats(w: &mut impl Write, out: &StatsOutput, color: bool) -> io::Result<()> {
    let size = out
        .db_bytes
        .map_or_else(|| "-".to_string(), |b| format!("{} ({b})", human_bytes(b)));
    let generation = out
        .last_generation
        .map_or_else(|| "never indexed".to_string(), |g| g.to_string());

    let rows = [
        ("Database:", out.db_path.clone()),
        ("Size:", size),
        ("Files:", out.file_count.to_string()),
        ("Generation:", generation),
    ];
    for (label, value) in rows {
        if color {
            writeln!(w, "{:<16} {}", label.bold(), value)?;
        } else {
            writeln!(w, "{label:<16} {value}")?;
        }
    }
    Ok(())
}
