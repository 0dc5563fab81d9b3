//! The query commands: `q`, `open` and `reveal` all rank the same way.

use crate::error::SearchError;
use crate::services::{QueryOptions, Ranker, SearchHit};
use crate::tools::window;
use serde::Serialize;
use std::collections::BTreeSet;

/// Input for a query.
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
    /// Raw query text
    pub query: String,
    /// Max results (0 = default)
    pub limit: usize,
    /// Relative window such as `7d`; `None` or empty means unbounded
    pub since: Option<String>,
    /// Extension allow-set (empty = any)
    pub extensions: BTreeSet<String>,
}

/// Output for a query.
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    /// Hits in final order (newest first, then score)
    pub results: Vec<SearchHit>,
    /// Absolute cutoff derived from `since`, in unix seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_cutoff: Option<i64>,
}

/// Executes a query as of the system clock.
///
/// # Errors
///
/// Returns `SearchError::EmptyQuery` for a blank query, a window error for
/// a malformed `since`, or a `DbError` if the catalog cannot be read.
pub fn execute_search(ranker: &Ranker, input: SearchInput) -> crate::error::Result<SearchOutput> {
    execute_search_at(ranker, input, crate::unix_now())
}

/// Executes a query as of `now` (unix seconds).
///
/// # Errors
///
/// Same as [`execute_search`].
pub fn execute_search_at(
    ranker: &Ranker,
    input: SearchInput,
    now: i64,
) -> crate::error::Result<SearchOutput> {
    if input.query.trim().is_empty() {
        return Err(SearchError::EmptyQuery.into());
    }
    let since_cutoff = match input.since.as_deref() {
        Some(w) => window::cutoff(w, now)?,
        None => None,
    };

    let opts = QueryOptions {
        limit: input.limit,
        extensions: input.extensions,
        ..QueryOptions::default()
    };
    let mut results = ranker.search_at(&input.query, &opts, now)?;

    if let Some(cutoff) = since_cutoff {
        window::retain_since(&mut results, cutoff);
    }

    Ok(SearchOutput {
        query: input.query,
        results,
        since_cutoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, ObservedFile};
    use crate::error::FindexError;
    use crate::services::normalize::{ext_lower, normalize};
    use std::sync::Arc;

    const NOW: i64 = 1_750_000_000;
    const DAY: i64 = 86_400;

    fn seeded(files: &[(&str, i64)]) -> Ranker {
        let db = Arc::new(Database::in_memory().unwrap());
        let writer = db.begin_pass().unwrap();
        let generation = writer.generation();
        for (name, mtime) in files {
            let file = ObservedFile {
                path: format!("/data/{name}"),
                filename: (*name).to_string(),
                filename_norm: normalize(name),
                ext: ext_lower(name),
                mtime: *mtime,
                size: 1,
                is_dir: false,
            };
            writer.upsert(&file, generation).unwrap();
        }
        writer.commit().unwrap();
        Ranker::new(db)
    }

    #[test]
    fn test_blank_query_is_rejected() {
        let ranker = seeded(&[]);
        let err = execute_search_at(
            &ranker,
            SearchInput {
                query: "   ".into(),
                ..SearchInput::default()
            },
            NOW,
        )
        .unwrap_err();
        assert!(matches!(err, FindexError::Search(SearchError::EmptyQuery)));
    }

    #[test]
    fn test_since_drops_old_hits() {
        let ranker = seeded(&[("notes-new.txt", NOW - DAY), ("notes-old.txt", NOW - 30 * DAY)]);
        let out = execute_search_at(
            &ranker,
            SearchInput {
                query: "notes".into(),
                since: Some("7d".into()),
                ..SearchInput::default()
            },
            NOW,
        )
        .unwrap();
        assert_eq!(out.since_cutoff, Some(NOW - 7 * DAY));
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].path, "/data/notes-new.txt");
    }

    #[test]
    fn test_bad_window_rejected_before_search() {
        let ranker = seeded(&[("notes.txt", NOW)]);
        let err = execute_search_at(
            &ranker,
            SearchInput {
                query: "notes".into(),
                since: Some("3y".into()),
                ..SearchInput::default()
            },
            NOW,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FindexError::Search(SearchError::InvalidWindowUnit('y'))
        ));
    }

    #[test]
    fn test_limit_applies() {
        let ranker = seeded(&[
            ("report-1.txt", NOW - 1),
            ("report-2.txt", NOW - 2),
            ("report-3.txt", NOW - 3),
        ]);
        let out = execute_search_at(
            &ranker,
            SearchInput {
                query: "report".into(),
                limit: 2,
                ..SearchInput::default()
            },
            NOW,
        )
        .unwrap();
        let paths: Vec<_> = out.results.iter().map(|h| h.path.as_str()).collect();
        assert_eq!(paths, vec!["/data/report-1.txt", "/data/report-2.txt"]);
    }
}
