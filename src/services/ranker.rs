//! Shortlist-and-rank search over the catalog.
//!
//! A query is normalized and tokenized, a bounded candidate set is pulled
//! with a cheap substring pre-filter (newest first), and every candidate is
//! scored with a weighted sum of substring, token, prefix, trigram, recency
//! and length signals.
//!
//! Final order is **mtime first, score second**: a weak match modified
//! yesterday outranks a perfect match from last year. Score only decides
//! between files with identical mtimes.

use crate::db::{Database, FileRecord};
use crate::error::DbResult;
use crate::services::normalize::{jaccard, normalize, tokenize, trigrams};
use crate::types::Score;
use ahash::AHashSet;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Default maximum results returned.
pub const DEFAULT_LIMIT: usize = 30;

/// Default maximum candidates pulled before scoring.
pub const DEFAULT_SHORTLIST: usize = 800;

const SUBSTRING_WEIGHT: f64 = 6.0;
const TOKEN_WEIGHT: f64 = 2.2;
const PREFIX_WEIGHT: f64 = 2.5;
const TRIGRAM_WEIGHT: f64 = 4.0;
const RECENCY_WEIGHT: f64 = 1.5;
const LENGTH_WEIGHT: f64 = 0.15;
/// Filename length (chars) at which the length bonus is halved.
const LENGTH_HALF_POINT: f64 = 40.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Options for one query.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Max results returned; 0 means the default
    pub limit: usize,
    /// Max candidates pulled from the catalog; 0 means the default
    pub shortlist: usize,
    /// Extension allow-set (empty = any)
    pub extensions: BTreeSet<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            shortlist: DEFAULT_SHORTLIST,
            extensions: BTreeSet::new(),
        }
    }
}

impl QueryOptions {
    /// Returns the options with non-positive bounds replaced by defaults.
    #[must_use]
    pub fn effective(&self) -> (usize, usize) {
        let limit = if self.limit > 0 { self.limit } else { DEFAULT_LIMIT };
        let shortlist = if self.shortlist > 0 {
            self.shortlist
        } else {
            DEFAULT_SHORTLIST
        };
        (limit, shortlist)
    }
}

/// A ranked file.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub filename: String,
    pub ext: String,
    pub mtime: i64,
    pub size: i64,
    pub score: Score,
}

/// Normalized query plus the derived sets every candidate is scored against.
#[derive(Debug)]
pub struct PreparedQuery {
    normalized: String,
    tokens: Vec<String>,
    trigrams: AHashSet<String>,
}

impl PreparedQuery {
    /// Prepares a raw query. Returns `None` if it normalizes to nothing.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return None;
        }
        let tokens = tokenize(&normalized)
            .into_iter()
            .map(str::to_string)
            .collect();
        let trigrams = trigrams(&normalized);
        Some(Self {
            normalized,
            tokens,
            trigrams,
        })
    }

    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Substrings for the shortlist predicate: the whole query, then each token.
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        std::iter::once(self.normalized.as_str())
            .chain(self.tokens.iter().map(String::as_str))
            .collect()
    }

    /// Scores a normalized filename modified at `mtime`, as of `now`.
    #[must_use]
    pub fn score(&self, filename_norm: &str, mtime: i64, now: i64) -> Score {
        let mut score = Score::ZERO;

        if filename_norm.contains(self.normalized.as_str()) {
            score = score.plus(SUBSTRING_WEIGHT, 1.0);
        }

        let overlap = token_overlap(&self.tokens, &tokenize(filename_norm));
        score = score.plus(TOKEN_WEIGHT, overlap as f64);

        if filename_norm.starts_with(self.normalized.as_str()) {
            score = score.plus(PREFIX_WEIGHT, 1.0);
        }

        let similarity = jaccard(&self.trigrams, &trigrams(filename_norm));
        score = score.plus(TRIGRAM_WEIGHT, similarity);

        score = score.plus(RECENCY_WEIGHT, recency(mtime, now));

        let len = filename_norm.chars().count() as f64;
        score.plus(LENGTH_WEIGHT, 1.0 / (1.0 + len / LENGTH_HALF_POINT))
    }
}

/// Counts query tokens present among the filename's tokens.
fn token_overlap(query: &[String], filename: &[&str]) -> usize {
    if query.is_empty() || filename.is_empty() {
        return 0;
    }
    let set: AHashSet<&str> = filename.iter().copied().collect();
    query.iter().filter(|t| set.contains(t.as_str())).count()
}

/// Logarithmic recency decay: 1.0 for brand new, toward 0 for very old.
///
/// Future mtimes count as age zero.
#[must_use]
pub fn recency(mtime: i64, now: i64) -> f64 {
    let age_days = now.saturating_sub(mtime).max(0) as f64 / SECONDS_PER_DAY;
    1.0 / (1.0 + age_days.ln_1p())
}

/// Orders hits newest first, then by score; stable for full ties.
pub fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.mtime
            .cmp(&a.mtime)
            .then_with(|| b.score.total_cmp(&a.score))
    });
}

/// Ranking service over a shared catalog.
///
/// Read-only and stateless between queries, so one instance can serve
/// concurrent searches.
pub struct Ranker {
    db: Arc<Database>,
}

impl Ranker {
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Ranks the catalog against `query` as of the system clock.
    ///
    /// A blank query yields no results.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the shortlist query fails.
    pub fn search(&self, query: &str, opts: &QueryOptions) -> DbResult<Vec<SearchHit>> {
        self.search_at(query, opts, crate::unix_now())
    }

    /// Ranks the catalog against `query` as of `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the shortlist query fails.
    pub fn search_at(&self, query: &str, opts: &QueryOptions, now: i64) -> DbResult<Vec<SearchHit>> {
        let Some(prepared) = PreparedQuery::new(query) else {
            return Ok(Vec::new());
        };
        let (limit, shortlist) = opts.effective();

        let candidates =
            self.db
                .shortlist_by_substring(&prepared.patterns(), &opts.extensions, shortlist)?;

        tracing::debug!(
            query = prepared.normalized(),
            tokens = prepared.tokens().len(),
            candidates = candidates.len(),
            "Shortlist fetched"
        );

        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .map(|record| rank_record(&prepared, record, now))
            .collect();

        sort_hits(&mut hits);
        hits.truncate(limit);
        Ok(hits)
    }
}

fn rank_record(prepared: &PreparedQuery, record: FileRecord, now: i64) -> SearchHit {
    let score = prepared.score(&record.filename_norm, record.mtime, now);
    SearchHit {
        path: record.path,
        filename: record.filename,
        ext: record.ext,
        mtime: record.mtime,
        size: record.size,
        score,
    }
}
