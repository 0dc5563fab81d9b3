//! Type-safe newtypes for findex.
//!
//! These newtypes provide compile-time safety and semantic clarity
//! for core domain concepts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version stamp of one reconciliation pass.
///
/// Every row written during a pass carries the pass's generation in
/// `seen_gen`; rows still carrying an older one after the pass are swept.
/// The newtype prevents mixing generations with mtimes or sizes, which are
/// also stored as SQLite integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(pub i64);

impl Generation {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Picks the id for the next pass: the wall clock, unless that would not
    /// move strictly past `last`.
    #[must_use]
    pub fn next_after(last: Option<Self>, now_unix: i64) -> Self {
        match last {
            Some(prev) if prev.0 >= now_unix => Self(prev.0 + 1),
            _ => Self(now_unix),
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.0;
        write!(f, "gen:{id}")
    }
}

impl From<i64> for Generation {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<Generation> for i64 {
    fn from(generation: Generation) -> Self {
        generation.0
    }
}

/// Composite relevance score of a ranked file.
///
/// Unbounded above: the weighted signals sum to roughly 16.4 at most.
/// Ordering uses `f64::total_cmp` so sorting never panics on NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    /// Zero relevance score.
    pub const ZERO: Self = Self(0.0);

    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_f64(self) -> f64 {
        self.0
    }

    /// Adds a weighted signal to this score.
    #[must_use]
    pub fn plus(self, weight: f64, signal: f64) -> Self {
        Self(self.0 + weight * signal)
    }

    /// NaN-safe total order over scores.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<Generation>();
    assert_send_sync::<Score>();
};
