//! Relative time windows such as `24h`, `7d` or `2w`.
//!
//! A window becomes an absolute cutoff and is applied after ranking: hits
//! older than the cutoff are dropped, the order of the rest is untouched.

use crate::error::{SearchError, SearchResult};
use crate::services::SearchHit;

const HOUR: u64 = 3_600;

/// Parses a window into seconds. Empty input means "no window".
///
/// # Errors
///
/// Returns `SearchError::InvalidWindow` if the amount is not a
/// non-negative integer (or overflows).
/// Returns `SearchError::InvalidWindowUnit` if the unit is not `h`, `d`
/// or `w`.
pub fn parse_window(s: &str) -> SearchResult<Option<u64>> {
    let s = s.trim();
    let Some(unit) = s.chars().last() else {
        return Ok(None);
    };
    let amount = &s[..s.len() - unit.len_utf8()];
    let value: u64 = amount
        .parse()
        .map_err(|_| SearchError::InvalidWindow(s.to_string()))?;

    let unit_secs = match unit {
        'h' => HOUR,
        'd' => 24 * HOUR,
        'w' => 7 * 24 * HOUR,
        other => return Err(SearchError::InvalidWindowUnit(other)),
    };

    value
        .checked_mul(unit_secs)
        .map(Some)
        .ok_or_else(|| SearchError::InvalidWindow(s.to_string()))
}

/// Resolves a window to an absolute unix-seconds cutoff relative to `now`.
///
/// # Errors
///
/// Same as [`parse_window`].
pub fn cutoff(window: &str, now: i64) -> SearchResult<Option<i64>> {
    Ok(parse_window(window)?
        .map(|secs| now.saturating_sub(i64::try_from(secs).unwrap_or(i64::MAX))))
}

/// Keeps hits modified at or after `cutoff`, preserving order.
pub fn retain_since(hits: &mut Vec<SearchHit>, cutoff: i64) {
    hits.retain(|h| h.mtime >= cutoff);
}
