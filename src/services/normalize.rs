//! Filename normalization, tokenization and trigram similarity.
//!
//! Everything the ranker compares goes through [`normalize`] first, so
//! "Final_Report-v2.PDF" and "final report v2 pdf" look identical to it.
//! Trigrams tolerate small typos: "reprot" still shares most of its
//! 3-character windows with "report".

use ahash::AHashSet;
use regex::Regex;
use std::sync::LazyLock;

/// Runs of whitespace, underscores, hyphens and periods.
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_\-.]+").expect("separator pattern is a valid regex"));

/// Tokens carrying no signal in a filename query.
const STOP_WORDS: [&str; 7] = ["the", "a", "an", "and", "or", "of", "to"];

/// Set of (up to) 3-character windows of a string.
pub type TrigramSet = AHashSet<String>;

/// Normalizes a filename or query for matching.
///
/// Lowercases, turns every separator run into one space, trims, then
/// collapses any remaining Unicode whitespace run to a single space.
#[must_use]
pub fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let spaced = SEPARATORS.replace_all(&lowered, " ");
    let trimmed = spaced.trim();

    let mut out = String::with_capacity(trimmed.len());
    let mut last_space = false;
    for c in trimmed.chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
            continue;
        }
        last_space = false;
        out.push(c);
    }
    out
}

/// Splits a normalized string into tokens, dropping stop words.
#[must_use]
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized
        .split(' ')
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .collect()
}

/// Extracts the trigram set of `s`, ignoring spaces.
///
/// Strings shorter than three characters yield a single degenerate
/// "trigram" holding the whole (possibly empty) string.
#[must_use]
pub fn trigrams(s: &str) -> TrigramSet {
    let chars: Vec<char> = s.chars().filter(|&c| c != ' ').collect();
    if chars.len() < 3 {
        let mut set = TrigramSet::with_capacity(1);
        set.insert(chars.into_iter().collect());
        return set;
    }
    chars.windows(3).map(|w| w.iter().collect()).collect()
}

/// Jaccard similarity of two sets, in `[0, 1]`.
///
/// Two empty sets are identical (1.0); one empty set shares nothing (0.0).
#[must_use]
pub fn jaccard(a: &TrigramSet, b: &TrigramSet) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let inter = small.iter().filter(|t| large.contains(*t)).count();
    let union = a.len() + b.len() - inter;
    inter as f64 / union as f64
}

/// Lowercase text after the last dot of a file name, empty if there is none.
///
/// A dotfile's whole name is its extension: `.bashrc` yields `bashrc`.
#[must_use]
pub fn ext_lower(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> TrigramSet {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize("Final_Report-v2.PDF"), "final report v2 pdf");
        assert_eq!(normalize("my-resume_2024.pdf"), "my resume 2024 pdf");
    }

    #[test]
    fn test_normalize_collapses_and_trims() {
        assert_eq!(normalize("  My   Résumé__2024..PDF  "), "my résumé 2024 pdf");
        assert_eq!(normalize("a\u{00a0}\u{2003}b"), "a b");
        assert_eq!(normalize("___"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for s in ["Tax Return 2023.PDF", "x--y__z", "ÀBC def"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_tokenize_drops_stop_words() {
        assert_eq!(tokenize("the budget report"), vec!["budget", "report"]);
        assert_eq!(tokenize("a tale of two cities"), vec!["tale", "two", "cities"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("the and of").is_empty());
    }

    #[test]
    fn test_trigrams_windows() {
        assert_eq!(trigrams("report"), set(&["rep", "epo", "por", "ort"]));
        // Spaces are stripped before windowing.
        assert_eq!(trigrams("ab cd"), set(&["abc", "bcd"]));
        // Duplicates collapse.
        assert_eq!(trigrams("aaaa"), set(&["aaa"]));
    }

    #[test]
    fn test_trigrams_short_strings() {
        assert_eq!(trigrams("ab"), set(&["ab"]));
        assert_eq!(trigrams(" "), set(&[""]));
        assert_eq!(trigrams(""), set(&[""]));
    }

    #[test]
    fn test_trigrams_are_character_based() {
        assert_eq!(trigrams("résumé"), set(&["rés", "ésu", "sum", "umé"]));
    }

    #[test]
    fn test_jaccard_boundaries() {
        assert_eq!(jaccard(&set(&[]), &set(&[])), 1.0);
        assert_eq!(jaccard(&set(&["abc"]), &set(&[])), 0.0);
        assert_eq!(jaccard(&set(&[]), &set(&["abc"])), 0.0);
    }

    #[test]
    fn test_jaccard_overlap() {
        let a = set(&["abc", "bcd"]);
        let b = set(&["bcd", "cde", "def"]);
        assert!((jaccard(&a, &b) - 0.25).abs() < 1e-12);
        assert_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn test_ext_lower() {
        assert_eq!(ext_lower("Report.PDF"), "pdf");
        assert_eq!(ext_lower("archive.tar.GZ"), "gz");
        assert_eq!(ext_lower("Makefile"), "");
        assert_eq!(ext_lower(".bashrc"), "bashrc");
        assert_eq!(ext_lower("trailing."), "");
    }
}
