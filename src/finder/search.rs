//! Plain-text search primitive
//!
//! Stateless occurrence lookup over a rendered-text index. Every call scans
//! from the offsets it is given; all cursor and resume state belongs to the
//! finder. Break characters sit in the haystack, so a query can never match
//! across a line or paragraph boundary.

use crate::dom::{TextIndex, TreeStrategy};

/// Flags for a single search invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Report the last occurrence in the window instead of the first
    pub backwards: bool,
    /// Case-sensitive comparison
    pub match_case: bool,
    /// Only accept occurrences starting at a word boundary
    pub word_start: bool,
    /// Treat an uppercase letter inside camelCase as a word start
    pub medial_capital_as_word_start: bool,
}

/// Locate an occurrence of `query` whose start lies in `[from, to)`
///
/// Returns global `[start, end)` offsets of the occurrence, or `None`.
pub fn find_plain_text<S: TreeStrategy>(
    index: &TextIndex<S>,
    query: &str,
    from: usize,
    to: usize,
    options: SearchOptions,
) -> Option<(usize, usize)> {
    let needle: Vec<char> = if options.match_case {
        query.chars().collect()
    } else {
        query.chars().map(fold_case).collect()
    };
    if needle.is_empty() {
        return None;
    }
    let haystack = index.chars();
    let to = to.min(haystack.len());
    if from >= to {
        return None;
    }
    // last offset where the whole needle still fits, clamped into the window
    let last = haystack.len().checked_sub(needle.len())?.min(to - 1);
    if options.backwards {
        (from..=last)
            .rev()
            .find(|&o| matches_at(haystack, &needle, o, options))
            .map(|o| (o, o + needle.len()))
    } else {
        (from..=last)
            .find(|&o| matches_at(haystack, &needle, o, options))
            .map(|o| (o, o + needle.len()))
    }
}

fn matches_at(haystack: &[char], needle: &[char], offset: usize, options: SearchOptions) -> bool {
    let candidate = &haystack[offset..offset + needle.len()];
    let equal = if options.match_case {
        candidate == needle
    } else {
        candidate
            .iter()
            .zip(needle)
            .all(|(&c, &n)| fold_case(c) == n)
    };
    if !equal {
        return false;
    }
    if options.word_start && !is_word_start(haystack, offset, options) {
        return false;
    }
    true
}

fn is_word_start(haystack: &[char], offset: usize, options: SearchOptions) -> bool {
    if offset == 0 {
        return true;
    }
    let prev = haystack[offset - 1];
    if !prev.is_alphanumeric() {
        return true;
    }
    options.medial_capital_as_word_start
        && haystack[offset].is_uppercase()
        && prev.is_lowercase()
}

/// Single-character case fold; multi-character expansions keep the original
/// so offsets stay aligned with the rendered text
fn fold_case(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}
