//! Relevance scoring for search hits.
//!
//! The default strategy is plain string-length arithmetic: a field scores the
//! number of characters that disappear when every occurrence of the query is
//! cut out of it. That is `occurrences x query length` for non-overlapping
//! matches, so longer queries and repeated hits both rank higher, and an
//! absent or empty query scores 0.
//!
//! Case folding is ASCII-only to agree with SQLite's `LIKE`, which decides
//! which rows reach the scorer in the first place.

use std::cmp::Ordering;

use crate::models::{FieldScores, SearchResult};

// ============================================================================
// Scorer Interface
// ============================================================================

/// A ranking strategy. Implementations must be pure: the same query and field
/// always give the same score.
pub trait Scorer: Send + Sync {
    /// Score one field value against the query.
    fn field_score(&self, query: &str, field: &str) -> i64;

    /// Score the three searchable fields of a hit.
    fn score(&self, query: &str, hit: &SearchResult) -> FieldScores {
        FieldScores {
            name: self.field_score(query, &hit.name),
            artists: self.field_score(query, &hit.artists_joined()),
            album: self.field_score(query, &hit.album),
        }
    }
}

/// Occurrence-times-length scoring, see the module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringScorer;

impl Scorer for SubstringScorer {
    fn field_score(&self, query: &str, field: &str) -> i64 {
        removal_score(field, query)
    }
}

/// `len(field) - len(field with every case-insensitive occurrence of query removed)`,
/// counted in characters.
pub fn removal_score(field: &str, query: &str) -> i64 {
    if query.is_empty() {
        return 0;
    }
    let haystack = field.to_ascii_lowercase();
    let needle = query.to_ascii_lowercase();
    let remaining = haystack.replace(&needle, "");
    (haystack.chars().count() - remaining.chars().count()) as i64
}

// ============================================================================
// Ordering
// ============================================================================

/// Name score desc, then artists desc, then album desc. Hits tied on all
/// three fall back to `Id` ascending so repeated queries return one order.
pub fn rank_order(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.scores
        .name
        .cmp(&a.scores.name)
        .then_with(|| b.scores.artists.cmp(&a.scores.artists))
        .then_with(|| b.scores.album.cmp(&a.scores.album))
        .then_with(|| a.id.cmp(&b.id))
}
