//! Similarity ranking over stored entries

use crate::entry::Entry;
use crate::error::VectorResult;
use crate::vector::cosine_similarity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of results kept by [`rank`].
pub const TOP_K: usize = 10;

/// An entry scored against a query. Serializes as the entry's fields plus
/// `"similarity"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub entry: Entry,
    pub similarity: f64,
}

/// Ranks `entries` against `query` and keeps the best [`TOP_K`].
///
/// See [`rank_top_k`].
pub fn rank(query: &[f64], entries: &[Entry]) -> VectorResult<Vec<SearchResult>> {
    rank_top_k(query, entries, TOP_K)
}

/// Scores every entry by cosine similarity to `query` and returns the `top_k`
/// best, most similar first. Equal scores keep insertion order.
///
/// No entries (or `top_k == 0`) gives an empty result. Fails with
/// `DimensionMismatch` as soon as an entry's embedding length differs from the
/// query's.
///
/// # Examples
///
/// ```
/// use hashvdb::{embed, rank_top_k, Entry};
///
/// let entries: Vec<Entry> = ["apples and pears", "rust borrow checker", "pears"]
///     .iter()
///     .map(|text| Entry::from_text(text).unwrap())
///     .collect();
///
/// let results = rank_top_k(&embed("pears"), &entries, 2).unwrap();
/// assert_eq!(results.len(), 2);
/// assert_eq!(results[0].entry.text, "pears");
/// assert!(results[0].similarity >= results[1].similarity);
/// ```
pub fn rank_top_k(query: &[f64], entries: &[Entry], top_k: usize) -> VectorResult<Vec<SearchResult>> {
    if top_k == 0 || entries.is_empty() {
        return Ok(Vec::new());
    }

    // (index into entries, similarity), sorted by similarity descending
    let mut best: Vec<(usize, f64)> = Vec::with_capacity(top_k + 1);
    for (i, entry) in entries.iter().enumerate() {
        let sim = cosine_similarity(query, &entry.embedding)?;
        if best.len() == top_k && best[top_k - 1].1 >= sim {
            continue;
        }

        let insert_index = best.partition_point(|&(_, s)| s >= sim);
        best.insert(insert_index, (i, sim));
        best.truncate(top_k);
    }

    tracing::debug!(candidates = entries.len(), returned = best.len(), "ranked entries");

    let results = best.into_iter()
        .map(|(i, similarity)| SearchResult { entry: entries[i].clone(), similarity })
        .collect();

    Ok(results)
}

/// Percentage with one decimal, e.g. `0.8734` renders as `"87.3%"`.
pub fn format_similarity(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

/// Coarse bucket for displaying a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityTier {
    High,
    Medium,
    Low,
    Weak,
}

impl SimilarityTier {
    pub fn from_score(score: f64) -> SimilarityTier {
        if score >= 0.8 {
            SimilarityTier::High
        } else if score >= 0.6 {
            SimilarityTier::Medium
        } else if score >= 0.4 {
            SimilarityTier::Low
        } else {
            SimilarityTier::Weak
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SimilarityTier::High => "high",
            SimilarityTier::Medium => "medium",
            SimilarityTier::Low => "low",
            SimilarityTier::Weak => "weak",
        }
    }
}

impl fmt::Display for SimilarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
