//! Greedy near-duplicate title collapse.
//!
//! Items are walked most recent first; a candidate is dropped when any
//! already-kept title scores at or above the threshold, so the latest
//! phrasing of a repeated headline survives.

use std::cmp::Reverse;

use super::similarity::title_similarity;
use crate::ingest::types::Item;

pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.85;

pub fn deduplicate(mut items: Vec<Item>, threshold: f64) -> Vec<Item> {
    // Stable: equal timestamps keep the caller's order.
    items.sort_by_key(|it| Reverse(it.published_at));

    let mut kept: Vec<Item> = Vec::with_capacity(items.len());
    for candidate in items {
        let near_duplicate = kept
            .iter()
            .any(|k| title_similarity(&k.title, &candidate.title) >= threshold);
        if near_duplicate {
            tracing::debug!(target: "pipeline", title = %candidate.title, "near-duplicate dropped");
            continue;
        }
        kept.push(candidate);
    }
    kept
}
