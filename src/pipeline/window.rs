//! Recency window.

use chrono::{DateTime, Duration, Utc};

use crate::ingest::types::Item;

/// Keep items with `now - published_at <= window`. The boundary is inclusive.
///
/// Timestamps are already validated when raw records become `Item`s, so
/// anything unparseable never reaches this point.
pub fn within_window(items: Vec<Item>, now: DateTime<Utc>, window: Duration) -> Vec<Item> {
    items
        .into_iter()
        .filter(|it| now.signed_duration_since(it.published_at) <= window)
        .collect()
}
