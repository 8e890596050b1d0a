//! Item and cluster scores.
//!
//! item  = w_recency * exp(-hours / decay_hours)
//!       + w_source  * trust(source)
//!       + w_richness * (rich if description+content > rich_text_chars else sparse)
//!
//! group = max(item scores) + corroboration * ln(cluster_size + 1)

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::ingest::types::Item;
use crate::source_weights::SourceTrust;

/// Scoring knobs; the defaults are the tuned production values.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    pub w_recency: f64,
    pub w_source: f64,
    pub w_richness: f64,
    /// e-folding time of the recency decay (half-life ≈ 0.69 × this).
    pub decay_hours: f64,
    pub rich_text_chars: usize,
    pub rich: f64,
    pub sparse: f64,
    pub corroboration: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            w_recency: 0.45,
            w_source: 0.40,
            w_richness: 0.15,
            decay_hours: 18.0,
            rich_text_chars: 400,
            rich: 1.0,
            sparse: 0.6,
            corroboration: 0.1,
        }
    }
}

/// Hours since publication; future timestamps count as zero.
pub fn hours_since(item: &Item, now: DateTime<Utc>) -> f64 {
    let age = now.signed_duration_since(item.published_at);
    let hours = match age.num_microseconds() {
        Some(us) => us as f64 / 3_600_000_000.0,
        None => age.num_milliseconds() as f64 / 3_600_000.0,
    };
    hours.max(0.0)
}

pub fn recency(hours: f64, w: &ScoringWeights) -> f64 {
    (-hours / w.decay_hours.max(f64::EPSILON)).exp()
}

pub fn richness(item: &Item, w: &ScoringWeights) -> f64 {
    if item.text_len() > w.rich_text_chars {
        w.rich
    } else {
        w.sparse
    }
}

pub fn score_item(item: &Item, now: DateTime<Utc>, trust: &SourceTrust, w: &ScoringWeights) -> f64 {
    w.w_recency * recency(hours_since(item, now), w)
        + w.w_source * trust.weight_for(&item.source)
        + w.w_richness * richness(item, w)
}

/// Best single item plus a sub-linear corroboration bonus.
/// `None` for an empty slice.
pub fn group_score(item_scores: &[f64], w: &ScoringWeights) -> Option<f64> {
    let best = item_scores.iter().copied().reduce(f64::max)?;
    Some(best + w.corroboration * ((item_scores.len() + 1) as f64).ln())
}

/// Largest bonus a cluster of `max_size` items can earn.
pub fn max_corroboration_bonus(max_size: usize, w: &ScoringWeights) -> f64 {
    w.corroboration * ((max_size + 1) as f64).ln()
}
