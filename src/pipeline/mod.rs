// src/pipeline/mod.rs
//! Story selection: window → dedup → cluster → score → select.
//!
//! Everything here is synchronous and deterministic for a given input order
//! and `now`; the only fatal outcome is `PipelineError::EmptyInput`.

pub mod cluster;
pub mod dedup;
pub mod scoring;
pub mod select;
pub mod similarity;
pub mod window;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge};

use crate::error::{PipelineError, PipelineResult};
use crate::ingest::types::Item;
use crate::source_weights::SourceTrust;

pub use cluster::{cluster, Cluster, ClusterStrategy, DEFAULT_CLUSTER_THRESHOLD};
pub use dedup::{deduplicate, DEFAULT_DEDUP_THRESHOLD};
pub use scoring::{group_score, score_item, ScoringWeights};
pub use select::{score_clusters, select, ScoredCluster};
pub use similarity::title_similarity;
pub use window::within_window;

pub const DEFAULT_WINDOW_HOURS: u64 = 48;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub window: Duration,
    pub dedup_threshold: f64,
    pub cluster_threshold: f64,
    pub strategy: ClusterStrategy,
    pub scoring: ScoringWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: Duration::hours(DEFAULT_WINDOW_HOURS as i64),
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
            cluster_threshold: DEFAULT_CLUSTER_THRESHOLD,
            strategy: ClusterStrategy::default(),
            scoring: ScoringWeights::default(),
        }
    }
}

/// How many items each stage let through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StageCounts {
    pub input: usize,
    pub windowed: usize,
    pub deduplicated: usize,
    pub clusters: usize,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub winner: ScoredCluster,
    pub counts: StageCounts,
}

/// Run the selection stages over normalized items.
pub fn select_story(
    items: Vec<Item>,
    now: DateTime<Utc>,
    cfg: &PipelineConfig,
    trust: &SourceTrust,
) -> PipelineResult<Selection> {
    let mut counts = StageCounts {
        input: items.len(),
        ..Default::default()
    };

    let windowed = within_window(items, now, cfg.window);
    counts.windowed = windowed.len();
    counter!("pipeline_window_dropped_total").increment((counts.input - counts.windowed) as u64);

    let deduped = deduplicate(windowed, cfg.dedup_threshold);
    counts.deduplicated = deduped.len();
    counter!("pipeline_dedup_dropped_total")
        .increment((counts.windowed - counts.deduplicated) as u64);

    if deduped.is_empty() {
        tracing::warn!(target: "pipeline", ?counts, "nothing left to cluster");
        return Err(PipelineError::EmptyInput);
    }

    let clusters = cluster(deduped, cfg.cluster_threshold, cfg.strategy);
    counts.clusters = clusters.len();
    gauge!("pipeline_clusters").set(counts.clusters as f64);

    let scored = score_clusters(clusters, now, trust, &cfg.scoring);
    let winner = select(scored)?;

    tracing::info!(
        target: "pipeline",
        input = counts.input,
        windowed = counts.windowed,
        deduplicated = counts.deduplicated,
        clusters = counts.clusters,
        cluster_size = winner.cluster.len(),
        group_score = winner.group_score,
        representative = %winner.representative.title,
        "story selected"
    );

    Ok(Selection { winner, counts })
}
