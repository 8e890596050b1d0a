//! Picking the winning cluster and its representative.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cluster::Cluster;
use super::scoring::{group_score, score_item, ScoringWeights};
use crate::error::{PipelineError, PipelineResult};
use crate::ingest::types::Item;
use crate::source_weights::SourceTrust;

/// A cluster with its per-item scores, aggregate score and representative.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCluster {
    pub cluster: Cluster,
    /// Parallel to `cluster.items()`.
    pub item_scores: Vec<f64>,
    pub group_score: f64,
    pub representative: Item,
    /// Position of `representative` inside the cluster.
    pub representative_index: usize,
}

impl ScoredCluster {
    pub fn representative_score(&self) -> f64 {
        self.item_scores[self.representative_index]
    }
}

/// Highest item score wins; ties go to the more recent item, then to the
/// earlier cluster position.
fn pick_representative(items: &[Item], scores: &[f64]) -> usize {
    let mut best = 0;
    for i in 1..items.len() {
        let better = scores[i] > scores[best]
            || (scores[i] == scores[best] && items[i].published_at > items[best].published_at);
        if better {
            best = i;
        }
    }
    best
}

pub fn score_cluster(
    cluster: Cluster,
    now: DateTime<Utc>,
    trust: &SourceTrust,
    w: &ScoringWeights,
) -> ScoredCluster {
    let item_scores: Vec<f64> = cluster
        .items()
        .iter()
        .map(|it| score_item(it, now, trust, w))
        .collect();
    // Clusters are never empty, so there is always a best score.
    let group = group_score(&item_scores, w).unwrap_or(f64::NEG_INFINITY);
    let rep = pick_representative(cluster.items(), &item_scores);
    let representative = cluster.items()[rep].clone();
    ScoredCluster {
        cluster,
        item_scores,
        group_score: group,
        representative,
        representative_index: rep,
    }
}

pub fn score_clusters(
    clusters: Vec<Cluster>,
    now: DateTime<Utc>,
    trust: &SourceTrust,
    w: &ScoringWeights,
) -> Vec<ScoredCluster> {
    clusters
        .into_iter()
        .map(|c| score_cluster(c, now, trust, w))
        .collect()
}

/// Strictly highest group score wins; the first cluster wins exact ties.
pub fn select(scored: Vec<ScoredCluster>) -> PipelineResult<ScoredCluster> {
    let mut best: Option<ScoredCluster> = None;
    for sc in scored {
        match &best {
            Some(b) if sc.group_score <= b.group_score => {}
            _ => best = Some(sc),
        }
    }
    best.ok_or(PipelineError::EmptyInput)
}
