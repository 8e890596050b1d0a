//! Grouping corroborating coverage of the same event.
//!
//! Two strategies share the title similarity primitive:
//!
//! - `GreedyAnchor`: each item joins the first cluster whose anchor (first
//!   member) scores at or above the threshold, else it opens a new cluster.
//!   Cheap, but the partition depends on input order.
//! - `ConnectedComponents`: every pair at or above the threshold is linked and
//!   clusters are the connected components (union-find). Order only affects
//!   how clusters and members are listed, never who ends up together.

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use super::similarity::title_similarity;
use crate::ingest::types::Item;

pub const DEFAULT_CLUSTER_THRESHOLD: f64 = 0.45;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStrategy {
    #[default]
    GreedyAnchor,
    ConnectedComponents,
}

/// Non-empty, ordered group of items believed to describe one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    items: Vec<Item>,
}

impl Cluster {
    pub fn new(anchor: Item) -> Self {
        Self {
            items: vec![anchor],
        }
    }

    /// First member; the item every other member was compared against.
    pub fn anchor(&self) -> &Item {
        &self.items[0]
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }
}

pub fn cluster(items: Vec<Item>, threshold: f64, strategy: ClusterStrategy) -> Vec<Cluster> {
    match strategy {
        ClusterStrategy::GreedyAnchor => greedy_anchor(items, threshold),
        ClusterStrategy::ConnectedComponents => connected_components(items, threshold),
    }
}

fn greedy_anchor(items: Vec<Item>, threshold: f64) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    for item in items {
        match clusters
            .iter_mut()
            .find(|c| title_similarity(&item.title, &c.anchor().title) >= threshold)
        {
            Some(c) => c.push(item),
            None => clusters.push(Cluster::new(item)),
        }
    }
    clusters
}

fn connected_components(items: Vec<Item>, threshold: f64) -> Vec<Cluster> {
    let n = items.len();
    let mut uf: UnionFind<usize> = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if title_similarity(&items[i].title, &items[j].title) >= threshold {
                uf.union(i, j);
            }
        }
    }

    // Clusters are listed by their earliest member; members keep input order.
    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut clusters: Vec<Cluster> = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        let root = uf.find_mut(i);
        match slot_of_root.get(&root) {
            Some(&slot) => clusters[slot].push(item),
            None => {
                slot_of_root.insert(root, clusters.len());
                clusters.push(Cluster::new(item));
            }
        }
    }
    clusters
}
