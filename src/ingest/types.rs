// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One record as an adapter hands it over. Nothing is validated yet.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub source: String,
    /// RFC 3339 or RFC 2822 timestamp string.
    pub published_at: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

/// A validated story fragment from one source.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub description: Option<String>,
    pub content: Option<String>,
}

impl Item {
    /// Characters of descriptive text carried by the item.
    pub fn text_len(&self) -> usize {
        self.description.as_deref().map_or(0, |d| d.chars().count())
            + self.content.as_deref().map_or(0, |c| c.chars().count())
    }
}

/// What every adapter is asked for on a run.
#[derive(Debug, Clone)]
pub struct FetchQuery {
    pub now: DateTime<Utc>,
    pub window: Duration,
    pub language: String,
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawItem>>;
    fn name(&self) -> &str;
}
