//! Generation: request building + backend abstraction.
//!
//! The core hands a `GenerationRequest` to any `Generator` and treats the
//! returned text as opaque article body. Backends:
//! - `OpenAiGenerator` (chat completions),
//! - `StaticGenerator` (fixed body; dry runs and tests),
//! - `CachingGenerator<G>` wraps either with a file cache.

pub mod cache;
pub mod openai;

use std::fmt;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::GenerationConfig;
use crate::pipeline::ScoredCluster;

pub use cache::CachingGenerator;
pub use openai::OpenAiGenerator;

pub const SYSTEM_PROMPT: &str = "You write one short, neutral news explainer per day. \
Use only the numbered references you are given, cite them inline as [n], \
do not speculate beyond them, and end with a one-sentence summary. \
Return plain Markdown body text without a title.";

/// One numbered source line of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub index: usize,
    pub title: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} — {} ({}) {}",
            self.index,
            self.title,
            self.source,
            self.published_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.url
        )
    }
}

/// Primary attribution: the representative item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribution {
    pub title: String,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub date: NaiveDate,
    pub primary: Attribution,
    pub references: Vec<Reference>,
}

impl GenerationRequest {
    /// Build from the winning cluster: its `max_references` most recent items,
    /// numbered from 1, plus the representative as primary attribution.
    pub fn from_selection(winner: &ScoredCluster, date: NaiveDate, max_references: usize) -> Self {
        let mut items: Vec<_> = winner.cluster.items().iter().collect();
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let references = items
            .into_iter()
            .take(max_references)
            .enumerate()
            .map(|(i, it)| Reference {
                index: i + 1,
                title: it.title.clone(),
                source: it.source.clone(),
                published_at: it.published_at,
                url: it.url.clone(),
            })
            .collect();

        let rep = &winner.representative;
        Self {
            date,
            primary: Attribution {
                title: rep.title.clone(),
                source: rep.source.clone(),
                url: rep.url.clone(),
            },
            references,
        }
    }

    /// User prompt sent to the backend.
    pub fn prompt(&self) -> String {
        let mut out = format!(
            "Date: {}\nPrimary story: {} — {} {}\n\nReferences:\n",
            self.date.format("%Y-%m-%d"),
            self.primary.title,
            self.primary.source,
            self.primary.url
        );
        for r in &self.references {
            out.push_str(&r.to_string());
            out.push('\n');
        }
        out
    }
}

#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Narrative body for the request. Errors abort the run.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
    fn name(&self) -> &'static str;
}

pub type DynGenerator = Arc<dyn Generator>;

/// Returns the same body every time.
#[derive(Debug, Clone)]
pub struct StaticGenerator {
    pub body: String,
}

impl StaticGenerator {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait::async_trait]
impl Generator for StaticGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if self.body.trim().is_empty() {
            bail!("static generator has an empty body");
        }
        Ok(self.body.replace("{title}", &request.primary.title))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Build the configured backend, wrapped in the file cache when one is set.
pub fn build_generator(cfg: &GenerationConfig) -> Result<DynGenerator> {
    match cfg.provider.as_str() {
        "openai" => {
            if cfg.api_key.is_empty() {
                bail!("generation provider is openai but no API key is configured (OPENAI_API_KEY)");
            }
            tracing::info!(
                provider = "openai",
                model = %cfg.model,
                key_len = cfg.api_key.len(),
                cache = ?cfg.cache_dir,
                "generation backend ready"
            );
            let inner = OpenAiGenerator::new(cfg)?;
            Ok(match &cfg.cache_dir {
                Some(dir) => Arc::new(CachingGenerator::new(inner, dir.clone())),
                None => Arc::new(inner),
            })
        }
        "static" => {
            let body = cfg
                .static_body
                .clone()
                .unwrap_or_else(|| "Today's most corroborated story: {title}.".to_string());
            Ok(Arc::new(StaticGenerator::new(body)))
        }
        other => bail!("unsupported generation provider: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Item;
    use crate::pipeline::{select::score_cluster, Cluster, ScoringWeights};
    use crate::source_weights::SourceTrust;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
    }

    fn item(n: i64) -> Item {
        Item {
            title: format!("Senate passes bill {n}"),
            url: format!("https://news.test/{n}"),
            source: if n == 3 { "Reuters".into() } else { "Blog".into() },
            published_at: now() - Duration::hours(n),
            description: None,
            content: None,
        }
    }

    fn winner(n: i64) -> ScoredCluster {
        // Oldest first, so the request has to reorder.
        let mut c = Cluster::new(item(n));
        for i in (0..n).rev() {
            c.push(item(i));
        }
        score_cluster(c, now(), &SourceTrust::default_seed(), &ScoringWeights::default())
    }

    #[test]
    fn references_are_recent_first_and_capped() {
        let req = GenerationRequest::from_selection(&winner(12), now().date_naive(), 10);
        assert_eq!(req.references.len(), 10);
        assert_eq!(req.references[0].index, 1);
        assert_eq!(req.references[0].url, "https://news.test/0");
        assert_eq!(req.references[9].url, "https://news.test/9");
        assert_eq!(req.primary.source, "Reuters");
    }

    #[test]
    fn reference_line_format() {
        let req = GenerationRequest::from_selection(&winner(1), now().date_naive(), 10);
        assert_eq!(
            req.references[0].to_string(),
            "[1] Senate passes bill 0 — Blog (2024-05-02T12:00:00Z) https://news.test/0"
        );
        let prompt = req.prompt();
        assert!(prompt.starts_with("Date: 2024-05-02\n"));
        assert!(prompt.contains("[2] Senate passes bill 1 — Blog (2024-05-02T11:00:00Z)"));
    }

    #[tokio::test]
    async fn static_generator_fills_title() {
        let req = GenerationRequest::from_selection(&winner(3), now().date_naive(), 10);
        let g = StaticGenerator::new("About {title}.");
        assert_eq!(g.generate(&req).await.unwrap(), "About Senate passes bill 3.");
        assert!(StaticGenerator::new("  ").generate(&req).await.is_err());
    }
}
