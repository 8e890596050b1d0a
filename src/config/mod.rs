// src/config/mod.rs
//! Application configuration: one TOML file plus a few env overrides.
//!
//! Lookup order for the file: explicit path → `$DAILY_STORY_CONFIG_PATH` →
//! `config/daily_story.toml` → built-in defaults.

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::config::{load_feeds_from, FeedSpec};
use crate::pipeline::{
    ClusterStrategy, PipelineConfig, ScoringWeights, DEFAULT_CLUSTER_THRESHOLD,
    DEFAULT_DEDUP_THRESHOLD, DEFAULT_WINDOW_HOURS,
};
use crate::source_weights::SourceTrust;

pub use ai::GenerationConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/daily_story.toml";
pub const ENV_CONFIG_PATH: &str = "DAILY_STORY_CONFIG_PATH";
pub const ENV_WINDOW_HOURS: &str = "DAILY_STORY_WINDOW_HOURS";
pub const ENV_DEDUP_THRESHOLD: &str = "DAILY_STORY_DEDUP_THRESHOLD";
pub const ENV_CLUSTER_THRESHOLD: &str = "DAILY_STORY_CLUSTER_THRESHOLD";
pub const ENV_LANGUAGE: &str = "DAILY_STORY_LANGUAGE";
pub const ENV_OUTPUT_DIR: &str = "DAILY_STORY_OUTPUT_DIR";

/// Longest accepted recency window (ten years).
pub const MAX_WINDOW_HOURS: u64 = 24 * 366 * 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    pub hours: u64,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupSection {
    pub threshold: f64,
}

impl Default for DedupSection {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DEDUP_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterSection {
    pub threshold: f64,
    pub strategy: ClusterStrategy,
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CLUSTER_THRESHOLD,
            strategy: ClusterStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Language hint passed to every adapter.
    pub language: String,
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub feeds: Vec<FeedSpec>,
    /// Extra feeds from a standalone TOML/JSON list.
    pub feeds_path: Option<PathBuf>,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            fetch_timeout_secs: 10,
            feeds: Vec::new(),
            feeds_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("content/daily"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowSection,
    pub dedup: DedupSection,
    pub cluster: ClusterSection,
    pub scoring: ScoringWeights,
    pub sources: SourceTrust,
    pub ingest: IngestSection,
    pub generation: GenerationConfig,
    pub output: OutputSection,
}

// parse optional float env and clamp to <0.0..=1.0>
fn parse_threshold_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

// parse optional hour count and clamp to <1..=MAX_WINDOW_HOURS>
fn parse_hours_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&h| h > 0)
        .map(|h| h.min(MAX_WINDOW_HOURS))
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing config toml")?;
        cfg.sources = cfg.sources.normalized();
        Ok(cfg)
    }

    /// Load using the lookup order above, then apply env overrides and repair
    /// out-of-range values.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => match std::env::var(ENV_CONFIG_PATH) {
                Ok(p) => {
                    let pb = PathBuf::from(p);
                    if !pb.exists() {
                        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                    }
                    Some(pb)
                }
                Err(_) => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()),
            },
        };

        let mut cfg = match &path {
            Some(p) => {
                let s = fs::read_to_string(p)
                    .with_context(|| format!("reading config from {}", p.display()))?;
                Self::from_toml_str(&s)?
            }
            None => Self::default(),
        };

        if let Some(feeds_path) = cfg.ingest.feeds_path.clone() {
            let base = path
                .as_deref()
                .and_then(Path::parent)
                .unwrap_or_else(|| Path::new("."));
            let resolved = if feeds_path.is_relative() && !feeds_path.exists() {
                base.join(&feeds_path)
            } else {
                feeds_path
            };
            let extra = load_feeds_from(&resolved)?;
            cfg.ingest.feeds.extend(extra);
        }

        cfg.apply_env_overrides();
        cfg.sanitize()?;
        tracing::debug!(
            path = ?path,
            feeds = cfg.ingest.feeds.len(),
            window_hours = cfg.window.hours,
            "config loaded"
        );
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(h) = parse_hours_env(std::env::var(ENV_WINDOW_HOURS).ok()) {
            self.window.hours = h;
        }
        if let Some(t) = parse_threshold_env(std::env::var(ENV_DEDUP_THRESHOLD).ok()) {
            self.dedup.threshold = t;
        }
        if let Some(t) = parse_threshold_env(std::env::var(ENV_CLUSTER_THRESHOLD).ok()) {
            self.cluster.threshold = t;
        }
        if let Ok(lang) = std::env::var(ENV_LANGUAGE) {
            if !lang.trim().is_empty() {
                self.ingest.language = lang.trim().to_string();
            }
        }
        if let Ok(dir) = std::env::var(ENV_OUTPUT_DIR) {
            if !dir.trim().is_empty() {
                self.output.dir = PathBuf::from(dir.trim());
            }
        }
    }

    fn sanitize(&mut self) -> Result<()> {
        if self.window.hours == 0 {
            self.window.hours = DEFAULT_WINDOW_HOURS;
        }
        self.window.hours = self.window.hours.min(MAX_WINDOW_HOURS);
        self.dedup.threshold = self.dedup.threshold.clamp(0.0, 1.0);
        self.cluster.threshold = self.cluster.threshold.clamp(0.0, 1.0);
        if self.ingest.fetch_timeout_secs == 0 {
            self.ingest.fetch_timeout_secs = IngestSection::default().fetch_timeout_secs;
        }
        if self.scoring.decay_hours <= 0.0 {
            self.scoring.decay_hours = ScoringWeights::default().decay_hours;
        }
        self.sources = std::mem::take(&mut self.sources).normalized();
        self.generation = self.generation.clone().resolved()?;
        Ok(())
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            window: chrono::Duration::hours(self.window_hours() as i64),
            dedup_threshold: self.dedup.threshold,
            cluster_threshold: self.cluster.threshold,
            strategy: self.cluster.strategy,
            scoring: self.scoring,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.ingest.fetch_timeout_secs)
    }

    pub fn window_std(&self) -> Duration {
        Duration::from_secs(self.window_hours() * 3600)
    }

    // `from_toml_str` skips `sanitize`.
    fn window_hours(&self) -> u64 {
        self.window.hours.min(MAX_WINDOW_HOURS)
    }
}
