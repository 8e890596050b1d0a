//! # Run Engine
//! One full run: gather → select → build request → generate → persist.
//!
//! The run either writes exactly one complete document or returns a
//! `PipelineError` and writes nothing. Adapter failures are absorbed by
//! ingest and never reach this level.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use metrics::{describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::generate::{GenerationRequest, Generator};
use crate::ingest::types::{FetchQuery, Item, SourceAdapter};
use crate::ingest::{self, IngestStats};
use crate::pipeline::{select_story, StageCounts};
use crate::source_weights::SourceTrust;
use crate::store::{Document, DocumentStore};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_gauge!(
            "run_last_success_ts",
            "Unix time of the last run that persisted a document."
        );
    });
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub now: DateTime<Utc>,
    /// Stop after building the generation request.
    pub dry_run: bool,
}

impl RunOptions {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// `None` on dry runs.
    pub document: Option<String>,
    pub representative: Item,
    pub cluster_size: usize,
    pub group_score: f64,
    pub ingest: IngestStats,
    pub counts: StageCounts,
    pub request: GenerationRequest,
}

pub async fn run_once(
    adapters: &[Arc<dyn SourceAdapter>],
    generator: &dyn Generator,
    store: &dyn DocumentStore,
    cfg: &AppConfig,
    trust: &SourceTrust,
    opts: RunOptions,
) -> PipelineResult<RunReport> {
    ensure_metrics_described();
    let now = opts.now;

    let query = FetchQuery {
        now,
        window: cfg.window_std(),
        language: cfg.ingest.language.clone(),
    };
    let (items, ingest) = ingest::run_once(adapters, &query, cfg.fetch_timeout()).await;

    let selection = select_story(items, now, &cfg.pipeline(), trust)?;
    let winner = selection.winner;
    let date = now.date_naive();
    let request = GenerationRequest::from_selection(&winner, date, cfg.generation.max_references);

    let mut report = RunReport {
        document: None,
        representative: winner.representative.clone(),
        cluster_size: winner.cluster.len(),
        group_score: winner.group_score,
        ingest,
        counts: selection.counts,
        request,
    };

    if opts.dry_run {
        tracing::info!(
            representative = %report.representative.title,
            references = report.request.references.len(),
            "dry run: skipping generation and persistence"
        );
        return Ok(report);
    }

    let body = generator
        .generate(&report.request)
        .await
        .map_err(PipelineError::Generation)?;
    let body = body.trim();
    if body.is_empty() {
        return Err(PipelineError::Generation(anyhow!(
            "{} returned an empty body",
            generator.name()
        )));
    }

    let doc = Document::for_story(date, &winner.representative, body);
    store.put(&doc).await.map_err(PipelineError::Persistence)?;

    gauge!("run_last_success_ts").set(now.timestamp() as f64);
    tracing::info!(
        document = %doc.name,
        generator = generator.name(),
        cluster_size = report.cluster_size,
        group_score = report.group_score,
        "run complete"
    );

    report.document = Some(doc.name);
    Ok(report)
}
