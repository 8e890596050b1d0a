// tests/engine_e2e.rs
//
// Whole runs over fixture feeds: one complete document, or an error and no
// document at all.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, TimeZone, Utc};

use daily_story::engine::{run_once, RunOptions};
use daily_story::generate::{GenerationRequest, Generator, StaticGenerator};
use daily_story::ingest::providers::rss::RssAdapter;
use daily_story::store::{Document, DocumentStore, DocumentSummary, MarkdownDirStore};
use daily_story::{AppConfig, FetchQuery, PipelineError, RawItem, SourceAdapter, SourceTrust};

const WIRE_XML: &str = include_str!("fixtures/wire_rss.xml");
const BROADCASTER_XML: &str = include_str!("fixtures/broadcaster_rss.xml");
const FOREIGN_XML: &str = include_str!("fixtures/foreign_rss.xml");

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
}

struct Unreachable;

#[async_trait::async_trait]
impl SourceAdapter for Unreachable {
    async fn fetch(&self, _query: &FetchQuery) -> Result<Vec<RawItem>> {
        bail!("dns error")
    }
    fn name(&self) -> &str {
        "unreachable"
    }
}

struct FailingGenerator;

#[async_trait::async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        bail!("upstream 503")
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

struct ReadOnlyStore;

#[async_trait::async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn put(&self, _doc: &Document) -> Result<()> {
        bail!("read-only file system")
    }
    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        Ok(Vec::new())
    }
    async fn get(&self, _name: &str) -> Result<Option<Document>> {
        Ok(None)
    }
}

fn adapters() -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(Unreachable),
        Arc::new(RssAdapter::from_fixture("Reuters", WIRE_XML)),
        Arc::new(RssAdapter::from_fixture("BBC News", BROADCASTER_XML)),
        Arc::new(RssAdapter::from_fixture("Nachrichten", FOREIGN_XML)),
    ]
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|rd| rd.count()).unwrap_or(0)
}

#[tokio::test]
async fn successful_run_writes_one_complete_document() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MarkdownDirStore::new(tmp.path().join("daily"));
    let cfg = AppConfig::default();
    let generator = StaticGenerator::new("Lawmakers approved {title} [1][2].");

    let report = run_once(
        &adapters(),
        &generator,
        &store,
        &cfg,
        &SourceTrust::default_seed(),
        RunOptions::at(now()),
    )
    .await
    .expect("run ok");

    assert_eq!(report.document.as_deref(), Some("2024-05-02-senate-passes-bill"));
    assert_eq!(report.representative.source, "Reuters");
    assert_eq!(report.cluster_size, 2);
    assert_eq!(report.ingest.raw, 7);
    assert_eq!(report.ingest.malformed, 1);
    assert_eq!(report.ingest.url_duplicates, 1);
    assert_eq!(report.counts.windowed, 4);
    assert_eq!(report.counts.clusters, 2);

    let refs = &report.request.references;
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].title, "Senate passes bill");
    assert_eq!(refs[1].source, "BBC News");

    assert_eq!(file_count(store.dir()), 1);
    let raw = std::fs::read_to_string(store.path_for("2024-05-02-senate-passes-bill")).unwrap();
    assert!(raw.starts_with("---\ntitle: Senate passes bill\n"));
    assert!(raw.contains("primarySource: Reuters\n"));
    assert!(raw.contains("Lawmakers approved Senate passes bill [1][2]."));
}

#[tokio::test]
async fn same_day_rerun_overwrites() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MarkdownDirStore::new(tmp.path());
    let cfg = AppConfig::default();
    let trust = SourceTrust::default_seed();

    for body in ["first draft", "second draft"] {
        run_once(&adapters(), &StaticGenerator::new(body), &store, &cfg, &trust, RunOptions::at(now()))
            .await
            .unwrap();
    }
    assert_eq!(file_count(tmp.path()), 1);
    let doc = store.get("2024-05-02-senate-passes-bill").await.unwrap().unwrap();
    assert_eq!(doc.body, "second draft");
}

#[tokio::test]
async fn nothing_in_window_fails_without_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MarkdownDirStore::new(tmp.path().join("daily"));
    let later = now() + chrono::Duration::days(10);

    let err = run_once(
        &adapters(),
        &StaticGenerator::new("never"),
        &store,
        &AppConfig::default(),
        &SourceTrust::default_seed(),
        RunOptions::at(later),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::EmptyInput));
    assert_eq!(file_count(&tmp.path().join("daily")), 0);
}

#[tokio::test]
async fn only_failing_adapters_is_empty_input() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MarkdownDirStore::new(tmp.path());
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(Unreachable)];
    let err = run_once(
        &adapters,
        &StaticGenerator::new("never"),
        &store,
        &AppConfig::default(),
        &SourceTrust::default_seed(),
        RunOptions::at(now()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::EmptyInput));
}

#[tokio::test]
async fn generation_failure_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MarkdownDirStore::new(tmp.path());
    let trust = SourceTrust::default_seed();
    let cfg = AppConfig::default();

    let err = run_once(&adapters(), &FailingGenerator, &store, &cfg, &trust, RunOptions::at(now()))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Generation(_)));
    assert!(err.to_string().contains("upstream 503"));

    let err = run_once(
        &adapters(),
        &StaticGenerator::new("   "),
        &store,
        &cfg,
        &trust,
        RunOptions::at(now()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::Generation(_)));

    assert_eq!(file_count(tmp.path()), 0);
}

#[tokio::test]
async fn persistence_failure_is_reported() {
    let err = run_once(
        &adapters(),
        &StaticGenerator::new("body"),
        &ReadOnlyStore,
        &AppConfig::default(),
        &SourceTrust::default_seed(),
        RunOptions::at(now()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::Persistence(_)));
}

#[tokio::test]
async fn dry_run_selects_but_does_not_write() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MarkdownDirStore::new(tmp.path());
    let opts = RunOptions {
        now: now(),
        dry_run: true,
    };
    let report = run_once(
        &adapters(),
        &FailingGenerator,
        &store,
        &AppConfig::default(),
        &SourceTrust::default_seed(),
        opts,
    )
    .await
    .unwrap();
    assert!(report.document.is_none());
    assert_eq!(report.representative.title, "Senate passes bill");
    assert_eq!(file_count(tmp.path()), 0);
}
