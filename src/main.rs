//! daily-story — binary entrypoint.
//! `run` performs one batch selection and writes a document, `serve` exposes
//! the archive over HTTP, `list` prints it.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daily_story::cli::{Cli, Command};
use daily_story::config::AppConfig;
use daily_story::engine::{self, RunOptions};
use daily_story::error::PipelineError;
use daily_story::generate::{build_generator, DynGenerator, StaticGenerator};
use daily_story::ingest::config::{build_adapters, load_feeds_default};
use daily_story::metrics::Metrics;
use daily_story::store::{DocumentStore, MarkdownDirStore};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "daily-story failed");
            match e.downcast_ref::<PipelineError>() {
                Some(PipelineError::EmptyInput) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let cfg = AppConfig::load(cli.config.as_deref()).map_err(PipelineError::Config)?;
    let store = MarkdownDirStore::new(cfg.output.dir.clone());

    match cli.command {
        Command::Run {
            dry_run,
            metrics_textfile,
        } => {
            let metrics = Metrics::install()?;
            let result = run(&cfg, &store, dry_run).await;
            if let Some(path) = metrics_textfile {
                if let Err(e) = metrics.write_textfile(&path) {
                    tracing::warn!(error = ?e, path = %path.display(), "metrics textfile not written");
                }
            }
            result
        }
        Command::Serve { bind } => {
            let metrics = Metrics::install()?;
            let app = daily_story::api::router(Arc::new(store), Some(metrics));
            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("binding {bind}"))?;
            tracing::info!(%bind, "archive api listening");
            axum::serve(listener, app).await.context("http server")?;
            Ok(())
        }
        Command::List => {
            for doc in store.list().await? {
                println!("{}  {}  {}", doc.meta.date, doc.name, doc.meta.title);
            }
            Ok(())
        }
    }
}

async fn run(cfg: &AppConfig, store: &MarkdownDirStore, dry_run: bool) -> Result<()> {
    let feeds = if cfg.ingest.feeds.is_empty() {
        load_feeds_default()?
    } else {
        cfg.ingest.feeds.clone()
    };
    let adapters = build_adapters(&feeds).map_err(PipelineError::Config)?;
    if adapters.is_empty() {
        tracing::warn!("no feeds configured");
    }

    let generator: DynGenerator = if dry_run {
        Arc::new(StaticGenerator::new("dry run"))
    } else {
        build_generator(&cfg.generation).map_err(PipelineError::Config)?
    };

    let opts = RunOptions {
        now: chrono::Utc::now(),
        dry_run,
    };
    let report = engine::run_once(
        &adapters,
        generator.as_ref(),
        store as &dyn DocumentStore,
        cfg,
        &cfg.sources,
        opts,
    )
    .await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("encoding run report")?
    );
    Ok(())
}
