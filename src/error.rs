//! Fatal outcomes of a run.
//!
//! Adapter failures and malformed items never show up here: they are absorbed
//! during ingest (logged and counted) and simply contribute zero items.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Nothing survived normalization, windowing and deduplication.
    #[error("no items left to select from after normalization and windowing")]
    EmptyInput,

    /// The generation backend failed or produced an empty body.
    #[error("generation failed: {0:#}")]
    Generation(#[source] anyhow::Error),

    /// Writing the output document failed.
    #[error("persistence failed: {0:#}")]
    Persistence(#[source] anyhow::Error),

    #[error("invalid configuration: {0:#}")]
    Config(#[source] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
