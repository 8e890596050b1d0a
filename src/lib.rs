// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod generate;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod source_weights;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::AppConfig;
pub use crate::engine::{run_once, RunOptions, RunReport};
pub use crate::error::{PipelineError, PipelineResult};
pub use crate::ingest::types::{FetchQuery, Item, RawItem, SourceAdapter};
pub use crate::pipeline::{select_story, Selection};
pub use crate::source_weights::SourceTrust;
