//! File cache in front of any `Generator`.
//!
//! Keyed by SHA-256 of model-visible input, so re-running the same day on
//! the same story does not hit the backend twice. Only successful, non-empty
//! bodies are stored; writes go through a temp file and a rename.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use metrics::counter;
use sha2::{Digest, Sha256};

use super::{GenerationRequest, Generator, SYSTEM_PROMPT};

pub struct CachingGenerator<G: Generator> {
    inner: G,
    cache_dir: PathBuf,
}

impl<G: Generator> CachingGenerator<G> {
    pub fn new(inner: G, cache_dir: PathBuf) -> Self {
        let _ = fs::create_dir_all(&cache_dir); // best-effort
        Self { inner, cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

#[async_trait::async_trait]
impl<G: Generator> Generator for CachingGenerator<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let key = cache_key(self.inner.name(), &request.prompt());
        if let Some(hit) = read_cache_file(&self.cache_dir, &key) {
            tracing::debug!(%key, "generation cache hit");
            counter!("generation_cache_hits_total").increment(1);
            return Ok(hit);
        }
        counter!("generation_cache_misses_total").increment(1);

        let fresh = self.inner.generate(request).await?;
        if fresh.trim().is_empty() {
            bail!("{} returned an empty body", self.inner.name());
        }
        if let Err(e) = write_cache_file(&self.cache_dir, &key, &fresh) {
            tracing::warn!(error = %e, %key, "could not write generation cache");
        }
        Ok(fresh)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

fn cache_key(backend: &str, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(backend.as_bytes());
    hasher.update([0u8]);
    hasher.update(SYSTEM_PROMPT.as_bytes());
    hasher.update([0u8]);
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.md"))
}

fn read_cache_file(dir: &Path, key: &str) -> Option<String> {
    let body = fs::read_to_string(cache_path(dir, key)).ok()?;
    (!body.trim().is_empty()).then_some(body)
}

fn write_cache_file(dir: &Path, key: &str, body: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let path = cache_path(dir, key);
    let tmp = path.with_extension("md.tmp");
    fs::write(&tmp, body)?;
    fs::rename(tmp, path)?;
    Ok(())
}
