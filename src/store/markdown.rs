// src/store/markdown.rs
//! Directory of `{date}-{slug}.md` files. Doubles as the archive read side
//! served by the HTTP API.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

use super::{sort_archive, Document, DocumentStore, DocumentSummary};

#[derive(Debug, Clone)]
pub struct MarkdownDirStore {
    dir: PathBuf,
}

impl MarkdownDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.md"))
    }

    async fn read_doc(&self, name: &str) -> Result<Option<Document>> {
        let path = self.path_for(name);
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(Document::parse(name, &raw))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }
}

// Names come from URLs on the read side; only accept what slugify can produce.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name.chars().all(|c| c.is_alphanumeric() || c == '-')
}

#[async_trait::async_trait]
impl DocumentStore for MarkdownDirStore {
    async fn put(&self, doc: &Document) -> Result<()> {
        let rendered = doc.to_markdown()?;
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating output dir {}", self.dir.display()))?;

        let path = self.path_for(&doc.name);
        let tmp = self.dir.join(format!(".{}.md.tmp", doc.name));
        fs::write(&tmp, rendered.as_bytes())
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("renaming into {}", path.display()));
        }

        tracing::info!(path = %path.display(), bytes = rendered.len(), "document written");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("listing {}", self.dir.display()));
            }
        };

        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if let Some(doc) = self.read_doc(name).await? {
                out.push(doc.summary());
            }
        }
        sort_archive(&mut out);
        Ok(out)
    }

    async fn get(&self, name: &str) -> Result<Option<Document>> {
        if !is_safe_name(name) {
            return Ok(None);
        }
        self.read_doc(name).await
    }
}
