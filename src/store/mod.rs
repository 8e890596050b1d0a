// src/store/mod.rs
//! Output documents and where they live.
//!
//! A run produces exactly one `Document`: a fixed-key YAML front matter block
//! followed by the generated body. Stores only see whole documents, so a
//! failed run never leaves a partial file behind.

pub mod markdown;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ingest::types::Item;

pub use markdown::MarkdownDirStore;

pub const PLACEHOLDER_SLUG: &str = "daily-story";
pub const MAX_SLUG_CHARS: usize = 80;
/// Date used for archive entries without a parseable `date` key.
pub const FALLBACK_DATE: &str = "1970-01-01";

/// Lower-case, collapse every non-alphanumeric run into one `-`, trim the
/// separators, cap the length. Empty results become `daily-story`.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_sep = false;
    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }

    let mut slug: String = out.chars().take(MAX_SLUG_CHARS).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        PLACEHOLDER_SLUG.to_string()
    } else {
        slug
    }
}

/// `{YYYY-MM-DD}-{slug}`; the file is `{name}.md`.
pub fn document_name(date: NaiveDate, title: &str) -> String {
    format!("{}-{}", date.format("%Y-%m-%d"), slugify(title))
}

/// Front matter keys, in the order they are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: String,
    pub headline: String,
    pub date: String,
    #[serde(rename = "primarySource")]
    pub primary_source: String,
    #[serde(rename = "primaryUrl")]
    pub primary_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub name: String,
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub body: String,
}

/// Listing entry: metadata without the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    #[serde(flatten)]
    pub meta: DocumentMeta,
}

impl Document {
    /// Document for the day's representative item.
    pub fn for_story(date: NaiveDate, representative: &Item, body: impl Into<String>) -> Self {
        Self {
            name: document_name(date, &representative.title),
            meta: DocumentMeta {
                title: representative.title.clone(),
                headline: representative.title.clone(),
                date: date.format("%Y-%m-%d").to_string(),
                primary_source: representative.source.clone(),
                primary_url: representative.url.clone(),
            },
            body: body.into(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.md", self.name)
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            name: self.name.clone(),
            meta: self.meta.clone(),
        }
    }

    pub fn to_markdown(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(&self.meta).context("serializing front matter")?;
        Ok(format!("---\n{}---\n\n{}\n", yaml, self.body.trim_end()))
    }

    /// Parse a stored file. Missing keys fall back to the file name (title,
    /// headline) and `1970-01-01` (date); a broken front matter block is
    /// treated as absent.
    pub fn parse(name: &str, raw: &str) -> Self {
        let (front, body) = split_front_matter(raw);
        let map = front
            .and_then(|f| match serde_yaml::from_str::<serde_yaml::Mapping>(f) {
                Ok(m) => Some(m),
                Err(e) => {
                    tracing::warn!(%name, error = %e, "unreadable front matter");
                    None
                }
            })
            .unwrap_or_default();

        let field = |key: &str| map.get(key).and_then(yaml_scalar);
        let title = field("title").unwrap_or_else(|| name.to_string());
        let headline = field("headline").unwrap_or_else(|| title.clone());
        let date = field("date")
            .filter(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok())
            .unwrap_or_else(|| FALLBACK_DATE.to_string());

        Self {
            name: name.to_string(),
            meta: DocumentMeta {
                title,
                headline,
                date,
                primary_source: field("primarySource").unwrap_or_default(),
                primary_url: field("primaryUrl").unwrap_or_default(),
            },
            body: body.trim().to_string(),
        }
    }
}

fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let Some(rest) = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))
    else {
        return (None, raw);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, raw)
}

fn yaml_scalar(v: &serde_yaml::Value) -> Option<String> {
    let s = match v {
        serde_yaml::Value::String(s) => s.trim().to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Archive ordering: newest date first, then name descending.
pub fn sort_archive(docs: &mut [DocumentSummary]) {
    docs.sort_by(|a, b| b.meta.date.cmp(&a.meta.date).then_with(|| b.name.cmp(&a.name)));
}

/// Persistence boundary. `put` replaces any document with the same name.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, doc: &Document) -> Result<()>;
    /// All documents, archive order.
    async fn list(&self) -> Result<Vec<DocumentSummary>>;
    async fn get(&self, name: &str) -> Result<Option<Document>>;

    async fn latest(&self) -> Result<Option<DocumentSummary>> {
        Ok(self.list().await?.into_iter().next())
    }
}
