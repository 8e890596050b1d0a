// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::types::{FetchQuery, RawItem, SourceAdapter};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    language: Option<String>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "encoded", alias = "content:encoded")]
    content: Option<String>,
}

/// Generic RSS 2.0 adapter. Every item is attributed to the configured feed name.
pub struct RssAdapter {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssAdapter {
    /// Parse a fixed XML document instead of hitting the network.
    pub fn from_fixture(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(name: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("daily-story/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .build()
            .context("building rss http client")?;
        Ok(Self {
            name: name.into(),
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        })
    }

    fn parse_items_from_str(&self, s: &str, language: &str) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean)
            .with_context(|| format!("parsing {} rss xml", self.name))?;

        if let Some(lang) = rss.channel.language.as_deref() {
            if !language_matches(lang, language) {
                tracing::debug!(
                    provider = %self.name,
                    feed_language = lang,
                    wanted = language,
                    "skipping feed in another language"
                );
                return Ok(Vec::new());
            }
        }

        let out = rss
            .channel
            .item
            .into_iter()
            .map(|it| RawItem {
                title: it.title,
                url: it.link,
                source: self.name.clone(),
                published_at: it.pub_date,
                description: it.description,
                content: it.content,
            })
            .collect::<Vec<_>>();

        histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s, &query.language),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .with_context(|| format!("{} http get()", self.name))?
                    .text()
                    .await
                    .with_context(|| format!("{} http .text()", self.name))?;
                self.parse_items_from_str(&body, &query.language)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// "en-us" matches a hint of "en"; an empty hint matches everything.
fn language_matches(feed: &str, hint: &str) -> bool {
    let hint = hint.trim();
    if hint.is_empty() {
        return true;
    }
    let feed = feed.trim().to_ascii_lowercase();
    let hint = hint.to_ascii_lowercase();
    feed == hint || feed.starts_with(&format!("{hint}-")) || feed.starts_with(&format!("{hint}_"))
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
