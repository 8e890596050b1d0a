// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;

use crate::ingest::types::{FetchQuery, Item, RawItem, SourceAdapter};
use chrono::{DateTime, TimeZone, Utc};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};
use url::Url;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Raw items returned by adapters.");
        describe_counter!(
            "ingest_malformed_total",
            "Items dropped for a missing title/url or an unparseable timestamp."
        );
        describe_counter!(
            "ingest_url_duplicates_total",
            "Items dropped because their url identity key was already seen."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Adapter fetch/parse errors."
        );
        describe_counter!(
            "ingest_provider_timeouts_total",
            "Adapters that did not answer within the fetch timeout."
        );
        describe_histogram!("ingest_fetch_ms", "Adapter fetch time in milliseconds.");
    });
}

/// Normalize text: decode entities, strip tags, fold quotes and whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 4000 chars
    if out.chars().count() > 4000 {
        out = out.chars().take(4000).collect();
    }

    out
}

/// Parse an adapter timestamp. Accepts RFC 3339 and RFC 2822.
pub fn parse_published_at(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    let odt = OffsetDateTime::parse(ts, &Rfc2822).ok()?;
    Utc.timestamp_opt(odt.unix_timestamp(), odt.nanosecond())
        .single()
}

fn is_tracking_param(key: &str) -> bool {
    let k = key.to_ascii_lowercase();
    k.starts_with("utm_")
        || matches!(
            k.as_str(),
            "fbclid" | "gclid" | "mc_cid" | "mc_eid" | "ocid" | "cmpid" | "ref"
        )
}

/// Identity key used for exact-duplicate detection: trimmed, lower-cased,
/// without fragment, tracking parameters or a trailing path slash.
pub fn url_identity_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut u) = Url::parse(trimmed) else {
        return trimmed.to_lowercase();
    };

    u.set_fragment(None);

    let kept: Vec<(String, String)> = u
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        u.set_query(None);
    } else {
        u.query_pairs_mut().clear().extend_pairs(kept.iter());
    }

    let path = u.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        u.set_path(path.trim_end_matches('/'));
    }

    u.to_string().to_lowercase()
}

/// Validate one raw record. `None` means malformed.
pub fn into_item(raw: RawItem) -> Option<Item> {
    let title = normalize_text(raw.title.as_deref().unwrap_or_default());
    let url = raw.url.as_deref().map(str::trim).unwrap_or_default().to_string();
    if title.is_empty() || url.is_empty() {
        return None;
    }
    let published_at = parse_published_at(raw.published_at.as_deref()?)?;

    let clean = |s: Option<String>| {
        s.map(|v| normalize_text(&v))
            .filter(|v| !v.is_empty())
    };

    Some(Item {
        title,
        url,
        source: raw.source.trim().to_string(),
        published_at,
        description: clean(raw.description),
        content: clean(raw.content),
    })
}

/// Most recent first; url then source break ties so the order never depends
/// on which adapter answered first.
pub fn sort_most_recent_first(items: &mut [Item]) {
    items.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.url.cmp(&b.url))
            .then_with(|| a.source.cmp(&b.source))
    });
}

/// Keep the first item seen for every url identity key.
pub fn normalize(items: Vec<Item>) -> Vec<Item> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|it| seen.insert(url_identity_key(&it.url)))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestStats {
    pub raw: usize,
    pub malformed: usize,
    pub url_duplicates: usize,
}

/// Validate, order and url-dedup a gathered batch.
pub fn prepare(raw: Vec<RawItem>) -> (Vec<Item>, IngestStats) {
    ensure_metrics_described();

    let raw_count = raw.len();
    let mut items: Vec<Item> = raw.into_iter().filter_map(into_item).collect();
    let malformed = raw_count - items.len();

    sort_most_recent_first(&mut items);
    let before = items.len();
    let items = normalize(items);
    let url_duplicates = before - items.len();

    counter!("ingest_malformed_total").increment(malformed as u64);
    counter!("ingest_url_duplicates_total").increment(url_duplicates as u64);

    (
        items,
        IngestStats {
            raw: raw_count,
            malformed,
            url_duplicates,
        },
    )
}

/// Fetch every adapter concurrently, each under its own timeout.
///
/// A failing, panicking or slow adapter contributes nothing; the others are
/// unaffected. The result is concatenated in adapter order.
pub async fn gather(
    adapters: &[Arc<dyn SourceAdapter>],
    query: &FetchQuery,
    timeout: Duration,
) -> Vec<RawItem> {
    ensure_metrics_described();

    let handles: Vec<_> = adapters
        .iter()
        .map(|adapter| {
            let adapter = Arc::clone(adapter);
            let query = query.clone();
            tokio::spawn(async move {
                let t0 = Instant::now();
                let res = tokio::time::timeout(timeout, adapter.fetch(&query)).await;
                histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                match res {
                    Ok(Ok(items)) => {
                        tracing::debug!(provider = adapter.name(), count = items.len(), "provider ok");
                        counter!("ingest_events_total").increment(items.len() as u64);
                        items
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(error = ?e, provider = adapter.name(), "provider error");
                        counter!("ingest_provider_errors_total").increment(1);
                        Vec::new()
                    }
                    Err(_) => {
                        tracing::warn!(
                            provider = adapter.name(),
                            timeout_ms = timeout.as_millis() as u64,
                            "provider timed out"
                        );
                        counter!("ingest_provider_timeouts_total").increment(1);
                        Vec::new()
                    }
                }
            })
        })
        .collect();

    let mut raw = Vec::new();
    for (handle, adapter) in futures::future::join_all(handles)
        .await
        .into_iter()
        .zip(adapters)
    {
        match handle {
            Ok(mut items) => raw.append(&mut items),
            Err(e) => {
                tracing::warn!(error = %e, provider = adapter.name(), "provider task aborted");
                counter!("ingest_provider_errors_total").increment(1);
            }
        }
    }
    raw
}

/// Gather from all adapters and prepare the combined batch.
pub async fn run_once(
    adapters: &[Arc<dyn SourceAdapter>],
    query: &FetchQuery,
    timeout: Duration,
) -> (Vec<Item>, IngestStats) {
    let raw = gather(adapters, query, timeout).await;
    let (items, stats) = prepare(raw);
    tracing::info!(
        target: "ingest",
        raw = stats.raw,
        malformed = stats.malformed,
        url_duplicates = stats.url_duplicates,
        kept = items.len(),
        "ingest finished"
    );
    (items, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, url: &str, ts: &str) -> RawItem {
        RawItem {
            title: Some(title.into()),
            url: Some(url.into()),
            source: "Reuters".into(),
            published_at: Some(ts.into()),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_text_strips_tags_and_entities() {
        let s = "  <b>Senate&nbsp;passes</b>   &ldquo;bill&rdquo;  ";
        assert_eq!(normalize_text(s), r#"Senate passes "bill""#);
    }

    #[test]
    fn parses_both_timestamp_flavours() {
        let a = parse_published_at("2024-05-01T12:00:00Z").unwrap();
        let b = parse_published_at("Wed, 01 May 2024 12:00:00 +0000").unwrap();
        assert_eq!(a, b);
        assert!(parse_published_at("yesterday-ish").is_none());
        assert!(parse_published_at("  ").is_none());
    }

    #[test]
    fn identity_key_ignores_case_space_and_tracking() {
        let a = url_identity_key("  https://Example.com/News/Story?utm_source=x&utm_medium=y ");
        let b = url_identity_key("https://example.com/news/story/#top");
        assert_eq!(a, b);
        let c = url_identity_key("https://example.com/news/story?id=7&fbclid=abc");
        assert_eq!(c, "https://example.com/news/story?id=7");
    }

    #[test]
    fn identity_key_falls_back_for_unparseable_urls() {
        assert_eq!(url_identity_key("  Not A URL "), "not a url");
    }

    #[test]
    fn malformed_items_are_dropped() {
        let mut missing_title = raw("x", "https://a.test/1", "2024-05-01T12:00:00Z");
        missing_title.title = None;
        let mut blank_url = raw("x", "   ", "2024-05-01T12:00:00Z");
        blank_url.url = Some("   ".into());
        let bad_ts = raw("x", "https://a.test/2", "not a date");
        let ok = raw("x", "https://a.test/3", "2024-05-01T12:00:00Z");

        let (items, stats) = prepare(vec![missing_title, blank_url, bad_ts, ok]);
        assert_eq!(items.len(), 1);
        assert_eq!(stats.malformed, 3);
        assert_eq!(items[0].url, "https://a.test/3");
    }

    #[test]
    fn first_seen_wins_after_recency_sort() {
        let older = raw("Old phrasing", "https://a.test/story", "2024-05-01T08:00:00Z");
        let newer = raw("New phrasing", "HTTPS://A.TEST/story ", "2024-05-01T12:00:00Z");
        let (items, stats) = prepare(vec![older, newer]);
        assert_eq!(items.len(), 1);
        assert_eq!(stats.url_duplicates, 1);
        assert_eq!(items[0].title, "New phrasing");
    }
}
