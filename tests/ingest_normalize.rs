// tests/ingest_normalize.rs
//
// Validation, ordering and url-level dedup of gathered raw items.

use daily_story::ingest::{prepare, url_identity_key};
use daily_story::RawItem;

fn raw(source: &str, title: Option<&str>, url: Option<&str>, ts: &str) -> RawItem {
    RawItem {
        title: title.map(Into::into),
        url: url.map(Into::into),
        source: source.into(),
        published_at: Some(ts.into()),
        ..Default::default()
    }
}

#[test]
fn malformed_items_are_dropped_and_counted() {
    let (items, stats) = prepare(vec![
        raw("Reuters", Some("Senate passes bill"), Some("https://a.test/1"), "2024-05-02T10:00:00Z"),
        raw("Reuters", None, Some("https://a.test/2"), "2024-05-02T10:00:00Z"),
        raw("Reuters", Some("   "), Some("https://a.test/3"), "2024-05-02T10:00:00Z"),
        raw("Reuters", Some("No url"), None, "2024-05-02T10:00:00Z"),
        raw("Reuters", Some("Bad time"), Some("https://a.test/5"), "yesterday-ish"),
    ]);
    assert_eq!(items.len(), 1);
    assert_eq!(stats.raw, 5);
    assert_eq!(stats.malformed, 4);
    assert_eq!(stats.url_duplicates, 0);
}

#[test]
fn tracking_parameters_do_not_defeat_url_dedup() {
    let (items, stats) = prepare(vec![
        raw(
            "Reuters",
            Some("Senate passes bill"),
            Some("https://news.test/senate?utm_source=twitter&utm_campaign=x"),
            "2024-05-02T10:00:00Z",
        ),
        raw(
            "AP",
            Some("Senate passes bill"),
            Some("HTTPS://News.test/senate/#top"),
            "2024-05-02T09:00:00Z",
        ),
    ]);
    assert_eq!(items.len(), 1, "exactly one survives");
    assert_eq!(stats.url_duplicates, 1);
    // most recent is seen first, so it wins
    assert_eq!(items[0].source, "Reuters");
}

#[test]
fn meaningful_query_parameters_are_kept() {
    assert_ne!(
        url_identity_key("https://news.test/story?id=1"),
        url_identity_key("https://news.test/story?id=2")
    );
    assert_eq!(
        url_identity_key("https://news.test/story?id=1&fbclid=zzz"),
        url_identity_key(" https://news.test/story?id=1 ")
    );
}

#[test]
fn normalized_output_has_unique_identity_keys() {
    let hosts = ["https://a.test", "https://A.test", "https://b.test"];
    let suffixes = ["/x", "/x/", "/x?utm_medium=rss", "/y", "/x#frag"];
    let mut batch = Vec::new();
    for (i, h) in hosts.iter().enumerate() {
        for (j, s) in suffixes.iter().enumerate() {
            batch.push(raw(
                "Src",
                Some(&format!("Title {i}{j}")),
                Some(&format!("{h}{s}")),
                &format!("2024-05-02T{:02}:00:00Z", i * 5 + j),
            ));
        }
    }

    let (items, _) = prepare(batch);
    let mut keys: Vec<String> = items.iter().map(|i| url_identity_key(&i.url)).collect();
    let n = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), n);
    // a.test/x, a.test/y, b.test/x, b.test/y
    assert_eq!(n, 4);
}

#[test]
fn output_is_most_recent_first() {
    let (items, _) = prepare(vec![
        raw("A", Some("old"), Some("https://a.test/old"), "Wed, 01 May 2024 08:00:00 GMT"),
        raw("B", Some("new"), Some("https://a.test/new"), "2024-05-02T08:00:00+02:00"),
        raw("C", Some("mid"), Some("https://a.test/mid"), "2024-05-01T20:00:00Z"),
    ]);
    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, ["new", "mid", "old"]);
}
