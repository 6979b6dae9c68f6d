// src/ingest/mod.rs
//! News pipeline: endpoint chain → shape normalizer → (importance selector)
//! → record mapper → quality filter, dedup and cap.
//!
//! The two feeds of a source run concurrently and fail independently; an
//! exhausted chain degrades that feed to an empty list.

pub mod fields;
pub mod mapper;
pub mod shape;
pub mod types;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::analyze::select_hot;
use crate::config::{ProxyConfig, SourceConfig};
use crate::error::FetchError;
use crate::fetch::{fetch_with_fallback, Expect, HttpTransport};
use crate::ingest::mapper::RecordMapper;
use crate::ingest::shape::extract_items;
use crate::ingest::types::{CanonicalRecord, Feed, RawItem, SourceQueryResult};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_records_total", "Canonical records returned.");
        describe_counter!(
            "news_filtered_total",
            "Records dropped for empty or too short content."
        );
        describe_counter!("news_dedup_total", "Records dropped as duplicates.");
        describe_counter!(
            "news_degraded_total",
            "Feeds degraded to empty after chain exhaustion."
        );
    });
}

/// Normalize text: decode entities, strip tags, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace (nbsp included)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Drop records below `min_chars`, dedup by id then by content, cap to `cap`.
/// Returns (kept, filtered_count, dedup_count).
pub fn filter_dedup(
    records: Vec<CanonicalRecord>,
    min_chars: usize,
    cap: usize,
) -> (Vec<CanonicalRecord>, usize, usize) {
    let min_chars = min_chars.max(1);
    let mut filtered_out = 0usize;
    let mut dedup_out = 0usize;
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_texts: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(records.len().min(cap));

    for rec in records {
        if rec.content.chars().count() < min_chars {
            filtered_out += 1;
            continue;
        }
        if seen_ids.contains(&rec.id) || seen_texts.contains(&rec.content) {
            dedup_out += 1;
            continue;
        }
        if keep.len() == cap {
            break;
        }
        seen_ids.insert(rec.id.clone());
        seen_texts.insert(rec.content.clone());
        keep.push(rec);
    }

    (keep, filtered_out, dedup_out)
}

fn has_usable_content(item: &RawItem, source: &SourceConfig) -> bool {
    source
        .fields
        .content
        .first_str(item)
        .map(|s| normalize_text(s).chars().count() >= source.min_content_chars)
        .unwrap_or(false)
}

/// Run one feed of one source end to end.
pub async fn run_feed(
    transport: &dyn HttpTransport,
    source: &SourceConfig,
    cfg: &ProxyConfig,
    feed: Feed,
    now: DateTime<Utc>,
) -> Result<Vec<CanonicalRecord>, FetchError> {
    ensure_metrics_described();

    let chain = source.chain(feed);
    let payload = fetch_with_fallback(transport, &chain, Expect::Json, cfg.backoff()).await?;

    let mut items = extract_items(&payload);
    let raw_count = items.len();
    let mut unusable = 0;
    if feed == Feed::Hottest && source.rank_hottest {
        // unusable items must not take a ranked slot
        items.retain(|it| has_usable_content(it, source));
        unusable = raw_count - items.len();
        items = select_hot(items, &source.fields.content);
    }

    let mapper = RecordMapper::new(source, cfg.display_offset());
    let records: Vec<CanonicalRecord> = items.iter().map(|it| mapper.map(it, now)).collect();
    let (kept, filtered, dedup) = filter_dedup(records, source.min_content_chars, cfg.max_items);
    let filtered = filtered + unusable;

    counter!("news_records_total").increment(kept.len() as u64);
    counter!("news_filtered_total").increment(filtered as u64);
    counter!("news_dedup_total").increment(dedup as u64);
    tracing::info!(
        target: "news",
        platform = %source.platform,
        feed = feed.as_str(),
        raw = raw_count,
        kept = kept.len(),
        filtered,
        dedup,
        "feed processed"
    );

    Ok(kept)
}

async fn run_feed_or_empty(
    transport: &dyn HttpTransport,
    source: &SourceConfig,
    cfg: &ProxyConfig,
    feed: Feed,
    now: DateTime<Utc>,
) -> Option<Vec<CanonicalRecord>> {
    match run_feed(transport, source, cfg, feed, now).await {
        Ok(v) => Some(v),
        Err(e) => {
            counter!("news_degraded_total").increment(1);
            tracing::warn!(
                target: "news",
                platform = %source.platform,
                feed = feed.as_str(),
                error = %e,
                "feed degraded to empty"
            );
            None
        }
    }
}

/// Fetch "latest" and "hottest" concurrently; each degrades on its own.
pub async fn query_source(
    transport: &dyn HttpTransport,
    source: &SourceConfig,
    cfg: &ProxyConfig,
    now: DateTime<Utc>,
) -> SourceQueryResult {
    let (latest, hottest) = tokio::join!(
        run_feed_or_empty(transport, source, cfg, Feed::Latest, now),
        run_feed_or_empty(transport, source, cfg, Feed::Hottest, now),
    );

    let mut failed = Vec::new();
    if latest.is_none() {
        failed.push(Feed::Latest);
    }
    if hottest.is_none() {
        failed.push(Feed::Hottest);
    }
    SourceQueryResult {
        latest: latest.unwrap_or_default(),
        hottest: hottest.unwrap_or_default(),
        failed,
    }
}
