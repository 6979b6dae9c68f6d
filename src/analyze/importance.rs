// src/analyze/importance.rs
//! "Hottest" selection over raw items.
//!
//! Flagged items win when there are enough of them; on quiet days the whole
//! feed is ranked by a composite score instead, so the list never starves.

use std::cmp::Ordering;

use serde_json::Value;

use crate::ingest::fields::FieldChain;
use crate::ingest::mapper::raw_importance;
use crate::ingest::types::RawItem;

/// Minimum flagged items needed to return only flagged items.
pub const MIN_FLAGGED: usize = 5;
/// Output cap.
pub const HOT_CAP: usize = 10;
/// important, urgent, breaking, major news, attention, significant.
pub const HOT_KEYWORDS: &[&str] = &["重要", "紧急", "突发", "重磅", "关注", "重大"];
/// Keyword that adds one point to the fallback score.
const SCORE_KEYWORD: &str = "重要";

fn text_of<'a>(item: &'a RawItem, text: &FieldChain) -> &'a str {
    text.first_str(item).unwrap_or_default()
}

fn has_flag(item: &RawItem) -> bool {
    let str_is = |k: &str, want: &str| item.get(k).and_then(Value::as_str) == Some(want);
    let is_true = |k: &str| item.get(k) == Some(&Value::Bool(true));

    raw_importance(item) > 0.0
        || str_is("level", "important")
        || is_true("is_important")
        || str_is("priority", "high")
        || is_true("urgent")
}

pub fn is_flagged(item: &RawItem, text: &FieldChain) -> bool {
    let body = text_of(item, text);
    has_flag(item) || HOT_KEYWORDS.iter().any(|k| body.contains(k))
}

pub fn hot_score(item: &RawItem, text: &FieldChain) -> f64 {
    let bonus = if text_of(item, text).contains(SCORE_KEYWORD) {
        1.0
    } else {
        0.0
    };
    raw_importance(item) + bonus
}

/// Pick the hottest items. `text` names the fields searched for keywords.
pub fn select_hot(items: Vec<RawItem>, text: &FieldChain) -> Vec<RawItem> {
    let total = items.len();
    let flagged: Vec<RawItem> = items
        .iter()
        .filter(|it| is_flagged(it, text))
        .cloned()
        .collect();

    tracing::debug!(target: "news", total, flagged = flagged.len(), "importance filter");

    if flagged.len() >= MIN_FLAGGED {
        return flagged.into_iter().take(HOT_CAP).collect();
    }

    let mut scored: Vec<(f64, RawItem)> = items
        .into_iter()
        .map(|it| (hot_score(&it, text), it))
        .collect();
    // stable: equal scores keep upstream order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().take(HOT_CAP).map(|(_, it)| it).collect()
}
