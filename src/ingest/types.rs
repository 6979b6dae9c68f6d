// src/ingest/types.rs
use serde::{Deserialize, Serialize};

pub use crate::fetch::RawPayload;

/// One upstream item with unknown keys.
pub type RawItem = serde_json::Map<String, serde_json::Value>;

/// Normalized news item returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub id: String,      // source-prefixed, e.g. "cl_123"
    pub time: String,    // "HH:MM", never empty
    pub content: String, // normalized, trimmed
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u64>,
    pub source: String, // display name, e.g. "财联社"
}

/// The two independently fetched lists of one news source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Latest,
    Hottest,
}

impl Feed {
    pub fn as_str(self) -> &'static str {
        match self {
            Feed::Latest => "latest",
            Feed::Hottest => "hottest",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceQueryResult {
    pub latest: Vec<CanonicalRecord>,
    pub hottest: Vec<CanonicalRecord>,
    /// Feeds whose endpoint chain was exhausted (degraded to empty).
    pub failed: Vec<Feed>,
}

impl SourceQueryResult {
    /// Human message for the response envelope when any feed degraded.
    pub fn degraded_message(&self, source_name: &str) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        let feeds: Vec<&str> = self.failed.iter().map(|f| f.as_str()).collect();
        Some(format!(
            "{source_name} upstream unavailable: {}",
            feeds.join(", ")
        ))
    }
}
