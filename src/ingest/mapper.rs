// src/ingest/mapper.rs
//! Raw upstream item → `CanonicalRecord`. Mapping is total: every missing or
//! malformed field degrades to a default.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::{SignalKind, SourceConfig};
use crate::ingest::fields::as_number;
use crate::ingest::normalize_text;
use crate::ingest::types::{CanonicalRecord, RawItem};

/// Numeric timestamps below this are seconds, at or above it milliseconds.
pub const MILLIS_EPOCH_THRESHOLD: f64 = 10_000_000_000.0;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

fn from_epoch_number(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() || n <= 0.0 {
        return None;
    }
    let ms = if n < MILLIS_EPOCH_THRESHOLD { n * 1_000.0 } else { n };
    DateTime::from_timestamp_millis(ms as i64)
}

fn parse_time_str(s: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(n) = s.parse::<f64>() {
        return from_epoch_number(n);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Interpret an upstream timestamp of unknown unit/format.
pub fn parse_timestamp(v: &Value, offset: FixedOffset) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => n.as_f64().and_then(from_epoch_number),
        Value::String(s) => parse_time_str(s, offset),
        _ => None,
    }
}

/// "HH:MM" in `offset`; falls back to `now` when the value is unusable.
pub fn display_time(v: Option<&Value>, now: DateTime<Utc>, offset: FixedOffset) -> String {
    let at = v.and_then(|v| parse_timestamp(v, offset)).unwrap_or(now);
    at.with_timezone(&offset).format("%H:%M").to_string()
}

/// Stable fallback token for items without an upstream id.
pub fn content_token(raw: &RawItem) -> String {
    let serialized = serde_json::to_string(raw).unwrap_or_default();
    let digest = Sha256::digest(serialized.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub struct RecordMapper<'a> {
    source: &'a SourceConfig,
    offset: FixedOffset,
}

impl<'a> RecordMapper<'a> {
    pub fn new(source: &'a SourceConfig, offset: FixedOffset) -> Self {
        Self { source, offset }
    }

    fn signal(&self, raw: &RawItem) -> u64 {
        let fields = &self.source.fields;
        let flagged = self.source.signal == SignalKind::Importance
            && raw.get("level").and_then(Value::as_str) == Some("important");
        // a zero signal does not mask the level flag
        let n = fields
            .signal
            .first_number(raw)
            .filter(|x| *x > 0.0)
            .or(flagged.then_some(1.0));
        n.unwrap_or(0.0) as u64
    }

    pub fn map(&self, raw: &RawItem, now: DateTime<Utc>) -> CanonicalRecord {
        let fields = &self.source.fields;
        let upstream_id = fields.id.first_text(raw);

        let id = format!(
            "{}_{}",
            self.source.tag,
            upstream_id.clone().unwrap_or_else(|| content_token(raw))
        );
        let time = display_time(fields.time.first_value(raw), now, self.offset);
        let content = fields
            .content
            .first_str(raw)
            .map(normalize_text)
            .unwrap_or_default();
        let url = fields
            .link
            .first_str(raw)
            .map(str::to_string)
            .unwrap_or_else(|| self.source.link_for(upstream_id.as_deref()));

        let signal = Some(self.signal(raw));
        let (read_count, importance) = match self.source.signal {
            SignalKind::ReadCount => (signal, None),
            SignalKind::Importance => (None, signal),
        };

        CanonicalRecord {
            id,
            time,
            content,
            url,
            read_count,
            importance,
            source: self.source.name.clone(),
        }
    }
}

/// Importance of an item regardless of source: numeric `importance`, else 0.
pub fn raw_importance(raw: &RawItem) -> f64 {
    raw.get("importance").and_then(as_number).unwrap_or(0.0)
}
