// src/ingest/fields.rs
//! Ordered field-fallback chains over raw upstream items.
//!
//! A value counts as present when it is not null, not `false`, not numeric
//! zero and not a blank string. Every accessor is total: absence is `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ingest::types::RawItem;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldChain(Vec<String>);

fn is_present(v: &Value) -> bool {
    match v {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        _ => true,
    }
}

/// Numbers and numeric strings.
pub fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

impl FieldChain {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First present value of any JSON type.
    pub fn first_value<'a>(&self, item: &'a RawItem) -> Option<&'a Value> {
        self.0
            .iter()
            .filter_map(|k| item.get(k))
            .find(|v| is_present(v))
    }

    /// First present string, trimmed.
    pub fn first_str<'a>(&self, item: &'a RawItem) -> Option<&'a str> {
        self.0
            .iter()
            .filter_map(|k| item.get(k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    /// First present scalar rendered as text (ids arrive as numbers or strings).
    pub fn first_text(&self, item: &RawItem) -> Option<String> {
        self.0.iter().filter_map(|k| item.get(k)).find_map(|v| {
            if !is_present(v) {
                return None;
            }
            match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        })
    }

    /// First value that reads as a number.
    pub fn first_number(&self, item: &RawItem) -> Option<f64> {
        self.0.iter().filter_map(|k| item.get(k)).find_map(as_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(v: Value) -> RawItem {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn first_str_skips_blank_and_missing() {
        let c = FieldChain::new(["content", "title", "brief"]);
        let it = item(json!({"content": "   ", "brief": " third "}));
        assert_eq!(c.first_str(&it), Some("third"));
        assert_eq!(c.first_str(&item(json!({}))), None);
    }

    #[test]
    fn first_text_renders_numeric_ids() {
        let c = FieldChain::new(["id", "newsId"]);
        assert_eq!(c.first_text(&item(json!({"id": 42}))), Some("42".into()));
        assert_eq!(
            c.first_text(&item(json!({"id": null, "newsId": "n-7"}))),
            Some("n-7".into())
        );
        assert_eq!(c.first_text(&item(json!({"id": 0}))), None);
    }

    #[test]
    fn first_number_accepts_numeric_strings() {
        let c = FieldChain::new(["read_count", "readCount", "readNum"]);
        assert_eq!(c.first_number(&item(json!({"readCount": "1200"}))), Some(1200.0));
        assert_eq!(c.first_number(&item(json!({"read_count": "n/a", "readNum": 3}))), Some(3.0));
        assert_eq!(c.first_number(&item(json!({"readNum": true}))), None);
    }

    #[test]
    fn chain_deserializes_from_plain_list() {
        let c: FieldChain = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(c.names(), ["a".to_string(), "b".to_string()]);
    }
}
