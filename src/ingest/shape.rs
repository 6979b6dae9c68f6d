// src/ingest/shape.rs
//! Locate the item list inside an upstream envelope of unknown shape.
//!
//! `SHAPE_RULES` is tried top to bottom and the first rule whose shape
//! exists wins, even when the list it finds is empty. Supporting a new
//! upstream envelope means adding a row here.

use serde_json::{Map, Value};

use crate::ingest::types::{RawItem, RawPayload};

/// Where a rule found the items.
pub enum Matched<'a> {
    Array(&'a [Value]),
    Values(&'a Map<String, Value>),
}

pub type Extractor = for<'a> fn(&'a Value) -> Option<Matched<'a>>;

pub const SHAPE_RULES: &[(&str, Extractor)] = &[
    ("rolling_data", rolling_data),
    ("top_level_array", top_level_array),
    ("data_array", data_array),
    ("items", items_key),
    ("list", list_key),
    ("object_of_objects", object_of_objects),
];

fn array_at<'a>(v: &'a Value, pointer: &str) -> Option<Matched<'a>> {
    v.pointer(pointer)
        .and_then(Value::as_array)
        .map(|a| Matched::Array(a.as_slice()))
}

fn rolling_data(v: &Value) -> Option<Matched<'_>> {
    array_at(v, "/data/roll_data")
}

fn top_level_array(v: &Value) -> Option<Matched<'_>> {
    v.as_array().map(|a| Matched::Array(a.as_slice()))
}

fn data_array(v: &Value) -> Option<Matched<'_>> {
    array_at(v, "/data")
}

fn items_key(v: &Value) -> Option<Matched<'_>> {
    array_at(v, "/data/items").or_else(|| array_at(v, "/items"))
}

fn list_key(v: &Value) -> Option<Matched<'_>> {
    array_at(v, "/data/list").or_else(|| array_at(v, "/list"))
}

fn object_of_objects(v: &Value) -> Option<Matched<'_>> {
    [v.get("data"), Some(v)]
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .find(|m| !m.is_empty() && m.values().all(Value::is_object))
        .map(Matched::Values)
}

/// Name of the first rule matching `v`, if any.
pub fn matching_rule(v: &Value) -> Option<(&'static str, Matched<'_>)> {
    SHAPE_RULES
        .iter()
        .find_map(|(name, rule)| rule(v).map(|m| (*name, m)))
}

/// Items of the payload; empty when no rule matches or the payload is text.
pub fn extract_items(payload: &RawPayload) -> Vec<RawItem> {
    let RawPayload::Json(v) = payload else {
        return Vec::new();
    };

    match matching_rule(v) {
        Some((name, matched)) => {
            let items: Vec<RawItem> = match matched {
                Matched::Array(a) => a.iter().filter_map(Value::as_object).cloned().collect(),
                Matched::Values(m) => m.values().filter_map(Value::as_object).cloned().collect(),
            };
            tracing::debug!(target: "news", rule = name, count = items.len(), "payload shape matched");
            items
        }
        None => {
            let preview: String = v.to_string().chars().take(200).collect();
            tracing::debug!(target: "news", %preview, "no payload shape matched");
            Vec::new()
        }
    }
}
