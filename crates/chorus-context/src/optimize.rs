// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lossy payload shrinking.
//!
//! Recursively drops null values, empty strings, empty arrays and empty
//! objects, truncates long strings and replaces long arrays with
//! `{"sample": [...], "total_count": n}`.

use serde_json::{Map, Value, json};

use crate::render::truncate_chars;

/// Items kept in the `sample` of a summarized array.
const SAMPLE_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    pub max_text_length: usize,
    pub max_collection_items: usize,
}

impl From<&chorus_config::model::ContextConfig> for OptimizeOptions {
    fn from(config: &chorus_config::model::ContextConfig) -> Self {
        Self {
            max_text_length: config.max_text_length,
            max_collection_items: config.max_collection_items,
        }
    }
}

/// Shrink `payload`. Returns `Value::Null` when nothing survives.
pub fn optimize_payload(payload: Value, options: &OptimizeOptions) -> Value {
    optimize_value(payload, options).unwrap_or(Value::Null)
}

fn optimize_value(value: Value, options: &OptimizeOptions) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(Value::String(truncate_chars(&s, options.max_text_length))),
        Value::Array(items) => {
            let total = items.len();
            let kept: Vec<Value> = items
                .into_iter()
                .filter_map(|item| optimize_value(item, options))
                .collect();
            if kept.is_empty() {
                None
            } else if total > options.max_collection_items {
                let sample: Vec<Value> = kept.into_iter().take(SAMPLE_ITEMS).collect();
                Some(json!({ "sample": sample, "total_count": total }))
            } else {
                Some(Value::Array(kept))
            }
        }
        Value::Object(map) => {
            let kept: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| optimize_value(v, options).map(|v| (k, v)))
                .collect();
            (!kept.is_empty()).then_some(Value::Object(kept))
        }
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTS: OptimizeOptions = OptimizeOptions {
        max_text_length: 10,
        max_collection_items: 3,
    };

    #[test]
    fn strips_empty_values_recursively() {
        let input = json!({
            "a": null,
            "b": "",
            "c": [],
            "d": {"e": null, "f": []},
            "g": 0,
            "h": false,
        });
        assert_eq!(optimize_payload(input, &OPTS), json!({"g": 0, "h": false}));
    }

    #[test]
    fn truncates_long_strings() {
        let out = optimize_payload(json!({"text": "abcdefghijklmnop"}), &OPTS);
        assert_eq!(out["text"], "abcdefghij…");
    }

    #[test]
    fn summarizes_large_arrays() {
        let out = optimize_payload(json!({"items": [1, 2, 3, 4, 5, 6, 7]}), &OPTS);
        assert_eq!(out["items"]["total_count"], 7);
        assert_eq!(out["items"]["sample"], json!([1, 2, 3, 4, 5]));
    }

    #[test]
    fn small_arrays_stay_arrays() {
        let out = optimize_payload(json!([1, null, 2]), &OPTS);
        assert_eq!(out, json!([1, 2]));
    }
}
