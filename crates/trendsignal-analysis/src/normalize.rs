//! Total coercion from generic JSON into typed records.
//!
//! Every function here accepts any [`Value`] and returns a record; nothing
//! fails. Missing fields, wrong types and unknown enum values resolve to the
//! defaults documented on each record type. An object standing in for an
//! array (`{"0": {...}, "1": {...}}`) is flattened to its values.

use serde_json::{Map, Value};
use trendsignal_core::{
    Confidence, CreatorAdvice, EmotionalTone, StrengthEstimate, TopicRecord, TrendStrength,
    VideoRecord, MAX_HOOKS,
};

/// Normalizes the extract stage output (`{"videos": [...]}`).
///
/// A bare top-level array is accepted as the video list itself. Items that
/// are not objects are dropped.
#[must_use]
pub fn normalize_videos(value: &Value) -> Vec<VideoRecord> {
    record_items(value, "videos")
        .into_iter()
        .filter_map(|item| item.as_object().map(normalize_video))
        .collect()
}

/// Normalizes one video object.
#[must_use]
pub fn normalize_video(obj: &Map<String, Value>) -> VideoRecord {
    let emotional_tone = obj
        .get("emotional_tone")
        .and_then(Value::as_str)
        .map(EmotionalTone::from_loose)
        .unwrap_or_default();

    VideoRecord {
        title: coerce_string(obj.get("title")),
        creator: coerce_string(obj.get("creator")),
        views: coerce_count(obj.get("views")),
        hours_since_posted: coerce_count(obj.get("hours_since_posted")),
        emotional_tone,
    }
}

/// Normalizes the topic detection output (`{"topics": [...]}`).
///
/// Order is preserved exactly; the first element is treated downstream as
/// the dominant topic. A bare string item becomes a topic with that name and
/// a zero count. Other non-object items are dropped.
#[must_use]
pub fn normalize_topics(value: &Value) -> Vec<TopicRecord> {
    record_items(value, "topics")
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(TopicRecord {
                topic_name: coerce_string(obj.get("topic_name")),
                video_count: coerce_count(obj.get("video_count")),
            }),
            Value::String(name) => Some(TopicRecord {
                topic_name: name.clone(),
                video_count: 0,
            }),
            _ => None,
        })
        .collect()
}

/// Normalizes the strength estimate output.
#[must_use]
pub fn normalize_strength(value: &Value) -> StrengthEstimate {
    let Some(obj) = value.as_object() else {
        return StrengthEstimate::default();
    };

    StrengthEstimate {
        trend_strength: obj
            .get("trend_strength")
            .and_then(Value::as_str)
            .map(TrendStrength::from_loose)
            .unwrap_or_default(),
        confidence: obj
            .get("confidence")
            .and_then(Value::as_str)
            .map(Confidence::from_loose)
            .unwrap_or_default(),
    }
}

/// Normalizes the creator advice output.
#[must_use]
pub fn normalize_advice(value: &Value) -> CreatorAdvice {
    let Some(obj) = value.as_object() else {
        return CreatorAdvice::default();
    };

    CreatorAdvice {
        why_trending: coerce_string(obj.get("why_trending")),
        who_is_winning: coerce_string(obj.get("who_is_winning")),
        posting_advice: coerce_string(obj.get("posting_advice")),
        hooks: normalize_hooks(obj.get("hooks")),
    }
}

/// Coerces a hooks field into at most [`MAX_HOOKS`] plain strings.
///
/// - a single string is split into non-empty trimmed lines;
/// - an array (or object-as-array) keeps its first items in order, taking
///   the `text` or `hook` field of object items and stringifying the rest;
/// - anything else yields no hooks.
#[must_use]
pub fn normalize_hooks(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(text)) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(MAX_HOOKS)
            .map(ToOwned::to_owned)
            .collect(),
        Some(seq @ (Value::Array(_) | Value::Object(_))) => sequence_items(seq)
            .into_iter()
            .take(MAX_HOOKS)
            .map(hook_text)
            .collect(),
        _ => Vec::new(),
    }
}

fn hook_text(item: &Value) -> String {
    if let Value::Object(obj) = item {
        for key in ["text", "hook"] {
            let text = coerce_string(obj.get(key));
            if !text.trim().is_empty() {
                return text.trim().to_string();
            }
        }
    }
    coerce_string(Some(item)).trim().to_string()
}

/// Coerces any JSON value into display text.
///
/// Missing and `null` become `""`; strings pass through; other scalars use
/// their JSON rendering; arrays and objects are serialized compactly.
#[must_use]
pub fn coerce_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Coerces a JSON number into a non-negative integer. Anything else is `0`.
///
/// Fractions truncate toward zero; negatives clamp to zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_count(value: Option<&Value>) -> u64 {
    let Some(Value::Number(n)) = value else {
        return 0;
    };
    if let Some(v) = n.as_u64() {
        return v;
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f > 0.0 => f as u64,
        _ => 0,
    }
}

/// Returns the items under `key` of a record envelope, or the value itself
/// when the model skipped the envelope and returned a bare array.
///
/// Array items that are themselves envelopes holding `key` (back-to-back
/// envelopes joined by the repair pass) contribute their items in order.
fn record_items<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    match value {
        Value::Object(obj) => obj.get(key).map(sequence_items).unwrap_or_default(),
        Value::Array(items) => items
            .iter()
            .flat_map(|item| match item.as_object().and_then(|obj| obj.get(key)) {
                Some(inner) => sequence_items(inner),
                None => vec![item],
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Arrays yield their items; objects yield their values in document order.
fn sequence_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => obj.values().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
