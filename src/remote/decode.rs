//! Tolerant decoding of poem responses.
//!
//! The API is not consistent about response shapes. A single poem may come
//! back bare, wrapped in `{"poem": ...}`, or with fields missing or renamed.
//! Decoding runs an ordered chain of independent attempts and takes the first
//! that succeeds:
//!
//! 1. strict: the body is exactly a [`Poem`]
//! 2. wrapper: the body is `{"poem": ...}` (inner value strict, then lenient)
//! 3. lenient: field-by-field extraction with defaults
//!
//! List endpoints accept a bare array, `{"poems": [...]}`, or a single poem.
//! Items that fail every attempt are dropped; they never fail the batch.

use crate::model::{Category, Poem, Poet};
use crate::util::paragraph_html;
use rand::Rng;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::ops::Range;

/// Ids assigned to poems that arrive without one. Kept far above the id
/// space of the real archive so placeholders never shadow real poems.
pub const PLACEHOLDER_ID_RANGE: Range<i64> = 1_000_000..2_000_000;

type Attempt = fn(&Value) -> Option<Poem>;

const DECODE_CHAIN: [Attempt; 3] = [strict, wrapped, lenient];

/// Decode a single-poem response body.
pub fn decode_poem(bytes: &[u8]) -> Option<Poem> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => poem_from_value(&value),
        Err(e) => {
            tracing::debug!(error = %e, "Poem response is not JSON");
            None
        }
    }
}

/// Decode a list response body. Never fails; undecodable items are skipped.
pub fn decode_poem_list(bytes: &[u8]) -> Vec<Poem> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Poem list response is not JSON");
            return Vec::new();
        }
    };

    let items: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("poems") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![&value],
        },
        _ => Vec::new(),
    };

    let total = items.len();
    let poems: Vec<Poem> = items.into_iter().filter_map(poem_from_value).collect();
    if poems.len() < total {
        tracing::debug!(
            total = total,
            skipped = total - poems.len(),
            "Dropped undecodable poems from list response"
        );
    }
    poems
}

/// Run the decode chain against an already-parsed value.
pub fn poem_from_value(value: &Value) -> Option<Poem> {
    DECODE_CHAIN.iter().find_map(|attempt| attempt(value))
}

fn strict(value: &Value) -> Option<Poem> {
    Poem::deserialize(value).ok()
}

fn wrapped(value: &Value) -> Option<Poem> {
    let inner = value.get("poem")?;
    strict(inner).or_else(|| lenient(inner))
}

fn lenient(value: &Value) -> Option<Poem> {
    let obj = value.as_object()?;

    // An object with no text at all is an error body or metadata, not a poem
    let plain_text = extract_text(obj)?;

    let id = obj
        .get("id")
        .and_then(as_i64)
        .unwrap_or_else(|| rand::thread_rng().gen_range(PLACEHOLDER_ID_RANGE));
    let title = first_str(obj, &["title", "fullTitle"])
        .unwrap_or("Untitled")
        .to_string();
    let url_slug = first_str(obj, &["urlSlug", "fullUrl"])
        .unwrap_or_default()
        .to_string();
    let html_text = first_str(obj, &["htmlText"])
        .map(str::to_string)
        .unwrap_or_else(|| paragraph_html(&plain_text));

    // Archive-style responses nest poet and category under `category`
    let nested = obj.get("category").and_then(Value::as_object);
    let poet = obj
        .get("poet")
        .or_else(|| nested.and_then(|c| c.get("poet")))
        .and_then(Value::as_object)
        .map(lenient_poet)
        .unwrap_or_else(Poet::unknown);
    let category = nested
        .map(|c| c.get("cat").and_then(Value::as_object).unwrap_or(c))
        .map(lenient_category)
        .unwrap_or_else(Category::unknown);

    Some(Poem {
        id,
        title,
        url_slug,
        plain_text,
        html_text,
        poet,
        category,
    })
}

/// `plainText`, else the joined verse lines, else a generic body field.
fn extract_text(obj: &Map<String, Value>) -> Option<String> {
    if let Some(text) = first_str(obj, &["plainText"]).filter(|t| !t.trim().is_empty()) {
        return Some(text.to_string());
    }

    if let Some(Value::Array(verses)) = obj.get("verses") {
        let lines: Vec<&str> = verses
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.as_str()),
                Value::Object(verse) => first_str(verse, &["text", "plainText"]),
                _ => None,
            })
            .collect();
        if !lines.is_empty() {
            return Some(lines.join("\n"));
        }
    }

    first_str(obj, &["body", "text", "content"])
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
}

fn lenient_poet(obj: &Map<String, Value>) -> Poet {
    Poet {
        id: obj.get("id").and_then(as_i64).unwrap_or(0),
        name: first_str(obj, &["name", "nickname"])
            .unwrap_or("Unknown")
            .to_string(),
        description: first_str(obj, &["description"]).map(str::to_string),
        birth_year: obj.get("birthYear").and_then(as_i32),
        death_year: obj.get("deathYear").and_then(as_i32),
    }
}

fn lenient_category(obj: &Map<String, Value>) -> Category {
    Category {
        id: obj.get("id").and_then(as_i64).unwrap_or(0),
        title: first_str(obj, &["title"]).unwrap_or("Unknown").to_string(),
        url_slug: first_str(obj, &["urlSlug", "fullUrl"])
            .unwrap_or_default()
            .to_string(),
        parent_id: obj.get("parentId").and_then(as_i64),
    }
}

fn first_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
}

/// Accepts JSON numbers and numeric strings.
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_i32(value: &Value) -> Option<i32> {
    as_i64(value).and_then(|n| i32::try_from(n).ok())
}
