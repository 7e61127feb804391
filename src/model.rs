//! Poem, poet and category value types as served by the poetry API.
//!
//! Field names follow the API's camelCase JSON. Deduplication treats two
//! poems as the same entry when their `id` matches, regardless of content.

use serde::{Deserialize, Serialize};

/// A single poem with its embedded poet and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poem {
    pub id: i64,
    pub title: String,
    pub url_slug: String,
    pub plain_text: String,
    pub html_text: String,
    pub poet: Poet,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poet {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
}

impl Poet {
    /// Poet used when a response carries no usable poet object.
    pub fn unknown() -> Self {
        Self {
            id: 0,
            name: "Unknown".to_string(),
            description: None,
            birth_year: None,
            death_year: None,
        }
    }
}

/// Poem category. `parent_id` links categories into a tree that the feed
/// never walks; it is carried as opaque metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub url_slug: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl Category {
    pub fn unknown() -> Self {
        Self {
            id: 0,
            title: "Unknown".to_string(),
            url_slug: String::new(),
            parent_id: None,
        }
    }
}
