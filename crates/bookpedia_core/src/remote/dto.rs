//! Wire payloads of the book search API.
//!
//! # Invariants
//! - Unknown JSON fields are ignored.
//! - A work `description` arrives either as a bare string or as
//!   `{ "type": ..., "value": string }`; both decode into one optional string.

use serde::{Deserialize, Deserializer};

/// Search endpoint response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResponseDto {
    #[serde(rename = "docs")]
    pub results: Vec<SearchedBookDto>,
}

/// One entry of a search response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchedBookDto {
    /// Work key, e.g. `/works/OL45804W`.
    #[serde(rename = "key", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "language", default)]
    pub languages: Vec<String>,
    #[serde(rename = "cover_i")]
    pub cover_alternative_key: Option<i64>,
    #[serde(rename = "author_key", default)]
    pub author_keys: Vec<String>,
    #[serde(rename = "author_name", default)]
    pub author_names: Vec<String>,
    #[serde(rename = "cover_edition_key")]
    pub cover_key: Option<String>,
    pub first_publish_year: Option<i32>,
    pub ratings_average: Option<f64>,
    pub ratings_count: Option<u32>,
    #[serde(rename = "number_of_pages_median")]
    pub num_pages_median: Option<u32>,
    #[serde(rename = "edition_count", default)]
    pub num_editions: u32,
}

/// Work detail endpoint response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookWorkDto {
    #[serde(default, deserialize_with = "deserialize_description")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptionShape {
    Text(String),
    Structured { value: String },
    Other(serde_json::Value),
}

fn deserialize_description<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let shape = Option::<DescriptionShape>::deserialize(deserializer)?;
    Ok(match shape {
        Some(DescriptionShape::Text(text)) => Some(text),
        Some(DescriptionShape::Structured { value }) => Some(value),
        Some(DescriptionShape::Other(_)) | None => None,
    })
}
