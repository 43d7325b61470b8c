//! Free-text search scoring and highlighting.
//!
//! Matching is case-insensitive. A field scores [`EXACT_SCORE`] when its whole
//! text equals the query, [`PREFIX_SCORE`] when it starts with it and
//! [`SUBSTRING_SCORE`] when the query occurs anywhere else. An item scores the
//! best of its searched fields.

use serde::{Deserialize, Serialize};

use super::fields::FieldTable;

pub const EXACT_SCORE: f64 = 1.0;
pub const PREFIX_SCORE: f64 = 0.7;
pub const SUBSTRING_SCORE: f64 = 0.4;

/// Free-text search over a restricted set of fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Fields to search; empty means the entity's default searchable fields
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            fields: Vec::new(),
            max_results: None,
        }
    }

    #[must_use]
    pub fn in_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(ToString::to_string).collect();
        self
    }

    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// A matched span inside a field, in char offsets (`end` exclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub field: String,
    pub start: usize,
    pub end: usize,
    pub fragment: String,
}

/// Relevance metadata for one returned item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub score: f64,
    pub highlights: Vec<Highlight>,
}

impl SearchResult {
    pub fn is_match(&self) -> bool {
        self.score > 0.0
    }
}

/// Pre-folded query applied to every candidate item.
pub(crate) struct SearchMatcher<'a> {
    needle: Vec<char>,
    fields: Vec<&'a str>,
}

impl<'a> SearchMatcher<'a> {
    /// Returns `None` when the request has nothing to search for.
    pub(crate) fn new<T>(request: &'a SearchRequest, table: &FieldTable<T>) -> Option<Self> {
        if request.is_blank() {
            return None;
        }
        let fields: Vec<&'a str> = if request.fields.is_empty() {
            table.default_search_fields()
        } else {
            request.fields.iter().map(String::as_str).collect()
        };
        Some(Self {
            needle: fold(request.query.trim()),
            fields,
        })
    }

    pub(crate) fn score<T>(&self, table: &FieldTable<T>, item: &T) -> SearchResult {
        let mut result = SearchResult::default();
        for field in &self.fields {
            let Some(value) = table.get(item, field) else {
                continue;
            };
            let Some(text) = value.as_text() else {
                continue;
            };
            let original: Vec<char> = text.chars().collect();
            let haystack = fold(text);
            let positions = occurrences(&haystack, &self.needle);
            let Some(&first) = positions.first() else {
                continue;
            };

            let field_score = if first == 0 && haystack.len() == self.needle.len() {
                EXACT_SCORE
            } else if first == 0 {
                PREFIX_SCORE
            } else {
                SUBSTRING_SCORE
            };
            result.score = result.score.max(field_score);

            for start in positions {
                let end = start + self.needle.len();
                result.highlights.push(Highlight {
                    field: (*field).to_string(),
                    start,
                    end,
                    fragment: original[start..end].iter().collect(),
                });
            }
        }
        result
    }
}

/// Lower-cases char by char so offsets stay aligned with the original text.
fn fold(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Start offsets of non-overlapping occurrences of `needle` in `haystack`.
fn occurrences(haystack: &[char], needle: &[char]) -> Vec<usize> {
    let mut found = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return found;
    }
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()] == *needle {
            found.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    found
}
