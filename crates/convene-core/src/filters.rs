//! Ordered filter maps and the canonical → provider key table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical filter keys and the provider field each one is sent as.
///
/// Keys missing from the table pass through under their own name, so callers
/// can already use provider-specific filters the table does not know about.
pub const FILTER_KEY_MAPPINGS: &[(&str, &str)] = &[
    ("company_stage", "stage"),
    ("funding_stage", "funding_stage"),
    ("employee_count_min", "employee_count_min"),
    ("employee_count_max", "employee_count_max"),
    ("founded_year_min", "founded_year_min"),
    ("founded_year_max", "founded_year_max"),
    ("industry", "industry"),
    ("location", "location"),
    ("technology", "technology"),
];

/// Provider field name for a canonical filter key.
pub fn provider_key(key: &str) -> &str {
    FILTER_KEY_MAPPINGS
        .iter()
        .find(|(canonical, _)| *canonical == key)
        .map_or(key, |(_, provider)| *provider)
}

/// Insertion-ordered mapping from filter key to JSON value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(IndexMap<String, Value>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or overwrites `key`. An existing key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Appends every entry of `other`, overwriting values for keys already present.
    pub fn extend(&mut self, other: &FilterSet) {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
    }

    /// Query-string rendering: strings verbatim, other scalars as JSON text, nulls skipped.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (key.clone(), rendered)
            })
            .collect()
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.0
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Self::new();
        for (key, value) in iter {
            filters.insert(key, value);
        }
        filters
    }
}

/// Rewrites canonical keys to provider field names and drops null values.
///
/// When two input keys land on the same provider field, the field stays at the
/// position of its first occurrence and takes the later value.
pub fn map_filters(filters: &FilterSet) -> FilterSet {
    filters
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (provider_key(key), value.clone()))
        .collect()
}
