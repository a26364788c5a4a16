//! Merging of result collections from several calls or providers.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{ErrorInfo, PayloadShape, ResponseEnvelope, UtcDateTime, ValidationError};

/// Records from every source, concatenated in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedCollection {
    pub items: Vec<Value>,
    pub source_count: usize,
    pub total_records: usize,
    pub timestamp: UtcDateTime,
    /// Failures carried over from envelopes that had no data to contribute.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorInfo>,
}

/// Concatenates collections and optionally drops repeated entities.
///
/// Without a dedup key nothing is dropped. With one, the first record seen for
/// each key value wins (earliest source, then earliest position). Records that
/// lack the key or hold `null` for it are always kept. Key values compare as
/// exact JSON, so `1` and `"1"` are different entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMerger {
    dedup_key: Option<String>,
}

impl ResponseMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dedup_key(mut self, key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ValidationError::EmptyDedupKey);
        }
        self.dedup_key = Some(key);
        Ok(self)
    }

    pub fn dedup_key(&self) -> Option<&str> {
        self.dedup_key.as_deref()
    }

    pub fn merge<'a, I>(&self, sources: I) -> MergedCollection
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut source_count = 0;
        let mut concatenated = Vec::new();
        for source in sources {
            source_count += 1;
            concatenated.extend(PayloadShape::of_collection(source).records().iter().cloned());
        }

        self.finish(concatenated, source_count, Vec::new())
    }

    /// Merges the payloads of successful envelopes. Failed envelopes still
    /// count as sources and surface their [`ErrorInfo`] in `errors`.
    pub fn merge_envelopes<'a, I>(&self, envelopes: I) -> MergedCollection
    where
        I: IntoIterator<Item = &'a ResponseEnvelope>,
    {
        let mut source_count = 0;
        let mut concatenated = Vec::new();
        let mut errors = Vec::new();
        for envelope in envelopes {
            source_count += 1;
            match (envelope.data(), envelope.error()) {
                (Some(payload), _) => concatenated
                    .extend(PayloadShape::of_collection(payload).records().iter().cloned()),
                (None, Some(error)) => {
                    warn!(
                        endpoint = %error.endpoint,
                        provider = %error.provider,
                        kind = error.kind.as_str(),
                        "skipping failed envelope during merge"
                    );
                    errors.push(error.clone());
                }
                (None, None) => {}
            }
        }

        self.finish(concatenated, source_count, errors)
    }

    fn finish(
        &self,
        concatenated: Vec<Value>,
        source_count: usize,
        errors: Vec<ErrorInfo>,
    ) -> MergedCollection {
        let before = concatenated.len();
        let items = match &self.dedup_key {
            Some(key) => dedup_first_seen(concatenated, key),
            None => concatenated,
        };

        debug!(
            source_count,
            records_in = before,
            records_out = items.len(),
            dedup_key = self.dedup_key.as_deref().unwrap_or(""),
            "merged collections"
        );

        MergedCollection {
            total_records: items.len(),
            items,
            source_count,
            timestamp: UtcDateTime::now(),
            errors,
        }
    }
}

/// Merges bare collections with an optional dedup key.
pub fn merge_responses(
    sources: &[Value],
    dedup_key: Option<&str>,
) -> Result<MergedCollection, ValidationError> {
    let merger = match dedup_key {
        Some(key) => ResponseMerger::new().with_dedup_key(key)?,
        None => ResponseMerger::new(),
    };
    Ok(merger.merge(sources))
}

fn dedup_first_seen(records: Vec<Value>, key: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| match record.get(key) {
            None | Some(Value::Null) => true,
            Some(value) => seen.insert(value.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccessError, ProviderId};
    use serde_json::json;

    #[test]
    fn overlapping_sources_dedup_to_first_seen() {
        let a = json!([{ "id": 1 }, { "id": 2 }]);
        let b = json!([{ "id": 2 }, { "id": 3 }]);

        let merged = merge_responses(&[a, b], Some("id")).expect("valid key");

        assert_eq!(
            merged.items,
            vec![json!({ "id": 1 }), json!({ "id": 2 }), json!({ "id": 3 })]
        );
        assert_eq!(merged.total_records, 3);
        assert_eq!(merged.source_count, 2);
    }

    #[test]
    fn no_dedup_key_keeps_every_record() {
        let a = json!([{ "id": 1 }, { "id": 1 }]);
        let b = json!({ "data": [{ "id": 1 }] });
        let c = json!({ "id": 1 });

        let merged = ResponseMerger::new().merge([&a, &b, &c]);

        assert_eq!(merged.total_records, 4);
        assert_eq!(merged.items.len(), 4);
    }

    #[test]
    fn data_wrapping_a_single_record_counts_once() {
        let single = json!({ "data": { "id": "a" }, "success": true });
        let merged = ResponseMerger::new().merge([&single]);
        assert_eq!(merged.items, vec![json!({ "id": "a" })]);
    }

    #[test]
    fn dedup_key_values_compare_as_exact_json() {
        let a = json!([{ "id": 1 }, { "id": "1" }, { "name": "keyless" }, { "name": "keyless" }]);

        let merged = merge_responses(&[a], Some("id")).expect("valid key");

        assert_eq!(merged.total_records, 4);
    }

    #[test]
    fn null_dedup_key_counts_as_missing() {
        let a = json!([{ "id": null, "n": 1 }, { "id": null, "n": 2 }, { "id": 3 }, { "id": 3 }]);

        let merged = merge_responses(&[a], Some("id")).expect("valid key");

        assert_eq!(
            merged.items,
            vec![json!({ "id": null, "n": 1 }), json!({ "id": null, "n": 2 }), json!({ "id": 3 })]
        );
    }

    #[test]
    fn surviving_duplicate_comes_from_earliest_source() {
        let a = json!([{ "id": 5, "from": "a" }]);
        let b = json!([{ "id": 5, "from": "b" }, { "id": 6, "from": "b" }]);

        let merged = merge_responses(&[a, b], Some("id")).expect("valid key");

        assert_eq!(merged.items[0]["from"], json!("a"));
        assert_eq!(merged.total_records, 2);
    }

    #[test]
    fn empty_dedup_key_is_rejected() {
        let err = ResponseMerger::new().with_dedup_key("").expect_err("must fail");
        assert_eq!(err, ValidationError::EmptyDedupKey);
    }

    #[test]
    fn failed_envelopes_surface_as_errors() {
        let ok = ResponseEnvelope::success(json!([{ "id": 1 }]));
        let failed = ResponseEnvelope::from_access_error(
            &AccessError::http(500, "Internal Server Error", ""),
            "companies/2",
            ProviderId::Harmonic,
        );

        let merged = ResponseMerger::new().merge_envelopes([&ok, &failed]);

        assert_eq!(merged.source_count, 2);
        assert_eq!(merged.total_records, 1);
        assert_eq!(merged.errors.len(), 1);
        assert_eq!(merged.errors[0].endpoint, "companies/2");
    }

    #[test]
    fn no_sources_yield_empty_collection() {
        let merged = ResponseMerger::new().merge(std::iter::empty::<&Value>());
        assert_eq!(merged.source_count, 0);
        assert!(merged.items.is_empty());
    }
}
