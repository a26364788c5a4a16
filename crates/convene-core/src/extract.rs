use serde_json::Value;

use crate::{PayloadShape, ResponseEnvelope};

/// Pulls the `field` value out of every entity in `payload`, in order.
///
/// Entities lacking the field (or holding `null`) are skipped. Strings are
/// returned verbatim; other values are rendered as JSON text, so `42` becomes `"42"`.
pub fn extract_entity_ids(payload: &Value, field: &str) -> Vec<String> {
    PayloadShape::of_entities(payload)
        .records()
        .iter()
        .filter_map(|entity| entity.as_object()?.get(field))
        .filter_map(coerce_id)
        .collect()
}

/// Same as [`extract_entity_ids`] over a successful envelope; failed envelopes yield nothing.
pub fn extract_envelope_ids(envelope: &ResponseEnvelope, field: &str) -> Vec<String> {
    envelope
        .data()
        .map(|payload| extract_entity_ids(payload, field))
        .unwrap_or_default()
}

fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
