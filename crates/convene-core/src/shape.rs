//! Classification of heterogeneous provider payload shapes.
//!
//! Providers return bare arrays, objects wrapping an array under a well-known
//! key, or a single object. Everything downstream works on the classified
//! [`PayloadShape`] instead of probing JSON at each call site.

use serde_json::Value;

/// Wrapper keys that hold the entity list of a search/list response, in lookup order.
pub const ENTITY_LIST_KEYS: &[&str] = &["results", "items"];

/// Key under which merged collections and envelopes carry their payload.
pub const DATA_KEY: &str = "data";

/// Borrowed view of the records a payload carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadShape<'a> {
    /// The payload itself is an array.
    Sequence(&'a [Value]),
    /// An object wrapping an array under a recognised key.
    Wrapped(&'a [Value]),
    /// Anything else counts as one record.
    Single(&'a Value),
}

impl<'a> PayloadShape<'a> {
    /// Classification used for merge sources: a bare array, or an object
    /// whose `data` key holds an array or a single record.
    pub fn of_collection(payload: &'a Value) -> Self {
        match payload {
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => match map.get(DATA_KEY) {
                Some(Value::Array(items)) => Self::Wrapped(items),
                Some(record) => Self::Single(record),
                None => Self::Single(payload),
            },
            other => Self::Single(other),
        }
    }

    /// Classification used for id extraction. A top-level `data` wrapper is
    /// unwrapped first, then the payload is tried as an array, then each of
    /// [`ENTITY_LIST_KEYS`], then as one entity.
    pub fn of_entities(payload: &'a Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map.get(DATA_KEY).unwrap_or(payload),
            other => other,
        };

        match payload {
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => ENTITY_LIST_KEYS
                .iter()
                .find_map(|key| match map.get(*key) {
                    Some(Value::Array(items)) => Some(Self::Wrapped(items.as_slice())),
                    _ => None,
                })
                .unwrap_or(Self::Single(payload)),
            other => Self::Single(other),
        }
    }

    pub fn records(self) -> &'a [Value] {
        match self {
            Self::Sequence(items) | Self::Wrapped(items) => items,
            Self::Single(record) => std::slice::from_ref(record),
        }
    }

    pub fn len(self) -> usize {
        self.records().len()
    }

    pub fn is_empty(self) -> bool {
        self.records().is_empty()
    }
}
