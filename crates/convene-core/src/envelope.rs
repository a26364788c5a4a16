use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AccessError, CoreError, ProviderId, UtcDateTime};

/// Top-level keys whose presence signals that another page exists.
pub const CONTINUATION_MARKERS: &[&str] = &[
    "page_token",
    "next_page_token",
    "cursor",
    "next_cursor",
    "next",
    "next_url",
    "next_page_url",
];

/// Failure taxonomy for provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller supplied a malformed or out-of-range argument; no call was made.
    #[serde(rename = "validation_error")]
    Validation,
    /// Connection-level failure or timeout before any response arrived.
    #[serde(rename = "transport_error")]
    Transport,
    /// A response arrived with a non-success status.
    #[serde(rename = "http_error")]
    Http,
    #[serde(rename = "unknown_error")]
    Unknown,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::Transport => "transport_error",
            Self::Http => "http_error",
            Self::Unknown => "unknown_error",
        }
    }

    pub const fn of(error: &AccessError) -> Self {
        match error {
            AccessError::Timeout { .. } | AccessError::Connect { .. } => Self::Transport,
            AccessError::Http { .. } => Self::Http,
            AccessError::Validation(_) => Self::Validation,
            AccessError::Decode { .. } | AccessError::Other { .. } => Self::Unknown,
        }
    }
}

/// Structured failure report for one provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub endpoint: String,
    pub provider: ProviderId,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Provider error body, parsed as JSON when possible, raw text otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_details: Option<Value>,
    pub timestamp: UtcDateTime,
}

impl ErrorInfo {
    pub fn from_access_error(
        error: &AccessError,
        endpoint: impl Into<String>,
        provider: ProviderId,
    ) -> Self {
        let (http_status, reason, provider_details) = match error {
            AccessError::Http {
                status,
                reason,
                body,
            } => (
                Some(*status),
                Some(reason.clone()).filter(|reason| !reason.is_empty()),
                provider_details(body),
            ),
            _ => (None, None, None),
        };

        Self {
            message: error.to_string(),
            endpoint: endpoint.into(),
            provider,
            kind: ErrorKind::of(error),
            http_status,
            reason,
            provider_details,
            timestamp: UtcDateTime::now(),
        }
    }

    /// Whether a caller may reasonably retry with backoff: transport failures,
    /// HTTP 429 and 5xx responses.
    pub fn retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Transport => true,
            ErrorKind::Http => self
                .http_status
                .is_some_and(|status| status == 429 || (500..600).contains(&status)),
            ErrorKind::Validation | ErrorKind::Unknown => false,
        }
    }
}

fn provider_details(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_owned())))
}

/// Size and paging facts derived from a successful payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    /// Element count for array payloads, 1 otherwise.
    pub record_count: usize,
    pub has_more_pages: bool,
    /// Serialized JSON length in bytes. For logging, not correctness.
    pub approximate_size: usize,
}

impl EnvelopeMetadata {
    pub fn describe(payload: &Value) -> Self {
        let record_count = match payload {
            Value::Array(items) => items.len(),
            _ => 1,
        };
        let has_more_pages = payload.as_object().is_some_and(|map| {
            CONTINUATION_MARKERS
                .iter()
                .any(|marker| map.contains_key(*marker))
        });

        Self {
            record_count,
            has_more_pages,
            approximate_size: payload.to_string().len(),
        }
    }
}

/// Uniform wrapper around the outcome of one provider call.
///
/// Exactly one of `data` and `error` is populated; the constructors are the
/// only way to build one and nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    success: bool,
    data: Option<Value>,
    error: Option<ErrorInfo>,
    timestamp: UtcDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<EnvelopeMetadata>,
}

impl ResponseEnvelope {
    pub fn success(payload: Value) -> Self {
        let metadata = EnvelopeMetadata::describe(&payload);
        Self {
            metadata: Some(metadata),
            ..Self::success_without_metadata(payload)
        }
    }

    pub fn success_without_metadata(payload: Value) -> Self {
        Self {
            success: true,
            data: Some(payload),
            error: None,
            timestamp: UtcDateTime::now(),
            metadata: None,
        }
    }

    pub fn failure(error: ErrorInfo) -> Self {
        Self {
            success: false,
            data: None,
            timestamp: error.timestamp,
            error: Some(error),
            metadata: None,
        }
    }

    pub fn from_access_error(
        error: &AccessError,
        endpoint: impl Into<String>,
        provider: ProviderId,
    ) -> Self {
        Self::failure(ErrorInfo::from_access_error(error, endpoint, provider))
    }

    /// Wraps whatever an accessor returned for `endpoint`.
    pub fn from_result(
        result: Result<Value, AccessError>,
        endpoint: impl Into<String>,
        provider: ProviderId,
    ) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(error) => Self::from_access_error(&error, endpoint, provider),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Value> {
        self.data
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub const fn timestamp(&self) -> UtcDateTime {
        self.timestamp
    }

    pub const fn metadata(&self) -> Option<&EnvelopeMetadata> {
        self.metadata.as_ref()
    }

    pub fn to_value(&self) -> Result<Value, CoreError> {
        Ok(serde_json::to_value(self)?)
    }
}
