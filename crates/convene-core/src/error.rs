use thiserror::Error;

/// Caller-input errors. These never reach the network and are never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("page_size must be between {min} and {max}, got {value}")]
    PageSizeOutOfRange { value: i64, min: u32, max: u32 },
    #[error("limit must be between {min} and {max}, got {value}")]
    LimitOutOfRange { value: i64, min: u32, max: u32 },
    #[error("offset must be a non-negative integer: '{value}'")]
    InvalidOffset { value: String },

    #[error("invalid relative date '{value}', expected <N>d, <N>m or <N>y")]
    InvalidRelativeDate { value: String },
    #[error("date '{value}' is not an ISO-8601 date")]
    InvalidDateExpression { value: String },
    #[error("relative date '{value}' resolves outside the supported range")]
    DateOutOfRange { value: String },
    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("invalid provider '{value}', expected one of affinity, harmonic")]
    InvalidProvider { value: String },
    #[error("{provider} collections are {expected}-paged")]
    PagingConventionMismatch {
        provider: String,
        expected: &'static str,
    },
    #[error("resource '{resource}' does not belong to {provider}")]
    ResourceProviderMismatch { resource: String, provider: String },
    #[error("entity id cannot be empty")]
    EmptyEntityId,

    #[error("batch size must be greater than zero")]
    ZeroBatchSize,
    #[error("dedup key cannot be empty")]
    EmptyDedupKey,
}

/// Failure characteristics reported by a provider accessor.
///
/// The variant alone decides how the failure is classified in an
/// [`ErrorInfo`](crate::ErrorInfo); endpoint strings are never inspected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("request timed out: {message}")]
    Timeout { message: String },
    #[error("connection failed: {message}")]
    Connect { message: String },
    #[error("HTTP {status} {reason}")]
    Http {
        status: u16,
        reason: String,
        body: String,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to decode provider response: {message}")]
    Decode { message: String },
    #[error("{message}")]
    Other { message: String },
}

impl AccessError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    pub fn http(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connect { .. })
    }
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
