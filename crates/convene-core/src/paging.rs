//! Paging parameter validation.
//!
//! The two providers page differently: Affinity hands out opaque page tokens
//! (`page_size` + `page_token`, at most 500 per page) while Harmonic uses
//! offsets (`limit` + `offset`, at most 1000 per page). Out-of-range sizes are
//! rejected, never clamped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ProviderId, ValidationError};

/// Largest page a token-paged provider accepts.
pub const TOKEN_PAGE_MAX: u32 = 500;
/// Largest page an offset-paged provider accepts.
pub const OFFSET_PAGE_MAX: u32 = 1000;

/// Paging convention spoken by a provider's collection endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageConvention {
    Token,
    Offset,
}

impl PageConvention {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Offset => "offset",
        }
    }

    pub const fn max_size(self) -> u32 {
        match self {
            Self::Token => TOKEN_PAGE_MAX,
            Self::Offset => OFFSET_PAGE_MAX,
        }
    }

    pub const fn size_key(self) -> &'static str {
        match self {
            Self::Token => "page_size",
            Self::Offset => "limit",
        }
    }

    pub const fn cursor_key(self) -> &'static str {
        match self {
            Self::Token => "page_token",
            Self::Offset => "offset",
        }
    }

    fn check(self, value: i64) -> Result<u32, ValidationError> {
        let max = self.max_size();
        match u32::try_from(value) {
            Ok(size) if (1..=max).contains(&size) => Ok(size),
            _ => Err(match self {
                Self::Token => ValidationError::PageSizeOutOfRange { value, min: 1, max },
                Self::Offset => ValidationError::LimitOutOfRange { value, min: 1, max },
            }),
        }
    }
}

/// Validated paging arguments for one logical operation.
///
/// Only the conventions the caller supplied are present; both may be set when
/// the operation fans out to both providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PagingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl PagingParams {
    pub fn validate(page_size: Option<i64>, limit: Option<i64>) -> Result<Self, ValidationError> {
        let page_size = page_size
            .map(|value| PageConvention::Token.check(value))
            .transpose()?;
        let limit = limit
            .map(|value| PageConvention::Offset.check(value))
            .transpose()?;

        Ok(Self { page_size, limit })
    }

    pub const fn is_empty(&self) -> bool {
        self.page_size.is_none() && self.limit.is_none()
    }

    /// Mapping with exactly the keys that were supplied.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(page_size) = self.page_size {
            map.insert(String::from("page_size"), Value::from(page_size));
        }
        if let Some(limit) = self.limit {
            map.insert(String::from("limit"), Value::from(limit));
        }
        map
    }
}

/// Per-call paging request for a single provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingRequest {
    convention: PageConvention,
    size: u32,
    cursor: Option<String>,
}

impl PagingRequest {
    pub fn token_paged(
        page_size: i64,
        page_token: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            convention: PageConvention::Token,
            size: PageConvention::Token.check(page_size)?,
            cursor: page_token.filter(|token| !token.is_empty()),
        })
    }

    pub fn offset_paged(limit: i64, offset: Option<u64>) -> Result<Self, ValidationError> {
        Ok(Self {
            convention: PageConvention::Offset,
            size: PageConvention::Offset.check(limit)?,
            cursor: offset.map(|offset| offset.to_string()),
        })
    }

    /// Builds a request in whichever convention `provider` speaks.
    ///
    /// For offset-paged providers the cursor must be a decimal offset.
    pub fn for_provider(
        provider: ProviderId,
        size: i64,
        cursor: Option<String>,
    ) -> Result<Self, ValidationError> {
        match provider.page_convention() {
            PageConvention::Token => Self::token_paged(size, cursor),
            PageConvention::Offset => {
                let offset = match cursor {
                    Some(raw) => Some(
                        raw.parse::<u64>()
                            .map_err(|_| ValidationError::InvalidOffset { value: raw.clone() })?,
                    ),
                    None => None,
                };
                Self::offset_paged(size, offset)
            }
        }
    }

    pub const fn convention(&self) -> PageConvention {
        self.convention
    }

    pub const fn size(&self) -> u32 {
        self.size
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Query parameters in the provider's own vocabulary.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(self.convention.size_key(), self.size.to_string())];
        if let Some(cursor) = &self.cursor {
            pairs.push((self.convention.cursor_key(), cursor.clone()));
        }
        pairs
    }
}
