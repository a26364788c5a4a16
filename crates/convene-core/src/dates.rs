//! Interaction date range resolution.
//!
//! A start expression is either an ISO-8601 date/time, passed through as-is,
//! or a relative shorthand `<N>d`, `<N>m` (30 days) or `<N>y` (365 days)
//! counted back from the instant of resolution. Resolving the same shorthand
//! twice at different instants yields different starts: the window rolls.
//! Use [`DateRange::resolve_at`] to pin several resolutions to one instant.

use serde::Serialize;
use time::Duration;

use crate::{FilterSet, UtcDateTime, ValidationError};

pub const MIN_INTERACTION_DATE: &str = "min_interaction_date";
pub const MAX_INTERACTION_DATE: &str = "max_interaction_date";

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelativeUnit {
    Days,
    Months,
    Years,
}

impl RelativeUnit {
    fn from_suffix(suffix: char) -> Option<Self> {
        match suffix {
            'd' => Some(Self::Days),
            'm' => Some(Self::Months),
            'y' => Some(Self::Years),
            _ => None,
        }
    }

    const fn days(self) -> i64 {
        match self {
            Self::Days => 1,
            Self::Months => 30,
            Self::Years => 365,
        }
    }
}

/// Resolved interaction window. Either side may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    /// Resolves against the current instant.
    pub fn resolve(start: Option<&str>, end: Option<&str>) -> Result<Self, ValidationError> {
        Self::resolve_at(start, end, UtcDateTime::now())
    }

    /// Resolves relative expressions against `reference` instead of now.
    pub fn resolve_at(
        start: Option<&str>,
        end: Option<&str>,
        reference: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        let start = start
            .filter(|expr| !expr.is_empty())
            .map(|expr| resolve_start(expr, reference))
            .transpose()?;

        let end = end
            .filter(|expr| !expr.is_empty())
            .map(|expr| {
                if looks_like_iso8601(expr) {
                    Ok(expr.to_owned())
                } else {
                    Err(ValidationError::InvalidDateExpression {
                        value: expr.to_owned(),
                    })
                }
            })
            .transpose()?;

        Ok(Self { start, end })
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Filter entries under the canonical interaction-date keys.
    pub fn to_filters(&self) -> FilterSet {
        let mut filters = FilterSet::new();
        if let Some(start) = &self.start {
            filters.insert(MIN_INTERACTION_DATE, start.as_str());
        }
        if let Some(end) = &self.end {
            filters.insert(MAX_INTERACTION_DATE, end.as_str());
        }
        filters
    }
}

fn resolve_start(expr: &str, reference: UtcDateTime) -> Result<String, ValidationError> {
    if looks_like_iso8601(expr) {
        return Ok(expr.to_owned());
    }

    let invalid = || ValidationError::InvalidRelativeDate {
        value: expr.to_owned(),
    };
    let out_of_range = || ValidationError::DateOutOfRange {
        value: expr.to_owned(),
    };

    let suffix = expr.chars().last().ok_or_else(invalid)?;
    let unit = RelativeUnit::from_suffix(suffix).ok_or_else(invalid)?;
    let digits = &expr[..expr.len() - suffix.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(invalid());
    }

    let count = digits.parse::<i64>().map_err(|_| out_of_range())?;
    let seconds = count
        .checked_mul(unit.days())
        .and_then(|days| days.checked_mul(SECONDS_PER_DAY))
        .ok_or_else(out_of_range)?;

    reference
        .checked_sub(Duration::seconds(seconds))
        .ok_or_else(out_of_range)?
        .try_format_rfc3339()
        .map_err(|_| out_of_range())
}

/// Basic shape check only: a `YYYY-MM-DD` prefix. The provider is authoritative
/// on calendar validity.
fn looks_like_iso8601(expr: &str) -> bool {
    let bytes = expr.as_bytes();
    if bytes.len() < 10 {
        return false;
    }

    bytes[..10].iter().enumerate().all(|(index, byte)| match index {
        4 | 7 => *byte == b'-',
        _ => byte.is_ascii_digit(),
    })
}
