use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::paging::PageConvention;
use crate::ValidationError;

/// Canonical provider identifiers used in envelopes and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Relationship/CRM data.
    Affinity,
    /// Company and people intelligence.
    Harmonic,
}

impl ProviderId {
    pub const ALL: [Self; 2] = [Self::Affinity, Self::Harmonic];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Affinity => "affinity",
            Self::Harmonic => "harmonic",
        }
    }

    /// Paging convention the provider's collection endpoints speak.
    pub const fn page_convention(self) -> PageConvention {
        match self {
            Self::Affinity => PageConvention::Token,
            Self::Harmonic => PageConvention::Offset,
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "affinity" => Ok(Self::Affinity),
            "harmonic" => Ok(Self::Harmonic),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Affinity".parse::<ProviderId>(), Ok(ProviderId::Affinity));
        assert_eq!(" harmonic ".parse::<ProviderId>(), Ok(ProviderId::Harmonic));
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = "crunchbase".parse::<ProviderId>().expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidProvider { .. }));
    }

    #[test]
    fn each_provider_has_its_own_paging_convention() {
        assert_eq!(ProviderId::Affinity.page_convention(), PageConvention::Token);
        assert_eq!(ProviderId::Harmonic.page_convention(), PageConvention::Offset);
    }
}
