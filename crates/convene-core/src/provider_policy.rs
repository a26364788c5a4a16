use std::time::Duration;

use crate::ProviderId;

/// Call-shaping defaults for batch lookups against one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub batch_size: usize,
    pub max_concurrency: usize,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub retry_backoff: BackoffPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_retries: u32,
}

impl ProviderPolicy {
    pub fn affinity_default() -> Self {
        Self {
            provider_id: ProviderId::Affinity,
            batch_size: 50,
            max_concurrency: 5,
            quota_window: Duration::from_secs(60),
            quota_limit: 900,
            retry_backoff: BackoffPolicy {
                initial_delay: Duration::from_millis(250),
                max_delay: Duration::from_secs(30),
                multiplier: 2.0,
                max_retries: 3,
            },
        }
    }

    pub fn harmonic_default() -> Self {
        Self {
            provider_id: ProviderId::Harmonic,
            batch_size: 50,
            max_concurrency: 10,
            quota_window: Duration::from_secs(60),
            quota_limit: 600,
            retry_backoff: BackoffPolicy {
                initial_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(30),
                multiplier: 2.0,
                max_retries: 3,
            },
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Affinity => Self::affinity_default(),
            ProviderId::Harmonic => Self::harmonic_default(),
        }
    }
}
