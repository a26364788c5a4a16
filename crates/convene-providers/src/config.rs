use std::env;

use convene_core::{ProviderId, ProviderPolicy};
use thiserror::Error;

use crate::http_client::HttpAuth;
use crate::retry::RetryConfig;

pub const AFFINITY_BASE_URL: &str = "https://api.affinity.co";
pub const HARMONIC_BASE_URL: &str = "https://api.harmonic.ai";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no API key for {provider}: set {primary} or {fallback}")]
    MissingApiKey {
        provider: ProviderId,
        primary: &'static str,
        fallback: &'static str,
    },
    #[error("base URL for {provider} cannot be empty")]
    EmptyBaseUrl { provider: ProviderId },
}

/// Connection settings for one provider.
///
/// | Provider | Primary Env Var | Fallback Env Var |
/// |----------|----------------|------------------|
/// | Affinity | `CONVENE_AFFINITY_API_KEY` | `AFFINITY_API_KEY` |
/// | Harmonic | `CONVENE_HARMONIC_API_KEY` | `HARMONIC_API_KEY` |
#[derive(Clone)]
pub struct ProviderConfig {
    provider: ProviderId,
    base_url: String,
    api_key: String,
    timeout_ms: u64,
    retry: RetryConfig,
}

impl ProviderConfig {
    pub fn new(provider: ProviderId, api_key: impl Into<String>) -> Self {
        let policy = ProviderPolicy::default_for(provider);
        Self {
            provider,
            base_url: default_base_url(provider).to_owned(),
            api_key: api_key.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetryConfig::from_backoff_policy(&policy.retry_backoff),
        }
    }

    /// Reads the API key from the environment; blank values count as unset.
    pub fn from_env(provider: ProviderId) -> Result<Self, ConfigError> {
        Self::from_lookup(provider, |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(provider: ProviderId, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (primary, fallback) = api_key_vars(provider);
        let api_key = [primary, fallback]
            .into_iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey {
                provider,
                primary,
                fallback,
            })?;

        Ok(Self::new(provider, api_key.trim()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyBaseUrl {
                provider: self.provider,
            });
        }
        self.base_url = trimmed.to_owned();
        Ok(self)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub const fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Affinity takes the key as the Basic auth password with an empty
    /// username; Harmonic takes it as a bearer token.
    pub fn auth(&self) -> HttpAuth {
        match self.provider {
            ProviderId::Affinity => HttpAuth::Basic {
                username: String::new(),
                password: self.api_key.clone(),
            },
            ProviderId::Harmonic => HttpAuth::BearerToken(self.api_key.clone()),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .field("retry", &self.retry)
            .finish()
    }
}

pub const fn default_base_url(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Affinity => AFFINITY_BASE_URL,
        ProviderId::Harmonic => HARMONIC_BASE_URL,
    }
}

/// Primary and fallback environment variable names holding the API key.
pub const fn api_key_vars(provider: ProviderId) -> (&'static str, &'static str) {
    match provider {
        ProviderId::Affinity => ("CONVENE_AFFINITY_API_KEY", "AFFINITY_API_KEY"),
        ProviderId::Harmonic => ("CONVENE_HARMONIC_API_KEY", "HARMONIC_API_KEY"),
    }
}
