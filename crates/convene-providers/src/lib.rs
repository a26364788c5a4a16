//! # Convene Providers
//!
//! Authenticated GET access to the Affinity and Harmonic REST APIs, shaped to
//! plug into [`convene_core::BatchFetcher`].
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Provider client with retry |
//! | [`config`] | Base URLs, credentials and timeouts |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`resources`] | Resource catalog and per-id accessors |
//! | [`retry`] | Backoff and retry policy |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use convene_core::{BatchFetcher, FilterSet, ProviderId, ProviderPolicy};
//! use convene_providers::{ProviderClient, ProviderConfig, Resource, ResourceAccessor};
//!
//! let config = ProviderConfig::from_env(ProviderId::Harmonic)?;
//! let client = Arc::new(ProviderClient::with_reqwest(config));
//! let accessor = Arc::new(ResourceAccessor::new(client, Resource::HarmonicCompany)?);
//!
//! let fetcher = BatchFetcher::from_policy(&ProviderPolicy::harmonic_default())?;
//! let envelopes = fetcher.fetch_all(&["101", "102"], accessor, &FilterSet::new()).await;
//! ```

pub mod client;
pub mod config;
pub mod http_client;
pub mod resources;
pub mod retry;

pub use client::ProviderClient;
pub use config::{
    api_key_vars, default_base_url, ConfigError, ProviderConfig, AFFINITY_BASE_URL,
    HARMONIC_BASE_URL,
};
pub use http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use resources::{Resource, ResourceAccessor};
pub use retry::{Backoff, RetryConfig};
