//! # Convene Core
//!
//! Provider-agnostic aggregation layer for the Affinity and Harmonic APIs.
//!
//! ## Overview
//!
//! Everything here is pure data plumbing that sits between tool-level callers
//! and provider HTTP accessors:
//!
//! - **Paging and filters** normalized from caller vocabulary to provider vocabulary
//! - **Date ranges** resolved from relative expressions such as `7d`
//! - **Response envelope** with metadata and a classified error report
//! - **Batch lookups** that isolate per-id failures
//! - **Merging and id extraction** over heterogeneous collection payloads
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | Per-id lookups with failure isolation |
//! | [`dates`] | Relative date resolution |
//! | [`domain`] | UTC timestamp type |
//! | [`envelope`] | Response envelope, metadata and error classification |
//! | [`error`] | Core error types |
//! | [`extract`] | Entity id extraction |
//! | [`filters`] | Filter key mapping |
//! | [`merge`] | Collection merging and deduplication |
//! | [`paging`] | Page size and limit validation |
//! | [`provider_policy`] | Per-provider call shaping defaults |
//! | [`shape`] | Payload shape classification |
//! | [`source`] | Provider identifiers |
//! | [`throttling`] | Rate limiting support |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use convene_core::{BatchFetcher, DateRange, FilterSet, ResponseMerger};
//!
//! let range = DateRange::resolve(Some("7d"), None)?;
//! let filters = FilterSet::new().with("with_interaction_dates", true);
//!
//! let envelopes = BatchFetcher::default()
//!     .fetch_all(&["101", "102"], accessor, &filters)
//!     .await;
//! let merged = ResponseMerger::new()
//!     .with_dedup_key("id")?
//!     .merge_envelopes(&envelopes);
//! ```

pub mod batch;
pub mod dates;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod filters;
pub mod merge;
pub mod paging;
pub mod provider_policy;
pub mod shape;
pub mod source;
pub mod throttling;

pub use batch::{AccessFuture, BatchFetcher, EntityAccessor, DEFAULT_BATCH_SIZE};
pub use dates::{DateRange, MAX_INTERACTION_DATE, MIN_INTERACTION_DATE};
pub use domain::UtcDateTime;
pub use envelope::{
    EnvelopeMetadata, ErrorInfo, ErrorKind, ResponseEnvelope, CONTINUATION_MARKERS,
};
pub use error::{AccessError, CoreError, ValidationError};
pub use extract::{extract_entity_ids, extract_envelope_ids};
pub use filters::{map_filters, provider_key, FilterSet, FILTER_KEY_MAPPINGS};
pub use merge::{merge_responses, MergedCollection, ResponseMerger};
pub use paging::{PageConvention, PagingParams, PagingRequest, OFFSET_PAGE_MAX, TOKEN_PAGE_MAX};
pub use provider_policy::{BackoffPolicy, ProviderPolicy};
pub use shape::PayloadShape;
pub use source::ProviderId;
pub use throttling::ThrottlingQueue;
