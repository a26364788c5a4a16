//! Per-id batch lookups with failure isolation.
//!
//! [`BatchFetcher`] calls a caller-supplied [`EntityAccessor`] once per id and
//! returns one [`ResponseEnvelope`] per id, in input order. A failing id turns
//! into an error envelope at its own position; it never aborts, skips or
//! reorders the others. Ids are walked in fixed-size groups, which only shapes
//! call cadence.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    AccessError, FilterSet, ProviderId, ProviderPolicy, ResponseEnvelope, ThrottlingQueue,
    ValidationError,
};

/// Default ids per group.
pub const DEFAULT_BATCH_SIZE: usize = 50;

pub type AccessFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, AccessError>> + Send + 'a>>;

/// Single-item lookup against one provider endpoint.
///
/// Implementations report every failure through [`AccessError`]; a missing
/// entity is an error, never a silent `null`.
pub trait EntityAccessor: Send + Sync {
    fn provider(&self) -> ProviderId;

    /// Short operation name, used as the endpoint prefix in error reports.
    fn operation(&self) -> &str;

    fn fetch<'a>(&'a self, id: &'a str, filters: &'a FilterSet) -> AccessFuture<'a>;
}

/// Drives per-id lookups through an [`EntityAccessor`].
#[derive(Clone)]
pub struct BatchFetcher {
    batch_size: usize,
    max_concurrency: usize,
    throttle: Option<ThrottlingQueue>,
}

impl Default for BatchFetcher {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrency: 1,
            throttle: None,
        }
    }
}

impl BatchFetcher {
    pub fn new(batch_size: usize) -> Result<Self, ValidationError> {
        if batch_size == 0 {
            return Err(ValidationError::ZeroBatchSize);
        }
        Ok(Self {
            batch_size,
            ..Self::default()
        })
    }

    /// Batch size, concurrency and rate budget taken from a provider policy.
    pub fn from_policy(policy: &ProviderPolicy) -> Result<Self, ValidationError> {
        Ok(Self::new(policy.batch_size)?
            .with_max_concurrency(policy.max_concurrency)
            .with_throttle(ThrottlingQueue::from_policy(policy)))
    }

    /// Allows up to `max_concurrency` lookups of a group in flight at once,
    /// each on its own task. `0` and `1` both mean one after another.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Waits for rate budget before every accessor call.
    pub fn with_throttle(mut self, throttle: ThrottlingQueue) -> Self {
        self.throttle = Some(throttle);
        self
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub const fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub const fn is_concurrent(&self) -> bool {
        self.max_concurrency > 1
    }

    /// Fetches every id once and returns envelopes aligned with `ids`.
    ///
    /// Every call receives the same `filters`. Dropping the returned future
    /// aborts any lookups still running on their own tasks.
    pub async fn fetch_all<S>(
        &self,
        ids: &[S],
        accessor: Arc<dyn EntityAccessor>,
        filters: &FilterSet,
    ) -> Vec<ResponseEnvelope>
    where
        S: AsRef<str>,
    {
        let mut results = Vec::with_capacity(ids.len());
        let group_count = ids.len().div_ceil(self.batch_size);
        let permits = Arc::new(Semaphore::new(self.max_concurrency));

        for (group_index, group) in ids.chunks(self.batch_size).enumerate() {
            debug!(
                provider = %accessor.provider(),
                operation = accessor.operation(),
                group = group_index + 1,
                groups = group_count,
                size = group.len(),
                max_concurrency = self.max_concurrency,
                "fetching batch group"
            );

            if self.is_concurrent() {
                self.fetch_group_concurrently(group, &accessor, filters, &permits, &mut results)
                    .await;
            } else {
                for id in group {
                    let id = id.as_ref();
                    wait_for_budget(self.throttle.as_ref()).await;
                    let result = accessor.fetch(id, filters).await;
                    results.push(envelope_for(accessor.as_ref(), id, result));
                }
            }
        }

        results
    }

    async fn fetch_group_concurrently<S>(
        &self,
        group: &[S],
        accessor: &Arc<dyn EntityAccessor>,
        filters: &FilterSet,
        permits: &Arc<Semaphore>,
        results: &mut Vec<ResponseEnvelope>,
    ) where
        S: AsRef<str>,
    {
        let shared_filters = Arc::new(filters.clone());
        let mut tasks = AbortOnDrop(Vec::with_capacity(group.len()));

        for id in group {
            let id = id.as_ref().to_owned();
            let accessor = Arc::clone(accessor);
            let filters = Arc::clone(&shared_filters);
            let permits = Arc::clone(permits);
            let throttle = self.throttle.clone();
            tasks.0.push(tokio::spawn(async move {
                let result = match permits.acquire().await {
                    Ok(_permit) => {
                        wait_for_budget(throttle.as_ref()).await;
                        accessor.fetch(&id, &filters).await
                    }
                    Err(closed) => Err(AccessError::other(format!(
                        "concurrency limit unavailable: {closed}"
                    ))),
                };
                envelope_for(accessor.as_ref(), &id, result)
            }));
        }

        // Awaited in spawn order, so output order follows input order.
        for (id, handle) in group.iter().zip(tasks.0.iter_mut()) {
            let envelope = match handle.await {
                Ok(envelope) => envelope,
                Err(join_error) => {
                    let error = AccessError::other(format!("accessor task failed: {join_error}"));
                    envelope_for(accessor.as_ref(), id.as_ref(), Err(error))
                }
            };
            results.push(envelope);
        }
    }
}

/// Aborts every task it still holds when dropped.
struct AbortOnDrop<T>(Vec<JoinHandle<T>>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

async fn wait_for_budget(throttle: Option<&ThrottlingQueue>) {
    if let Some(throttle) = throttle {
        throttle.acquire().await;
    }
}

fn envelope_for(
    accessor: &dyn EntityAccessor,
    id: &str,
    result: Result<Value, AccessError>,
) -> ResponseEnvelope {
    let endpoint = format!("{}/{}", accessor.operation(), id);
    if let Err(error) = &result {
        warn!(
            provider = %accessor.provider(),
            endpoint = %endpoint,
            error = %error,
            "batch item failed"
        );
    }
    ResponseEnvelope::from_result(result, endpoint, accessor.provider())
}
