//! Behavior tests for batch lookups.
//!
//! A batch must come back the same length and order as its input, with each
//! failing id isolated at its own position and every id looked up once.

use convene_core::{
    AccessError, AccessFuture, BackoffPolicy, BatchFetcher, EntityAccessor, ErrorKind, FilterSet,
    ProviderId, ProviderPolicy, ThrottlingQueue,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Accessor that fails for a chosen set of ids and records every call.
struct ScriptedAccessor {
    failing: HashSet<String>,
    panicking: HashSet<String>,
    delay_for: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, FilterSet)>>,
}

impl ScriptedAccessor {
    fn new(failing: &[&str]) -> Self {
        Self {
            failing: failing.iter().map(|id| id.to_string()).collect(),
            panicking: HashSet::new(),
            delay_for: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn panicking_on(mut self, id: &str) -> Self {
        self.panicking.insert(id.to_owned());
        self
    }

    fn slow_on(mut self, id: &str, delay: Duration) -> Self {
        self.delay_for.insert(id.to_owned(), delay);
        self
    }

    fn call_count(&self, id: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|(called, _)| called == id)
            .count()
    }
}

impl EntityAccessor for ScriptedAccessor {
    fn provider(&self) -> ProviderId {
        ProviderId::Harmonic
    }

    fn operation(&self) -> &str {
        "companies"
    }

    fn fetch<'a>(&'a self, id: &'a str, filters: &'a FilterSet) -> AccessFuture<'a> {
        Box::pin(async move {
            self.calls
                .lock()
                .expect("calls lock")
                .push((id.to_owned(), filters.clone()));

            if let Some(delay) = self.delay_for.get(id) {
                tokio::time::sleep(*delay).await;
            }
            if self.panicking.contains(id) {
                panic!("accessor blew up on {id}");
            }
            if self.failing.contains(id) {
                return Err(AccessError::http(
                    404,
                    "Not Found",
                    format!(r#"{{"error":"company {id} not found"}}"#),
                ));
            }
            Ok(json!({ "id": id, "name": format!("Company {id}") }))
        })
    }
}

/// Accessor that sleeps on every call and tracks how many calls overlap.
#[derive(Default)]
struct GaugedAccessor {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    completed: AtomicUsize,
}

impl GaugedAccessor {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

impl EntityAccessor for GaugedAccessor {
    fn provider(&self) -> ProviderId {
        ProviderId::Affinity
    }

    fn operation(&self) -> &str {
        "persons"
    }

    fn fetch<'a>(&'a self, id: &'a str, _filters: &'a FilterSet) -> AccessFuture<'a> {
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "id": id }))
        })
    }
}

fn ids(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("c{index}")).collect()
}

fn assert_isolated(ids: &[String], failing: &[&str], results: &[convene_core::ResponseEnvelope]) {
    assert_eq!(results.len(), ids.len());
    for (id, envelope) in ids.iter().zip(results) {
        if failing.contains(&id.as_str()) {
            let error = envelope.error().expect("failing id yields an error envelope");
            assert_eq!(error.kind, ErrorKind::Http);
            assert_eq!(error.endpoint, format!("companies/{id}"));
            assert_eq!(error.provider, ProviderId::Harmonic);
            assert!(envelope.data().is_none());
        } else {
            assert!(envelope.error().is_none());
            assert_eq!(
                envelope.data(),
                Some(&json!({ "id": id, "name": format!("Company {id}") }))
            );
        }
    }
}

// =============================================================================
// Sequential batches
// =============================================================================

#[tokio::test]
async fn when_some_ids_fail_every_other_id_still_succeeds_in_order() {
    // Given: 7 ids, three of which fail, walked in groups of 3
    let ids = ids(7);
    let failing = ["c0", "c3", "c6"];
    let accessor = Arc::new(ScriptedAccessor::new(&failing));

    // When: The batch runs
    let results = BatchFetcher::new(3)
        .expect("valid size")
        .fetch_all(&ids, accessor.clone(), &FilterSet::new())
        .await;

    // Then: Errors sit exactly at the failing positions
    assert_isolated(&ids, &failing, &results);
    for id in &ids {
        assert_eq!(accessor.call_count(id), 1, "{id} called more than once");
    }
}

#[tokio::test]
async fn when_every_id_fails_batch_is_all_error_envelopes() {
    let ids = ids(4);
    let failing: Vec<&str> = ids.iter().map(String::as_str).collect();
    let accessor = Arc::new(ScriptedAccessor::new(&failing));

    let results = BatchFetcher::default()
        .fetch_all(&ids, accessor, &FilterSet::new())
        .await;

    assert_isolated(&ids, &failing, &results);
    assert!(results.iter().all(|envelope| !envelope.is_success()));
}

#[tokio::test]
async fn when_filters_are_given_every_lookup_receives_the_same_filters() {
    let ids = ids(5);
    let accessor = Arc::new(ScriptedAccessor::new(&[]));
    let filters = FilterSet::new()
        .with("include_funding", true)
        .with("fields", json!(["name", "stage"]));

    BatchFetcher::new(2)
        .expect("valid size")
        .fetch_all(&ids, accessor.clone(), &filters)
        .await;

    let calls = accessor.calls.lock().expect("calls lock");
    assert_eq!(calls.len(), ids.len());
    assert!(calls.iter().all(|(_, received)| received == &filters));
}

#[tokio::test]
async fn when_failure_body_is_json_it_is_kept_as_provider_details() {
    let accessor = Arc::new(ScriptedAccessor::new(&["c1"]));

    let results = BatchFetcher::default()
        .fetch_all(&ids(2), accessor, &FilterSet::new())
        .await;

    let details = results[1]
        .error()
        .and_then(|error| error.provider_details.clone())
        .expect("details");
    assert_eq!(details, json!({ "error": "company c1 not found" }));
}

// =============================================================================
// Concurrent batches
// =============================================================================

#[tokio::test]
async fn when_running_concurrently_output_follows_input_not_completion_order() {
    // Given: The first id of the group is the slowest to answer
    let ids = ids(6);
    let failing = ["c2"];
    let accessor = Arc::new(
        ScriptedAccessor::new(&failing).slow_on("c0", Duration::from_millis(50)),
    );

    // When: The group runs concurrently
    let results = BatchFetcher::new(6)
        .expect("valid size")
        .with_max_concurrency(6)
        .fetch_all(&ids, accessor.clone(), &FilterSet::new())
        .await;

    // Then: Results still line up with the input
    assert_isolated(&ids, &failing, &results);
    for id in &ids {
        assert_eq!(accessor.call_count(id), 1);
    }
}

#[tokio::test]
async fn when_one_lookup_panics_siblings_are_unaffected() {
    let ids = ids(4);
    let accessor = Arc::new(ScriptedAccessor::new(&[]).panicking_on("c1"));

    let results = BatchFetcher::new(2)
        .expect("valid size")
        .with_max_concurrency(2)
        .fetch_all(&ids, accessor, &FilterSet::new())
        .await;

    assert_eq!(results.len(), 4);
    let panicked = results[1].error().expect("panic becomes an error envelope");
    assert_eq!(panicked.kind, ErrorKind::Unknown);
    assert_eq!(panicked.endpoint, "companies/c1");
    for index in [0, 2, 3] {
        assert!(results[index].is_success(), "index {index} should succeed");
    }
}

#[tokio::test]
async fn when_built_from_policy_in_flight_lookups_never_exceed_its_concurrency() {
    // Given: Affinity's policy and a full group of slow lookups
    let policy = ProviderPolicy::affinity_default();
    let accessor = Arc::new(GaugedAccessor::with_delay(Duration::from_millis(10)));
    let ids = ids(policy.batch_size);

    // When: The whole group runs through the policy-shaped fetcher
    let results = BatchFetcher::from_policy(&policy)
        .expect("non-zero batch size")
        .fetch_all(&ids, accessor.clone(), &FilterSet::new())
        .await;

    // Then: Every id answered, but never more than the policy allows at once
    assert_eq!(results.len(), ids.len());
    assert!(results.iter().all(|envelope| envelope.is_success()));
    let peak = accessor.peak.load(Ordering::SeqCst);
    assert!(peak <= policy.max_concurrency, "peak {peak} over limit");
    assert!(peak > 1, "lookups should overlap");
}

#[tokio::test]
async fn when_caller_gives_up_on_a_batch_running_lookups_are_cancelled() {
    // Given: Ten lookups that each take longer than the caller will wait
    let accessor = Arc::new(GaugedAccessor::with_delay(Duration::from_millis(50)));
    let fetcher = BatchFetcher::new(10)
        .expect("valid size")
        .with_max_concurrency(10);

    // When: The caller times out and drops the batch
    let outcome = tokio::time::timeout(
        Duration::from_millis(5),
        fetcher.fetch_all(&ids(10), accessor.clone(), &FilterSet::new()),
    )
    .await;
    assert!(outcome.is_err(), "batch should not finish within 5ms");
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Then: No lookup ran to completion after the caller left
    assert_eq!(accessor.completed.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Paced batches
// =============================================================================

#[tokio::test]
async fn when_rate_budget_is_small_batch_waits_but_completes() {
    // Given: Two calls per 100ms with no burst headroom beyond that
    let backoff = BackoffPolicy {
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        multiplier: 2.0,
        max_retries: 3,
    };
    let throttle = ThrottlingQueue::new(Duration::from_millis(100), 2, backoff);
    let ids = ids(4);
    let accessor = Arc::new(ScriptedAccessor::new(&["c3"]));

    // When: Four ids go through the paced fetcher
    let started = std::time::Instant::now();
    let results = BatchFetcher::new(2)
        .expect("valid size")
        .with_throttle(throttle.clone())
        .fetch_all(&ids, accessor, &FilterSet::new())
        .await;

    // Then: The third call had to wait for budget, and nothing was dropped
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert_isolated(&ids, &["c3"], &results);
    assert_eq!(throttle.waiting_len(), 0);
}

#[tokio::test]
async fn when_built_from_policy_fetcher_takes_its_shape() {
    let policy = ProviderPolicy::harmonic_default();

    let fetcher = BatchFetcher::from_policy(&policy).expect("non-zero batch size");

    assert_eq!(fetcher.batch_size(), policy.batch_size);
    assert_eq!(fetcher.max_concurrency(), policy.max_concurrency);
    assert!(fetcher.is_concurrent());

    let results = fetcher
        .fetch_all(&ids(3), Arc::new(ScriptedAccessor::new(&[])), &FilterSet::new())
        .await;
    assert!(results.iter().all(|envelope| envelope.data().is_some_and(Value::is_object)));
}
