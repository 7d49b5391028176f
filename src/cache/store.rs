//! Query cache coordinator.
//!
//! A process-wide (but explicitly constructed, never global) store of query
//! results keyed by [`QueryKey`]. The coordinator deduplicates concurrent
//! fetches for one key, serves stale data while revalidating in the
//! background, retries failed fetches once, and applies completions in
//! request order: a fetch superseded by a newer one for the same key is
//! discarded when it resolves, never stored.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use futures::FutureExt;
use metrics::counter;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::source::SourceError;

use super::config::CacheConfig;
use super::entry::{
    CacheEntry, EntryState, ErasedOutcome, Fetcher, Payload, QueryOutcome, SharedFetch,
};
use super::keys::{KeyScope, QueryKey};

const METRIC_CACHE_HIT: &str = "agora_cache_hit_total";
const METRIC_CACHE_MISS: &str = "agora_cache_miss_total";
const METRIC_CACHE_STALE_SERVED: &str = "agora_cache_stale_served_total";
const METRIC_CACHE_REFETCH: &str = "agora_cache_refetch_total";
const METRIC_CACHE_RETRY: &str = "agora_cache_retry_total";
const METRIC_CACHE_DISCARDED: &str = "agora_cache_discarded_total";
const METRIC_CACHE_EVICTED: &str = "agora_cache_evicted_total";

/// Shared query cache.
///
/// Cheap to clone; all clones address the same store. Construct one per
/// process (or per test) and pass it where it is needed.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Bind a fetch function to a key, registering an observer.
    ///
    /// The returned handle keeps the entry alive and eligible for
    /// invalidation-triggered refetches until dropped.
    pub fn handle<T, F, Fut>(&self, key: QueryKey, fetch: F) -> QueryHandle<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, SourceError>> + Send + 'static,
    {
        let fetcher: Fetcher = Arc::new(move || {
            fetch()
                .map(|result| result.map(|value| Arc::new(value) as Payload))
                .boxed()
        });
        self.inner.retain(&key, &fetcher);
        QueryHandle {
            cache: self.clone(),
            key,
            fetcher,
            _marker: PhantomData,
        }
    }

    /// Mark every entry under `scope` stale. Observed entries refetch in the
    /// background; unobserved ones are dropped. Returns the number of
    /// entries affected.
    pub fn invalidate(&self, scope: KeyScope) -> usize {
        self.inner.invalidate(scope)
    }

    /// Evict unobserved entries whose retention window has elapsed.
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    /// Run [`sweep`](Self::sweep) on the configured interval until the cache
    /// is dropped.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let interval = self.inner.config.sweep_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                inner.sweep();
            }
        })
    }

    pub fn state_of(&self, key: &QueryKey) -> EntryState {
        match self.inner.entries.get(key) {
            Some(entry) => entry.state(Instant::now()),
            None => EntryState::Idle,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

/// A cache-bound read operation for one key.
///
/// Holding the handle counts as observing the entry; dropping it releases
/// the observer. Clones observe the same entry independently.
pub struct QueryHandle<T> {
    cache: QueryCache,
    key: QueryKey,
    fetcher: Fetcher,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> QueryHandle<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Resolve the query through the cache.
    ///
    /// Fresh data returns immediately. Stale data also returns immediately,
    /// flagged `is_stale`, with a background refetch in flight; callers must
    /// tolerate the data being replaced on a later read. Only a cold entry
    /// awaits the fetch.
    pub async fn get(&self) -> QueryOutcome<T> {
        let erased = self.cache.inner.read(&self.key, &self.fetcher).await;
        downcast_outcome(&self.key, erased)
    }

    /// Snapshot the entry without triggering any fetch.
    pub fn peek(&self) -> QueryOutcome<T> {
        let erased = self.cache.inner.peek(&self.key);
        downcast_outcome(&self.key, erased)
    }
}

impl<T> Clone for QueryHandle<T> {
    fn clone(&self) -> Self {
        self.cache.inner.retain(&self.key, &self.fetcher);
        Self {
            cache: self.cache.clone(),
            key: self.key.clone(),
            fetcher: self.fetcher.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Drop for QueryHandle<T> {
    fn drop(&mut self) {
        self.cache.inner.release(&self.key);
    }
}

fn downcast_outcome<T: Send + Sync + 'static>(
    key: &QueryKey,
    erased: ErasedOutcome,
) -> QueryOutcome<T> {
    let data = erased.data.and_then(|payload| match payload.downcast::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            error!(key = %key, "Cached payload has unexpected type; dropping");
            None
        }
    });
    QueryOutcome {
        data,
        error: erased.error,
        is_loading: erased.is_loading,
        is_stale: erased.is_stale,
    }
}

enum ReadPlan {
    Serve { data: Payload, is_stale: bool },
    Await(SharedFetch),
}

struct CacheInner {
    entries: DashMap<QueryKey, CacheEntry>,
    config: CacheConfig,
}

impl CacheInner {
    fn retain(self: &Arc<Self>, key: &QueryKey, fetcher: &Fetcher) {
        let now = Instant::now();
        let stale_after = self.config.stale_for(key.scope);
        let mut entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(stale_after, now));
        entry.observers += 1;
        entry.stale_after = stale_after;
        entry.fetcher = Some(fetcher.clone());
        entry.last_touched = now;
    }

    fn release(&self, key: &QueryKey) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.observers = entry.observers.saturating_sub(1);
            entry.last_touched = Instant::now();
        }
    }

    async fn read(self: &Arc<Self>, key: &QueryKey, fetcher: &Fetcher) -> ErasedOutcome {
        match self.plan_read(key, fetcher) {
            ReadPlan::Serve { data, is_stale } => {
                if is_stale {
                    counter!(METRIC_CACHE_STALE_SERVED, "scope" => key.scope.name()).increment(1);
                } else {
                    counter!(METRIC_CACHE_HIT, "scope" => key.scope.name()).increment(1);
                }
                ErasedOutcome {
                    data: Some(data),
                    error: None,
                    is_loading: false,
                    is_stale,
                }
            }
            ReadPlan::Await(shared) => {
                counter!(METRIC_CACHE_MISS, "scope" => key.scope.name()).increment(1);
                match shared.await {
                    Ok(data) => ErasedOutcome {
                        data: Some(data),
                        error: None,
                        is_loading: false,
                        is_stale: false,
                    },
                    Err(error) => ErasedOutcome {
                        data: None,
                        error: Some(error),
                        is_loading: false,
                        is_stale: false,
                    },
                }
            }
        }
    }

    fn plan_read(self: &Arc<Self>, key: &QueryKey, fetcher: &Fetcher) -> ReadPlan {
        let now = Instant::now();
        let stale_after = self.config.stale_for(key.scope);
        let mut entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(stale_after, now));
        entry.last_touched = now;
        if entry.fetcher.is_none() {
            entry.fetcher = Some(fetcher.clone());
        }

        if let Some(data) = entry.data.clone() {
            if !entry.is_expired(now) {
                return ReadPlan::Serve {
                    data,
                    is_stale: false,
                };
            }
            if entry.inflight.is_none() {
                self.start_fetch(key, &mut entry, fetcher.clone());
            }
            return ReadPlan::Serve {
                data,
                is_stale: true,
            };
        }

        let shared = match &entry.inflight {
            Some(inflight) => inflight.clone(),
            None => self.start_fetch(key, &mut entry, fetcher.clone()),
        };
        ReadPlan::Await(shared)
    }

    fn start_fetch(
        self: &Arc<Self>,
        key: &QueryKey,
        entry: &mut CacheEntry,
        fetcher: Fetcher,
    ) -> SharedFetch {
        entry.generation += 1;
        let generation = entry.generation;

        counter!(METRIC_CACHE_REFETCH, "scope" => key.scope.name()).increment(1);

        let weak = Arc::downgrade(self);
        let fetch_key = key.clone();
        let shared: SharedFetch = async move {
            let result = run_with_retry(&fetcher, &fetch_key).await;
            if let Some(inner) = weak.upgrade() {
                inner.apply(&fetch_key, generation, &result);
            }
            result
        }
        .boxed()
        .shared();

        entry.inflight = Some(shared.clone());

        // Drive the fetch to completion even when nobody awaits it: the
        // stale-while-revalidate and invalidation paths return before the
        // refetch resolves.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(shared.clone().map(|_| ()));
            }
            Err(_) => {
                debug!(key = %key, "No async runtime; fetch completes on first poll");
            }
        }

        shared
    }

    /// Store a fetch completion, unless a newer fetch for the same key has
    /// started since (last-requested-wins).
    fn apply(&self, key: &QueryKey, generation: u64, result: &Result<Payload, Arc<SourceError>>) {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return;
        };
        if entry.generation != generation {
            debug!(
                key = %key,
                generation,
                current = entry.generation,
                "Discarding superseded fetch result"
            );
            counter!(METRIC_CACHE_DISCARDED, "scope" => key.scope.name()).increment(1);
            return;
        }

        let now = Instant::now();
        entry.inflight = None;
        entry.last_touched = now;
        match result {
            Ok(payload) => {
                entry.data = Some(payload.clone());
                entry.error = None;
                entry.fetched_at = Some(now);
                entry.forced_stale = false;
            }
            Err(error) => {
                // Keep any stale data; it stays servable alongside the error.
                entry.error = Some(error.clone());
            }
        }
    }

    fn invalidate(self: &Arc<Self>, scope: KeyScope) -> usize {
        let keys: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|kv| kv.key().scope == scope)
            .map(|kv| kv.key().clone())
            .collect();

        let mut touched = 0;
        for key in keys {
            let mut drop_entry = false;
            if let Some(mut entry) = self.entries.get_mut(&key) {
                if entry.observers == 0 {
                    drop_entry = true;
                } else {
                    entry.forced_stale = true;
                    entry.last_touched = Instant::now();
                    if let Some(fetcher) = entry.fetcher.clone() {
                        self.start_fetch(&key, &mut entry, fetcher);
                    }
                    touched += 1;
                }
            }
            if drop_entry {
                self.entries.remove(&key);
                counter!(METRIC_CACHE_EVICTED, "scope" => scope.name()).increment(1);
                touched += 1;
            }
        }
        touched
    }

    fn sweep(&self) -> usize {
        let now = Instant::now();
        let retain_for = self.config.retain_for();
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            entry.observers > 0 || now.duration_since(entry.last_touched) < retain_for
        });
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            debug!(evicted, "Swept expired cache entries");
            counter!(METRIC_CACHE_EVICTED, "scope" => "sweep").increment(evicted as u64);
        }
        evicted
    }

    fn peek(&self, key: &QueryKey) -> ErasedOutcome {
        let Some(entry) = self.entries.get(key) else {
            return ErasedOutcome::idle();
        };
        let now = Instant::now();
        ErasedOutcome {
            data: entry.data.clone(),
            error: entry.error.clone(),
            is_loading: entry.data.is_none() && entry.inflight.is_some(),
            is_stale: entry.data.is_some() && entry.is_expired(now),
        }
    }
}

async fn run_with_retry(fetcher: &Fetcher, key: &QueryKey) -> Result<Payload, Arc<SourceError>> {
    match fetcher().await {
        Ok(value) => Ok(value),
        Err(error) if error.is_retryable() => {
            warn!(key = %key, %error, "Fetch failed; retrying once");
            counter!(METRIC_CACHE_RETRY, "scope" => key.scope.name()).increment(1);
            fetcher().await.map_err(Arc::new)
        }
        Err(error) => Err(Arc::new(error)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::domain::types::EntityKind;

    use super::*;

    fn jobs_key() -> QueryKey {
        QueryKey::entity(EntityKind::Jobs, vec![None, None])
    }

    fn config_with_stale_ms(stale_ms: u64) -> CacheConfig {
        CacheConfig {
            default_stale_ms: stale_ms,
            stale_ms: Default::default(),
            ..Default::default()
        }
    }

    /// Fetcher that counts calls and returns the call number, sleeping
    /// `delay_ms` per call.
    fn counting_fetch(
        calls: Arc<AtomicUsize>,
        delay_ms: u64,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = Result<Vec<u32>, SourceError>> + Send>>
    + Send
    + Sync
    + 'static {
        move || {
            let calls = calls.clone();
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Ok(vec![n as u32])
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_reads_share_one_fetch() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = cache.handle(jobs_key(), counting_fetch(calls.clone(), 50));

        let (a, b, c) = tokio::join!(handle.get(), handle.get(), handle.get());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for outcome in [a, b, c] {
            assert_eq!(outcome.data.as_deref(), Some(&vec![1]));
            assert!(!outcome.is_stale);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_served_immediately_with_one_background_refetch() {
        let cache = QueryCache::new(config_with_stale_ms(1_000));
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = cache.handle(jobs_key(), counting_fetch(calls.clone(), 10));

        let first = handle.get().await;
        assert_eq!(first.data.as_deref(), Some(&vec![1]));
        assert!(!first.is_stale);

        tokio::time::advance(Duration::from_millis(1_001)).await;

        // Two reads on the stale entry: old data synchronously, one refetch.
        let stale_a = handle.get().await;
        let stale_b = handle.get().await;
        assert_eq!(stale_a.data.as_deref(), Some(&vec![1]));
        assert!(stale_a.is_stale);
        assert!(stale_b.is_stale);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let refreshed = handle.get().await;
        assert_eq!(refreshed.data.as_deref(), Some(&vec![2]));
        assert!(!refreshed.is_stale);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_fetch_result_is_discarded() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = cache.handle(jobs_key(), {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    // The first request resolves long after the second.
                    let delay = if n == 1 { 600 } else { 50 };
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok(vec![n as u32])
                }
            }
        });

        let slow = tokio::spawn({
            let handle = handle.clone();
            async move { handle.get().await }
        });
        // Let the first fetch start.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A newer request for the same key supersedes it.
        cache.invalidate(KeyScope::Entity(EntityKind::Jobs));
        tokio::time::sleep(Duration::from_millis(700)).await;

        let slow_outcome = slow.await.expect("join slow read");
        assert_eq!(slow_outcome.data.as_deref(), Some(&vec![1]));

        // The cache holds the newer result even though it resolved first.
        let current = handle.get().await;
        assert_eq!(current.data.as_deref(), Some(&vec![2]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_is_scoped_to_one_kind() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let jobs_a = cache.handle(
            QueryKey::entity(EntityKind::Jobs, vec![Some("internship".into()), None]),
            counting_fetch(calls.clone(), 50),
        );
        let jobs_b = cache.handle(
            QueryKey::entity(EntityKind::Jobs, vec![Some("full_time".into()), None]),
            counting_fetch(calls.clone(), 50),
        );
        let events = cache.handle(
            QueryKey::entity(EntityKind::Events, vec![None]),
            counting_fetch(calls.clone(), 50),
        );
        let groups = cache.handle(
            QueryKey::entity(EntityKind::StudyGroups, vec![None]),
            counting_fetch(calls.clone(), 50),
        );

        tokio::join!(jobs_a.get(), jobs_b.get(), events.get(), groups.get());

        // An unobserved jobs entry is dropped outright on invalidation.
        let orphan_key = QueryKey::entity(EntityKind::Jobs, vec![Some("orphan".into()), None]);
        {
            let orphan = cache.handle(orphan_key.clone(), counting_fetch(calls.clone(), 50));
            orphan.get().await;
        }

        cache.invalidate(KeyScope::Entity(EntityKind::Jobs));

        assert_eq!(cache.state_of(jobs_a.key()), EntryState::Stale);
        assert_eq!(cache.state_of(jobs_b.key()), EntryState::Stale);
        assert_eq!(cache.state_of(events.key()), EntryState::Fresh);
        assert_eq!(cache.state_of(groups.key()), EntryState::Fresh);
        assert_eq!(cache.state_of(&orphan_key), EntryState::Idle);

        // Observed jobs entries refetch in the background.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.state_of(jobs_a.key()), EntryState::Fresh);
        assert_eq!(cache.state_of(jobs_b.key()), EntryState::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_error_is_retried_exactly_once() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = cache.handle(jobs_key(), {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n == 1 {
                        Err(SourceError::backend("transient"))
                    } else {
                        Ok(vec![n as u32])
                    }
                }
            }
        });

        let outcome = handle.get().await;
        assert_eq!(outcome.data.as_deref(), Some(&vec![2]));
        assert!(outcome.error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_not_retried() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = cache.handle(jobs_key(), {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<Vec<u32>, _>(SourceError::NotFound)
                }
            }
        });

        let outcome = handle.get().await;
        assert!(outcome.data.is_none());
        assert!(matches!(
            outcome.error.as_deref(),
            Some(SourceError::NotFound)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_failure_surfaces_after_retry() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = cache.handle(jobs_key(), {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<Vec<u32>, _>(SourceError::backend("down"))
                }
            }
        });

        let outcome = handle.get().await;
        assert!(outcome.data.is_none());
        assert!(outcome.error.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.state_of(handle.key()), EntryState::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refetch_keeps_stale_data_servable() {
        let cache = QueryCache::new(config_with_stale_ms(1_000));
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = cache.handle(jobs_key(), {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n == 1 {
                        Ok(vec![1u32])
                    } else {
                        Err(SourceError::backend("down"))
                    }
                }
            }
        });

        handle.get().await;
        tokio::time::advance(Duration::from_millis(1_001)).await;

        let stale = handle.get().await;
        assert!(stale.is_stale);

        // The refetch and its retry both fail; data is kept.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let after = handle.peek();
        assert_eq!(after.data.as_deref(), Some(&vec![1]));
        assert!(after.error.is_some());
        assert!(after.is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_evicts_only_unobserved_expired_entries() {
        let config = CacheConfig {
            retain_ms: 1_000,
            ..Default::default()
        };
        let cache = QueryCache::new(config);
        let calls = Arc::new(AtomicUsize::new(0));

        let kept = cache.handle(
            QueryKey::entity(EntityKind::Issues, vec![None]),
            counting_fetch(calls.clone(), 0),
        );
        kept.get().await;

        {
            let dropped = cache.handle(jobs_key(), counting_fetch(calls.clone(), 0));
            dropped.get().await;
        }

        assert_eq!(cache.len(), 2);
        tokio::time::advance(Duration::from_millis(1_001)).await;

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.state_of(kept.key()), EntryState::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn peek_reports_first_load_without_fetching() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = cache.handle(jobs_key(), counting_fetch(calls.clone(), 100));

        // Nothing has been requested yet.
        let idle = handle.peek();
        assert!(idle.data.is_none());
        assert!(!idle.is_loading);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let read = tokio::spawn({
            let handle = handle.clone();
            async move { handle.get().await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        let loading = handle.peek();
        assert!(loading.is_loading);
        assert!(loading.data.is_none());

        read.await.expect("join read");
        let done = handle.peek();
        assert!(!done.is_loading);
        assert_eq!(done.data.as_deref(), Some(&vec![1]));
    }
}
