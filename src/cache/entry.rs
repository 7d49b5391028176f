//! Cache entry state and read outcomes.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;

use crate::source::SourceError;

/// Type-erased cached value. Each key maps to exactly one concrete type,
/// restored by the typed [`QueryHandle`](super::store::QueryHandle).
pub(crate) type Payload = Arc<dyn Any + Send + Sync>;

/// A fetch in flight, shared between concurrent readers of the same key.
pub(crate) type SharedFetch = Shared<BoxFuture<'static, Result<Payload, Arc<SourceError>>>>;

/// The stored fetch closure, re-run on staleness and invalidation.
pub(crate) type Fetcher =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Payload, SourceError>> + Send + Sync>;

/// Observable lifecycle of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Created but never fetched.
    Idle,
    /// First fetch in flight, no data to serve yet.
    Fetching,
    /// Data younger than the staleness window.
    Fresh,
    /// Data servable but past the staleness window or explicitly
    /// invalidated; a background refetch may be in flight.
    Stale,
    /// Last fetch failed (after its retry) and no data is held.
    Error,
}

pub(crate) struct CacheEntry {
    pub(crate) data: Option<Payload>,
    pub(crate) error: Option<Arc<SourceError>>,
    pub(crate) fetched_at: Option<Instant>,
    /// Set by invalidation; cleared when a fetch result is applied.
    pub(crate) forced_stale: bool,
    pub(crate) stale_after: Duration,
    /// Bumped at every fetch start; a completion only applies while its
    /// generation is still current (last-requested-wins).
    pub(crate) generation: u64,
    pub(crate) inflight: Option<SharedFetch>,
    pub(crate) observers: usize,
    pub(crate) last_touched: Instant,
    pub(crate) fetcher: Option<Fetcher>,
}

impl CacheEntry {
    pub(crate) fn new(stale_after: Duration, now: Instant) -> Self {
        Self {
            data: None,
            error: None,
            fetched_at: None,
            forced_stale: false,
            stale_after,
            generation: 0,
            inflight: None,
            observers: 0,
            last_touched: now,
            fetcher: None,
        }
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.forced_stale
            || self
                .fetched_at
                .is_none_or(|at| now.duration_since(at) >= self.stale_after)
    }

    pub(crate) fn state(&self, now: Instant) -> EntryState {
        if self.data.is_some() {
            if self.is_expired(now) {
                EntryState::Stale
            } else {
                EntryState::Fresh
            }
        } else if self.inflight.is_some() {
            EntryState::Fetching
        } else if self.error.is_some() {
            EntryState::Error
        } else {
            EntryState::Idle
        }
    }
}

/// Snapshot handed to consumers: the cached data (possibly stale), the last
/// error, and the loading flags. Serving stale data is a deliberate,
/// observable condition (`is_stale`), not an error.
#[derive(Debug, Clone)]
pub struct QueryOutcome<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<SourceError>>,
    /// A first fetch is in flight and no data is available yet.
    pub is_loading: bool,
    /// The data served is past its staleness window; a background refetch
    /// has been triggered.
    pub is_stale: bool,
}

impl<T> QueryOutcome<T> {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// Untyped outcome produced by the coordinator before downcasting.
#[derive(Clone)]
pub(crate) struct ErasedOutcome {
    pub(crate) data: Option<Payload>,
    pub(crate) error: Option<Arc<SourceError>>,
    pub(crate) is_loading: bool,
    pub(crate) is_stale: bool,
}

impl ErasedOutcome {
    pub(crate) fn idle() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_stale: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_without_data_or_fetch_is_idle() {
        let now = Instant::now();
        let entry = CacheEntry::new(Duration::from_secs(60), now);
        assert_eq!(entry.state(now), EntryState::Idle);
    }

    #[test]
    fn fresh_data_becomes_stale_after_window() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(Duration::from_secs(60), now);
        entry.data = Some(Arc::new(vec![1u32]));
        entry.fetched_at = Some(now);

        assert_eq!(entry.state(now + Duration::from_secs(59)), EntryState::Fresh);
        assert_eq!(entry.state(now + Duration::from_secs(60)), EntryState::Stale);
    }

    #[test]
    fn forced_stale_overrides_age() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(Duration::from_secs(60), now);
        entry.data = Some(Arc::new(vec![1u32]));
        entry.fetched_at = Some(now);
        entry.forced_stale = true;

        assert_eq!(entry.state(now), EntryState::Stale);
    }

    #[test]
    fn error_without_data_is_error_state() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(Duration::from_secs(60), now);
        entry.error = Some(Arc::new(SourceError::backend("boom")));
        assert_eq!(entry.state(now), EntryState::Error);
    }
}
