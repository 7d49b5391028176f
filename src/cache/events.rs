//! Change event feed.
//!
//! Mutation paths and any external realtime bridge publish collection-level
//! change events here; consuming them invalidates the matching cache scopes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::domain::types::{ChangeKind, EntityKind};

/// A collection-level change with idempotency and ordering support.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Unique identifier for idempotency.
    pub id: Uuid,
    /// Monotonic ordering within this process.
    pub epoch: u64,
    /// The content kind that changed.
    pub kind: EntityKind,
    pub change: ChangeKind,
    pub occurred_at: OffsetDateTime,
}

/// In-memory FIFO of change events.
///
/// A mutex-guarded queue is enough here; contention is expected to be low.
#[derive(Default)]
pub struct ChangeFeed {
    queue: Mutex<VecDeque<ChangeEvent>>,
    epoch_counter: AtomicU64,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, kind: EntityKind, change: ChangeKind) {
        let event = ChangeEvent {
            id: Uuid::new_v4(),
            epoch: self.epoch_counter.fetch_add(1, Ordering::SeqCst),
            kind,
            change,
            occurred_at: OffsetDateTime::now_utc(),
        };

        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            collection = %kind,
            change = ?change,
            "Change event enqueued"
        );

        self.lock().push_back(event);
    }

    /// Drain up to `limit` events in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<ChangeEvent> {
        let mut queue = self.lock();
        let count = limit.min(queue.len());
        queue.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ChangeEvent>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
