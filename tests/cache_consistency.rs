//! Cache coordination through the public client surface: deduplication,
//! stale-while-revalidate, invalidation after mutations, and retention.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use agora::source::memory::MemorySource;
use agora::{CacheConfig, Collection, DataClient, EntityKind, EntryState, EventFilter, IssueFilter};

fn issue_row(title: &str, category: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "title": title,
        "description": "",
        "category": category,
        "status": "open",
        "location": null,
        "user_id": null,
        "upvotes": null,
        "reports": null,
        "created_at": created_at,
    })
}

fn seeded_source() -> Arc<MemorySource> {
    let source = Arc::new(MemorySource::new());
    source.insert(
        Collection::Issues,
        issue_row("first", "Campus", "2024-05-01T10:00:00Z"),
    );
    source
}

#[tokio::test(start_paused = true)]
async fn concurrent_handles_share_one_select() {
    let source = seeded_source();
    source.set_select_delay(Collection::Issues, Duration::from_millis(50));
    let client = DataClient::new(source.clone(), CacheConfig::default());

    let a = client.issues(&IssueFilter::default());
    let b = client.issues(&IssueFilter::default());

    let (left, right) = tokio::join!(a.get(), b.get());

    assert_eq!(source.select_calls(Collection::Issues), 1);
    assert_eq!(left.data.as_deref().map(Vec::len), Some(1));
    assert_eq!(right.data.as_deref().map(Vec::len), Some(1));
}

#[tokio::test(start_paused = true)]
async fn stale_read_serves_old_data_then_swaps_in_fresh() {
    let source = seeded_source();
    let config = CacheConfig {
        default_stale_ms: 1_000,
        stale_ms: Default::default(),
        ..Default::default()
    };
    let client = DataClient::new(source.clone(), config);

    let issues = client.issues(&IssueFilter::default());
    let first = issues.get().await;
    assert_eq!(first.data.as_deref().map(Vec::len), Some(1));

    // A row lands in the backend; the cache does not see it yet.
    source.insert(
        Collection::Issues,
        issue_row("second", "Campus", "2024-05-02T10:00:00Z"),
    );

    tokio::time::advance(Duration::from_millis(1_001)).await;

    // Past the staleness window: the old data is served synchronously while
    // a background refetch runs.
    let stale = issues.get().await;
    assert!(stale.is_stale);
    assert_eq!(stale.data.as_deref().map(Vec::len), Some(1));

    tokio::time::sleep(Duration::from_millis(10)).await;

    let refreshed = issues.get().await;
    assert!(!refreshed.is_stale);
    assert_eq!(refreshed.data.as_deref().map(Vec::len), Some(2));
    assert_eq!(source.select_calls(Collection::Issues), 2);
}

#[tokio::test(start_paused = true)]
async fn mutation_invalidation_forces_a_refetch() {
    let source = seeded_source();
    let client = DataClient::new(source.clone(), CacheConfig::default());

    let issues = client.issues(&IssueFilter::default());
    issues.get().await;
    assert_eq!(source.select_calls(Collection::Issues), 1);

    // A fresh entry is served from cache without touching the backend.
    issues.get().await;
    assert_eq!(source.select_calls(Collection::Issues), 1);

    source.insert(
        Collection::Issues,
        issue_row("second", "Teaching", "2024-05-02T10:00:00Z"),
    );
    client.invalidate(EntityKind::Issues);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let after = issues.get().await;
    assert_eq!(after.data.as_deref().map(Vec::len), Some(2));
    assert_eq!(source.select_calls(Collection::Issues), 2);
}

#[tokio::test(start_paused = true)]
async fn invalidation_does_not_cross_entity_scopes() {
    let source = seeded_source();
    source.insert(
        Collection::Events,
        json!({
            "id": Uuid::new_v4().to_string(),
            "title": "Career fair",
            "description": "",
            "event_type": "fair",
            "event_date": "2024-06-01T09:00:00Z",
            "location": null,
            "user_id": null,
            "registrations": null,
            "created_at": "2024-05-01T10:00:00Z",
        }),
    );
    let client = DataClient::new(source.clone(), CacheConfig::default());

    let issues = client.issues(&IssueFilter::default());
    let events = client.events(&EventFilter::default());
    issues.get().await;
    events.get().await;

    client.invalidate(EntityKind::Jobs);

    assert_eq!(client.cache().state_of(issues.key()), EntryState::Fresh);
    assert_eq!(client.cache().state_of(events.key()), EntryState::Fresh);
}

#[tokio::test(start_paused = true)]
async fn sweeper_evicts_abandoned_entries() {
    let source = seeded_source();
    let config = CacheConfig {
        retain_ms: 1_000,
        sweep_interval_ms: 500,
        ..Default::default()
    };
    let client = DataClient::new(source.clone(), config);
    let sweeper = client.cache().spawn_sweeper();

    let key = {
        let issues = client.issues(&IssueFilter::default());
        issues.get().await;
        issues.key().clone()
    };
    assert_eq!(client.cache().len(), 1);

    // Past retention with no observers: the sweeper drops the entry.
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(client.cache().len(), 0);
    assert_eq!(client.cache().state_of(&key), EntryState::Idle);

    sweeper.abort();
}
