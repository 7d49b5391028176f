//! Client façade: cache-bound reads per content kind, invalidation, and
//! change feed consumption.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::cache::{CacheConfig, ChangeFeed, KeyScope, QueryCache, QueryHandle, QueryKey};
use crate::domain::entities::{
    Announcement, Authored, DashboardStats, Event, Issue, Job, Resource, Scholarship, StudyGroup,
};
use crate::domain::types::EntityKind;
use crate::source::DataSource;

use super::content::{
    AnnouncementFilter, EventFilter, IssueFilter, JobFilter, ResourceFilter, ScholarshipFilter,
    StudyGroupFilter, fetch_announcements, fetch_events, fetch_issues, fetch_jobs,
    fetch_resources, fetch_scholarships, fetch_study_groups,
};
use super::dashboard::fetch_dashboard_stats;

/// The data layer's surface towards UI code.
///
/// Each read method returns a [`QueryHandle`] bound to a cache entry keyed
/// by (kind, normalized filters). Mutation paths call
/// [`invalidate`](Self::invalidate) after any create/update/delete; an
/// external realtime bridge publishes into a [`ChangeFeed`] consumed via
/// [`consume_changes`](Self::consume_changes).
pub struct DataClient {
    source: Arc<dyn DataSource>,
    cache: QueryCache,
}

impl DataClient {
    pub fn new(source: Arc<dyn DataSource>, config: CacheConfig) -> Self {
        Self {
            source,
            cache: QueryCache::new(config),
        }
    }

    /// Bind to an existing cache, e.g. one shared with other clients or
    /// constructed by a test.
    pub fn with_cache(source: Arc<dyn DataSource>, cache: QueryCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn issues(&self, filter: &IssueFilter) -> QueryHandle<Vec<Authored<Issue>>> {
        let key = QueryKey::entity(EntityKind::Issues, filter.key_params());
        let source = Arc::clone(&self.source);
        let filter = filter.clone();
        self.cache.handle(key, move || {
            let source = Arc::clone(&source);
            let filter = filter.clone();
            async move { fetch_issues(source.as_ref(), &filter).await }
        })
    }

    pub fn events(&self, filter: &EventFilter) -> QueryHandle<Vec<Authored<Event>>> {
        let key = QueryKey::entity(EntityKind::Events, filter.key_params());
        let source = Arc::clone(&self.source);
        let filter = filter.clone();
        self.cache.handle(key, move || {
            let source = Arc::clone(&source);
            let filter = filter.clone();
            async move { fetch_events(source.as_ref(), &filter).await }
        })
    }

    pub fn announcements(
        &self,
        filter: &AnnouncementFilter,
    ) -> QueryHandle<Vec<Authored<Announcement>>> {
        let key = QueryKey::entity(EntityKind::Announcements, filter.key_params());
        let source = Arc::clone(&self.source);
        let filter = filter.clone();
        self.cache.handle(key, move || {
            let source = Arc::clone(&source);
            let filter = filter.clone();
            async move { fetch_announcements(source.as_ref(), &filter).await }
        })
    }

    pub fn jobs(&self, filter: &JobFilter) -> QueryHandle<Vec<Authored<Job>>> {
        let key = QueryKey::entity(EntityKind::Jobs, filter.key_params());
        let source = Arc::clone(&self.source);
        let filter = filter.clone();
        self.cache.handle(key, move || {
            let source = Arc::clone(&source);
            let filter = filter.clone();
            async move { fetch_jobs(source.as_ref(), &filter).await }
        })
    }

    pub fn study_groups(
        &self,
        filter: &StudyGroupFilter,
    ) -> QueryHandle<Vec<Authored<StudyGroup>>> {
        let key = QueryKey::entity(EntityKind::StudyGroups, filter.key_params());
        let source = Arc::clone(&self.source);
        let filter = filter.clone();
        self.cache.handle(key, move || {
            let source = Arc::clone(&source);
            let filter = filter.clone();
            async move { fetch_study_groups(source.as_ref(), &filter).await }
        })
    }

    pub fn scholarships(
        &self,
        filter: &ScholarshipFilter,
    ) -> QueryHandle<Vec<Authored<Scholarship>>> {
        let key = QueryKey::entity(EntityKind::Scholarships, filter.key_params());
        let source = Arc::clone(&self.source);
        let filter = filter.clone();
        self.cache.handle(key, move || {
            let source = Arc::clone(&source);
            let filter = filter.clone();
            async move { fetch_scholarships(source.as_ref(), &filter).await }
        })
    }

    pub fn resources(&self, filter: &ResourceFilter) -> QueryHandle<Vec<Authored<Resource>>> {
        let key = QueryKey::entity(EntityKind::Resources, filter.key_params());
        let source = Arc::clone(&self.source);
        let filter = filter.clone();
        self.cache.handle(key, move || {
            let source = Arc::clone(&source);
            let filter = filter.clone();
            async move { fetch_resources(source.as_ref(), &filter).await }
        })
    }

    pub fn dashboard_stats(&self) -> QueryHandle<DashboardStats> {
        let source = Arc::clone(&self.source);
        self.cache.handle(QueryKey::dashboard(), move || {
            let source = Arc::clone(&source);
            async move { Ok(fetch_dashboard_stats(source.as_ref()).await) }
        })
    }

    /// Invalidate after a create/update/delete of `kind`.
    ///
    /// Invalidation is deliberately coarse: a mutation can affect any
    /// filtered view of the kind, so every entry under it is marked stale.
    /// The dashboard scope is invalidated alongside since counts shift with
    /// any mutation.
    pub fn invalidate(&self, kind: EntityKind) {
        self.cache.invalidate(KeyScope::Entity(kind));
        self.cache.invalidate(KeyScope::Dashboard);
    }

    /// Drain one batch from the change feed and invalidate the affected
    /// scopes. Returns the number of events consumed.
    #[instrument(skip_all)]
    pub fn consume_changes(&self, feed: &ChangeFeed) -> usize {
        let events = feed.drain(self.cache.config().consume_batch_limit);
        if events.is_empty() {
            return 0;
        }

        let mut kinds: Vec<EntityKind> = events.iter().map(|event| event.kind).collect();
        kinds.sort_by_key(|kind| kind.name());
        kinds.dedup();

        for kind in &kinds {
            self.cache.invalidate(KeyScope::Entity(*kind));
        }
        self.cache.invalidate(KeyScope::Dashboard);

        debug!(consumed = events.len(), kinds = ?kinds, "Consumed change events");
        events.len()
    }
}
