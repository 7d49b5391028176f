//! Agora client data layer.
//!
//! Cached, parametrized read queries for the Agora community platform:
//! content lists (issues, events, announcements, jobs, study groups,
//! scholarships, resources) denormalized with their author profiles, a
//! stale-while-revalidate query cache with request deduplication and keyed
//! invalidation, and a dashboard aggregator over all content collections.
//!
//! The remote backend stays behind the [`source::DataSource`] port; UI
//! surfaces obtain [`cache::QueryHandle`]s from a [`DataClient`] and render
//! from [`cache::QueryOutcome`] snapshots.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod source;

pub use application::client::DataClient;
pub use application::content::{
    AnnouncementFilter, EventFilter, IssueFilter, JobFilter, ResourceFilter, ScholarshipFilter,
    StudyGroupFilter,
};
pub use cache::{
    CacheConfig, ChangeEvent, ChangeFeed, EntryState, KeyScope, QueryCache, QueryHandle, QueryKey,
    QueryOutcome,
};
pub use config::{CacheSettings, Settings, SettingsError};
pub use domain::entities::{
    Announcement, Authored, DashboardStats, Event, Issue, Job, Profile, Resource, Scholarship,
    StudyGroup,
};
pub use domain::types::{ChangeKind, Collection, EntityKind};
pub use source::{DataSource, Filter, OrderBy, SelectRequest, SourceError};
