//! Entity query functions.
//!
//! Seven near-identical read operations, one per content kind: build a
//! filtered, sorted select, decode the rows, resolve authors in one batched
//! lookup, merge. A failed primary read fails the whole operation; a failed
//! profile lookup does not (see `profiles.rs`).
//!
//! Blank filter values mean "no filter": they are normalized away both here
//! and in key construction, so `search: ""` and no search are the same
//! query.

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::cache::normalize_param;
use crate::domain::entities::{
    Announcement, Authored, Event, Issue, Job, Resource, Scholarship, StudyGroup,
};
use crate::domain::types::Collection;
use crate::source::{DataSource, OrderBy, SelectRequest, SourceError};

use super::profiles::resolve_profiles;

/// Access to the author foreign key, for the batched profile join.
pub trait HasAuthor {
    fn author_id(&self) -> Option<Uuid>;
}

impl HasAuthor for Issue {
    fn author_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

impl HasAuthor for Event {
    fn author_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

impl HasAuthor for Announcement {
    fn author_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

impl HasAuthor for Job {
    fn author_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

impl HasAuthor for StudyGroup {
    fn author_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

impl HasAuthor for Scholarship {
    fn author_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

impl HasAuthor for Resource {
    fn author_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueFilter {
    pub category: Option<String>,
}

impl IssueFilter {
    pub fn key_params(&self) -> Vec<Option<String>> {
        vec![normalize_param(self.category.as_deref())]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub event_type: Option<String>,
}

impl EventFilter {
    pub fn key_params(&self) -> Vec<Option<String>> {
        vec![normalize_param(self.event_type.as_deref())]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnouncementFilter {
    pub priority: Option<String>,
}

impl AnnouncementFilter {
    pub fn key_params(&self) -> Vec<Option<String>> {
        vec![normalize_param(self.priority.as_deref())]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub job_type: Option<String>,
    pub search: Option<String>,
}

impl JobFilter {
    pub fn key_params(&self) -> Vec<Option<String>> {
        vec![
            normalize_param(self.job_type.as_deref()),
            normalize_param(self.search.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyGroupFilter {
    pub subject: Option<String>,
}

impl StudyGroupFilter {
    pub fn key_params(&self) -> Vec<Option<String>> {
        vec![normalize_param(self.subject.as_deref())]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScholarshipFilter {
    pub category: Option<String>,
}

impl ScholarshipFilter {
    pub fn key_params(&self) -> Vec<Option<String>> {
        vec![normalize_param(self.category.as_deref())]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceFilter {
    pub resource_type: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
    pub search: Option<String>,
}

impl ResourceFilter {
    pub fn key_params(&self) -> Vec<Option<String>> {
        vec![
            normalize_param(self.resource_type.as_deref()),
            normalize_param(self.department.as_deref()),
            normalize_param(self.semester.as_deref()),
            normalize_param(self.search.as_deref()),
        ]
    }
}

pub async fn fetch_issues(
    source: &dyn DataSource,
    filter: &IssueFilter,
) -> Result<Vec<Authored<Issue>>, SourceError> {
    let mut request = SelectRequest::new(Collection::Issues).order(OrderBy::desc("created_at"));
    if let Some(category) = normalize_param(filter.category.as_deref()) {
        request = request.eq("category", category);
    }

    let records: Vec<Issue> = decode_rows(source.select(request).await?)?;
    Ok(with_authors(source, records).await)
}

pub async fn fetch_events(
    source: &dyn DataSource,
    filter: &EventFilter,
) -> Result<Vec<Authored<Event>>, SourceError> {
    let mut request = SelectRequest::new(Collection::Events).order(OrderBy::asc("event_date"));
    if let Some(event_type) = normalize_param(filter.event_type.as_deref()) {
        request = request.eq("event_type", event_type);
    }

    let records: Vec<Event> = decode_rows(source.select(request).await?)?;
    Ok(with_authors(source, records).await)
}

pub async fn fetch_announcements(
    source: &dyn DataSource,
    filter: &AnnouncementFilter,
) -> Result<Vec<Authored<Announcement>>, SourceError> {
    let mut request =
        SelectRequest::new(Collection::Announcements).order(OrderBy::desc("created_at"));
    if let Some(priority) = normalize_param(filter.priority.as_deref()) {
        request = request.eq("priority", priority);
    }

    let records: Vec<Announcement> = decode_rows(source.select(request).await?)?;
    Ok(with_authors(source, records).await)
}

pub async fn fetch_jobs(
    source: &dyn DataSource,
    filter: &JobFilter,
) -> Result<Vec<Authored<Job>>, SourceError> {
    let mut request = SelectRequest::new(Collection::Jobs).order(OrderBy::desc("created_at"));
    if let Some(job_type) = normalize_param(filter.job_type.as_deref()) {
        request = request.eq("job_type", job_type);
    }
    if let Some(term) = normalize_param(filter.search.as_deref()) {
        request = request.search(&["title", "company", "description"], term);
    }

    let records: Vec<Job> = decode_rows(source.select(request).await?)?;
    Ok(with_authors(source, records).await)
}

pub async fn fetch_study_groups(
    source: &dyn DataSource,
    filter: &StudyGroupFilter,
) -> Result<Vec<Authored<StudyGroup>>, SourceError> {
    let mut request =
        SelectRequest::new(Collection::StudyGroups).order(OrderBy::desc("created_at"));
    if let Some(subject) = normalize_param(filter.subject.as_deref()) {
        request = request.eq("subject", subject);
    }

    let records: Vec<StudyGroup> = decode_rows(source.select(request).await?)?;
    Ok(with_authors(source, records).await)
}

pub async fn fetch_scholarships(
    source: &dyn DataSource,
    filter: &ScholarshipFilter,
) -> Result<Vec<Authored<Scholarship>>, SourceError> {
    let mut request = SelectRequest::new(Collection::Scholarships).order(OrderBy::asc("deadline"));
    if let Some(category) = normalize_param(filter.category.as_deref()) {
        request = request.eq("category", category);
    }

    let records: Vec<Scholarship> = decode_rows(source.select(request).await?)?;
    Ok(with_authors(source, records).await)
}

pub async fn fetch_resources(
    source: &dyn DataSource,
    filter: &ResourceFilter,
) -> Result<Vec<Authored<Resource>>, SourceError> {
    let mut request = SelectRequest::new(Collection::Resources).order(OrderBy::desc("created_at"));
    if let Some(resource_type) = normalize_param(filter.resource_type.as_deref()) {
        request = request.eq("resource_type", resource_type);
    }
    if let Some(department) = normalize_param(filter.department.as_deref()) {
        request = request.eq("department", department);
    }
    if let Some(semester) = normalize_param(filter.semester.as_deref()) {
        request = request.eq("semester", semester);
    }
    if let Some(term) = normalize_param(filter.search.as_deref()) {
        request = request.search(&["title", "description"], term);
    }

    let records: Vec<Resource> = decode_rows(source.select(request).await?)?;
    Ok(with_authors(source, records).await)
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, SourceError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|error| SourceError::Decode(error.to_string())))
        .collect()
}

/// Annotate records with their resolved authors: one batched profile lookup,
/// then an in-memory merge. Records whose author did not resolve carry
/// `author: None`.
async fn with_authors<T: HasAuthor>(source: &dyn DataSource, records: Vec<T>) -> Vec<Authored<T>> {
    let profiles = resolve_profiles(source, records.iter().map(HasAuthor::author_id)).await;
    records
        .into_iter()
        .map(|record| {
            let author = record.author_id().and_then(|id| profiles.get(&id).cloned());
            Authored { record, author }
        })
        .collect()
}
