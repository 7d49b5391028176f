//! Content records mirrored from the remote data source.
//!
//! Records are immutable snapshots of backend rows: a refetch replaces the
//! whole list, nothing is patched in place. Nullable array columns decode to
//! empty vectors so consumers can always iterate them.

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Author display profile, resolved in one batched lookup per fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// A content record annotated with its resolved author.
///
/// `author` is always present as a field; `None` means the author's profile
/// row does not exist (or the profile lookup was degraded), not that the
/// annotation step was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Authored<T> {
    #[serde(flatten)]
    pub record: T,
    pub author: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub location: Option<String>,
    pub user_id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_to_empty")]
    pub upvotes: Vec<Uuid>,
    #[serde(default, deserialize_with = "null_to_empty")]
    pub reports: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub event_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub event_date: OffsetDateTime,
    pub location: Option<String>,
    pub user_id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_to_empty")]
    pub registrations: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub priority: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    pub user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub job_type: String,
    pub location: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub apply_url: Option<String>,
    pub user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyGroup {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub description: String,
    pub meeting_schedule: Option<String>,
    pub capacity: Option<u32>,
    pub user_id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_to_empty")]
    pub members: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scholarship {
    pub id: Uuid,
    pub title: String,
    pub provider: Option<String>,
    pub description: String,
    pub category: String,
    pub amount: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub link: Option<String>,
    pub user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub resource_type: String,
    pub department: Option<String>,
    pub semester: Option<String>,
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "null_to_empty")]
    pub tags: Vec<String>,
    pub user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Row counts across all content collections, one field per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub issues: u64,
    pub events: u64,
    pub announcements: u64,
    pub jobs: u64,
    pub study_groups: u64,
    pub scholarships: u64,
    pub resources: u64,
}

fn null_to_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
