//! Shared domain enumerations aligned with the backend's named collections.

use serde::{Deserialize, Serialize};

/// The seven content kinds served by the data layer.
///
/// Serialized form matches the backing collection name (`snake_case`), so the
/// kind can be used directly in configuration files and invalidation signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Issues,
    Events,
    Announcements,
    Jobs,
    StudyGroups,
    Scholarships,
    Resources,
}

impl EntityKind {
    /// All content kinds, in dashboard display order.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Issues,
        EntityKind::Events,
        EntityKind::Announcements,
        EntityKind::Jobs,
        EntityKind::StudyGroups,
        EntityKind::Scholarships,
        EntityKind::Resources,
    ];

    /// The backing collection for this kind.
    pub fn collection(self) -> Collection {
        match self {
            EntityKind::Issues => Collection::Issues,
            EntityKind::Events => Collection::Events,
            EntityKind::Announcements => Collection::Announcements,
            EntityKind::Jobs => Collection::Jobs,
            EntityKind::StudyGroups => Collection::StudyGroups,
            EntityKind::Scholarships => Collection::Scholarships,
            EntityKind::Resources => Collection::Resources,
        }
    }

    pub fn name(self) -> &'static str {
        self.collection().name()
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Named collections exposed by the remote data source.
///
/// The seven content collections plus `profiles`, which only the profile
/// resolver reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Issues,
    Events,
    Announcements,
    Jobs,
    StudyGroups,
    Scholarships,
    Resources,
    Profiles,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Issues => "issues",
            Collection::Events => "events",
            Collection::Announcements => "announcements",
            Collection::Jobs => "jobs",
            Collection::StudyGroups => "study_groups",
            Collection::Scholarships => "scholarships",
            Collection::Resources => "resources",
            Collection::Profiles => "profiles",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The mutation class carried by a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}
