//! Batched author profile resolution.
//!
//! Content rows carry an author id; the matching display profiles are
//! fetched in one batched lookup per query and joined in memory. The backend
//! offers no ad hoc join over this relationship, so the two-step
//! fetch-then-join is the intended strategy, not a workaround.

use std::collections::{HashMap, HashSet};

use tracing::warn;
use uuid::Uuid;

use crate::domain::entities::Profile;
use crate::domain::types::Collection;
use crate::source::{DataSource, SelectRequest};

const PROFILE_COLUMNS: [&str; 3] = ["user_id", "full_name", "avatar_url"];

/// Resolve display profiles for a set of author ids.
///
/// Absent and nil ids are filtered out and the rest deduplicated before a
/// single batched select; an empty set never touches the backend. Ids with
/// no profile row are simply missing from the returned map. A failed lookup
/// degrades to an empty map: profile resolution never blocks content
/// display.
pub async fn resolve_profiles(
    source: &dyn DataSource,
    ids: impl IntoIterator<Item = Option<Uuid>>,
) -> HashMap<Uuid, Profile> {
    let distinct: HashSet<Uuid> = ids
        .into_iter()
        .flatten()
        .filter(|id| !id.is_nil())
        .collect();
    if distinct.is_empty() {
        return HashMap::new();
    }

    let request = SelectRequest::new(Collection::Profiles)
        .columns(&PROFILE_COLUMNS)
        .id_in("user_id", distinct.into_iter().collect());

    match source.select(request).await {
        Ok(rows) => rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<Profile>(row) {
                Ok(profile) => Some((profile.user_id, profile)),
                Err(error) => {
                    warn!(%error, "Skipping malformed profile row");
                    None
                }
            })
            .collect(),
        Err(error) => {
            warn!(%error, "Profile lookup failed; serving content without authors");
            HashMap::new()
        }
    }
}
