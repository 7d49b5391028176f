//! Dashboard aggregation: row counts fanned out across all content
//! collections.

use futures::future::join_all;
use tracing::warn;

use crate::domain::entities::DashboardStats;
use crate::domain::types::EntityKind;
use crate::source::DataSource;

/// Count rows in every content collection, all seven requests in parallel.
///
/// A failed count is logged and defaults to zero for that collection; one
/// unreachable collection never takes the whole dashboard down. Exact counts
/// are not safety-critical, which is also why the result is cached under a
/// longer staleness window.
pub async fn fetch_dashboard_stats(source: &dyn DataSource) -> DashboardStats {
    let counts = join_all(EntityKind::ALL.iter().copied().map(|kind| async move {
        match source.count(kind.collection(), &[]).await {
            Ok(count) => (kind, count),
            Err(error) => {
                warn!(collection = %kind, %error, "Count failed; defaulting to 0");
                (kind, 0)
            }
        }
    }))
    .await;

    let mut stats = DashboardStats::default();
    for (kind, count) in counts {
        match kind {
            EntityKind::Issues => stats.issues = count,
            EntityKind::Events => stats.events = count,
            EntityKind::Announcements => stats.announcements = count,
            EntityKind::Jobs => stats.jobs = count,
            EntityKind::StudyGroups => stats.study_groups = count,
            EntityKind::Scholarships => stats.scholarships = count,
            EntityKind::Resources => stats.resources = count,
        }
    }
    stats
}
