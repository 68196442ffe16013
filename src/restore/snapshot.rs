use tracing::debug;

use crate::backup::track::NameMapping;
use crate::cluster::ClusterQueries;
use crate::errors::{AdapterError, Result};
use crate::utils::context::RequestContext;

/// Names of the indices captured in `backup_id`, each replaced by its
/// renamed counterpart when `changed_name_db` has one.
pub async fn actual_indices(
    cluster: &dyn ClusterQueries,
    ctx: &RequestContext,
    backup_id: &str,
    repository: &str,
    changed_name_db: Option<&NameMapping>,
) -> Result<Vec<String>> {
    let repository = if repository.is_empty() { backup_id } else { repository };
    let snapshots = cluster.snapshot_status(ctx, repository, backup_id).await?;
    debug!(found = snapshots.len(), backup_id, repository, "Snapshots received");

    let snapshot = snapshots
        .into_iter()
        .find(|s| s.snapshot == backup_id)
        .ok_or_else(|| AdapterError::SnapshotNotFound {
            snapshot: backup_id.to_string(),
            repository: repository.to_string(),
        })?;

    let mut indices: Vec<String> = snapshot
        .indices
        .keys()
        .map(|name| {
            changed_name_db
                .and_then(|mapping| mapping.get(name))
                .filter(|renamed| !renamed.is_empty())
                .unwrap_or(name)
                .clone()
        })
        .collect();
    indices.sort();
    Ok(indices)
}
