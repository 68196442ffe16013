pub mod planner;
pub mod recovery;
pub mod snapshot;

use tracing::{Instrument, error, info};

use crate::adapter::BackupAdapter;
use crate::backup::track::{ActionTrack, restoring_track_path};
use crate::curator::status::job_track_status;
use crate::errors::Result;
use crate::utils::context::RequestContext;
use snapshot::actual_indices;

impl BackupAdapter {
    /// Restores `dbs` from `backup_id` and reports the job state.
    ///
    /// With `regenerate_names` every restored index gets a fresh name; the
    /// answer then carries the name mapping and a `trackPath` for polling
    /// the renamed indices.
    pub async fn restore_backup(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        dbs: &[String],
        regenerate_names: bool,
    ) -> Result<ActionTrack> {
        async {
            info!(backup_id, ?dbs, regenerate_names, "Request to restore backup is received");
            let mapping = self
                .planner
                .restore(ctx, backup_id, dbs, &self.repository, regenerate_names)
                .await
                .map_err(|e| {
                    error!(error = %e, backup_id, "Failed to restore backup");
                    e
                })?;

            let status = job_track_status(self.curator.as_ref(), ctx, backup_id).await;
            let Some(mapping) = mapping else {
                return Ok(ActionTrack::restore(backup_id, status, None));
            };

            let indices = actual_indices(
                self.cluster.as_ref(),
                ctx,
                backup_id,
                &self.repository,
                Some(&mapping),
            )
            .await?;
            let track_path = restoring_track_path(&self.base_path, backup_id, &indices);
            Ok(ActionTrack::restore(backup_id, status, Some(mapping)).with_track_path(track_path))
        }
        .instrument(ctx.span())
        .await
    }

    pub async fn track_restore(&self, ctx: &RequestContext, backup_id: &str) -> ActionTrack {
        async {
            let status = job_track_status(self.curator.as_ref(), ctx, backup_id).await;
            ActionTrack::restore(backup_id, status, None)
        }
        .instrument(ctx.span())
        .await
    }

    /// Status of a name-regenerating restore, judged from shard recovery
    /// of the given (renamed) indices.
    pub async fn track_restore_indices(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        indices: &[String],
    ) -> ActionTrack {
        self.tracker
            .track_indices(ctx, backup_id, indices, &self.repository, None)
            .instrument(ctx.span())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::track::{TrackAction, TrackStatus};
    use crate::errors::AdapterError;
    use crate::testing::{FakeCluster, FakeCurator, strings, test_config};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_restore_without_renaming() -> anyhow::Result<()> {
        let curator = Arc::new(FakeCurator::with_job_state(Some("Queued")));
        let cluster = Arc::new(FakeCluster::with_snapshot("dbaas_1_1", "snapshots", &["db1", "db2"]));
        let adapter = BackupAdapter::new(curator.clone(), cluster, &test_config());

        let track = adapter
            .restore_backup(&RequestContext::new(), "dbaas_1_1", &strings(&["db1", "db2"]), false)
            .await?;

        assert_eq!(track.action, TrackAction::Restore);
        assert_eq!(track.track_id, "dbaas_1_1");
        assert_eq!(track.status, TrackStatus::Proceeding);
        assert_eq!(track.changed_name_db, None);
        assert_eq!(track.track_path, None);
        let calls = curator.restore_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].backup_id, "dbaas_1_1");
        assert_eq!(calls[0].dbs, strings(&["db1", "db2"]));
        assert_eq!(calls[0].rename, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_with_renaming_attaches_track_path() -> anyhow::Result<()> {
        let curator = Arc::new(FakeCurator::with_job_state(Some("Processing")));
        let cluster = Arc::new(FakeCluster::with_snapshot("snap", "snapshots", &["orders", "users"]));
        let adapter = BackupAdapter::new(curator.clone(), cluster, &test_config());

        let track = adapter
            .restore_backup(&RequestContext::new(), "snap", &strings(&["orders"]), true)
            .await?;

        let mapping = track.changed_name_db.clone().expect("mapping");
        assert_eq!(mapping.len(), 2);
        let renamed_orders = &mapping["orders"];
        let renamed_users = &mapping["users"];
        assert!(renamed_orders.starts_with("dbaas_") && renamed_orders.ends_with("_orders"));

        let track_path = track.track_path.expect("track path");
        assert!(track_path.starts_with(
            "/api/v2/dbaas/adapter/opensearch/backups/track/restoring/backups/snap/indices/"
        ));
        assert!(track_path.ends_with(&format!("{},{}", renamed_orders, renamed_users)));
        assert_eq!(track.status, TrackStatus::Proceeding);
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_rejects_empty_dbs() {
        let curator = Arc::new(FakeCurator::with_job_state(Some("Queued")));
        let cluster = Arc::new(FakeCluster::with_snapshot("snap", "snapshots", &["orders"]));
        let adapter = BackupAdapter::new(curator.clone(), cluster, &test_config());

        let err = adapter
            .restore_backup(&RequestContext::new(), "snap", &[], true)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidInput(_)));
        assert!(curator.restore_calls().is_empty());
    }

    #[tokio::test]
    async fn test_track_restore_failure_keeps_restore_action() {
        let adapter = BackupAdapter::new(
            Arc::new(FakeCurator::with_job_state(None)),
            Arc::new(FakeCluster::with_snapshot("snap", "snapshots", &[])),
            &test_config(),
        );
        let track = adapter.track_restore(&RequestContext::new(), "snap").await;
        assert_eq!(track.action, TrackAction::Restore);
        assert_eq!(track.status, TrackStatus::Fail);
    }

    #[tokio::test]
    async fn test_track_restore_indices() {
        let mut cluster = FakeCluster::with_snapshot("snap", "snapshots", &["orders"]);
        let ctx = RequestContext::new();
        let indices = strings(&["dbaas_1_orders"]);

        let adapter = BackupAdapter::new(
            Arc::new(FakeCurator::with_job_state(Some("Queued"))),
            Arc::new(FakeCluster::with_snapshot("snap", "snapshots", &["orders"])),
            &test_config(),
        );
        let track = adapter.track_restore_indices(&ctx, "snap", &indices).await;
        assert_eq!(track.status, TrackStatus::Success);
        assert_eq!(track.action, TrackAction::Restore);
        assert_eq!(adapter.recovery_fallbacks(), 0);

        cluster.recovery_fails = true;
        let adapter = BackupAdapter::new(
            Arc::new(FakeCurator::with_job_state(Some("Queued"))),
            Arc::new(cluster),
            &test_config(),
        );
        let track = adapter.track_restore_indices(&ctx, "snap", &indices).await;
        assert_eq!(track.status, TrackStatus::Proceeding);
        assert_eq!(adapter.recovery_fallbacks(), 1);
    }
}
