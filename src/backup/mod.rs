pub mod track; // ActionTrack and the statuses reported to the aggregator

use tracing::{Instrument, debug, error, info};

use crate::adapter::BackupAdapter;
use crate::curator::EvictResponse;
use crate::curator::status::job_track_status;
use crate::errors::{AdapterError, Result};
use crate::utils::context::RequestContext;
use track::ActionTrack;

impl BackupAdapter {
    /// Starts a backup of `dbs` and reports its initial state.
    pub async fn collect_backup(&self, ctx: &RequestContext, dbs: &[String]) -> Result<ActionTrack> {
        async {
            info!(?dbs, "Request to collect new backup is received");
            let backup_id = self.curator.collect(ctx, dbs).await.map_err(|e| {
                error!(error = %e, "Failed to create snapshot");
                e
            })?;
            Ok(self.backup_status(ctx, &backup_id).await)
        }
        .instrument(ctx.span())
        .await
    }

    pub async fn track_backup(&self, ctx: &RequestContext, backup_id: &str) -> ActionTrack {
        self.backup_status(ctx, backup_id).instrument(ctx.span()).await
    }

    /// Asks Curator to evict `backup_id`. Answers below 500 count as done.
    pub async fn evict_backup(&self, ctx: &RequestContext, backup_id: &str) -> Result<EvictResponse> {
        async {
            info!(backup_id, "Request to delete backup is received");
            let response = self.curator.evict(ctx, backup_id).await?;
            if response.is_server_error() {
                error!(backup_id, status = response.status, "Curator failed to evict backup");
                return Err(AdapterError::UnexpectedStatus {
                    status: response.status,
                    body: response.body,
                });
            }
            Ok(response)
        }
        .instrument(ctx.span())
        .await
    }

    async fn backup_status(&self, ctx: &RequestContext, backup_id: &str) -> ActionTrack {
        debug!(backup_id, "Tracking backup");
        let status = job_track_status(self.curator.as_ref(), ctx, backup_id).await;
        debug!(backup_id, %status, "Backup status");
        ActionTrack::backup(backup_id, status)
    }
}
