use tracing::{debug, error};

use super::CuratorApi;
use crate::backup::track::TrackStatus;
use crate::utils::context::RequestContext;

/// Maps a raw Curator job state onto the adapter's status space.
/// Anything unrecognised is a failure.
pub fn translate_state(raw: &str) -> TrackStatus {
    match raw {
        "Failed" => TrackStatus::Fail,
        "Successful" => TrackStatus::Success,
        "Queued" | "Processing" => TrackStatus::Proceeding,
        _ => TrackStatus::Fail,
    }
}

/// Asks Curator for the job state of `backup_id`. Errors collapse to `FAIL`.
pub async fn job_track_status(
    curator: &dyn CuratorApi,
    ctx: &RequestContext,
    backup_id: &str,
) -> TrackStatus {
    match curator.job_status(ctx, backup_id).await {
        Ok(job) => {
            let status = translate_state(job.state());
            debug!(backup_id, raw_state = job.state(), %status, "Job status received");
            status
        }
        Err(e) => {
            error!(error = %e, backup_id, "Failed to find snapshot job");
            TrackStatus::Fail
        }
    }
}
