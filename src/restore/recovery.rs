// Restore progress as reported by the cluster's index recovery API.
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

use crate::backup::track::{ActionTrack, NameMapping, TrackStatus};
use crate::cluster::{ClusterQueries, RecoveryInfo};
use crate::errors::AdapterError;
use crate::utils::context::RequestContext;

/// What to report when the cluster gives no evidence about a restore: the
/// recovery query failed, or no shard recovered from the snapshot.
///
/// The cluster drops recovery records soon after completion, so missing
/// evidence is reported as still running by default. This can mask real
/// failures as in-progress; every occurrence is counted and logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum MissingRecoveryPolicy {
    #[default]
    #[serde(rename = "proceeding")]
    AssumeProceeding,
    #[serde(rename = "fail")]
    ReportFailure,
}

impl MissingRecoveryPolicy {
    pub fn status(self) -> TrackStatus {
        match self {
            MissingRecoveryPolicy::AssumeProceeding => TrackStatus::Proceeding,
            MissingRecoveryPolicy::ReportFailure => TrackStatus::Fail,
        }
    }
}

impl FromStr for MissingRecoveryPolicy {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proceeding" => Ok(MissingRecoveryPolicy::AssumeProceeding),
            "fail" => Ok(MissingRecoveryPolicy::ReportFailure),
            other => Err(AdapterError::Config(format!(
                "MISSING_RECOVERY_POLICY must be 'proceeding' or 'fail', got '{}'",
                other
            ))),
        }
    }
}

/// Folds shard recovery descriptors into one status for the restore of
/// `snapshot` from `repository`. `None` means no shard came from it.
pub fn aggregate_recovery(info: &RecoveryInfo, snapshot: &str, repository: &str) -> Option<TrackStatus> {
    let mut found = false;
    for shard in info.values().flat_map(|index| index.shards.iter()) {
        if shard.source.snapshot != snapshot || shard.source.repository != repository {
            continue;
        }
        if !shard.stage.eq_ignore_ascii_case("done") {
            return Some(TrackStatus::Proceeding);
        }
        found = true;
    }
    found.then_some(TrackStatus::Success)
}

/// Stateless tracker: every call queries the cluster from scratch.
pub struct RecoveryTracker {
    cluster: Arc<dyn ClusterQueries>,
    policy: MissingRecoveryPolicy,
    fallbacks: AtomicU64,
}

impl RecoveryTracker {
    pub fn new(cluster: Arc<dyn ClusterQueries>, policy: MissingRecoveryPolicy) -> Self {
        Self {
            cluster,
            policy,
            fallbacks: AtomicU64::new(0),
        }
    }

    /// How many times the missing-evidence policy decided a status.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub async fn track_indices(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        indices: &[String],
        repository: &str,
        changed_name_db: Option<NameMapping>,
    ) -> ActionTrack {
        info!(backup_id, ?indices, "Tracking indices restoration");

        let status = match self.query(ctx, backup_id, indices, repository).await {
            Ok(Some(status)) => status,
            Ok(None) => self.fall_back(backup_id, "no shard recovered from the snapshot"),
            Err(AdapterError::Cancelled(reason)) => {
                debug!(reason = %reason, "Recovery query cancelled");
                TrackStatus::Proceeding
            }
            Err(e) => {
                error!(error = %e, backup_id, "Failed to fetch recovery info");
                self.fall_back(backup_id, "recovery query failed")
            }
        };
        ActionTrack::restore(backup_id, status, changed_name_db)
    }

    /// Recovery status backed by evidence only. A failed query or one with
    /// no shard from the snapshot gives `None`; the missing-evidence policy
    /// is not applied and nothing is counted.
    pub async fn observe(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        indices: &[String],
        repository: &str,
    ) -> Option<TrackStatus> {
        match self.query(ctx, backup_id, indices, repository).await {
            Ok(status) => status,
            Err(e) => {
                debug!(error = %e, backup_id, "No recovery evidence this time");
                None
            }
        }
    }

    async fn query(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        indices: &[String],
        repository: &str,
    ) -> crate::errors::Result<Option<TrackStatus>> {
        let repository = if repository.is_empty() { backup_id } else { repository };
        let info = self.cluster.indices_recovery(ctx, indices).await?;
        debug!(indices = info.len(), backup_id, repository, "Recovery info received");
        Ok(aggregate_recovery(&info, backup_id, repository))
    }

    fn fall_back(&self, backup_id: &str, reason: &str) -> TrackStatus {
        let count = self.fallbacks.fetch_add(1, Ordering::Relaxed) + 1;
        let status = self.policy.status();
        warn!(
            backup_id,
            reason,
            policy = ?self.policy,
            %status,
            fallbacks = count,
            "No recovery evidence, status decided by policy"
        );
        status
    }
}
