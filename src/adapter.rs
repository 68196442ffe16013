use std::sync::Arc;
use tracing::info;

use crate::cluster::{ClusterQueries, OpenSearchClient};
use crate::config::AppConfig;
use crate::curator::{CuratorApi, CuratorClient};
use crate::errors::Result;
use crate::restore::planner::RestorePlanner;
use crate::restore::recovery::RecoveryTracker;

/// Entry point for every backup, restore and tracking request.
///
/// Holds no per-request state, so one instance is shared by all callers.
/// Backup flows live in `backup`, restore flows in `restore`.
pub struct BackupAdapter {
    pub(crate) curator: Arc<dyn CuratorApi>,
    pub(crate) cluster: Arc<dyn ClusterQueries>,
    pub(crate) tracker: Arc<RecoveryTracker>,
    pub(crate) planner: RestorePlanner,
    pub(crate) repository: String,
    pub(crate) base_path: String,
}

impl BackupAdapter {
    /// Builds the HTTP clients described by `config`. Fails only on setup defects.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let curator = Arc::new(CuratorClient::new(&config.curator)?);
        let cluster = Arc::new(OpenSearchClient::new(&config.cluster)?);
        Ok(Self::new(curator, cluster, config))
    }

    pub fn new(curator: Arc<dyn CuratorApi>, cluster: Arc<dyn ClusterQueries>, config: &AppConfig) -> Self {
        info!(repository = %config.repository, "Creating backup adapter");
        let tracker = Arc::new(RecoveryTracker::new(cluster.clone(), config.missing_recovery_policy));
        let planner = RestorePlanner::new(curator.clone(), cluster.clone(), tracker.clone(), config.restore_poll);
        Self {
            curator,
            cluster,
            tracker,
            planner,
            repository: config.repository.clone(),
            base_path: config.base_path(),
        }
    }

    /// Times the tracker reported a status without recovery evidence.
    pub fn recovery_fallbacks(&self) -> u64 {
        self.tracker.fallback_count()
    }
}
