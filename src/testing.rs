// In-memory Curator and cluster doubles shared by the flow tests.
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

use crate::cluster::{
    ClusterQueries, IndexRecovery, RecoveryInfo, RecoverySource, ShardRecovery, SnapshotStatus,
};
use crate::config::{AppConfig, RawJsonConfig};
use crate::curator::{CuratorApi, EvictResponse, JobStatus, RenameRule};
use crate::errors::{AdapterError, Result};
use crate::utils::context::RequestContext;

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::resolve(RawJsonConfig::default(), |key| match key {
        "CURATOR_ADDRESS" => Some("http://curator:8080".to_string()),
        "RESTORE_POLL_ATTEMPTS" => Some("3".to_string()),
        "RESTORE_POLL_INTERVAL_SECS" => Some("0".to_string()),
        _ => None,
    })
    .expect("test config");
    config.repository = "snapshots".to_string();
    config
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreCall {
    pub backup_id: String,
    pub dbs: Vec<String>,
    pub rename: Option<RenameRule>,
}

pub struct FakeCurator {
    pub backup_id: String,
    /// `None` makes `job_status` fail.
    pub job_state: Option<String>,
    pub evict_status: u16,
    pub restores: Mutex<Vec<RestoreCall>>,
    pub collected: Mutex<Vec<Vec<String>>>,
}

impl FakeCurator {
    pub fn with_job_state(state: Option<&str>) -> Self {
        Self {
            backup_id: "dbaas_20240322T091826".to_string(),
            job_state: state.map(str::to_string),
            evict_status: 200,
            restores: Mutex::new(Vec::new()),
            collected: Mutex::new(Vec::new()),
        }
    }

    pub fn restore_calls(&self) -> Vec<RestoreCall> {
        self.restores.lock().unwrap().clone()
    }
}

#[async_trait]
impl CuratorApi for FakeCurator {
    async fn collect(&self, _: &RequestContext, dbs: &[String]) -> Result<String> {
        self.collected.lock().unwrap().push(dbs.to_vec());
        Ok(self.backup_id.clone())
    }

    async fn restore(
        &self,
        _: &RequestContext,
        backup_id: &str,
        dbs: &[String],
        rename: Option<&RenameRule>,
    ) -> Result<()> {
        self.restores.lock().unwrap().push(RestoreCall {
            backup_id: backup_id.to_string(),
            dbs: dbs.to_vec(),
            rename: rename.cloned(),
        });
        Ok(())
    }

    async fn evict(&self, _: &RequestContext, _: &str) -> Result<EvictResponse> {
        Ok(EvictResponse {
            status: self.evict_status,
            body: if self.evict_status >= 500 { "evict failed".to_string() } else { String::new() },
        })
    }

    async fn job_status(&self, _: &RequestContext, backup_id: &str) -> Result<JobStatus> {
        match &self.job_state {
            Some(state) => Ok(JobStatus {
                state: Some(state.clone()),
                vault: Some(backup_id.to_string()),
                ..JobStatus::default()
            }),
            None => Err(AdapterError::UnexpectedStatus {
                status: 404,
                body: "unknown job".to_string(),
            }),
        }
    }
}

/// One snapshot in `repository`; every recovery query answers DONE shards
/// restored from it, or fails when `recovery_fails` is set.
pub struct FakeCluster {
    pub snapshot: SnapshotStatus,
    pub recovery_fails: bool,
}

impl FakeCluster {
    pub fn with_snapshot(name: &str, repository: &str, indices: &[&str]) -> Self {
        Self {
            snapshot: SnapshotStatus {
                state: "SUCCESS".to_string(),
                snapshot: name.to_string(),
                repository: repository.to_string(),
                indices: indices.iter().map(|i| (i.to_string(), json!({}))).collect(),
            },
            recovery_fails: false,
        }
    }
}

#[async_trait]
impl ClusterQueries for FakeCluster {
    async fn snapshot_status(&self, _: &RequestContext, repository: &str, _: &str) -> Result<Vec<SnapshotStatus>> {
        if repository != self.snapshot.repository {
            return Err(AdapterError::UnexpectedStatus {
                status: 404,
                body: "repository_missing_exception".to_string(),
            });
        }
        Ok(vec![self.snapshot.clone()])
    }

    async fn indices_recovery(&self, _: &RequestContext, indices: &[String]) -> Result<RecoveryInfo> {
        if self.recovery_fails {
            return Err(AdapterError::UnexpectedStatus {
                status: 500,
                body: "no recovery".to_string(),
            });
        }
        Ok(indices
            .iter()
            .map(|name| {
                let shard = ShardRecovery {
                    kind: "SNAPSHOT".to_string(),
                    stage: "DONE".to_string(),
                    source: RecoverySource {
                        snapshot: self.snapshot.snapshot.clone(),
                        repository: self.snapshot.repository.clone(),
                        index: name.clone(),
                    },
                };
                (name.clone(), IndexRecovery { shards: vec![shard] })
            })
            .collect())
    }
}
