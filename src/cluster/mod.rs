//! The two cluster queries the orchestration needs: snapshot status and
//! index recovery.

pub(crate) mod opensearch;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::errors::Result;
use crate::utils::context::RequestContext;

pub use opensearch::OpenSearchClient;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotsResponse {
    pub snapshots: Vec<SnapshotStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapshotStatus {
    pub state: String,
    pub snapshot: String,
    pub repository: String,
    /// Per-index snapshot details keyed by index name; only the keys are used.
    pub indices: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecoverySource {
    pub snapshot: String,
    pub repository: String,
    pub index: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShardRecovery {
    #[serde(rename = "type")]
    pub kind: String,
    pub stage: String,
    pub source: RecoverySource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexRecovery {
    pub shards: Vec<ShardRecovery>,
}

/// Index name to its shard recovery descriptors.
pub type RecoveryInfo = BTreeMap<String, IndexRecovery>;

#[async_trait]
pub trait ClusterQueries: Send + Sync {
    async fn snapshot_status(
        &self,
        ctx: &RequestContext,
        repository: &str,
        snapshot: &str,
    ) -> Result<Vec<SnapshotStatus>>;

    async fn indices_recovery(&self, ctx: &RequestContext, indices: &[String]) -> Result<RecoveryInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recovery_info_from_cluster_json() -> anyhow::Result<()> {
        let info: RecoveryInfo = serde_json::from_value(json!({
            "dbaas_1_orders": {
                "shards": [
                    {
                        "id": 0,
                        "type": "SNAPSHOT",
                        "stage": "DONE",
                        "primary": true,
                        "source": {
                            "repository": "snapshots",
                            "snapshot": "snap-1",
                            "version": "2.11.0",
                            "index": "orders"
                        }
                    },
                    {
                        "id": 0,
                        "type": "PEER",
                        "stage": "INDEX",
                        "source": {"id": "node-1", "host": "10.0.0.1"}
                    }
                ]
            }
        }))?;
        let shards = &info["dbaas_1_orders"].shards;
        assert_eq!(shards.len(), 2);
        assert_eq!(shards[0].source.snapshot, "snap-1");
        assert_eq!(shards[0].kind, "SNAPSHOT");
        assert_eq!(shards[1].source.snapshot, "");
        Ok(())
    }

    #[test]
    fn test_snapshot_status_from_cluster_json() -> anyhow::Result<()> {
        let response: SnapshotsResponse = serde_json::from_value(json!({
            "snapshots": [{
                "snapshot": "snap-1",
                "repository": "snapshots",
                "uuid": "abc",
                "state": "SUCCESS",
                "shards_stats": {"total": 2},
                "indices": {"orders": {"shards_stats": {}}, "users": {}}
            }]
        }))?;
        let snapshot = &response.snapshots[0];
        assert_eq!(snapshot.state, "SUCCESS");
        assert_eq!(snapshot.indices.keys().collect::<Vec<_>>(), vec!["orders", "users"]);
        Ok(())
    }
}
