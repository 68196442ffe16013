// Result shapes reported back to the aggregator.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Original index name to regenerated index name.
pub type NameMapping = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackAction {
    Backup,
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackStatus {
    Proceeding,
    Success,
    Fail,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Proceeding => "PROCEEDING",
            TrackStatus::Success => "SUCCESS",
            TrackStatus::Fail => "FAIL",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TrackStatus::Proceeding)
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDetails {
    pub local_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTrack {
    pub action: TrackAction,
    pub details: TrackDetails,
    pub status: TrackStatus,
    pub track_id: String,
    /// Present only when index names were regenerated.
    pub changed_name_db: Option<NameMapping>,
    /// Follow-up URL for per-index tracking after a renaming restore.
    pub track_path: Option<String>,
}

impl ActionTrack {
    pub fn new(
        action: TrackAction,
        track_id: &str,
        status: TrackStatus,
        changed_name_db: Option<NameMapping>,
    ) -> Self {
        Self {
            action,
            details: TrackDetails {
                local_id: track_id.to_string(),
            },
            status,
            track_id: track_id.to_string(),
            changed_name_db,
            track_path: None,
        }
    }

    pub fn backup(backup_id: &str, status: TrackStatus) -> Self {
        Self::new(TrackAction::Backup, backup_id, status, None)
    }

    pub fn restore(backup_id: &str, status: TrackStatus, changed_name_db: Option<NameMapping>) -> Self {
        Self::new(TrackAction::Restore, backup_id, status, changed_name_db)
    }

    pub fn with_track_path(mut self, track_path: String) -> Self {
        self.track_path = Some(track_path);
        self
    }
}

/// `{base_path}/backups/track/restoring/backups/{backup_id}/indices/{a,b,...}`
pub fn restoring_track_path(base_path: &str, backup_id: &str, indices: &[String]) -> String {
    format!(
        "{}/backups/track/restoring/backups/{}/indices/{}",
        base_path.trim_end_matches('/'),
        backup_id,
        indices.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backup_track_json_shape() -> anyhow::Result<()> {
        let track = ActionTrack::backup("dbaas_20240322T091826", TrackStatus::Proceeding);
        assert_eq!(
            serde_json::to_value(&track)?,
            json!({
                "action": "BACKUP",
                "details": {"localId": "dbaas_20240322T091826"},
                "status": "PROCEEDING",
                "trackId": "dbaas_20240322T091826",
                "changedNameDb": null,
                "trackPath": null
            })
        );
        Ok(())
    }

    #[test]
    fn test_restore_track_carries_mapping_and_path() -> anyhow::Result<()> {
        let mapping: NameMapping = [("orders".to_string(), "dbaas_x_orders".to_string())].into();
        let track = ActionTrack::restore("snap-1", TrackStatus::Success, Some(mapping))
            .with_track_path("/api/v2/x/backups/track/restoring/backups/snap-1/indices/dbaas_x_orders".to_string());
        let value = serde_json::to_value(&track)?;
        assert_eq!(value["action"], "RESTORE");
        assert_eq!(value["status"], "SUCCESS");
        assert_eq!(value["changedNameDb"]["orders"], "dbaas_x_orders");
        assert!(value["trackPath"].as_str().unwrap().ends_with("/indices/dbaas_x_orders"));
        Ok(())
    }

    #[test]
    fn test_restoring_track_path() {
        let path = restoring_track_path(
            "/api/v2/dbaas/adapter/opensearch/",
            "snap-1",
            &["a".to_string(), "b".to_string()],
        );
        assert_eq!(
            path,
            "/api/v2/dbaas/adapter/opensearch/backups/track/restoring/backups/snap-1/indices/a,b"
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TrackStatus::Proceeding.is_terminal());
        assert!(TrackStatus::Success.is_terminal());
        assert!(TrackStatus::Fail.is_terminal());
        assert_eq!(TrackStatus::Fail.to_string(), "FAIL");
    }
}
