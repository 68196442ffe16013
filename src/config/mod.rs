// opensearch-backup-adapter/src/config/mod.rs
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::errors::{AdapterError, Result};
use crate::restore::recovery::MissingRecoveryPolicy;
use crate::utils::retry::{DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS, RetryPolicy};

const DEFAULT_REPOSITORY: &str = "snapshots";
const DEFAULT_API_VERSION: &str = "v2";

// Structs for deserializing config.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonRestorePoll {
    pub max_attempts: Option<u32>,
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub curator_address: Option<String>,
    pub curator_credentials: Option<JsonCredentials>,
    pub opensearch_url: Option<String>,
    pub opensearch_credentials: Option<JsonCredentials>,
    pub snapshot_repository: Option<String>,
    pub api_version: Option<String>,
    pub restore_poll: Option<JsonRestorePoll>,
    pub missing_recovery_policy: Option<MissingRecoveryPolicy>,
}

// Application's internal configuration structs
#[derive(Debug, Clone)]
pub struct CuratorConfig {
    pub address: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub curator: CuratorConfig,
    pub cluster: ClusterConfig,
    pub repository: String,
    pub api_version: String,
    pub restore_poll: RetryPolicy,
    pub missing_recovery_policy: MissingRecoveryPolicy,
}

impl AppConfig {
    pub fn load_from_json(config_path: &Path) -> Result<RawJsonConfig> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            AdapterError::Config(format!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            ))
        })?;
        serde_json::from_str(&config_content).map_err(|e| {
            AdapterError::Config(format!(
                "Failed to parse JSON from config file at {}: {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Builds the configuration from `config.json` values overridden by the
    /// environment. `lookup` resolves environment variable names.
    pub fn resolve<F>(raw: RawJsonConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let curator_creds = raw.curator_credentials.unwrap_or_default();
        let address = env("CURATOR_ADDRESS")
            .or(raw.curator_address)
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                AdapterError::Config(
                    "CURATOR_ADDRESS must be set in the environment or curator_address in config.json"
                        .to_string(),
                )
            })?;
        let curator = CuratorConfig {
            address: address.trim_end_matches('/').to_string(),
            username: env("CURATOR_USERNAME")
                .or(curator_creds.username)
                .unwrap_or_default(),
            password: env("CURATOR_PASSWORD")
                .or(curator_creds.password)
                .unwrap_or_default(),
        };

        let cluster_creds = raw.opensearch_credentials.unwrap_or_default();
        let cluster = ClusterConfig {
            url: env("OPENSEARCH_URL")
                .or(raw.opensearch_url)
                .unwrap_or_else(|| "http://localhost:9200".to_string()),
            username: env("OPENSEARCH_USERNAME").or(cluster_creds.username),
            password: env("OPENSEARCH_PASSWORD").or(cluster_creds.password),
        };

        let poll = raw.restore_poll.unwrap_or_default();
        let max_attempts = match env("RESTORE_POLL_ATTEMPTS") {
            Some(value) => parse_number::<u32>("RESTORE_POLL_ATTEMPTS", &value)?,
            None => poll.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        };
        let interval = match env("RESTORE_POLL_INTERVAL_SECS") {
            Some(value) => Duration::from_secs(parse_number::<u64>("RESTORE_POLL_INTERVAL_SECS", &value)?),
            None => poll
                .interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_INTERVAL),
        };

        let missing_recovery_policy = match env("MISSING_RECOVERY_POLICY") {
            Some(value) => value.parse()?,
            None => raw.missing_recovery_policy.unwrap_or_default(),
        };

        Ok(AppConfig {
            curator,
            cluster,
            repository: env("SNAPSHOT_REPOSITORY")
                .or(raw.snapshot_repository)
                .unwrap_or_else(|| DEFAULT_REPOSITORY.to_string()),
            api_version: env("API_VERSION")
                .or(raw.api_version)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            restore_poll: RetryPolicy::new(max_attempts, interval),
            missing_recovery_policy,
        })
    }

    /// Path prefix of the adapter's REST API, used in follow-up track paths.
    pub fn base_path(&self) -> String {
        format!("/api/{}/dbaas/adapter/opensearch", self.api_version)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AdapterError::Config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}
