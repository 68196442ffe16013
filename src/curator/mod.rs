//! Gateway to the Curator service, which physically performs snapshots,
//! restores and evictions and reports job state.

pub(crate) mod client;
pub(crate) mod status;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::utils::context::RequestContext;

pub use client::CuratorClient;

/// Rename rule handed to Curator on restore; both halves travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRule {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BackupRequest<'a> {
    pub dbs: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct RestoreRequest<'a> {
    pub vault: &'a str,
    pub dbs: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename_pattern: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename_replacement: Option<&'a str>,
}

impl<'a> RestoreRequest<'a> {
    pub fn new(vault: &'a str, dbs: &'a [String], rename: Option<&'a RenameRule>) -> Self {
        Self {
            vault,
            dbs,
            rename_pattern: rename.map(|r| r.pattern.as_str()),
            rename_replacement: rename.map(|r| r.replacement.as_str()),
        }
    }
}

/// Job description returned by `GET /jobstatus/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobStatus {
    #[serde(rename = "status")]
    pub state: Option<String>,
    #[serde(rename = "details")]
    pub message: Option<String>,
    pub vault: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "err")]
    pub error: Option<String>,
    #[serde(rename = "trackPath")]
    pub task_id: Option<String>,
}

impl JobStatus {
    pub fn state(&self) -> &str {
        self.state.as_deref().unwrap_or("")
    }
}

/// Raw answer to an eviction; Curator's status is reported rather than judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictResponse {
    pub status: u16,
    pub body: String,
}

impl EvictResponse {
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

#[async_trait]
pub trait CuratorApi: Send + Sync {
    /// Starts a backup of `dbs` and returns the backup id Curator assigned.
    async fn collect(&self, ctx: &RequestContext, dbs: &[String]) -> Result<String>;

    async fn restore(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        dbs: &[String],
        rename: Option<&RenameRule>,
    ) -> Result<()>;

    async fn evict(&self, ctx: &RequestContext, backup_id: &str) -> Result<EvictResponse>;

    async fn job_status(&self, ctx: &RequestContext, backup_id: &str) -> Result<JobStatus>;
}
