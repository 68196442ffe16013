//! Restore planning: restores under the original names, or renames every
//! index either in one bulk call or one index at a time.

use std::sync::Arc;
use tracing::{Instrument, debug, error, info, warn};

use super::recovery::RecoveryTracker;
use super::snapshot::actual_indices;
use crate::backup::track::{NameMapping, TrackStatus};
use crate::cluster::ClusterQueries;
use crate::curator::{CuratorApi, RenameRule};
use crate::errors::{AdapterError, Result};
use crate::utils::context::RequestContext;
use crate::utils::naming::IndexNamer;
use crate::utils::retry::RetryPolicy;

/// Index names are limited to 255 bytes by the search engine.
pub const MAX_INDEX_NAME_BYTES: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStrategy {
    /// One restore call, one shared prefix for every index.
    Bulk,
    /// One restore call per index, each with its own generated name.
    Sequential,
}

impl RestoreStrategy {
    pub fn choose(prefix_len: usize, max_name_len: usize) -> Self {
        if prefix_len + max_name_len < MAX_INDEX_NAME_BYTES {
            RestoreStrategy::Bulk
        } else {
            RestoreStrategy::Sequential
        }
    }
}

pub struct RestorePlanner {
    curator: Arc<dyn CuratorApi>,
    cluster: Arc<dyn ClusterQueries>,
    tracker: Arc<RecoveryTracker>,
    namer: IndexNamer,
    poll: RetryPolicy,
}

impl RestorePlanner {
    pub fn new(
        curator: Arc<dyn CuratorApi>,
        cluster: Arc<dyn ClusterQueries>,
        tracker: Arc<RecoveryTracker>,
        poll: RetryPolicy,
    ) -> Self {
        Self {
            curator,
            cluster,
            tracker,
            namer: IndexNamer::new(),
            poll,
        }
    }

    /// Restores `dbs` from `backup_id`. Returns the name mapping when names
    /// were regenerated and `None` otherwise.
    pub async fn restore(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        dbs: &[String],
        repository: &str,
        regenerate_names: bool,
    ) -> Result<Option<NameMapping>> {
        if dbs.is_empty() {
            error!("Database prefixes to restore are not specified");
            return Err(AdapterError::InvalidInput(
                "database prefixes to restore are not specified".to_string(),
            ));
        }

        if !regenerate_names {
            self.curator.restore(ctx, backup_id, dbs, None).await?;
            return Ok(None);
        }

        let indices = actual_indices(self.cluster.as_ref(), ctx, backup_id, repository, None).await?;
        info!(
            count = indices.len(),
            backup_id,
            repository,
            ?indices,
            "Indices received to restore"
        );
        if indices.is_empty() {
            return Err(AdapterError::SnapshotEmpty {
                snapshot: backup_id.to_string(),
                repository: repository.to_string(),
            });
        }

        let max_len = indices.iter().map(String::len).max().unwrap_or(0);
        let prefix = self.namer.unique_prefix();
        debug!(max_len, prefix_len = prefix.len(), "Maximum length of restoring indices");

        let mapping = match RestoreStrategy::choose(prefix.len(), max_len) {
            RestoreStrategy::Bulk => {
                info!("Maximum index name allows to perform bulk restoration");
                self.restore_bulk(ctx, backup_id, &indices, &prefix).await?
            }
            RestoreStrategy::Sequential => {
                info!("Cannot perform bulk restoration");
                warn!(
                    "Index names are too long for bulk renaming; indices are restored one by one \
                     and the request may take much longer than usual"
                );
                self.restore_sequential(ctx, backup_id, &indices, repository).await?
            }
        };
        Ok(Some(mapping))
    }

    async fn restore_bulk(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        indices: &[String],
        prefix: &str,
    ) -> Result<NameMapping> {
        // `$0` is the whole match, so every index gets the same prefix
        let rule = RenameRule {
            pattern: ".+".to_string(),
            replacement: format!("{}$0", prefix),
        };
        self.curator.restore(ctx, backup_id, indices, Some(&rule)).await?;

        Ok(indices
            .iter()
            .map(|index| (index.clone(), format!("{}{}", prefix, index)))
            .collect())
    }

    async fn restore_sequential(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        indices: &[String],
        repository: &str,
    ) -> Result<NameMapping> {
        let mut mapping = NameMapping::new();
        // the next index must not start before the previous one is fully restored
        for index in indices {
            let new_name = self.namer.name_index();
            let span = tracing::debug_span!("index_restore", index = %index, new_name = %new_name);
            self.restore_one(ctx, backup_id, index, &new_name, repository)
                .instrument(span)
                .await?;
            mapping.insert(index.clone(), new_name);
        }
        Ok(mapping)
    }

    async fn restore_one(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        index: &str,
        new_name: &str,
        repository: &str,
    ) -> Result<()> {
        let rule = RenameRule {
            pattern: regex::escape(index),
            replacement: new_name.to_string(),
        };
        self.curator
            .restore(ctx, backup_id, &[index.to_string()], Some(&rule))
            .await?;

        let targets = [new_name.to_string()];
        let outcome = self
            .poll
            .poll(
                ctx,
                |attempt| {
                    debug!(attempt, max_attempts = self.poll.max_attempts, "Waiting for index to be restored");
                    let targets = &targets;
                    // no evidence yet means keep waiting, whatever the tracker policy
                    async move {
                        self.tracker
                            .observe(ctx, backup_id, targets, repository)
                            .await
                            .unwrap_or(TrackStatus::Proceeding)
                    }
                },
                TrackStatus::is_terminal,
            )
            .await?;

        if outcome.last != TrackStatus::Success {
            return Err(AdapterError::RestoreIncomplete {
                index: index.to_string(),
                new_name: new_name.to_string(),
                status: outcome.last.to_string(),
                attempts: outcome.attempts,
            });
        }
        debug!(attempts = outcome.attempts, "Index restored");
        Ok(())
    }
}
