use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{ClusterQueries, RecoveryInfo, SnapshotStatus, SnapshotsResponse};
use crate::config::ClusterConfig;
use crate::errors::{AdapterError, Result};
use crate::utils::context::{REQUEST_ID_HEADER, RequestContext};

/// Minimal REST client for the two cluster queries.
#[derive(Debug, Clone)]
pub struct OpenSearchClient {
    base: Url,
    username: Option<String>,
    password: Option<String>,
    http: reqwest::Client,
}

impl OpenSearchClient {
    pub fn new(config: &ClusterConfig) -> Result<Self> {
        let base = Url::parse(&config.url)?;
        if base.cannot_be_a_base() {
            return Err(AdapterError::Construction(format!(
                "OpenSearch URL '{}' cannot carry a request path",
                config.url
            )));
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(AdapterError::construction)?;
        Ok(Self {
            base,
            username: config.username.clone(),
            password: config.password.clone(),
            http,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AdapterError::Construction(format!("Cannot build OpenSearch URL from '{}'", self.base))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, ctx: &RequestContext, what: &str, url: Url) -> Result<T> {
        let mut request = self.http.get(url).header(REQUEST_ID_HEADER, ctx.request_id());
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }
        let response: Response = ctx
            .run(what, async {
                let response = request.send().await?;
                Ok(response)
            })
            .await?;
        let status = response.status();
        debug!(status = status.as_u16(), what, "Cluster responded");
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(AdapterError::UnexpectedStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ClusterQueries for OpenSearchClient {
    async fn snapshot_status(
        &self,
        ctx: &RequestContext,
        repository: &str,
        snapshot: &str,
    ) -> Result<Vec<SnapshotStatus>> {
        let url = self.endpoint(&["_snapshot", repository, snapshot, "_status"])?;
        let response: SnapshotsResponse = self.get(ctx, "snapshot status", url).await?;
        Ok(response.snapshots)
    }

    async fn indices_recovery(&self, ctx: &RequestContext, indices: &[String]) -> Result<RecoveryInfo> {
        let joined = indices.join(",");
        let url = if joined.is_empty() {
            self.endpoint(&["_recovery"])?
        } else {
            self.endpoint(&[joined.as_str(), "_recovery"])?
        };
        self.get(ctx, "indices recovery", url).await
    }
}
