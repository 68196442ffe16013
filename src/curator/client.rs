use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use tracing::{debug, error, info};
use url::Url;

use super::{BackupRequest, CuratorApi, EvictResponse, JobStatus, RenameRule, RestoreRequest};
use crate::config::CuratorConfig;
use crate::errors::{AdapterError, Result};
use crate::utils::context::{REQUEST_ID_HEADER, RequestContext};

/// HTTP client for Curator. Holds only read-only configuration, so one
/// instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct CuratorClient {
    base: Url,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl CuratorClient {
    pub fn new(config: &CuratorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(AdapterError::construction)?;
        Self::with_http_client(config, http)
    }

    pub fn with_http_client(config: &CuratorConfig, http: reqwest::Client) -> Result<Self> {
        let base = Url::parse(&config.address)?;
        if base.cannot_be_a_base() {
            return Err(AdapterError::Construction(format!(
                "Curator address '{}' cannot carry a request path",
                config.address
            )));
        }
        info!(curator = %base, "Curator client configured");
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
                AdapterError::Construction(format!("Cannot build Curator URL from '{}'", self.base))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn request(&self, ctx: &RequestContext, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .header(REQUEST_ID_HEADER, ctx.request_id())
    }

    async fn send(&self, ctx: &RequestContext, what: &str, request: RequestBuilder) -> Result<Response> {
        ctx.run(what, async {
            let response = request.send().await?;
            Ok(response)
        })
        .await
    }
}

/// Turns a non-2xx answer into an error carrying Curator's body.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AdapterError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CuratorApi for CuratorClient {
    async fn collect(&self, ctx: &RequestContext, dbs: &[String]) -> Result<String> {
        let url = self.endpoint(&["backup"])?;
        let mut request = self.request(ctx, Method::POST, url);
        if !dbs.is_empty() {
            request = request.json(&BackupRequest { dbs });
        }
        let response = self.send(ctx, "collect backup", request).await.map_err(|e| {
            error!(error = %e, ?dbs, "Failed to create snapshot with provided database prefixes");
            e
        })?;
        let body = ensure_success(response).await?.text().await?;
        let backup_id = body.trim().to_string();
        debug!(backup_id = %backup_id, "Snapshot is created");
        Ok(backup_id)
    }

    async fn restore(
        &self,
        ctx: &RequestContext,
        backup_id: &str,
        dbs: &[String],
        rename: Option<&RenameRule>,
    ) -> Result<()> {
        let url = self.endpoint(&["restore"])?;
        let body = RestoreRequest::new(backup_id, dbs, rename);
        debug!(backup_id, body = ?body, "Request body built to restore backup");
        let request = self.request(ctx, Method::POST, url).json(&body);
        let response = ensure_success(self.send(ctx, "restore backup", request).await?).await?;
        let answer = response.text().await.unwrap_or_default();
        info!(backup_id, response = %answer, "Snapshot restoration is started");
        Ok(())
    }

    async fn evict(&self, ctx: &RequestContext, backup_id: &str) -> Result<EvictResponse> {
        let url = self.endpoint(&["evict", backup_id])?;
        let request = self.request(ctx, Method::POST, url);
        let response = self.send(ctx, "evict backup", request).await.map_err(|e| {
            error!(error = %e, backup_id, "Failed to delete snapshot");
            e
        })?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(EvictResponse { status, body })
    }

    async fn job_status(&self, ctx: &RequestContext, backup_id: &str) -> Result<JobStatus> {
        let url = self.endpoint(&["jobstatus", backup_id])?;
        let request = self.request(ctx, Method::GET, url);
        let response = ensure_success(self.send(ctx, "job status", request).await?).await?;
        let bytes = response.bytes().await?;
        let status: JobStatus = serde_json::from_slice(&bytes)?;
        Ok(status)
    }
}
