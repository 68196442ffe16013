use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::errors::{AdapterError, Result};

/// Header used to forward the correlation id to downstream services.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Per-request state threaded through every call: the correlation id, the
/// tracing span that carries it and the caller's cancellation signal.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    cancel: CancellationToken,
    span: Span,
}

impl RequestContext {
    /// Creates a context with a freshly generated request id.
    pub fn new() -> Self {
        Self::with_request_id(generate_request_id())
    }

    /// Creates a context for an incoming request id, generating one when it is blank.
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        let mut request_id = request_id.into();
        if request_id.trim().is_empty() {
            request_id = generate_request_id();
        }
        let span = tracing::info_span!("request", request_id = %request_id);
        Self {
            request_id,
            cancel: CancellationToken::new(),
            span,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs `fut` unless the request is cancelled first.
    pub async fn run<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(AdapterError::Cancelled(what.to_string()));
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AdapterError::Cancelled(what.to_string())),
            result = fut => result,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// UUID v4 without hyphens.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
