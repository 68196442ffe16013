use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request or client construction failed. Signals a setup defect, not a runtime condition.
    #[error("Construction error: {0}")]
    Construction(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Snapshot '{snapshot}' not found in repository '{repository}'")]
    SnapshotNotFound { snapshot: String, repository: String },

    #[error("Snapshot '{snapshot}' in repository '{repository}' contains no indices")]
    SnapshotEmpty { snapshot: String, repository: String },

    #[error("Failed to restore {index}->{new_name}, status is '{status}' after {attempts} retries")]
    RestoreIncomplete {
        index: String,
        new_name: String,
        status: String,
        attempts: u32,
    },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

impl AdapterError {
    /// Whether the error comes from setup rather than from the operation itself.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AdapterError::Construction(_) | AdapterError::Config(_))
    }

    pub(crate) fn construction(err: impl std::fmt::Display) -> Self {
        AdapterError::Construction(err.to_string())
    }
}

impl From<url::ParseError> for AdapterError {
    fn from(err: url::ParseError) -> Self {
        AdapterError::Construction(format!("URL parsing error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
