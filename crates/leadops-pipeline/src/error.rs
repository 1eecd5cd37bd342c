use leadops_core::ValidationError;
use leadops_db::DbError;
use thiserror::Error;

/// Both names of the unsent-lead query failed.
#[derive(Debug, Error)]
#[error(
    "failed to fetch unsent leads: {primary_name}: {primary}; {fallback_name}: {fallback}"
)]
pub struct SourceError {
    pub primary_name: &'static str,
    pub primary: String,
    pub fallback_name: &'static str,
    pub fallback: String,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    /// The key pool is empty.
    #[error("no API keys found in the credential pool")]
    NoCredential,

    #[error("credential store error: {0}")]
    Store(#[from] DbError),
}

/// Failure of a single call to the external processor. Never aborts a batch.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status; `message` is the body's `error` field or `HTTP <status>`.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// 2xx status whose body is not JSON.
    #[error("Invalid JSON response")]
    InvalidJson,

    #[error("invalid processor base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Fatal batch errors. Each aborts the run before any lead is submitted.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl BatchError {
    /// `true` for the empty-credential-pool case.
    #[must_use]
    pub fn is_no_credential(&self) -> bool {
        matches!(self, BatchError::Credential(CredentialError::NoCredential))
    }
}

/// A single row could not be written to the lead store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("duplicate lead_id '{0}'")]
    Duplicate(String),

    #[error("{0}")]
    Store(String),
}

/// Whole-file CSV ingestion failures. Per-row problems are counted instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
