//! Lead-processing pipeline: CSV ingestion, the unsent-lead source, credential
//! selection, the external processor client, and the batch orchestrator.

pub mod batch;
pub mod credentials;
pub mod error;
pub mod ingest;
pub mod processor;
pub mod source;

pub use batch::{BatchOrchestrator, BatchProgress, BatchResult};
pub use credentials::{choose_credential, CredentialSelector, PgCredentialPool};
pub use error::{BatchError, CredentialError, IngestError, InsertError, ProcessError, SourceError};
pub use ingest::{
    extract_lead_id, ingest_csv, parse_csv, sample_csv, CsvLeadRecord, IngestReport, LeadSink,
};
pub use processor::{interpret_response, LeadProcessor, ProcessLeadRequest, ProcessorClient};
pub use source::{with_fallback, LeadSource, PgLeadStore};

use leadops_core::AppConfig;
use sqlx::PgPool;

/// The orchestrator wired to Postgres and the HTTP processor.
pub type PgBatchOrchestrator = BatchOrchestrator<PgLeadStore, PgCredentialPool, ProcessorClient>;

/// Builds a [`PgBatchOrchestrator`] from a pool and the application config.
///
/// # Errors
///
/// Returns [`ProcessError`] if the processor client cannot be constructed.
pub fn build_orchestrator(
    pool: &PgPool,
    config: &AppConfig,
) -> Result<PgBatchOrchestrator, ProcessError> {
    Ok(BatchOrchestrator::new(
        PgLeadStore::new(pool.clone()),
        PgCredentialPool::new(pool.clone()),
        ProcessorClient::new(config)?,
    ))
}
