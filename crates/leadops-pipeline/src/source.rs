//! Lead Source: unsent leads for a user, tolerant of the two names under
//! which a deployment may expose the underlying query.

use std::fmt::Display;
use std::future::Future;

use async_trait::async_trait;
use leadops_core::{Lead, NewLead};
use leadops_db::{DbError, UnsentLeadsQuery};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{InsertError, SourceError};
use crate::ingest::LeadSink;

#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Leads owned by `user_id` that have no processor result yet, in the
    /// order the store returns them.
    async fn fetch_unsent_leads(&self, user_id: Uuid) -> Result<Vec<Lead>, SourceError>;
}

/// Runs `call` against the primary query name and, only if that fails, once
/// against the alternate name. The error surfaces only when both fail.
///
/// # Errors
///
/// Returns [`SourceError`] carrying both failure messages.
pub async fn with_fallback<T, E, F, Fut>(mut call: F) -> Result<T, SourceError>
where
    F: FnMut(UnsentLeadsQuery) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let primary = UnsentLeadsQuery::ByUser;
    let fallback = UnsentLeadsQuery::Alternate;

    let primary_err = match call(primary).await {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    tracing::warn!(
        query = primary.function_name(),
        error = %primary_err,
        "unsent-lead query failed; trying alternate name"
    );

    call(fallback).await.map_err(|fallback_err| SourceError {
        primary_name: primary.function_name(),
        primary: primary_err.to_string(),
        fallback_name: fallback.function_name(),
        fallback: fallback_err.to_string(),
    })
}

/// Postgres-backed lead store: the Lead Source for batch runs and the sink
/// for CSV ingestion.
#[derive(Debug, Clone)]
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadSource for PgLeadStore {
    async fn fetch_unsent_leads(&self, user_id: Uuid) -> Result<Vec<Lead>, SourceError> {
        with_fallback(|query| leadops_db::fetch_unsent_leads(&self.pool, query, user_id)).await
    }
}

#[async_trait]
impl LeadSink for PgLeadStore {
    async fn insert_lead(&self, lead: &NewLead) -> Result<(), InsertError> {
        leadops_db::insert_lead(&self.pool, lead)
            .await
            .map_err(|e| insert_error(&lead.lead_id, &e))
    }
}

fn insert_error(lead_id: &str, err: &DbError) -> InsertError {
    if err.is_unique_violation() {
        InsertError::Duplicate(lead_id.to_string())
    } else {
        InsertError::Store(err.to_string())
    }
}
