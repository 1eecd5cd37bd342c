//! Credential Selector: one API key drawn uniformly at random from the pool.
//! Selection is memoryless; nothing is carried between runs.

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::Rng;
use sqlx::PgPool;

use crate::error::CredentialError;

#[async_trait]
pub trait CredentialSelector: Send + Sync {
    async fn select_credential(&self) -> Result<String, CredentialError>;
}

/// Picks one key uniformly from `keys`, or `None` for an empty pool.
pub fn choose_credential<'a, R: Rng + ?Sized>(keys: &'a [String], rng: &mut R) -> Option<&'a str> {
    keys.choose(rng).map(String::as_str)
}

/// Reads the `gemini_api` key pool on every selection.
#[derive(Debug, Clone)]
pub struct PgCredentialPool {
    pool: PgPool,
}

impl PgCredentialPool {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialSelector for PgCredentialPool {
    async fn select_credential(&self) -> Result<String, CredentialError> {
        let keys = leadops_db::list_api_keys(&self.pool).await?;
        let chosen = choose_credential(&keys, &mut rand::rng())
            .ok_or(CredentialError::NoCredential)?
            .to_owned();
        tracing::debug!(pool_size = keys.len(), "selected API credential");
        Ok(chosen)
    }
}
