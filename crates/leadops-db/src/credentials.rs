//! Database operations for the `gemini_api` key pool.

use sqlx::PgPool;

use crate::DbError;

/// Returns every API key in the pool, in no particular order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_api_keys(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let keys = sqlx::query_scalar::<_, String>("SELECT api_key FROM gemini_api")
        .fetch_all(pool)
        .await?;

    Ok(keys)
}

/// Adds a key to the pool. Returns `false` if the key was already present.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_api_key(pool: &PgPool, api_key: &str) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO gemini_api (api_key) VALUES ($1) \
         ON CONFLICT (api_key) DO NOTHING",
    )
    .bind(api_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
