//! Saved prompt configurations.

use chrono::{DateTime, Utc};
use leadops_core::PromptConfig;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PromptRow {
    pub id: i64,
    pub user_id: Uuid,
    pub tag: String,
    pub wildnet_data: String,
    pub scoring_criteria_and_icp: String,
    pub message_prompt: String,
    pub created_at: DateTime<Utc>,
}

impl PromptRow {
    /// The three prompt blocks of this row, ready to drive a batch run.
    #[must_use]
    pub fn prompt_config(&self) -> PromptConfig {
        PromptConfig::new(
            self.wildnet_data.clone(),
            self.scoring_criteria_and_icp.clone(),
            self.message_prompt.clone(),
        )
    }
}

/// Saves a prompt configuration for `user_id` under `tag`.
///
/// The caller is expected to have validated `prompt` already.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_prompt(
    pool: &PgPool,
    user_id: Uuid,
    tag: &str,
    prompt: &PromptConfig,
) -> Result<PromptRow, DbError> {
    let row = sqlx::query_as::<_, PromptRow>(
        "INSERT INTO prompts \
             (user_id, tag, wildnet_data, scoring_criteria_and_icp, message_prompt) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, user_id, tag, wildnet_data, scoring_criteria_and_icp, \
                   message_prompt, created_at",
    )
    .bind(user_id)
    .bind(tag)
    .bind(&prompt.wildnet_data)
    .bind(&prompt.scoring_criteria_and_icp)
    .bind(&prompt.message_prompt)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the user's saved prompts, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_prompts(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<PromptRow>, DbError> {
    let rows = sqlx::query_as::<_, PromptRow>(
        "SELECT id, user_id, tag, wildnet_data, scoring_criteria_and_icp, \
                message_prompt, created_at \
         FROM prompts \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches one saved prompt owned by `user_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no prompt with `id` belongs to the user,
/// or [`DbError::Sqlx`] if the query fails.
pub async fn get_prompt(pool: &PgPool, id: i64, user_id: Uuid) -> Result<PromptRow, DbError> {
    sqlx::query_as::<_, PromptRow>(
        "SELECT id, user_id, tag, wildnet_data, scoring_criteria_and_icp, \
                message_prompt, created_at \
         FROM prompts \
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}
