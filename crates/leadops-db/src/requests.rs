//! Scrape requests queued for the external scraper.

use chrono::{DateTime, Utc};
use leadops_core::NewScrapeRequest;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Hard cap on the number of requests returned by a listing.
pub const MAX_REQUEST_LIST: i64 = 200;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ScrapeRequestRow {
    pub request_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub keywords: Option<String>,
    pub search_url: Option<String>,
    pub request_by: Uuid,
    pub tag: String,
    pub load_time: i32,
    pub is_fulfilled: bool,
    pub scrape_likes: bool,
}

/// Queues a validated scrape request on behalf of `user_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when the row
/// violates the keywords/search URL check constraint.
pub async fn insert_scrape_request(
    pool: &PgPool,
    user_id: Uuid,
    request: &NewScrapeRequest,
) -> Result<ScrapeRequestRow, DbError> {
    let row = sqlx::query_as::<_, ScrapeRequestRow>(
        "INSERT INTO requests (keywords, search_url, request_by, tag, load_time, scrape_likes) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING request_id, created_at, keywords, search_url, request_by, tag, \
                   load_time, is_fulfilled, scrape_likes",
    )
    .bind(request.keywords.as_deref())
    .bind(request.search_url.as_deref())
    .bind(user_id)
    .bind(&request.tag)
    .bind(request.load_time)
    .bind(request.scrape_likes)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the user's latest requests, newest first. `limit` is clamped to
/// `1..=MAX_REQUEST_LIST`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_requests(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ScrapeRequestRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeRequestRow>(
        "SELECT request_id, created_at, keywords, search_url, request_by, tag, \
                load_time, is_fulfilled, scrape_likes \
         FROM requests \
         WHERE request_by = $1 \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit.clamp(1, MAX_REQUEST_LIST))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
