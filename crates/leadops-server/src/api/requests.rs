use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use leadops_core::NewScrapeRequest;
use leadops_db::{ScrapeRequestRow, MAX_REQUEST_LIST};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_db_error, validation_error, ApiError, ApiResponse, AppState, CallerId};

#[derive(Debug, Deserialize)]
pub(super) struct RequestListQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/requests: the caller's latest requests, newest first.
pub(super) async fn list_requests(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    caller: CallerId,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<ApiResponse<Vec<ScrapeRequestRow>>>, ApiError> {
    let limit = query.limit.unwrap_or(MAX_REQUEST_LIST);
    let rows = leadops_db::list_scrape_requests(&state.pool, caller.0, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(rows, req_id))
}

/// POST /api/v1/requests: queue a scrape request for the external scraper.
pub(super) async fn submit_request(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    caller: CallerId,
    Json(body): Json<NewScrapeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScrapeRequestRow>>), ApiError> {
    let request = body
        .validated()
        .map_err(|e| validation_error(req_id.0.clone(), &e))?;

    let row = leadops_db::insert_scrape_request(&state.pool, caller.0, &request)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(request_id = %row.request_id, tag = %row.tag, "scrape request queued");
    Ok((StatusCode::CREATED, ApiResponse::new(row, req_id)))
}
