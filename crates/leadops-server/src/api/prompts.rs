use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use leadops_core::{PromptConfig, ValidationError};
use leadops_db::PromptRow;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, validation_error, ApiError, ApiResponse, AppState, CallerId,
};

#[derive(Debug, Deserialize)]
pub(super) struct SavePromptRequest {
    pub tag: String,
    #[serde(flatten)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Deserialize)]
pub(super) struct PromptListQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/prompts: the caller's saved prompts, newest first.
pub(super) async fn list_prompts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    caller: CallerId,
    Query(query): Query<PromptListQuery>,
) -> Result<Json<ApiResponse<Vec<PromptRow>>>, ApiError> {
    let rows = leadops_db::list_prompts(&state.pool, caller.0, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(rows, req_id))
}

/// GET /api/v1/prompts/:id: 404 unless the prompt belongs to the caller.
pub(super) async fn get_prompt(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PromptRow>>, ApiError> {
    let row = leadops_db::get_prompt(&state.pool, id, caller.0)
        .await
        .map_err(|e| match e {
            leadops_db::DbError::NotFound => {
                ApiError::new(req_id.0.clone(), "not_found", format!("prompt {id} not found"))
            }
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(ApiResponse::new(row, req_id))
}

/// POST /api/v1/prompts
pub(super) async fn save_prompt(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    caller: CallerId,
    Json(body): Json<SavePromptRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PromptRow>>), ApiError> {
    let tag = body.tag.trim();
    if tag.is_empty() {
        return Err(validation_error(
            req_id.0.clone(),
            &ValidationError::new("tag is required"),
        ));
    }
    let prompt = body
        .prompt
        .validated()
        .map_err(|e| validation_error(req_id.0.clone(), &e))?;

    let row = leadops_db::insert_prompt(&state.pool, caller.0, tag, &prompt)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((StatusCode::CREATED, ApiResponse::new(row, req_id)))
}
