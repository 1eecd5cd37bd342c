use axum::{extract::State, Extension, Json};
use leadops_core::PromptConfig;
use leadops_pipeline::{BatchError, BatchResult};

use crate::middleware::RequestId;

use super::{validation_error, ApiError, ApiResponse, AppState, CallerId};

fn map_batch_error(request_id: String, error: &BatchError) -> ApiError {
    match error {
        BatchError::Validation(err) => validation_error(request_id, err),
        _ if error.is_no_credential() => {
            ApiError::new(request_id, "unprocessable", error.to_string())
        }
        BatchError::Source(_) | BatchError::Credential(_) => {
            tracing::error!(error = %error, "batch run aborted");
            ApiError::new(request_id, "internal_error", error.to_string())
        }
    }
}

/// POST /api/v1/batches: runs every unsent lead of the caller through the
/// processor and returns the final counters once all leads have resolved.
pub(super) async fn run_batch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    caller: CallerId,
    Json(prompt): Json<PromptConfig>,
) -> Result<Json<ApiResponse<BatchResult>>, ApiError> {
    let result = state
        .batches
        .run_batch(caller.0, &prompt)
        .await
        .map_err(|e| map_batch_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(result, req_id))
}
