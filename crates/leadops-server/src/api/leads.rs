use axum::{
    extract::{rejection::StringRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use leadops_pipeline::{IngestError, IngestReport, LeadSource, PgLeadStore};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{validation_error, ApiError, ApiResponse, AppState, CallerId};

/// Largest CSV body the import route buffers.
pub(super) const IMPORT_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub(super) struct ImportQuery {
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct UnsentCount {
    count: usize,
}

/// POST /api/v1/leads/import?tag= with the CSV text as the body.
pub(super) async fn import_leads(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    caller: CallerId,
    Query(query): Query<ImportQuery>,
    body: Result<String, StringRejection>,
) -> Result<Json<ApiResponse<IngestReport>>, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::new(
                req_id.0.clone(),
                "payload_too_large",
                format!("CSV body exceeds {IMPORT_BODY_LIMIT} bytes"),
            )
        } else {
            ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
        }
    })?;
    let store = PgLeadStore::new(state.pool.clone());
    let tag = query.tag.unwrap_or_default();

    let report = leadops_pipeline::ingest_csv(&store, &body, &tag, caller.0)
        .await
        .map_err(|e| match e {
            IngestError::Validation(err) => validation_error(req_id.0.clone(), &err),
            IngestError::Csv(err) => ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("malformed CSV: {err}"),
            ),
        })?;

    Ok(ApiResponse::new(report, req_id))
}

/// GET /api/v1/leads/unsent-count
pub(super) async fn unsent_count(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    caller: CallerId,
) -> Result<Json<ApiResponse<UnsentCount>>, ApiError> {
    let store = PgLeadStore::new(state.pool.clone());
    let leads = store.fetch_unsent_leads(caller.0).await.map_err(|e| {
        tracing::error!(error = %e, user_id = %caller.0, "unsent lead lookup failed");
        ApiError::new(req_id.0.clone(), "internal_error", "failed to fetch unsent leads")
    })?;

    Ok(ApiResponse::new(
        UnsentCount {
            count: leads.len(),
        },
        req_id,
    ))
}
