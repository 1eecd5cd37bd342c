//! Results dashboard handlers.
//!
//! - `GET /api/v1/dashboard`: one page of processor results
//! - `GET /api/v1/dashboard/tags`: distinct lead tags of the window
//!
//! Both accept `from`/`to` (inclusive `YYYY-MM-DD`, default: last 14 days).
//! Without an `x-user-id` header the view spans every user.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use leadops_core::ValidationError;
use leadops_db::{DashboardFilter, DashboardRow, DateWindow, ScoreFilter, ScoreOp, SortDir};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, validation_error, ApiError, ApiResponse, AppState, CallerId};

#[derive(Debug, Default, Deserialize)]
pub(super) struct DashboardQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Comma-separated lead tags.
    pub tags: Option<String>,
    pub should_contact_only: Option<bool>,
    pub score_op: Option<String>,
    pub score: Option<i32>,
    pub location: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WindowQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(super) struct DashboardPage {
    items: Vec<DashboardRow>,
    page: u32,
    page_size: u32,
}

pub(super) fn resolve_window(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DateWindow, ValidationError> {
    let to = to.unwrap_or(today);
    let window = match from {
        Some(from) => DateWindow { from, to },
        None => DateWindow::default_for(to),
    };
    window.validate()?;
    Ok(window)
}

impl DashboardQuery {
    pub(super) fn to_filter(
        &self,
        today: NaiveDate,
        caller: Option<CallerId>,
    ) -> Result<DashboardFilter, ValidationError> {
        let mut filter = DashboardFilter::new(resolve_window(self.from, self.to, today)?);
        filter.user_id = caller.map(|c| c.0);

        if let Some(tags) = &self.tags {
            filter.tags = tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }
        filter.should_contact_only = self.should_contact_only.unwrap_or(false);

        filter.score = match (self.score_op.as_deref(), self.score) {
            (Some(op), Some(value)) => Some(ScoreFilter {
                op: op.parse::<ScoreOp>()?,
                value,
            }),
            (None, None) => None,
            _ => {
                return Err(ValidationError::new(
                    "score_op and score must be given together",
                ))
            }
        };

        filter.location_substr.clone_from(&self.location);
        if let Some(sort) = &self.sort {
            filter.sort_dir = sort.parse::<SortDir>()?;
        }
        if let Some(page) = self.page {
            filter.page = page.max(1);
        }
        if let Some(page_size) = self.page_size {
            filter.page_size = page_size;
        }

        Ok(filter)
    }
}

pub(super) async fn list_results(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    caller: Option<CallerId>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardPage>>, ApiError> {
    let filter = query
        .to_filter(Utc::now().date_naive(), caller)
        .map_err(|e| validation_error(req_id.0.clone(), &e))?;

    let items = leadops_db::fetch_dashboard(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        DashboardPage {
            items,
            page: filter.page,
            page_size: filter.effective_page_size(),
        },
        req_id,
    ))
}

pub(super) async fn list_tags(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    caller: Option<CallerId>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let window = resolve_window(query.from, query.to, Utc::now().date_naive())
        .map_err(|e| validation_error(req_id.0.clone(), &e))?;

    let tags = leadops_db::list_result_tags(&state.pool, &window, caller.map(|c| c.0))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(tags, req_id))
}
