//! Caller identity taken from the `x-user-id` header.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::ApiError;

pub(super) const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf a request runs. Required by every per-user route;
/// optional (as `Option<CallerId>`) where an unscoped view is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub Uuid);

fn request_id_of(parts: &Parts) -> String {
    parts
        .extensions
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default()
}

fn parse_caller(parts: &Parts) -> Result<Option<CallerId>, ApiError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .map(str::trim)
        .and_then(|v| Uuid::parse_str(v).ok())
        .map(|id| Some(CallerId(id)))
        .ok_or_else(|| {
            ApiError::new(
                request_id_of(parts),
                "validation_error",
                format!("{USER_ID_HEADER} must be a UUID"),
            )
        })
}

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parse_caller(parts)?.ok_or_else(|| {
            ApiError::new(
                request_id_of(parts),
                "unauthorized",
                format!("{USER_ID_HEADER} header is required"),
            )
        })
    }
}

impl<S> OptionalFromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        parse_caller(parts)
    }
}
