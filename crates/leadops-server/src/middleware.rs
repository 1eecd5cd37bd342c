use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";
const API_KEYS_VAR: &str = "LEADOPS_API_KEYS";

/// Request ID stored as a request extension by [`request_id`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer-token settings for the protected routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    tokens: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Reads comma-separated bearer tokens from `LEADOPS_API_KEYS`.
    ///
    /// # Errors
    ///
    /// See [`AuthState::from_tokens`].
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var(API_KEYS_VAR).unwrap_or_default();
        Self::from_tokens(&raw, is_development)
    }

    /// Builds auth settings from a comma-separated token list. An empty list
    /// disables auth in development and is an error everywhere else.
    ///
    /// # Errors
    ///
    /// Returns an error when `raw` holds no tokens outside development.
    pub fn from_tokens(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let tokens: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if tokens.is_empty() {
            if !is_development {
                anyhow::bail!("{API_KEYS_VAR} is required outside development");
            }
            tracing::warn!("{API_KEYS_VAR} not set; bearer auth disabled");
            return Ok(Self {
                tokens: Arc::new(tokens),
                enabled: false,
            });
        }

        Ok(Self {
            tokens: Arc::new(tokens),
            enabled: true,
        })
    }

    fn allows(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

/// Uses the incoming `x-request-id` header or a fresh UUID, stores it as a
/// [`RequestId`] extension and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    res
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => {
            let rid = req
                .extensions()
                .get::<RequestId>()
                .map(|r| r.0.clone())
                .unwrap_or_default();
            ApiError::new(rid, "unauthorized", "missing or invalid bearer token").into_response()
        }
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_extracted() {
        let header = HeaderValue::from_static("Bearer ops-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("ops-token"));
    }

    #[test]
    fn non_bearer_scheme_is_ignored() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
        assert_eq!(extract_bearer_token(None), None);
    }

    #[test]
    fn empty_token_list_disables_auth_in_development() {
        let auth = AuthState::from_tokens(" , ", true).expect("dev allows missing tokens");
        assert!(!auth.enabled);
    }

    #[test]
    fn empty_token_list_fails_outside_development() {
        assert!(AuthState::from_tokens("", false).is_err());
    }

    #[test]
    fn tokens_are_trimmed_and_split() {
        let auth = AuthState::from_tokens("alpha, beta ,", false).expect("tokens");
        assert!(auth.enabled);
        assert!(auth.allows("alpha"));
        assert!(auth.allows("beta"));
        assert!(!auth.allows("gamma"));
    }
}
