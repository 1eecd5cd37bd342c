//! HTTP client for the external lead processor.
//!
//! One `POST {base}/process-lead` per lead. Any non-2xx status or a body that
//! is not JSON is a [`ProcessError`]; the caller decides what that means for
//! the run.

use std::time::Duration;

use async_trait::async_trait;
use leadops_core::{AppConfig, Lead, PromptConfig};
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;

use crate::error::ProcessError;

const PROCESS_LEAD_PATH: &str = "process-lead";

/// Request body for `/process-lead`. Absent lead fields serialize as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessLeadRequest<'a> {
    pub api_key: &'a str,
    pub wildnet_data: &'a str,
    pub scoring_criteria_and_icp: &'a str,
    pub message_prompt: &'a str,
    pub lead: &'a Lead,
}

impl<'a> ProcessLeadRequest<'a> {
    #[must_use]
    pub fn new(api_key: &'a str, prompt: &'a PromptConfig, lead: &'a Lead) -> Self {
        Self {
            api_key,
            wildnet_data: &prompt.wildnet_data,
            scoring_criteria_and_icp: &prompt.scoring_criteria_and_icp,
            message_prompt: &prompt.message_prompt,
            lead,
        }
    }
}

#[async_trait]
pub trait LeadProcessor: Send + Sync {
    /// Submits one lead and returns the processor's JSON response.
    async fn process_lead(&self, request: &ProcessLeadRequest<'_>) -> Result<Value, ProcessError>;
}

/// Client for the external processor. Use [`ProcessorClient::new`] with the
/// application config, or [`ProcessorClient::with_base_url`] to point at a
/// mock server in tests.
#[derive(Debug, Clone)]
pub struct ProcessorClient {
    client: Client,
    endpoint: Url,
}

impl ProcessorClient {
    /// # Errors
    ///
    /// Returns [`ProcessError`] if the HTTP client cannot be built or the
    /// configured base URL is invalid.
    pub fn new(config: &AppConfig) -> Result<Self, ProcessError> {
        Self::with_base_url(
            &config.processor_url,
            config.processor_timeout_secs,
            &config.processor_user_agent,
        )
    }

    /// `timeout_secs` bounds both connecting and the whole request; `None`
    /// keeps the transport defaults, which never time out.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ProcessError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: Option<u64>,
        user_agent: &str,
    ) -> Result<Self, ProcessError> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(secs) = timeout_secs {
            let limit = Duration::from_secs(secs);
            builder = builder.connect_timeout(limit).timeout(limit);
        }
        let client = builder.build()?;

        // A trailing slash makes `join` append rather than replace the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join(PROCESS_LEAD_PATH))
            .map_err(|e| ProcessError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl LeadProcessor for ProcessorClient {
    async fn process_lead(&self, request: &ProcessLeadRequest<'_>) -> Result<Value, ProcessError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        interpret_response(status.as_u16(), &body)
    }
}

/// Maps a processor reply to the response value or a per-lead error.
///
/// # Errors
///
/// [`ProcessError::Rejected`] for a non-2xx status, using the body's `error`
/// field when present; [`ProcessError::InvalidJson`] for a 2xx status whose
/// body does not parse.
pub fn interpret_response(status: u16, body: &str) -> Result<Value, ProcessError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map_or_else(|| format!("HTTP {status}"), ToOwned::to_owned);
        return Err(ProcessError::Rejected { status, message });
    }

    parsed.ok_or(ProcessError::InvalidJson)
}
