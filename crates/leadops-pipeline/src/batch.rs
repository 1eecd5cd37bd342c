//! Batch Orchestrator: submits every unsent lead of one user to the external
//! processor, strictly one at a time, in the order the Lead Source returns
//! them.
//!
//! Validation, lead fetching, and credential selection can abort a run. Once
//! the first lead is submitted the run always completes; per-lead failures are
//! counted and only the most recent error and response are kept.

use leadops_core::PromptConfig;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::credentials::CredentialSelector;
use crate::error::BatchError;
use crate::processor::{LeadProcessor, ProcessLeadRequest};
use crate::source::LeadSource;

/// Counters of one run. Also used as the final result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchProgress {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub last_error: Option<String>,
    pub last_response: Option<Value>,
}

pub type BatchResult = BatchProgress;

impl BatchProgress {
    /// `true` when the user had no unsent leads.
    #[must_use]
    pub fn nothing_to_do(&self) -> bool {
        self.total == 0
    }

    /// Leads not yet resolved to success or failure.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.success + self.failed)
    }
}

pub struct BatchOrchestrator<S, C, P> {
    source: S,
    credentials: C,
    processor: P,
}

impl<S, C, P> BatchOrchestrator<S, C, P>
where
    S: LeadSource,
    C: CredentialSelector,
    P: LeadProcessor,
{
    pub fn new(source: S, credentials: C, processor: P) -> Self {
        Self {
            source,
            credentials,
            processor,
        }
    }

    /// Runs a batch for `user_id` and returns the final counters.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] if the prompt configuration is incomplete, the
    /// unsent leads cannot be fetched, or no credential is available. No lead
    /// is submitted in any of these cases.
    pub async fn run_batch(
        &self,
        user_id: Uuid,
        prompt: &PromptConfig,
    ) -> Result<BatchResult, BatchError> {
        self.run_batch_with_progress(user_id, prompt, |_| {}).await
    }

    /// Like [`run_batch`](Self::run_batch), calling `on_progress` once the
    /// total is known and again after every lead resolves.
    ///
    /// # Errors
    ///
    /// See [`run_batch`](Self::run_batch).
    pub async fn run_batch_with_progress<F>(
        &self,
        user_id: Uuid,
        prompt: &PromptConfig,
        mut on_progress: F,
    ) -> Result<BatchResult, BatchError>
    where
        F: FnMut(&BatchProgress) + Send,
    {
        let prompt = prompt.validated()?;

        let leads = self.source.fetch_unsent_leads(user_id).await?;
        if leads.is_empty() {
            tracing::info!(%user_id, "no unsent leads for user");
            return Ok(BatchProgress::default());
        }

        let api_key = self.credentials.select_credential().await?;

        let mut progress = BatchProgress {
            total: leads.len(),
            ..BatchProgress::default()
        };
        tracing::info!(%user_id, total = progress.total, "batch run started");
        on_progress(&progress);

        for lead in &leads {
            let request = ProcessLeadRequest::new(&api_key, &prompt, lead);
            match self.processor.process_lead(&request).await {
                Ok(response) => {
                    progress.success += 1;
                    progress.last_response = Some(response);
                }
                Err(e) => {
                    tracing::warn!(
                        %user_id,
                        lead_id = lead.lead_id.as_deref().unwrap_or(""),
                        error = %e,
                        "lead processing failed"
                    );
                    progress.failed += 1;
                    progress.last_error = Some(e.to_string());
                }
            }
            on_progress(&progress);
        }

        tracing::info!(
            %user_id,
            total = progress.total,
            success = progress.success,
            failed = progress.failed,
            "batch run finished"
        );

        Ok(progress)
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod tests;
