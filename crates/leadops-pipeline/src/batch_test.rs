use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use leadops_core::Lead;
use serde_json::json;

use super::*;
use crate::error::{CredentialError, ProcessError, SourceError};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeSource {
    leads: Option<Vec<Lead>>,
}

#[async_trait]
impl LeadSource for FakeSource {
    async fn fetch_unsent_leads(&self, _user_id: Uuid) -> Result<Vec<Lead>, SourceError> {
        self.leads.clone().ok_or_else(|| SourceError {
            primary_name: "fetch_unsent_leads_by_user",
            primary: "down".to_string(),
            fallback_name: "fetch_unsent_leads",
            fallback: "down".to_string(),
        })
    }
}

struct FakeCredentials {
    key: Option<&'static str>,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl CredentialSelector for FakeCredentials {
    async fn select_credential(&self) -> Result<String, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.key
            .map(ToOwned::to_owned)
            .ok_or(CredentialError::NoCredential)
    }
}

/// Answers each lead according to `reply`, recording the order of calls.
struct FakeProcessor {
    reply: fn(&str) -> Result<Value, ProcessError>,
    seen: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl LeadProcessor for FakeProcessor {
    async fn process_lead(&self, request: &ProcessLeadRequest<'_>) -> Result<Value, ProcessError> {
        let lead_id = request.lead.lead_id.clone().unwrap_or_default();
        self.seen
            .lock()
            .expect("lock")
            .push((lead_id.clone(), request.api_key.to_string()));
        (self.reply)(&lead_id)
    }
}

fn always_ok(lead_id: &str) -> Result<Value, ProcessError> {
    Ok(json!({ "lead_id": lead_id, "score": 80 }))
}

fn always_rejected(_lead_id: &str) -> Result<Value, ProcessError> {
    Err(ProcessError::Rejected {
        status: 500,
        message: "HTTP 500".to_string(),
    })
}

fn fail_on_b(lead_id: &str) -> Result<Value, ProcessError> {
    if lead_id == "b" {
        Err(ProcessError::InvalidJson)
    } else {
        always_ok(lead_id)
    }
}

struct Harness {
    orchestrator: BatchOrchestrator<FakeSource, FakeCredentials, FakeProcessor>,
    credential_calls: Arc<AtomicU32>,
    seen: Arc<Mutex<Vec<(String, String)>>>,
}

fn harness(
    leads: Option<Vec<Lead>>,
    key: Option<&'static str>,
    reply: fn(&str) -> Result<Value, ProcessError>,
) -> Harness {
    let credential_calls = Arc::new(AtomicU32::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = BatchOrchestrator::new(
        FakeSource { leads },
        FakeCredentials {
            key,
            calls: Arc::clone(&credential_calls),
        },
        FakeProcessor {
            reply,
            seen: Arc::clone(&seen),
        },
    );
    Harness {
        orchestrator,
        credential_calls,
        seen,
    }
}

fn leads(ids: &[&str]) -> Vec<Lead> {
    ids.iter()
        .map(|id| Lead {
            lead_id: Some((*id).to_string()),
            tag: Some("SDR".to_string()),
            ..Lead::default()
        })
        .collect()
}

fn prompt() -> PromptConfig {
    PromptConfig::new("  About us  ", "ICP", "Write a note")
}

fn user() -> Uuid {
    Uuid::new_v4()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_lead_set_returns_zero_counts_without_credential_or_calls() {
    let h = harness(Some(Vec::new()), Some("key"), always_ok);

    let result = h
        .orchestrator
        .run_batch(user(), &prompt())
        .await
        .expect("run");

    assert_eq!(result, BatchProgress::default());
    assert!(result.nothing_to_do());
    assert_eq!(h.credential_calls.load(Ordering::SeqCst), 0);
    assert!(h.seen.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn all_successes_count_every_lead() {
    let h = harness(Some(leads(&["a", "b", "c", "d"])), Some("key"), always_ok);

    let result = h
        .orchestrator
        .run_batch(user(), &prompt())
        .await
        .expect("run");

    assert_eq!(result.total, 4);
    assert_eq!(result.success, 4);
    assert_eq!(result.failed, 0);
    assert!(result.last_error.is_none());
    assert_eq!(result.last_response, Some(json!({ "lead_id": "d", "score": 80 })));
}

#[tokio::test]
async fn all_failures_still_complete_the_run() {
    let h = harness(Some(leads(&["a", "b", "c"])), Some("key"), always_rejected);

    let result = h
        .orchestrator
        .run_batch(user(), &prompt())
        .await
        .expect("per-lead failures are not errors");

    assert_eq!(result.total, 3);
    assert_eq!(result.success, 0);
    assert_eq!(result.failed, 3);
    assert_eq!(result.last_error.as_deref(), Some("HTTP 500"));
    assert!(result.last_response.is_none());
    assert_eq!(h.seen.lock().expect("lock").len(), 3);
}

#[tokio::test]
async fn mixed_results_keep_only_latest_error_and_response() {
    let h = harness(Some(leads(&["a", "b", "c"])), Some("key"), fail_on_b);

    let result = h
        .orchestrator
        .run_batch(user(), &prompt())
        .await
        .expect("run");

    assert_eq!(result.success, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.last_error.as_deref(), Some("Invalid JSON response"));
    assert_eq!(result.last_response, Some(json!({ "lead_id": "c", "score": 80 })));
}

#[tokio::test]
async fn leads_are_sent_in_source_order_with_one_credential() {
    let h = harness(Some(leads(&["z", "a", "m"])), Some("secret"), always_ok);

    h.orchestrator
        .run_batch(user(), &prompt())
        .await
        .expect("run");

    let seen = h.seen.lock().expect("lock");
    let ids: Vec<&str> = seen.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["z", "a", "m"]);
    assert!(seen.iter().all(|(_, key)| key == "secret"));
    assert_eq!(h.credential_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn blank_prompt_block_fails_before_any_io() {
    let h = harness(Some(leads(&["a"])), Some("key"), always_ok);
    let incomplete = PromptConfig::new("ctx", "   ", "msg");

    let err = h
        .orchestrator
        .run_batch(user(), &incomplete)
        .await
        .expect_err("validation");

    assert!(matches!(err, BatchError::Validation(_)));
    assert_eq!(h.credential_calls.load(Ordering::SeqCst), 0);
    assert!(h.seen.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn empty_credential_pool_aborts_before_any_lead() {
    let h = harness(Some(leads(&["a", "b"])), None, always_ok);

    let err = h
        .orchestrator
        .run_batch(user(), &prompt())
        .await
        .expect_err("no credential");

    assert!(err.is_no_credential());
    assert!(h.seen.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn source_failure_aborts_the_run() {
    let h = harness(None, Some("key"), always_ok);

    let err = h
        .orchestrator
        .run_batch(user(), &prompt())
        .await
        .expect_err("source down");

    assert!(matches!(err, BatchError::Source(_)));
    assert_eq!(h.credential_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn progress_is_reported_after_every_lead() {
    let h = harness(Some(leads(&["a", "b", "c"])), Some("key"), fail_on_b);
    let mut snapshots = Vec::new();

    h.orchestrator
        .run_batch_with_progress(user(), &prompt(), |p| {
            snapshots.push((p.success, p.failed, p.remaining()));
        })
        .await
        .expect("run");

    assert_eq!(
        snapshots,
        vec![(0, 0, 3), (1, 0, 2), (1, 1, 1), (2, 1, 0)]
    );
}
