//! CSV bulk ingestion of leads.
//!
//! Every data row becomes one independent insert. A row that cannot be
//! inserted is counted and reported as the last error; it never stops the
//! rows after it.

use std::sync::LazyLock;

use async_trait::async_trait;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use leadops_core::{NewLead, ValidationError};
use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{IngestError, InsertError};

/// Bare profile token, optionally followed by a query string.
static BARE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+(?:\?.*)?$").expect("valid regex"));

/// `/in/<id>` terminated by a separator or the end of input.
static IN_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/in/([^/?#]+)(?:[/?#]|$)").expect("valid regex"));

const MISSING_URL: &str = "Missing linkedin_url in a row";
const MISSING_ID: &str = "missing identifier";

const SAMPLE_ROWS: [[&str; 2]; 2] = [
    [
        "https://www.linkedin.com/in/ACoAAB52FMgB3mqH5YbMWQTwnJnYxyBzqr72gdE",
        "Founder at ExampleCorp; building AI tools.",
    ],
    [
        "ACoAAB52FMgB3mqH5YbMWQTwnJnYxyBzqr72gdE?trk=example",
        "VP Growth at B2B SaaS; RevOps background.",
    ],
];

/// Destination for ingested leads.
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn insert_lead(&self, lead: &NewLead) -> Result<(), InsertError>;
}

/// The two columns a bulk upload must carry. Other columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvLeadRecord {
    pub linkedin_url: String,
    pub bio: String,
}

impl CsvLeadRecord {
    fn blank() -> Self {
        Self {
            linkedin_url: String::new(),
            bio: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub last_error: Option<String>,
}

impl IngestReport {
    fn record_failure(&mut self, message: String) {
        self.failed += 1;
        self.last_error = Some(message);
    }
}

/// Parses bulk-upload CSV text into records keyed by the header row.
///
/// Headers are matched case-insensitively after trimming. Rows shorter than
/// the header read the missing trailing fields as empty strings. Every
/// `\n`, `\r\n` or bare `\r` ends a row, so a blank line becomes a record
/// with empty fields; only the empty remainder after the final terminator
/// is dropped.
///
/// # Errors
///
/// Returns [`IngestError::Validation`] when the text has no header, lacks a
/// `linkedin_url` or `bio` column, or has no data rows. Returns
/// [`IngestError::Csv`] if the reader fails.
pub fn parse_csv(text: &str) -> Result<Vec<CsvLeadRecord>, IngestError> {
    let bytes = text.as_bytes();
    // The reader skips empty lines, including a blank first line that would
    // otherwise be the header.
    if matches!(bytes.first(), Some(b'\n' | b'\r')) {
        return Err(missing_headers());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(ValidationError::new(
            "CSV appears empty or invalid; ensure a header row exists",
        )
        .into());
    }

    let url_idx = headers.iter().position(|h| h == "linkedin_url");
    let bio_idx = headers.iter().position(|h| h == "bio");
    let (Some(url_idx), Some(bio_idx)) = (url_idx, bio_idx) else {
        return Err(missing_headers());
    };

    let mut records = Vec::new();
    let mut row = StringRecord::new();
    let mut consumed = byte_offset(reader.position().byte());
    loop {
        let more = reader.read_record(&mut row)?;
        let end = byte_offset(reader.position().byte());
        let skipped = blank_lines(&bytes[consumed..end], consumed, bytes);
        records.extend(std::iter::repeat_n(CsvLeadRecord::blank(), skipped));
        if !more {
            break;
        }
        records.push(CsvLeadRecord {
            linkedin_url: row.get(url_idx).unwrap_or_default().to_string(),
            bio: row.get(bio_idx).unwrap_or_default().to_string(),
        });
        consumed = end;
    }

    if records.is_empty() {
        return Err(ValidationError::new(
            "CSV appears empty or invalid; it has a header but no data rows",
        )
        .into());
    }

    Ok(records)
}

fn missing_headers() -> IngestError {
    ValidationError::new("CSV must include headers: linkedin_url, bio").into()
}

fn byte_offset(position: u64) -> usize {
    usize::try_from(position).unwrap_or(usize::MAX)
}

/// Counts the empty lines at the start of `gap`, the bytes the reader
/// skipped before its next record. `start` is the offset of `gap` in `text`;
/// a `\n` right after a `\r` completes the previous terminator.
fn blank_lines(mut gap: &[u8], start: usize, text: &[u8]) -> usize {
    if start > 0 && text[start - 1] == b'\r' {
        if let [b'\n', rest @ ..] = gap {
            gap = rest;
        }
    }

    let mut count = 0;
    while let [b'\r', b'\n', rest @ ..] | [b'\n' | b'\r', rest @ ..] = gap {
        count += 1;
        gap = rest;
    }
    count
}

/// Derives the stable lead identifier from a `LinkedIn` profile URL or a bare
/// profile token. Returns an empty string when nothing usable is found.
#[must_use]
pub fn extract_lead_id(input: &str) -> String {
    let raw = input.trim();
    if raw.is_empty() {
        return String::new();
    }

    if !raw.contains('/') && !raw.starts_with("http") && BARE_ID_RE.is_match(raw) {
        return before_query(raw).to_string();
    }

    match Url::parse(raw) {
        Ok(url) => {
            let path = url.path();
            if let Some(idx) = path.find("/in/") {
                let rest = &path[idx + 4..];
                return rest
                    .split(['/', '?', '#'])
                    .next()
                    .unwrap_or_default()
                    .to_string();
            }
            let last = path.split('/').rfind(|s| !s.is_empty()).unwrap_or_default();
            before_query(last).to_string()
        }
        Err(_) => IN_PATH_RE.captures(raw).map_or_else(
            || before_query(raw).to_string(),
            |caps| caps[1].to_string(),
        ),
    }
}

fn before_query(s: &str) -> &str {
    s.split('?').next().unwrap_or_default()
}

/// Parses `text` and inserts one lead per row for `user_id` under `tag`.
///
/// # Errors
///
/// Returns [`IngestError`] only for whole-file problems (blank tag, missing
/// headers, no rows). Row failures are counted in the returned report.
pub async fn ingest_csv(
    sink: &dyn LeadSink,
    text: &str,
    tag: &str,
    user_id: Uuid,
) -> Result<IngestReport, IngestError> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(ValidationError::new("tag is required for bulk upload").into());
    }

    let records = parse_csv(text)?;
    let mut report = IngestReport {
        total: records.len(),
        ..IngestReport::default()
    };

    tracing::info!(%user_id, tag, total = report.total, "ingesting CSV leads");

    for (row, record) in records.into_iter().enumerate() {
        let linkedin_url = record.linkedin_url.trim();
        if linkedin_url.is_empty() {
            tracing::warn!(row, "CSV row has no linkedin_url");
            report.record_failure(MISSING_URL.to_string());
            continue;
        }

        let lead_id = extract_lead_id(linkedin_url);
        if lead_id.is_empty() {
            tracing::warn!(row, linkedin_url, "could not derive lead_id");
            report.record_failure(MISSING_ID.to_string());
            continue;
        }

        let lead = NewLead {
            lead_id,
            linkedin_url: linkedin_url.to_string(),
            bio: record.bio.trim().to_string(),
            tag: tag.to_string(),
            user_id,
        };

        match sink.insert_lead(&lead).await {
            Ok(()) => report.success += 1,
            Err(e) => {
                tracing::warn!(row, lead_id = %lead.lead_id, error = %e, "failed to insert lead");
                report.record_failure(e.to_string());
            }
        }
    }

    tracing::info!(
        total = report.total,
        success = report.success,
        failed = report.failed,
        "CSV ingestion finished"
    );

    Ok(report)
}

/// The template bulk-upload file: a `linkedin_url,bio` header and two quoted
/// example rows.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if the writer fails.
pub fn sample_csv() -> Result<String, IngestError> {
    let mut buf = Vec::new();
    {
        let mut header = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut buf);
        header.write_record(["linkedin_url", "bio"])?;
        header.flush().map_err(csv::Error::from)?;
    }
    {
        let mut rows = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut buf);
        for row in SAMPLE_ROWS {
            rows.write_record(row)?;
        }
        rows.flush().map_err(csv::Error::from)?;
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
#[path = "ingest_test.rs"]
mod tests;
