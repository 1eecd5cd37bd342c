use std::collections::HashSet;
use std::sync::Mutex;

use super::*;

/// Records every insert and rejects repeated identifiers like the real store.
#[derive(Default)]
struct MemorySink {
    inserted: Mutex<Vec<NewLead>>,
}

impl MemorySink {
    fn lead_ids(&self) -> Vec<String> {
        self.inserted
            .lock()
            .expect("lock")
            .iter()
            .map(|l| l.lead_id.clone())
            .collect()
    }
}

#[async_trait]
impl LeadSink for MemorySink {
    async fn insert_lead(&self, lead: &NewLead) -> Result<(), InsertError> {
        let mut inserted = self.inserted.lock().expect("lock");
        let seen: HashSet<&str> = inserted.iter().map(|l| l.lead_id.as_str()).collect();
        if seen.contains(lead.lead_id.as_str()) {
            return Err(InsertError::Duplicate(lead.lead_id.clone()));
        }
        inserted.push(lead.clone());
        Ok(())
    }
}

fn user() -> Uuid {
    Uuid::parse_str("6f1c1c2e-3b0a-4c55-9d0e-0b2c4a7c9e11").expect("valid uuid")
}

// ---------------------------------------------------------------------------
// extract_lead_id
// ---------------------------------------------------------------------------

#[test]
fn profile_url_with_tracking_query_yields_handle() {
    assert_eq!(
        extract_lead_id("https://www.linkedin.com/in/janedoe123?trk=x"),
        "janedoe123"
    );
}

#[test]
fn derived_identifier_is_a_fixed_point() {
    for input in [
        "https://www.linkedin.com/in/janedoe123?trk=x",
        "https://www.linkedin.com/in/ACoAAB52FMgB3mqH5YbMWQTwnJnYxyBzqr72gdE/",
        "https://example.com/people/jane_doe-9",
    ] {
        let id = extract_lead_id(input);
        assert!(!id.is_empty(), "{input}");
        assert_eq!(extract_lead_id(&id), id, "{input}");
    }
}

#[test]
fn bare_token_drops_query() {
    assert_eq!(
        extract_lead_id("  ACoAAB52FMgB3mqH5YbMWQTwnJnYxyBzqr72gdE?trk=example "),
        "ACoAAB52FMgB3mqH5YbMWQTwnJnYxyBzqr72gdE"
    );
}

#[test]
fn in_segment_stops_at_next_separator() {
    assert_eq!(
        extract_lead_id("https://linkedin.com/in/jane-doe/details/experience/"),
        "jane-doe"
    );
    assert_eq!(
        extract_lead_id("https://linkedin.com/in/jane-doe#about"),
        "jane-doe"
    );
}

#[test]
fn url_without_in_segment_uses_last_path_segment() {
    assert_eq!(
        extract_lead_id("https://www.linkedin.com/company/acme-corp/?viewAsMember=true"),
        "acme-corp"
    );
}

#[test]
fn unparseable_url_falls_back_to_regex_then_raw_prefix() {
    assert_eq!(extract_lead_id("linkedin.com/in/janedoe123?trk=x"), "janedoe123");
    assert_eq!(extract_lead_id("not a url?x=1"), "not a url");
}

#[test]
fn empty_input_yields_empty_identifier() {
    assert_eq!(extract_lead_id("   "), "");
}

// ---------------------------------------------------------------------------
// parse_csv
// ---------------------------------------------------------------------------

#[test]
fn parses_quoted_fields_with_commas_newlines_and_escaped_quotes() {
    let text = "linkedin_url,bio\r\n\
                \"https://linkedin.com/in/a\",\"Founder, \"\"Acme\"\"\nBerlin\"\r\n";
    let rows = parse_csv(text).expect("parse");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].bio, "Founder, \"Acme\"\nBerlin");
}

#[test]
fn mixed_case_headers_are_accepted() {
    let lower = parse_csv("linkedin_url,bio\nhttps://linkedin.com/in/a,Hi\n").expect("lower");
    let mixed = parse_csv("LinkedIn_URL,Bio\nhttps://linkedin.com/in/a,Hi\n").expect("mixed");
    assert_eq!(lower, mixed);
}

#[test]
fn short_rows_read_missing_fields_as_empty() {
    let rows = parse_csv("name,linkedin_url,bio\nJane,https://linkedin.com/in/a\n").expect("parse");
    assert_eq!(rows[0].linkedin_url, "https://linkedin.com/in/a");
    assert_eq!(rows[0].bio, "");
}

#[test]
fn trailing_newline_adds_no_row() {
    assert_eq!(parse_csv("linkedin_url,bio\na,b\n").expect("lf").len(), 1);
    assert_eq!(parse_csv("linkedin_url,bio\r\na,b\r\n").expect("crlf").len(), 1);
}

#[test]
fn blank_lines_become_empty_rows() {
    let rows = parse_csv("linkedin_url,bio\na,A\n\nb,B\n\n").expect("parse");
    let urls: Vec<&str> = rows.iter().map(|r| r.linkedin_url.as_str()).collect();
    assert_eq!(urls, vec!["a", "", "b", ""]);
    assert_eq!(rows[1].bio, "");
}

#[test]
fn blank_crlf_line_is_one_empty_row() {
    let rows = parse_csv("linkedin_url,bio\r\na,A\r\n\r\nb,B\r\n").expect("parse");
    let urls: Vec<&str> = rows.iter().map(|r| r.linkedin_url.as_str()).collect();
    assert_eq!(urls, vec!["a", "", "b"]);
}

#[test]
fn bare_carriage_return_ends_a_row() {
    let rows = parse_csv("linkedin_url,bio\ra,A\rb,B\r\rc,C").expect("parse");
    let urls: Vec<&str> = rows.iter().map(|r| r.linkedin_url.as_str()).collect();
    assert_eq!(urls, vec!["a", "b", "", "c"]);
}

#[test]
fn blank_line_inside_quotes_is_field_content() {
    let rows = parse_csv("linkedin_url,bio\na,\"line one\n\nline three\"\n").expect("parse");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].bio, "line one\n\nline three");
}

#[test]
fn leading_blank_line_leaves_no_header() {
    for text in ["\nlinkedin_url,bio\nx,y\n", "\r\nlinkedin_url,bio\r\nx,y\r\n"] {
        let err = parse_csv(text).expect_err("reject");
        assert!(
            err.to_string().contains("must include headers"),
            "{text:?}: {err}"
        );
    }
}

#[test]
fn missing_bio_column_is_rejected() {
    let err = parse_csv("linkedin_url,name\nhttps://linkedin.com/in/a,Jane\n").expect_err("reject");
    assert!(matches!(err, IngestError::Validation(_)));
}

#[test]
fn empty_and_header_only_files_are_rejected() {
    assert!(matches!(parse_csv(""), Err(IngestError::Validation(_))));
    assert!(matches!(
        parse_csv("linkedin_url,bio\n"),
        Err(IngestError::Validation(_))
    ));
}

// ---------------------------------------------------------------------------
// ingest_csv
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_identifier_fails_one_row_and_continues() {
    let sink = MemorySink::default();
    let text = "linkedin_url,bio\n\
                https://www.linkedin.com/in/janedoe123?trk=x,Founder\n\
                janedoe123,Duplicate\n";

    let report = ingest_csv(&sink, text, "SDR", user()).await.expect("ingest");

    assert_eq!(report.total, 2);
    assert_eq!(report.success, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(
        report.last_error.as_deref(),
        Some("duplicate lead_id 'janedoe123'")
    );
    assert_eq!(sink.lead_ids(), vec!["janedoe123"]);
}

#[tokio::test]
async fn rows_are_tagged_trimmed_and_owned_by_user() {
    let sink = MemorySink::default();
    let text = "LinkedIn_URL,Bio\n  https://www.linkedin.com/in/janedoe123  ,  Founder  \n";

    ingest_csv(&sink, text, "  Dreamforce ", user())
        .await
        .expect("ingest");

    let inserted = sink.inserted.lock().expect("lock");
    assert_eq!(inserted[0].lead_id, "janedoe123");
    assert_eq!(inserted[0].linkedin_url, "https://www.linkedin.com/in/janedoe123");
    assert_eq!(inserted[0].bio, "Founder");
    assert_eq!(inserted[0].tag, "Dreamforce");
    assert_eq!(inserted[0].user_id, user());
}

#[tokio::test]
async fn row_without_url_is_counted_as_failure() {
    let sink = MemorySink::default();
    let text = "linkedin_url,bio\n,No url here\nhttps://linkedin.com/in/b,Ok\n";

    let report = ingest_csv(&sink, text, "SDR", user()).await.expect("ingest");

    assert_eq!(report.success, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.last_error.as_deref(), Some(MISSING_URL));
}

#[tokio::test]
async fn interior_blank_line_counts_as_failed_row() {
    let sink = MemorySink::default();
    let text = "linkedin_url,bio\nhttps://linkedin.com/in/a,A\n\nhttps://linkedin.com/in/b,B\n";

    let report = ingest_csv(&sink, text, "SDR", user()).await.expect("ingest");

    assert_eq!(report.total, 3);
    assert_eq!(report.success, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.last_error.as_deref(), Some(MISSING_URL));
    assert_eq!(sink.lead_ids(), vec!["a", "b"]);
}

#[tokio::test]
async fn missing_bio_header_inserts_nothing() {
    let sink = MemorySink::default();
    let result = ingest_csv(
        &sink,
        "linkedin_url\nhttps://linkedin.com/in/a\n",
        "SDR",
        user(),
    )
    .await;

    assert!(matches!(result, Err(IngestError::Validation(_))));
    assert!(sink.lead_ids().is_empty());
}

#[tokio::test]
async fn blank_tag_is_rejected() {
    let sink = MemorySink::default();
    let result = ingest_csv(&sink, "linkedin_url,bio\na,b\n", "  ", user()).await;
    assert!(matches!(result, Err(IngestError::Validation(_))));
}

// ---------------------------------------------------------------------------
// sample_csv
// ---------------------------------------------------------------------------

#[test]
fn sample_csv_has_plain_header_and_quoted_rows() {
    let sample = sample_csv().expect("sample");
    let lines: Vec<&str> = sample.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "linkedin_url,bio");
    assert!(lines[1].starts_with("\"https://www.linkedin.com/in/"));
    assert!(lines[2].ends_with("\"VP Growth at B2B SaaS; RevOps background.\""));
}

#[test]
fn sample_csv_parses_back_into_ingestable_rows() {
    let sample = sample_csv().expect("sample");
    let rows = parse_csv(&sample).expect("parse");
    assert_eq!(rows.len(), 2);
    let ids: Vec<String> = rows.iter().map(|r| extract_lead_id(&r.linkedin_url)).collect();
    assert_eq!(ids[0], ids[1]);
}
