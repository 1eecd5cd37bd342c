//! Lead command handlers: CSV bulk upload, the sample file, and the unsent
//! backlog.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use leadops_pipeline::{LeadSource, PgLeadStore};
use uuid::Uuid;

/// Sub-commands available under `leads`.
#[derive(Debug, Subcommand)]
pub enum LeadsCommands {
    /// Bulk-upload leads from a CSV file with `linkedin_url` and `bio` columns
    Import {
        /// Path to the CSV file
        #[arg(long)]
        file: PathBuf,
        /// Campaign tag applied to every imported lead
        #[arg(long)]
        tag: String,
        /// Owning user id
        #[arg(long)]
        user: Uuid,
    },
    /// Write the sample bulk-upload CSV
    SampleCsv {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show leads that have not been sent to the processor yet
    Unsent {
        /// Owning user id
        #[arg(long)]
        user: Uuid,
        /// Maximum number of leads to list
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

/// Import a CSV file and print the per-row outcome counts.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is rejected as a whole
/// (blank tag, missing headers, no rows). Row failures are only counted.
pub(crate) async fn run_leads_import(
    pool: &sqlx::PgPool,
    file: &Path,
    tag: &str,
    user: Uuid,
) -> anyhow::Result<()> {
    let is_csv = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        anyhow::bail!(
            "only CSV is supported; expected a .csv file, got {}",
            file.display()
        );
    }

    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    tracing::debug!(file = %file.display(), bytes = text.len(), "read CSV file");

    let store = PgLeadStore::new(pool.clone());
    let report = leadops_pipeline::ingest_csv(&store, &text, tag, user).await?;

    println!(
        "imported {} of {} row(s); {} failed",
        report.success, report.total, report.failed
    );
    if let Some(err) = &report.last_error {
        println!("last error: {err}");
    }

    Ok(())
}

/// Write the sample CSV to `out`, or print it.
///
/// # Errors
///
/// Returns an error if the sample cannot be produced or the file written.
pub(crate) fn run_sample_csv(out: Option<&Path>) -> anyhow::Result<()> {
    let sample = leadops_pipeline::sample_csv()?;
    match out {
        Some(path) => {
            std::fs::write(path, &sample)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote sample CSV to {}", path.display());
        }
        None => print!("{sample}"),
    }
    Ok(())
}

/// Print the number of unsent leads and the first `limit` of them.
///
/// # Errors
///
/// Returns an error if both unsent-lead queries fail.
pub(crate) async fn run_leads_unsent(
    pool: &sqlx::PgPool,
    user: Uuid,
    limit: usize,
) -> anyhow::Result<()> {
    let store = PgLeadStore::new(pool.clone());
    let leads = store.fetch_unsent_leads(user).await?;

    println!("pending to send to processor: {}", leads.len());
    if leads.is_empty() {
        return Ok(());
    }

    println!("{:<32}{:<20}NAME", "LEAD ID", "TAG");
    for lead in leads.iter().take(limit) {
        println!(
            "{:<32}{:<20}{}",
            lead.lead_id.as_deref().unwrap_or("\u{2014}"),
            lead.tag.as_deref().unwrap_or("\u{2014}"),
            lead.name.as_deref().unwrap_or("\u{2014}"),
        );
    }

    Ok(())
}
