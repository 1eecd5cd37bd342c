//! Results dashboard: filtered, paginated processor results, the tag list of
//! the window, and CSV export.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Args;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use leadops_db::{DashboardFilter, DashboardRow, DateWindow, ScoreFilter, ScoreOp, SortDir};
use uuid::Uuid;

use crate::prompts::truncate;

const EXPORT_HEADERS: [&str; 11] = [
    "created_at",
    "lead_id",
    "tag",
    "name",
    "title",
    "company_name",
    "location",
    "score",
    "should_contact",
    "subject",
    "message",
];

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Only results for leads owned by this user
    #[arg(long)]
    pub user: Option<Uuid>,
    /// First day of the window, inclusive (default: 13 days before --to)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day of the window, inclusive (default: today, UTC)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Restrict to these lead tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Only results the processor marked as worth contacting
    #[arg(long)]
    pub should_contact_only: bool,
    /// Score comparison: one of >, >=, =, <=, <
    #[arg(long, requires = "score")]
    pub score_op: Option<ScoreOp>,
    /// Score value compared with --score-op
    #[arg(long, requires = "score_op")]
    pub score: Option<i32>,
    /// Case-insensitive substring of the lead location
    #[arg(long)]
    pub location: Option<String>,
    /// Sort by result time: asc or desc
    #[arg(long, default_value = "desc")]
    pub sort: SortDir,
    /// 1-based page number
    #[arg(long, default_value = "1")]
    pub page: u32,
    /// Rows per page (1..=500)
    #[arg(long, default_value = "200")]
    pub page_size: u32,
    /// List the distinct tags of the window instead of results
    #[arg(long)]
    pub list_tags: bool,
    /// Write the page to a CSV file instead of printing it
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

impl DashboardArgs {
    /// Resolves the inclusive day window, defaulting to the last 14 days.
    pub(crate) fn window(&self, today: NaiveDate) -> DateWindow {
        let to = self.to.unwrap_or(today);
        match self.from {
            Some(from) => DateWindow { from, to },
            None => DateWindow::default_for(to),
        }
    }

    pub(crate) fn to_filter(&self, today: NaiveDate) -> DashboardFilter {
        let mut filter = DashboardFilter::new(self.window(today));
        filter.user_id = self.user;
        filter.tags.clone_from(&self.tags);
        filter.should_contact_only = self.should_contact_only;
        filter.score = self
            .score_op
            .zip(self.score)
            .map(|(op, value)| ScoreFilter { op, value });
        filter.location_substr.clone_from(&self.location);
        filter.sort_dir = self.sort;
        filter.page = self.page;
        filter.page_size = self.page_size;
        filter
    }
}

/// Print (or export) one dashboard page, or the tag list of the window.
///
/// # Errors
///
/// Returns an error if the window is inverted, the query fails, or the CSV
/// file cannot be written.
pub(crate) async fn run_dashboard(pool: &sqlx::PgPool, args: DashboardArgs) -> anyhow::Result<()> {
    let filter = args.to_filter(Utc::now().date_naive());
    filter.window.validate()?;

    if args.list_tags {
        let tags = leadops_db::list_result_tags(pool, &filter.window, filter.user_id).await?;
        if tags.is_empty() {
            println!("no tagged results between {} and {}", filter.window.from, filter.window.to);
        }
        for tag in &tags {
            println!("{tag}");
        }
        return Ok(());
    }

    let rows = leadops_db::fetch_dashboard(pool, &filter).await?;
    tracing::debug!(rows = rows.len(), page = filter.page, "dashboard page fetched");

    if let Some(path) = &args.csv {
        write_export(path, &rows)?;
        println!("wrote {} row(s) to {}", rows.len(), path.display());
        return Ok(());
    }

    if rows.is_empty() {
        println!(
            "no results between {} and {} for these filters",
            filter.window.from, filter.window.to
        );
        return Ok(());
    }

    println!(
        "{:<21}{:<14}{:<16}{:<22}{:<7}{:<9}SUBJECT",
        "CREATED", "LEAD", "TAG", "NAME", "SCORE", "CONTACT"
    );
    for row in &rows {
        println!(
            "{:<21}{:<14}{:<16}{:<22}{:<7}{:<9}{}",
            row.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            truncate(&row.lead_id, 10),
            truncate(row.tag.as_deref().unwrap_or("\u{2014}"), 14),
            truncate(row.name.as_deref().unwrap_or("\u{2014}"), 20),
            row.score.map_or_else(|| "\u{2014}".to_string(), |s| s.to_string()),
            row.should_contact
                .map_or_else(|| "\u{2014}".to_string(), |c| c.to_string()),
            truncate(row.subject.as_deref().unwrap_or(""), 60)
        );
    }
    println!("page {} ({} row(s))", filter.page.max(1), rows.len());

    Ok(())
}

fn write_export(path: &Path, rows: &[DashboardRow]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file);

    writer.write_record(EXPORT_HEADERS)?;
    for row in rows {
        writer.write_record(export_record(row))?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn export_record(row: &DashboardRow) -> [String; 11] {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    [
        row.created_at.to_rfc3339(),
        row.lead_id.clone(),
        text(&row.tag),
        text(&row.name),
        text(&row.title),
        text(&row.company_name),
        text(&row.location),
        row.score.map(|s| s.to_string()).unwrap_or_default(),
        row.should_contact.map(|c| c.to_string()).unwrap_or_default(),
        text(&row.subject),
        text(&row.message),
    ]
}
