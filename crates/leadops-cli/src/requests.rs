use clap::{Args, Subcommand};
use leadops_core::NewScrapeRequest;
use uuid::Uuid;

use crate::prompts::truncate;

/// Sub-commands available under `requests`.
#[derive(Debug, Subcommand)]
pub enum RequestsCommands {
    /// Queue a scrape request (keywords or a search URL, not both)
    Submit(SubmitArgs),
    /// Show the latest requests, newest first
    List {
        /// Requesting user id
        #[arg(long)]
        user: Uuid,
        /// Maximum number of requests to show (capped at 200)
        #[arg(long, default_value = "200")]
        limit: i64,
    },
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Requesting user id
    #[arg(long)]
    pub user: Uuid,
    /// Space-separated search keywords
    #[arg(long, conflicts_with = "search_url")]
    pub keywords: Option<String>,
    /// `LinkedIn` search URL
    #[arg(long)]
    pub search_url: Option<String>,
    /// Campaign tag
    #[arg(long)]
    pub tag: String,
    /// Page load duration in seconds
    #[arg(long, default_value = "3")]
    pub load_time: i32,
    /// Scrape posts instead of likes
    #[arg(long)]
    pub posts: bool,
}

/// Validate and queue a scrape request.
///
/// # Errors
///
/// Returns an error if validation fails or the insert fails.
pub(crate) async fn run_requests_submit(
    pool: &sqlx::PgPool,
    args: SubmitArgs,
) -> anyhow::Result<()> {
    let request = NewScrapeRequest {
        keywords: args.keywords,
        search_url: args.search_url,
        tag: args.tag,
        load_time: args.load_time,
        scrape_likes: !args.posts,
    }
    .validated()?;

    let row = leadops_db::insert_scrape_request(pool, args.user, &request).await?;
    println!("request submitted: {}", row.request_id);
    Ok(())
}

/// Print the user's latest requests.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn run_requests_list(
    pool: &sqlx::PgPool,
    user: Uuid,
    limit: i64,
) -> anyhow::Result<()> {
    let rows = leadops_db::list_scrape_requests(pool, user, limit).await?;
    if rows.is_empty() {
        println!("no requests yet for user {user}");
        return Ok(());
    }

    println!(
        "{:<22}{:<20}{:<7}{:<7}{:<11}TARGET",
        "CREATED", "TAG", "LOAD", "MODE", "FULFILLED"
    );
    for row in &rows {
        let target = row
            .keywords
            .as_deref()
            .or(row.search_url.as_deref())
            .unwrap_or("\u{2014}");
        println!(
            "{:<22}{:<20}{:<7}{:<7}{:<11}{}",
            row.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            truncate(&row.tag, 18),
            row.load_time,
            if row.scrape_likes { "likes" } else { "posts" },
            if row.is_fulfilled { "yes" } else { "no" },
            truncate(target, 60)
        );
    }

    Ok(())
}
