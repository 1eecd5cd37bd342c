mod batch;
mod dashboard;
mod keys;
mod leads;
mod prompts;
mod requests;

use clap::{Parser, Subcommand};
use leadops_core::AppConfig;
use tracing_subscriber::EnvFilter;

use crate::{
    batch::BatchCommands, dashboard::DashboardArgs, keys::KeysCommands, leads::LeadsCommands,
    prompts::PromptsCommands, requests::RequestsCommands,
};

#[derive(Debug, Parser)]
#[command(name = "leadops")]
#[command(about = "Lead operations: ingestion, batch scoring runs, scrape requests, results")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Bulk-upload and inspect leads
    Leads {
        #[command(subcommand)]
        command: LeadsCommands,
    },
    /// Run the lead-processing batch
    Batch {
        #[command(subcommand)]
        command: BatchCommands,
    },
    /// Prompt presets and saved prompts
    Prompts {
        #[command(subcommand)]
        command: PromptsCommands,
    },
    /// Scrape requests for the external scraper
    Requests {
        #[command(subcommand)]
        command: RequestsCommands,
    },
    /// Manage the processor API key pool
    Keys {
        #[command(subcommand)]
        command: KeysCommands,
    },
    /// Show processed results
    Dashboard(DashboardArgs),
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("no command given; run `leadops --help` for usage");
        return Ok(());
    };

    // The sample file needs neither configuration nor a database.
    if let Commands::Leads {
        command: LeadsCommands::SampleCsv { out },
    } = &command
    {
        init_tracing("info")?;
        return leads::run_sample_csv(out.as_deref());
    }

    let config = leadops_core::load_app_config()?;
    init_tracing(&config.log_level)?;

    if let Commands::Prompts {
        command: PromptsCommands::Presets,
    } = &command
    {
        return prompts::run_prompts_presets(&config);
    }

    let pool_config = leadops_db::PoolConfig::from_app_config(&config);
    let pool = leadops_db::connect_pool(&config.database_url, pool_config).await?;

    dispatch(command, &pool, &config).await
}

fn init_tracing(fallback: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

async fn dispatch(
    command: Commands,
    pool: &sqlx::PgPool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                leadops_db::health_check(pool).await?;
                println!("database is reachable");
            }
            DbCommands::Migrate => {
                let applied = leadops_db::run_migrations(pool).await?;
                println!("applied {applied} migration(s)");
            }
        },
        Commands::Leads { command } => match command {
            LeadsCommands::Import { file, tag, user } => {
                leads::run_leads_import(pool, &file, &tag, user).await?;
            }
            LeadsCommands::SampleCsv { out } => leads::run_sample_csv(out.as_deref())?,
            LeadsCommands::Unsent { user, limit } => {
                leads::run_leads_unsent(pool, user, limit).await?;
            }
        },
        Commands::Batch { command } => match command {
            BatchCommands::Run { user, prompt } => {
                batch::run_batch(pool, config, user, &prompt).await?;
            }
        },
        Commands::Prompts { command } => match command {
            PromptsCommands::Presets => prompts::run_prompts_presets(config)?,
            PromptsCommands::Save { user, tag, prompt } => {
                prompts::run_prompts_save(pool, config, user, &tag, &prompt).await?;
            }
            PromptsCommands::List { user, limit } => {
                prompts::run_prompts_list(pool, user, limit).await?;
            }
        },
        Commands::Requests { command } => match command {
            RequestsCommands::Submit(args) => requests::run_requests_submit(pool, args).await?,
            RequestsCommands::List { user, limit } => {
                requests::run_requests_list(pool, user, limit).await?;
            }
        },
        Commands::Keys { command } => match command {
            KeysCommands::Add { key } => keys::run_keys_add(pool, &key).await?,
            KeysCommands::Count => keys::run_keys_count(pool).await?,
        },
        Commands::Dashboard(args) => dashboard::run_dashboard(pool, args).await?,
    }

    Ok(())
}
