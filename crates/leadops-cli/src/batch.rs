//! Batch run command: submits every unsent lead of a user to the processor and
//! prints progress as each lead resolves.

use clap::Subcommand;
use leadops_core::AppConfig;
use leadops_pipeline::BatchProgress;
use uuid::Uuid;

use crate::prompts::{resolve_prompt, PromptArgs};

/// Sub-commands available under `batch`.
#[derive(Debug, Subcommand)]
pub enum BatchCommands {
    /// Score and message all unsent leads of a user
    Run {
        /// Owning user id
        #[arg(long)]
        user: Uuid,
        #[command(flatten)]
        prompt: PromptArgs,
    },
}

/// Run one batch to completion.
///
/// # Errors
///
/// Returns an error if the prompt cannot be resolved, the processor client
/// cannot be built, or the run aborts before the first lead (lead fetch
/// failure or empty credential pool). Per-lead failures are only counted.
pub(crate) async fn run_batch(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    user: Uuid,
    prompt_args: &PromptArgs,
) -> anyhow::Result<()> {
    let prompt = resolve_prompt(pool, config, user, prompt_args).await?;
    let orchestrator = leadops_pipeline::build_orchestrator(pool, config)?;

    let result = orchestrator
        .run_batch_with_progress(user, &prompt, print_progress)
        .await
        .inspect_err(|e| tracing::error!(%user, error = %e, "batch run aborted"))?;

    if result.nothing_to_do() {
        println!("no unsent leads for this user");
        return Ok(());
    }

    println!(
        "done: {} lead(s), {} succeeded, {} failed",
        result.total, result.success, result.failed
    );
    if let Some(err) = &result.last_error {
        println!("last error: {err}");
    }
    if let Some(response) = &result.last_response {
        println!("last response:");
        println!("{}", serde_json::to_string_pretty(response)?);
    }

    Ok(())
}

fn print_progress(progress: &BatchProgress) {
    println!(
        "progress: {}/{} (success {}, failed {})",
        progress.success + progress.failed,
        progress.total,
        progress.success,
        progress.failed
    );
}
