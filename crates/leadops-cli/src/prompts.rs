//! Prompt presets, saved prompts, and resolving the prompt configuration of a
//! batch run.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use leadops_core::{AppConfig, PromptConfig};
use leadops_db::DbError;
use uuid::Uuid;

/// Where the three prompt blocks come from. Exactly one source is required.
#[derive(Debug, Clone, Args)]
pub struct PromptArgs {
    /// Preset key from the presets file
    #[arg(long, conflicts_with_all = ["prompt_id", "wildnet_file"])]
    pub preset: Option<String>,
    /// Id of a saved prompt
    #[arg(long, conflicts_with = "wildnet_file")]
    pub prompt_id: Option<i64>,
    /// File with the operator context block (requires the other two files)
    #[arg(long, requires_all = ["scoring_file", "message_file"])]
    pub wildnet_file: Option<PathBuf>,
    /// File with the scoring criteria / ICP block
    #[arg(long, requires = "wildnet_file")]
    pub scoring_file: Option<PathBuf>,
    /// File with the messaging instructions block
    #[arg(long, requires = "wildnet_file")]
    pub message_file: Option<PathBuf>,
}

/// Sub-commands available under `prompts`.
#[derive(Debug, Subcommand)]
pub enum PromptsCommands {
    /// List the configured presets
    Presets,
    /// Save a prompt configuration for later batch runs
    Save {
        /// Owning user id
        #[arg(long)]
        user: Uuid,
        /// Campaign tag for the saved prompt
        #[arg(long)]
        tag: String,
        #[command(flatten)]
        prompt: PromptArgs,
    },
    /// List saved prompts, newest first
    List {
        /// Owning user id
        #[arg(long)]
        user: Uuid,
        /// Maximum number of prompts to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

/// Resolve `args` into a validated prompt configuration.
///
/// # Errors
///
/// Returns an error if the preset or saved prompt does not exist, a file
/// cannot be read, or any block is blank.
pub(crate) async fn resolve_prompt(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    user: Uuid,
    args: &PromptArgs,
) -> anyhow::Result<PromptConfig> {
    let prompt = if let Some(key) = &args.preset {
        let presets = leadops_core::load_presets(&config.presets_path)?;
        presets
            .find(key)
            .map(|p| p.prompt.clone())
            .ok_or_else(|| anyhow::anyhow!("preset '{key}' not found"))?
    } else if let Some(id) = args.prompt_id {
        match leadops_db::get_prompt(pool, id, user).await {
            Ok(row) => row.prompt_config(),
            Err(DbError::NotFound) => anyhow::bail!("saved prompt {id} not found for user {user}"),
            Err(e) => return Err(e.into()),
        }
    } else {
        match (&args.wildnet_file, &args.scoring_file, &args.message_file) {
            (Some(w), Some(s), Some(m)) => {
                PromptConfig::new(read_block(w)?, read_block(s)?, read_block(m)?)
            }
            _ => anyhow::bail!(
                "pass --preset, --prompt-id, or all of --wildnet-file/--scoring-file/--message-file"
            ),
        }
    };

    Ok(prompt.validated()?)
}

fn read_block(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Print the preset keys and labels.
///
/// # Errors
///
/// Returns an error if the presets file cannot be loaded.
pub(crate) fn run_prompts_presets(config: &AppConfig) -> anyhow::Result<()> {
    let presets = leadops_core::load_presets(&config.presets_path)?;
    println!("{:<24}LABEL", "KEY");
    for preset in &presets.presets {
        println!("{:<24}{}", preset.key, preset.label);
    }
    Ok(())
}

/// Save a prompt configuration under `tag`.
///
/// # Errors
///
/// Returns an error if the prompt cannot be resolved or the insert fails.
pub(crate) async fn run_prompts_save(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    user: Uuid,
    tag: &str,
    args: &PromptArgs,
) -> anyhow::Result<()> {
    let tag = tag.trim();
    if tag.is_empty() {
        anyhow::bail!("tag is required");
    }
    let prompt = resolve_prompt(pool, config, user, args).await?;
    let row = leadops_db::insert_prompt(pool, user, tag, &prompt).await?;
    println!("saved prompt {} (tag {})", row.id, row.tag);
    Ok(())
}

/// Print the user's saved prompts.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn run_prompts_list(
    pool: &sqlx::PgPool,
    user: Uuid,
    limit: i64,
) -> anyhow::Result<()> {
    let rows = leadops_db::list_prompts(pool, user, limit).await?;
    if rows.is_empty() {
        println!("no saved prompts for user {user}");
        return Ok(());
    }

    println!("{:<8}{:<22}{:<20}MESSAGE PROMPT", "ID", "CREATED", "TAG");
    for row in &rows {
        let first_line = row.message_prompt.lines().next().unwrap_or_default();
        println!(
            "{:<8}{:<22}{:<20}{}",
            row.id,
            row.created_at.format("%Y-%m-%d %H:%M:%S"),
            row.tag,
            truncate(first_line, 50)
        );
    }
    Ok(())
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max).collect::<String>())
    } else {
        s.to_string()
    }
}
