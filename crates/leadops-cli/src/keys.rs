use clap::Subcommand;

/// Sub-commands available under `keys`.
#[derive(Debug, Subcommand)]
pub enum KeysCommands {
    /// Add an API key to the pool
    Add {
        /// The key value
        #[arg(long, env = "LEADOPS_PROCESSOR_API_KEY", hide_env_values = true)]
        key: String,
    },
    /// Show how many keys the pool holds
    Count,
}

/// # Errors
///
/// Returns an error if the key is blank or the insert fails.
pub(crate) async fn run_keys_add(pool: &sqlx::PgPool, key: &str) -> anyhow::Result<()> {
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }
    if leadops_db::insert_api_key(pool, key).await? {
        println!("API key added");
    } else {
        println!("API key already present");
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn run_keys_count(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let keys = leadops_db::list_api_keys(pool).await?;
    println!("{} API key(s) in the pool", keys.len());
    Ok(())
}
