use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("LEADOPS_ENV", "development"))?;

    let bind_addr = parse_addr("LEADOPS_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("LEADOPS_LOG_LEVEL", "info");
    let presets_path = PathBuf::from(or_default("LEADOPS_PRESETS_PATH", "./config/presets.yaml"));

    let db_max_connections = parse_u32("LEADOPS_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("LEADOPS_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("LEADOPS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let processor_url = or_default("LEADOPS_PROCESSOR_URL", "http://localhost:8000");
    if !processor_url.starts_with("http://") && !processor_url.starts_with("https://") {
        return Err(invalid(
            "LEADOPS_PROCESSOR_URL",
            format!("expected an http(s) URL, got '{processor_url}'"),
        ));
    }
    let processor_timeout_secs = match lookup("LEADOPS_PROCESSOR_TIMEOUT_SECS") {
        Ok(raw) => Some(
            raw.parse::<u64>()
                .map_err(|e| invalid("LEADOPS_PROCESSOR_TIMEOUT_SECS", e.to_string()))?,
        ),
        Err(_) => None,
    };
    let processor_user_agent = or_default(
        "LEADOPS_PROCESSOR_USER_AGENT",
        "leadops/0.1 (lead-processing)",
    );

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        presets_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        processor_url,
        processor_timeout_secs,
        processor_user_agent,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LEADOPS_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}
