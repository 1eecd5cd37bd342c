//! Shared domain types and configuration for the lead-operations workspace.

pub mod app_config;
pub mod config;
pub mod leads;
pub mod prompts;
pub mod requests;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use leads::{Lead, NewLead};
pub use prompts::{load_presets, PresetsFile, PromptConfig, PromptPreset};
pub use requests::NewScrapeRequest;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read presets file {path}: {source}")]
    PresetsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse presets file: {0}")]
    PresetsFileParse(#[from] serde_yaml::Error),

    #[error("invalid preset: {0}")]
    InvalidPreset(String),
}

/// Caller-supplied input that failed validation before any I/O happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
