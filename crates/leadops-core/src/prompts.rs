//! Prompt configuration for batch runs and the preset file loader.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ValidationError};

/// The three free-text blocks sent with every lead of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Contextual data about the operator's own company.
    pub wildnet_data: String,
    pub scoring_criteria_and_icp: String,
    pub message_prompt: String,
}

impl PromptConfig {
    #[must_use]
    pub fn new(
        wildnet_data: impl Into<String>,
        scoring_criteria_and_icp: impl Into<String>,
        message_prompt: impl Into<String>,
    ) -> Self {
        Self {
            wildnet_data: wildnet_data.into(),
            scoring_criteria_and_icp: scoring_criteria_and_icp.into(),
            message_prompt: message_prompt.into(),
        }
    }

    /// Returns a trimmed copy, or a [`ValidationError`] naming the first
    /// block that is empty after trimming.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when any block is blank.
    pub fn validated(&self) -> Result<PromptConfig, ValidationError> {
        let fields = [
            ("wildnet_data", &self.wildnet_data),
            ("scoring_criteria_and_icp", &self.scoring_criteria_and_icp),
            ("message_prompt", &self.message_prompt),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::new(format!("{name} must not be empty")));
            }
        }

        Ok(PromptConfig {
            wildnet_data: self.wildnet_data.trim().to_string(),
            scoring_criteria_and_icp: self.scoring_criteria_and_icp.trim().to_string(),
            message_prompt: self.message_prompt.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptPreset {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Deserialize)]
pub struct PresetsFile {
    pub presets: Vec<PromptPreset>,
}

impl PresetsFile {
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&PromptPreset> {
        self.presets.iter().find(|p| p.key == key)
    }
}

/// Load and validate prompt presets from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_presets(path: &Path) -> Result<PresetsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PresetsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_presets(&content)
}

fn parse_presets(content: &str) -> Result<PresetsFile, ConfigError> {
    let file: PresetsFile = serde_yaml::from_str(content)?;
    validate_presets(&file)?;
    Ok(file)
}

fn validate_presets(file: &PresetsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for preset in &file.presets {
        if preset.key.trim().is_empty() {
            return Err(ConfigError::InvalidPreset(
                "preset key must not be empty".to_string(),
            ));
        }
        if !seen.insert(preset.key.as_str()) {
            return Err(ConfigError::InvalidPreset(format!(
                "duplicate preset key '{}'",
                preset.key
            )));
        }
        preset
            .prompt
            .validated()
            .map_err(|e| ConfigError::InvalidPreset(format!("{}: {e}", preset.key)))?;
    }
    Ok(())
}
