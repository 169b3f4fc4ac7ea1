use crate::errors::EditorResult;
use crate::validation::{AlwaysValidate, NeverValidate, SampledValidation, ValidationPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "tessera.config.json";

/// When incoming sequences are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ValidationMode {
    Always,
    Sampled { every: u32 },
    Never,
}

/// Scene configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    #[serde(default = "default_validation")]
    pub validation: ValidationMode,

    /// Reject invalid sequences instead of logging and repairing them
    #[serde(default)]
    pub strict: bool,

    /// Also require bound text to be keyed above its container
    #[serde(default = "default_include_bound_text")]
    pub include_bound_text_validation: bool,
}

fn default_validation() -> ValidationMode {
    ValidationMode::Sampled { every: 64 }
}

fn default_include_bound_text() -> bool {
    true
}

impl SceneConfig {
    /// Validate every install and reject violations
    pub fn strict() -> Self {
        Self {
            validation: ValidationMode::Always,
            strict: true,
            include_bound_text_validation: true,
        }
    }

    pub fn from_json(json: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> EditorResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            // Return default config if none exists
            Ok(Self::default())
        }
    }

    pub fn policy(&self) -> Box<dyn ValidationPolicy> {
        match self.validation {
            ValidationMode::Always => Box::new(AlwaysValidate {
                strict: self.strict,
            }),
            ValidationMode::Sampled { every } => Box::new(SampledValidation::new(every, self.strict)),
            ValidationMode::Never => Box::new(NeverValidate),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            validation: default_validation(),
            strict: false,
            include_bound_text_validation: default_include_bound_text(),
        }
    }
}
