//! Generator configuration
//!
//! Settings can come from a TOML file, command-line flags, and (for the
//! template directory) the `DSDLGEN_TEMPLATE_DIR` environment variable. Flags
//! win over the file; the environment is only a fallback.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::generator::FailurePolicy;
use crate::templates::DEFAULT_TEMPLATE_SUFFIX;

/// Environment variable consulted when no template directory is configured
pub const TEMPLATE_DIR_ENV: &str = "DSDLGEN_TEMPLATE_DIR";

/// Source of the fallback template directory, injectable for tests
pub trait TemplateConfigReader {
    fn get_template_dir(&self) -> Option<String>;
}

/// Production implementation that reads from environment variables
pub struct EnvTemplateConfigReader;

impl TemplateConfigReader for EnvTemplateConfigReader {
    fn get_template_dir(&self) -> Option<String> {
        std::env::var(TEMPLATE_DIR_ENV).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: Option<PathBuf>,
    pub template_dir: Option<PathBuf>,
    pub template_suffix: String,
    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            template_dir: None,
            template_suffix: DEFAULT_TEMPLATE_SUFFIX.to_string(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.template_suffix.starts_with('.') || self.template_suffix.len() < 2 {
            return Err(GenerationError::config(format!(
                "Template suffix '{}' must start with '.'",
                self.template_suffix
            )));
        }
        Ok(())
    }

    /// Template directory from the config, else from `reader`
    pub fn resolve_template_dir(&self, reader: &dyn TemplateConfigReader) -> Option<PathBuf> {
        self.template_dir
            .clone()
            .or_else(|| reader.get_template_dir().map(PathBuf::from))
    }

    /// Output directory from the config, else the current directory
    pub fn resolve_output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}
