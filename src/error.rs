//! Error handling for the dsdlgen code generation library.
//!
//! This module defines the main error type `GenerationError` used throughout
//! the library, along with a convenient `Result` type alias. Per-type failures
//! carry the [`TypeKey`] of the type being generated so the caller can tell
//! which type failed and how.
//!
//! # Examples
//!
//! ```
//! use dsdlgen::error::{GenerationError, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(GenerationError::config("template root is empty"))
//! }
//!
//! assert!(might_fail().is_err());
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::types::TypeKey;

/// Result type for dsdlgen operations
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Main error type for dsdlgen operations
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Invalid generator inputs, detected before any rendering happens
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No template file exists for the structural variant of a type
    #[error("Template '{template}' not found under {} (required by {type_key})", .root.display())]
    TemplateNotFound {
        type_key: TypeKey,
        template: String,
        root: PathBuf,
    },

    /// The template engine failed to load or render a template
    #[error("Failed to render template '{template}' for {type_key}: {message}")]
    TemplateRender {
        type_key: TypeKey,
        template: String,
        message: String,
    },

    /// Directory creation or file write failure
    #[error("File system error for {type_key} at {}: {source}", .path.display())]
    FileSystem {
        type_key: TypeKey,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Best-effort generation finished with per-type failures
    #[error("Generation incomplete: {} of {attempted} types failed", .failures.len())]
    Incomplete {
        attempted: usize,
        failures: Vec<GenerationError>,
    },

    /// Type manifest could not be turned into a type→path mapping
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(String),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl GenerationError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new manifest error
    pub fn manifest<S: Into<String>>(msg: S) -> Self {
        Self::Manifest(msg.into())
    }

    /// Build a render error from a tera error, keeping the whole source chain.
    ///
    /// Tera wraps filter failures several levels deep ("Failed to render" →
    /// "Filter call 'required' failed" → the filter's own message), so the
    /// top-level message alone hides the useful part.
    pub fn render(type_key: &TypeKey, template: &str, err: &tera::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::TemplateRender {
            type_key: type_key.clone(),
            template: template.to_string(),
            message,
        }
    }

    /// The type this error is about, if it is a per-type failure
    pub fn type_key(&self) -> Option<&TypeKey> {
        match self {
            Self::TemplateNotFound { type_key, .. }
            | Self::TemplateRender { type_key, .. }
            | Self::FileSystem { type_key, .. } => Some(type_key),
            _ => None,
        }
    }
}
