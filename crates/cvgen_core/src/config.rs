//! Workspace configuration.
//!
//! # Responsibility
//! - Provide defaults for document, build and template locations.
//! - Read optional overrides from `CVGEN_*` environment variables.
//!
//! # Invariants
//! - Blank overrides fall back to defaults.
//! - A validated config always targets a `.pdf` artifact with a named engine.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::compiler::PipelineSettings;

pub const ENV_DOCUMENT: &str = "CVGEN_DOCUMENT";
pub const ENV_BUILD_DIR: &str = "CVGEN_BUILD_DIR";
pub const ENV_TEMPLATE_DIR: &str = "CVGEN_TEMPLATE_DIR";
pub const ENV_TEMPLATE: &str = "CVGEN_TEMPLATE";
pub const ENV_ENGINE: &str = "CVGEN_ENGINE";
pub const ENV_OUTPUT: &str = "CVGEN_OUTPUT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Output name does not end in `.pdf`.
    InvalidOutput(String),
    BlankEngine,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOutput(name) => {
                write!(f, "output name `{name}` must be a .pdf file name")
            }
            Self::BlankEngine => write!(f, "typesetting engine cannot be empty"),
        }
    }
}

impl Error for ConfigError {}

/// Locations and tools used by one editing workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub document_path: PathBuf,
    pub build_dir: PathBuf,
    pub template_dir: PathBuf,
    pub default_template: String,
    /// LaTeX engine executable.
    pub engine: String,
    pub output_name: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            document_path: PathBuf::from("resume.yaml"),
            build_dir: PathBuf::from("build"),
            template_dir: PathBuf::from("cls"),
            default_template: "deedy".to_string(),
            engine: "pdflatex".to_string(),
            output_name: "resume.pdf".to_string(),
        }
    }
}

impl WorkspaceConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup(name)` for every `CVGEN_*` variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(value) = read(ENV_DOCUMENT) {
            config.document_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_BUILD_DIR) {
            config.build_dir = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_TEMPLATE_DIR) {
            config.template_dir = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_TEMPLATE) {
            config.default_template = value;
        }
        if let Some(value) = read(ENV_ENGINE) {
            config.engine = value;
        }
        if let Some(value) = read(ENV_OUTPUT) {
            config.output_name = value;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.trim().is_empty() {
            return Err(ConfigError::BlankEngine);
        }
        let output = self.output_name.trim();
        let stem = output.strip_suffix(".pdf").unwrap_or_default();
        if stem.is_empty() || stem.ends_with('/') {
            return Err(ConfigError::InvalidOutput(self.output_name.clone()));
        }
        Ok(())
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            build_dir: self.build_dir.clone(),
            template_dir: self.template_dir.clone(),
            default_template: self.default_template.clone(),
        }
    }
}
