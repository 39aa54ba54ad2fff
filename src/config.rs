//! Configuration for tree-schemas tooling
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (tree-schemas.toml)
//! - Environment variables (TREE_SCHEMAS__*)
//!
//! ## Example config file (tree-schemas.toml):
//! ```toml
//! [validation]
//! sort_results = true
//! check_permissions = false
//!
//! [report]
//! format = "text"
//! output_format = "pretty"
//! failures_only = true
//!
//! [logging]
//! level = "info"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeSchemasConfig {
    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Validation run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Most specific failures first
    #[serde(default = "default_true")]
    pub sort_results: bool,

    /// Register the permission validator for local runs
    #[serde(default)]
    pub check_permissions: bool,
}

/// Report rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,

    /// JSON layout
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Only list failing results in text output
    #[serde(default = "default_true")]
    pub failures_only: bool,
}

/// How a report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            sort_results: true,
            check_permissions: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            output_format: OutputFormat::Pretty,
            failures_only: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TreeSchemasConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, with an optional explicit file that must exist
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "tree-schemas.toml",
            ".tree-schemas.toml",
            "config/tree-schemas.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "tree-schemas") {
            let xdg_config = config_dir.config_dir().join("tree-schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // TREE_SCHEMAS__VALIDATION__SORT_RESULTS=false
        builder = builder.add_source(
            Environment::with_prefix("TREE_SCHEMAS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
