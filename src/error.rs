//! Error types for schema loading and configuration
//!
//! Validation outcomes are never errors: they are `ValidationResult` entries
//! in a report. These errors cover everything around the engine.

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema loading and tooling errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema file is empty: {0}")]
    EmptySchema(String),

    #[error("Invalid or missing node type: {0}")]
    InvalidNodeType(String),

    #[error("Invalid pattern '{pattern}' on node '{node}': {source}")]
    InvalidPattern {
        node: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Predicate '{0}' is missing required predicate_type")]
    MissingPredicateType(String),

    #[error("Predicate '{0}' is missing required elements list")]
    MissingElements(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
