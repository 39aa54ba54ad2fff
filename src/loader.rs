//! Schema Loading
//!
//! Builds a [`SchemaNode`] tree from a YAML or JSON document.
//!
//! ## Example schema (schema.yaml):
//! ```yaml
//! type: directory
//! semantical_name: dataset
//! children:
//!   - type: directory
//!     semantical_name: timestamp
//!     pattern_name: '\d{2}\.\d{2}\.\d{4}'
//!     children:
//!       - type: file
//!         semantical_name: image
//!         extension: jpg
//!       - type: file
//!         semantical_name: label
//!         extension: txt
//!       - type: predicate
//!         semantical_name: image_label_pairs
//!         predicate_type: pair_comparison
//!         elements: [image, label]
//! ```
//!
//! The root node's path is the validation target; every other node's path
//! is its parent's path joined with its semantic name.

use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::schema::{Metadata, NamePattern, NodeInfo, SchemaNode};

/// Anything that can produce a built schema tree
pub trait SchemaSource {
    fn load_schema(&self) -> Result<SchemaNode>;
}

/// Document format of a schema file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Yaml,
    Json,
}

impl SchemaFormat {
    /// Pick the format from a file extension; anything but `.json` is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SchemaFormat::Json,
            _ => SchemaFormat::Yaml,
        }
    }
}

/// Loads a schema file for a given validation target
#[derive(Debug, Clone)]
pub struct SchemaLoader {
    schema_path: PathBuf,
    target_path: PathBuf,
}

impl SchemaLoader {
    pub fn new(schema_path: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            schema_path: schema_path.into(),
            target_path: target_path.into(),
        }
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }
}

impl SchemaSource for SchemaLoader {
    fn load_schema(&self) -> Result<SchemaNode> {
        debug!(schema = %self.schema_path.display(), "loading schema");
        let content = fs::read_to_string(&self.schema_path)?;
        if content.trim().is_empty() {
            return Err(SchemaError::EmptySchema(
                self.schema_path.display().to_string(),
            ));
        }
        parse_schema(
            &content,
            SchemaFormat::from_path(&self.schema_path),
            &self.target_path,
        )
    }
}

/// Load a schema file for validating `target`
pub fn load_schema(schema_path: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<SchemaNode> {
    SchemaLoader::new(schema_path.as_ref(), target.as_ref()).load_schema()
}

/// Parse schema text. `target` becomes the root node's path.
pub fn parse_schema(text: &str, format: SchemaFormat, target: &Path) -> Result<SchemaNode> {
    let raw: Option<RawNode> = match format {
        SchemaFormat::Yaml => serde_yaml::from_str(text)?,
        SchemaFormat::Json => serde_json::from_str(text)?,
    };
    let raw = raw.ok_or_else(|| SchemaError::EmptySchema("<document>".to_string()))?;
    build_node(raw, target, true)
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "type", default)]
    node_type: String,
    #[serde(default)]
    semantical_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    pattern_name: Option<String>,
    /// String or number, e.g. `rwxr-xr-x` or `755`
    #[serde(default)]
    permissions: Option<Value>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    extension: Option<String>,
    #[serde(default)]
    children: Vec<RawNode>,
    #[serde(default)]
    predicate_type: Option<String>,
    #[serde(default)]
    elements: Vec<String>,
}

fn build_node(raw: RawNode, parent_path: &Path, is_root: bool) -> Result<SchemaNode> {
    let node_path = if is_root || raw.semantical_name.is_empty() {
        parent_path.to_path_buf()
    } else {
        parent_path.join(&raw.semantical_name)
    };

    let pattern_validation = raw
        .pattern_name
        .as_deref()
        .map(|pattern| {
            NamePattern::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                node: raw.semantical_name.clone(),
                pattern: pattern.to_string(),
                source,
            })
        })
        .transpose()?;

    let permissions = match raw.permissions {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    };

    let info = NodeInfo {
        path: node_path.clone(),
        semantical_name: raw.semantical_name.clone(),
        description: raw.description,
        pattern_validation,
        metadata: raw.metadata,
        permissions,
        owner: raw.owner,
    };

    let node_type = raw.node_type.to_lowercase();
    let mut node = match node_type.as_str() {
        "file" => SchemaNode::file(node_path, "", raw.extension.as_deref()),
        "directory" => {
            let children = raw
                .children
                .into_iter()
                .map(|child| build_node(child, &node_path, false))
                .collect::<Result<Vec<_>>>()?;
            SchemaNode::directory(node_path, "", children)
        }
        "predicate" => {
            let predicate_type = raw
                .predicate_type
                .filter(|t| !t.is_empty())
                .ok_or_else(|| SchemaError::MissingPredicateType(raw.semantical_name.clone()))?;
            if raw.elements.is_empty() {
                return Err(SchemaError::MissingElements(raw.semantical_name));
            }
            SchemaNode::predicate(node_path, "", predicate_type, raw.elements)
        }
        _ => return Err(SchemaError::InvalidNodeType(raw.node_type)),
    };

    *node.info_mut() = info;
    Ok(node)
}
