//! Schema node types
//!
//! A schema is a tree of [`SchemaNode`]s with exactly one root. Files and
//! directories describe filesystem shapes; predicates describe relationships
//! between named nodes and never match a filesystem entry themselves.

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque per-node metadata, passed through to validators and actions
pub type Metadata = serde_json::Map<String, Value>;

/// Predicate type the engine evaluates
pub const PAIR_COMPARISON: &str = "pair_comparison";

/// A compiled name pattern that must match the whole observed name
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    /// Compile a pattern. The regex is anchored so partial matches fail.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written in the schema
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_full_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl PartialEq for NamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Fields shared by every node kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInfo {
    /// Declared logical path, used for diagnostics
    pub path: PathBuf,
    /// Identity within the schema, used for registry and predicate lookups
    pub semantical_name: String,
    pub description: Option<String>,
    /// Stem (files) or full name (directories) must match when set
    pub pattern_validation: Option<NamePattern>,
    pub metadata: Option<Metadata>,
    /// Expected permission string, checked by collaborator validators
    pub permissions: Option<String>,
    /// Expected owner, checked by collaborator validators
    pub owner: Option<String>,
}

impl NodeInfo {
    pub fn new(path: impl Into<PathBuf>, semantical_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            semantical_name: semantical_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub info: NodeInfo,
    /// Expected extension without the leading dot, e.g. `jpg` or `tar.gz`
    pub extension: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryNode {
    pub info: NodeInfo,
    /// Declared children. Order only matters for deterministic backtracking.
    pub children: Vec<SchemaNode>,
}

impl DirectoryNode {
    pub fn add_child(&mut self, child: SchemaNode) {
        self.children.push(child);
    }

    /// First child with the given semantic name
    pub fn get_child_by_name(&self, name: &str) -> Option<&SchemaNode> {
        self.children.iter().find(|c| c.semantical_name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredicateNode {
    pub info: NodeInfo,
    /// Predicate tag, e.g. `pair_comparison`
    pub predicate_type: String,
    /// Semantic names this predicate constrains
    pub elements: Vec<String>,
}

/// One declared element of the expected tree
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    File(FileNode),
    Directory(DirectoryNode),
    Predicate(PredicateNode),
}

impl SchemaNode {
    /// Create a file node. A leading dot on the extension is dropped.
    pub fn file(
        path: impl Into<PathBuf>,
        semantical_name: impl Into<String>,
        extension: Option<&str>,
    ) -> Self {
        let extension = extension
            .map(|e| e.trim_start_matches('.'))
            .filter(|e| !e.is_empty())
            .map(String::from);
        SchemaNode::File(FileNode {
            info: NodeInfo::new(path, semantical_name),
            extension,
        })
    }

    pub fn directory(
        path: impl Into<PathBuf>,
        semantical_name: impl Into<String>,
        children: Vec<SchemaNode>,
    ) -> Self {
        SchemaNode::Directory(DirectoryNode {
            info: NodeInfo::new(path, semantical_name),
            children,
        })
    }

    pub fn predicate(
        path: impl Into<PathBuf>,
        semantical_name: impl Into<String>,
        predicate_type: impl Into<String>,
        elements: Vec<String>,
    ) -> Self {
        SchemaNode::Predicate(PredicateNode {
            info: NodeInfo::new(path, semantical_name),
            predicate_type: predicate_type.into(),
            elements,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.info_mut().description = Some(description.into());
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.info_mut().pattern_validation = Some(NamePattern::new(pattern)?);
        Ok(self)
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.info_mut().metadata = Some(metadata);
        self
    }

    pub fn with_permissions(mut self, permissions: impl Into<String>) -> Self {
        self.info_mut().permissions = Some(permissions.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.info_mut().owner = Some(owner.into());
        self
    }

    pub fn info(&self) -> &NodeInfo {
        match self {
            SchemaNode::File(f) => &f.info,
            SchemaNode::Directory(d) => &d.info,
            SchemaNode::Predicate(p) => &p.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut NodeInfo {
        match self {
            SchemaNode::File(f) => &mut f.info,
            SchemaNode::Directory(d) => &mut d.info,
            SchemaNode::Predicate(p) => &mut p.info,
        }
    }

    pub fn semantical_name(&self) -> &str {
        &self.info().semantical_name
    }

    pub fn path(&self) -> &Path {
        &self.info().path
    }

    /// Node kind as used in schema documents and diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaNode::File(_) => "file",
            SchemaNode::Directory(_) => "directory",
            SchemaNode::Predicate(_) => "predicate",
        }
    }

    /// Declared children; empty for files and predicates
    pub fn children(&self) -> &[SchemaNode] {
        match self {
            SchemaNode::Directory(d) => &d.children,
            _ => &[],
        }
    }

    pub fn is_predicate(&self) -> bool {
        matches!(self, SchemaNode::Predicate(_))
    }

    /// All nodes of the tree in depth-first pre-order, root included
    pub fn descendants(&self) -> Vec<&SchemaNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            for child in node.children().iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}

impl From<FileNode> for SchemaNode {
    fn from(node: FileNode) -> Self {
        SchemaNode::File(node)
    }
}

impl From<DirectoryNode> for SchemaNode {
    fn from(node: DirectoryNode) -> Self {
        SchemaNode::Directory(node)
    }
}

impl From<PredicateNode> for SchemaNode {
    fn from(node: PredicateNode) -> Self {
        SchemaNode::Predicate(node)
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}",
            self.kind(),
            self.semantical_name(),
            self.path().display()
        )
    }
}
