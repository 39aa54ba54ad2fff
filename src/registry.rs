//! Node Registry
//!
//! Run-scoped index of nodes that passed structural validation, queryable
//! by semantic name and by path. Predicates and after-validation actions
//! use it to find entries matched in other branches of the tree.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::schema::SchemaNode;

/// A schema node together with the path it matched
#[derive(Debug, Clone)]
pub struct NodeContext<'s> {
    pub node: &'s SchemaNode,
    pub path: PathBuf,
    /// Paths of enclosing matched directories, outermost first
    pub parent_paths: Vec<PathBuf>,
}

/// Registry state at a point in time, used to discard a losing candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    entries: usize,
    processed: usize,
}

/// Index of validated nodes for one validation run
#[derive(Debug, Default)]
pub struct NodeRegistry<'s> {
    /// Contexts in registration (traversal) order
    entries: Vec<NodeContext<'s>>,
    by_name: HashMap<String, Vec<usize>>,
    by_path: HashMap<PathBuf, usize>,
    processed_dirs: Vec<PathBuf>,
    processed_set: HashSet<PathBuf>,
}

impl<'s> NodeRegistry<'s> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node that passed validation
    pub fn register_node(&mut self, node: &'s SchemaNode, path: &Path, parent_paths: Vec<PathBuf>) {
        let idx = self.entries.len();
        self.entries.push(NodeContext {
            node,
            path: path.to_path_buf(),
            parent_paths,
        });
        self.by_name
            .entry(node.semantical_name().to_string())
            .or_default()
            .push(idx);
        self.by_path.insert(path.to_path_buf(), idx);
    }

    /// Mark a directory whose children have all been attempted
    pub fn register_processed_dir(&mut self, dir_path: &Path) {
        if self.processed_set.insert(dir_path.to_path_buf()) {
            self.processed_dirs.push(dir_path.to_path_buf());
        }
    }

    pub fn is_dir_processed(&self, dir_path: &Path) -> bool {
        self.processed_set.contains(dir_path)
    }

    /// All paths registered under a semantic name, in traversal order
    pub fn get_paths_by_name(&self, name: &str) -> Vec<&Path> {
        self.get_contexts_by_name(name)
            .map(|c| c.path.as_path())
            .collect()
    }

    pub fn get_context_by_path(&self, path: &Path) -> Option<&NodeContext<'s>> {
        self.by_path.get(path).map(|&idx| &self.entries[idx])
    }

    pub fn get_contexts_by_name<'r>(
        &'r self,
        name: &str,
    ) -> impl Iterator<Item = &'r NodeContext<'s>> + 'r {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.entries[idx])
    }

    pub fn iter_contexts(&self) -> impl Iterator<Item = &NodeContext<'s>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            entries: self.entries.len(),
            processed: self.processed_dirs.len(),
        }
    }

    /// Drop everything registered since `checkpoint`
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.entries.len() > checkpoint.entries {
            let idx = self.entries.len() - 1;
            let Some(context) = self.entries.pop() else {
                break;
            };

            let name = context.node.semantical_name();
            if let Some(indices) = self.by_name.get_mut(name) {
                indices.pop();
                if indices.is_empty() {
                    self.by_name.remove(name);
                }
            }

            if self.by_path.get(&context.path) == Some(&idx) {
                match self.entries.iter().rposition(|c| c.path == context.path) {
                    Some(previous) => {
                        self.by_path.insert(context.path, previous);
                    }
                    None => {
                        self.by_path.remove(&context.path);
                    }
                }
            }
        }

        for dir in self.processed_dirs.drain(checkpoint.processed..) {
            self.processed_set.remove(&dir);
        }
    }
}
