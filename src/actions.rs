//! Actions
//!
//! Side-effect callbacks attached to semantic names. An action fires either
//! inline while the tree is being matched, or once per matched location after
//! the whole validation (structure and predicates) has passed. Action errors
//! are captured as [`ActionResult`]s and never abort validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::registry::NodeRegistry;
use crate::schema::SchemaNode;

/// Free-form context handed to every action
pub type Context = serde_json::Map<String, Value>;

/// An enclosing directory on the traversal stack
#[derive(Debug, Clone)]
pub struct ParentContext<'s> {
    pub node: &'s SchemaNode,
    pub path: PathBuf,
}

/// Callback signature: current node, matched path, enclosing directories,
/// and the caller's context map. Errors and panics both become a failed
/// [`ActionResult`]; a panicking callback may leave the context half-written.
pub type ActionCallback =
    Box<dyn Fn(&SchemaNode, &Path, &[ParentContext<'_>], &mut Context) -> anyhow::Result<()>>;

/// When an action should be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTiming {
    /// Inline, as soon as the node matches
    #[default]
    DuringValidation,
    /// Once per matched location, after structure and predicates pass
    AfterValidation,
}

/// Outcome of one action invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    pub path: PathBuf,
    pub action_name: String,
}

impl ActionResult {
    pub fn succeeded(action_name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            success: true,
            message: "Action executed successfully".to_string(),
            path: path.as_ref().to_path_buf(),
            action_name: action_name.into(),
        }
    }

    pub fn failed(
        action_name: impl Into<String>,
        path: impl AsRef<Path>,
        error: impl fmt::Display,
    ) -> Self {
        Self {
            success: false,
            message: format!("Action failed: {}", error),
            path: path.as_ref().to_path_buf(),
            action_name: action_name.into(),
        }
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "Success" } else { "Failed" };
        write!(
            f,
            "{} - {} on {}: {}",
            status,
            self.action_name,
            self.path.display(),
            self.message
        )
    }
}

pub struct ActionRegistration {
    callback: ActionCallback,
    pub timing: ActionTiming,
}

/// Registered actions, keyed by semantic name
///
/// Built once by the caller and passed into every validation run.
/// Registering the same name twice replaces the earlier action.
#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<(String, ActionRegistration)>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.actions.iter().map(|(name, reg)| (name, reg.timing)))
            .finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, node_name: impl Into<String>, timing: ActionTiming, callback: F)
    where
        F: Fn(&SchemaNode, &Path, &[ParentContext<'_>], &mut Context) -> anyhow::Result<()>
            + 'static,
    {
        let node_name = node_name.into();
        let registration = ActionRegistration {
            callback: Box::new(callback),
            timing,
        };
        match self.actions.iter_mut().find(|(name, _)| *name == node_name) {
            Some((_, existing)) => *existing = registration,
            None => self.actions.push((node_name, registration)),
        }
    }

    pub fn get(&self, node_name: &str) -> Option<&ActionRegistration> {
        self.actions
            .iter()
            .find(|(name, _)| name == node_name)
            .map(|(_, reg)| reg)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run the inline action for this node, if one is registered.
    pub fn run_during_validation(
        &self,
        node: &SchemaNode,
        path: &Path,
        parents: &[ParentContext<'_>],
        context: &mut Context,
    ) -> Option<ActionResult> {
        let name = node.semantical_name();
        let registration = self.get(name)?;
        if registration.timing != ActionTiming::DuringValidation {
            return None;
        }
        Some(invoke(name, registration, node, path, parents, context))
    }

    /// Run every after-validation action once per location its name matched
    pub fn execute_after_validation(
        &self,
        registry: &NodeRegistry<'_>,
        context: &mut Context,
    ) -> Vec<ActionResult> {
        let mut results = Vec::new();
        for (name, registration) in &self.actions {
            if registration.timing != ActionTiming::AfterValidation {
                continue;
            }
            for node_context in registry.get_contexts_by_name(name) {
                results.push(invoke(
                    name,
                    registration,
                    node_context.node,
                    &node_context.path,
                    &[],
                    context,
                ));
            }
        }
        results
    }
}

fn invoke(
    name: &str,
    registration: &ActionRegistration,
    node: &SchemaNode,
    path: &Path,
    parents: &[ParentContext<'_>],
    context: &mut Context,
) -> ActionResult {
    debug!(action = name, path = %path.display(), "running action");
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        (registration.callback)(node, path, parents, context)
    }));
    match outcome {
        Ok(Ok(())) => ActionResult::succeeded(name, path),
        Ok(Err(e)) => {
            warn!(action = name, path = %path.display(), error = %e, "action failed");
            ActionResult::failed(name, path, e)
        }
        Err(payload) => {
            let reason = panic_message(&*payload);
            warn!(action = name, path = %path.display(), reason, "action panicked");
            ActionResult::failed(name, path, format!("panicked: {}", reason))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
