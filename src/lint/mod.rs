//! Schema Linting
//!
//! Static checks over a schema tree, run before any filesystem is touched.
//!
//! ## Lints
//! 1. **Unknown Elements**: predicate elements must name a file or directory
//!    declared somewhere in the same tree (with a "did you mean" hint)
//! 2. **Arity**: relational predicates need at least two elements
//! 3. **Unknown Predicates**: types the engine does not evaluate are no-ops
//! 4. **Empty Names**: non-root nodes without a semantic name cannot be
//!    referenced or reported meaningfully

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::HashSet;

use crate::schema::{SchemaNode, PAIR_COMPARISON};

/// Result of linting a schema
#[derive(Debug, Default)]
pub struct LintResult {
    pub schema_id: String,
    pub errors: Vec<LintError>,
    pub warnings: Vec<LintWarning>,
}

impl LintResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug)]
pub struct LintError {
    pub code: &'static str,
    pub message: String,
    pub path: String,
}

#[derive(Debug)]
pub struct LintWarning {
    pub code: &'static str,
    pub message: String,
    pub path: String,
}

/// The schema tree linter
pub struct SchemaLinter {
    /// Predicate types the engine evaluates
    known_predicates: HashSet<&'static str>,
    matcher: SkimMatcherV2,
}

impl Default for SchemaLinter {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaLinter {
    pub fn new() -> Self {
        Self {
            known_predicates: [PAIR_COMPARISON].into_iter().collect(),
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Lint a schema tree
    pub fn lint(&self, schema: &SchemaNode) -> LintResult {
        let mut result = LintResult {
            schema_id: schema.semantical_name().to_string(),
            ..Default::default()
        };

        let nodes = schema.descendants();
        let declared: Vec<&str> = nodes
            .iter()
            .filter(|n| !n.is_predicate())
            .map(|n| n.semantical_name())
            .filter(|n| !n.is_empty())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        for (i, node) in nodes.iter().enumerate() {
            let path = node.path().display().to_string();

            if i > 0 && node.semantical_name().is_empty() {
                result.warnings.push(LintWarning {
                    code: "EMPTY_NAME",
                    message: format!("{} node has no semantical_name", node.kind()),
                    path: path.clone(),
                });
            }

            if let SchemaNode::Predicate(predicate) = node {
                let kind = predicate.predicate_type.as_str();
                if !self.known_predicates.contains(kind) {
                    result.warnings.push(LintWarning {
                        code: "UNKNOWN_PREDICATE",
                        message: format!(
                            "Predicate type '{}' is not evaluated and always passes",
                            kind
                        ),
                        path: path.clone(),
                    });
                }

                let min_elements = if kind == PAIR_COMPARISON { 2 } else { 1 };
                if predicate.elements.len() < min_elements {
                    result.errors.push(LintError {
                        code: "PREDICATE_ARITY",
                        message: format!(
                            "Predicate '{}' needs at least {} element(s), has {}",
                            predicate.info.semantical_name,
                            min_elements,
                            predicate.elements.len()
                        ),
                        path: path.clone(),
                    });
                }

                for element in &predicate.elements {
                    if declared.contains(&element.as_str()) {
                        continue;
                    }
                    let hint = self
                        .suggest(element, &declared)
                        .map(|s| format!(" Did you mean '{}'?", s))
                        .unwrap_or_default();
                    result.errors.push(LintError {
                        code: "UNKNOWN_ELEMENT",
                        message: format!(
                            "Predicate element '{}' does not name any file or directory.{}",
                            element, hint
                        ),
                        path: path.clone(),
                    });
                }
            }
        }

        result
    }

    /// Closest declared name, trying the name as a query and as a target
    fn suggest<'d>(&self, element: &str, declared: &[&'d str]) -> Option<&'d str> {
        declared
            .iter()
            .filter_map(|&name| {
                let score = self
                    .matcher
                    .fuzzy_match(name, element)
                    .or_else(|| self.matcher.fuzzy_match(element, name))?;
                Some((score, name))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(a.1)))
            .map(|(_, name)| name)
    }
}
