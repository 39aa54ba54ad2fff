//! Predicate evaluation
//!
//! Runs after the structure has matched. Walks the schema tree (not the
//! filesystem) and checks each predicate against the registry, which now
//! holds every node that matched anywhere in the observed tree.
//!
//! A predicate is scoped to its containing directory: it is evaluated once
//! for every location where that directory matched, and only considers
//! registered paths under that location.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::ptr;

use tracing::debug;

use crate::registry::NodeRegistry;
use crate::report::{ValidationReport, ValidationResult};
use crate::schema::{PredicateNode, SchemaNode, PAIR_COMPARISON};

/// Evaluate every predicate in `schema` against `registry`
pub fn evaluate_predicates(
    schema: &SchemaNode,
    root_path: &Path,
    registry: &NodeRegistry<'_>,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    visit(schema, None, root_path, registry, &mut report);
    report
}

fn visit(
    node: &SchemaNode,
    container: Option<&SchemaNode>,
    logical_path: &Path,
    registry: &NodeRegistry<'_>,
    report: &mut ValidationReport,
) {
    match node {
        SchemaNode::Predicate(predicate) => {
            let scopes = match container {
                Some(dir) => registry
                    .iter_contexts()
                    .filter(|c| ptr::eq(c.node, dir))
                    .map(|c| c.path.clone())
                    .collect(),
                None => vec![logical_path.to_path_buf()],
            };
            report.merge(validate_predicate(predicate, logical_path, &scopes, registry));
        }
        SchemaNode::Directory(dir) => {
            for child in &dir.children {
                let child_path = if child.is_predicate() {
                    logical_path.to_path_buf()
                } else {
                    logical_path.join(child.semantical_name())
                };
                visit(child, Some(node), &child_path, registry, report);
            }
        }
        SchemaNode::File(_) => {}
    }
}

/// Evaluate one predicate over the observed locations of its container
pub fn validate_predicate(
    predicate: &PredicateNode,
    path: &Path,
    scopes: &[PathBuf],
    registry: &NodeRegistry<'_>,
) -> ValidationReport {
    let name = predicate.info.semantical_name.as_str();
    debug!(
        predicate = name,
        predicate_type = %predicate.predicate_type,
        scopes = scopes.len(),
        "evaluating predicate"
    );

    match predicate.predicate_type.as_str() {
        PAIR_COMPARISON => pair_comparison(predicate, path, scopes, registry),
        other => {
            let mut report = ValidationReport::new();
            report.add_result(ValidationResult::pass(
                other,
                name,
                path,
                format!("Predicate type '{}' is not evaluated", other),
            ));
            report
        }
    }
}

/// Every entry of the first element needs a same-named counterpart (ignoring
/// the final extension) for each other element, under the same location.
/// An element with no matches anywhere fails the predicate outright.
fn pair_comparison(
    predicate: &PredicateNode,
    path: &Path,
    scopes: &[PathBuf],
    registry: &NodeRegistry<'_>,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let name = predicate.info.semantical_name.as_str();

    if predicate.elements.len() < 2 {
        report.add_result(ValidationResult::fail(
            "predicate_element",
            name,
            path,
            format!(
                "Predicate '{}' of type {} requires at least two elements, got {}",
                name,
                PAIR_COMPARISON,
                predicate.elements.len()
            ),
        ));
        return report;
    }

    // Every element must have matched somewhere before locations are compared.
    if let Some(missing) = predicate
        .elements
        .iter()
        .find(|e| registry.get_paths_by_name(e.as_str()).is_empty())
    {
        report.add_result(ValidationResult::fail(
            "predicate_element",
            name,
            path,
            format!("Required element '{}' not found in validated nodes", missing),
        ));
        return report;
    }

    if scopes.is_empty() {
        report.add_result(ValidationResult::pass(
            PAIR_COMPARISON,
            name,
            path,
            "Containing directory did not match, nothing to compare",
        ));
        return report;
    }

    let first = predicate.elements[0].as_str();
    let first_paths = registry.get_paths_by_name(first);

    let mut compared = 0usize;
    for scope in scopes {
        for first_path in first_paths.iter().filter(|p| is_within(p, scope)) {
            let Some(base) = base_name(first_path) else {
                continue;
            };
            compared += 1;

            for other in &predicate.elements[1..] {
                let found = registry
                    .get_paths_by_name(other)
                    .iter()
                    .any(|p| is_within(p, scope) && base_name(p) == Some(base));
                if !found {
                    report.add_result(ValidationResult::fail(
                        PAIR_COMPARISON,
                        name,
                        first_path,
                        format!(
                            "Missing '{}' counterpart for '{}'",
                            other,
                            base.to_string_lossy()
                        ),
                    ));
                }
            }
        }
    }

    if report.is_empty() {
        report.add_result(ValidationResult::pass(
            PAIR_COMPARISON,
            name,
            path,
            format!("All {} '{}' entries have counterparts", compared, first),
        ));
    }
    report
}

fn is_within(path: &Path, scope: &Path) -> bool {
    path != scope && path.starts_with(scope)
}

/// File name without its final extension
fn base_name(path: &Path) -> Option<&OsStr> {
    path.file_stem()
}
