//! Validation Engine
//!
//! Matches a schema tree against an observed filesystem tree.
//!
//! ## Passes
//!
//! 1. **Structure**: depth-first walk of the schema. At every directory each
//!    observed child is tried against every declared child in declaration
//!    order; the first candidate whose whole subtree validates wins. Nodes
//!    that pass are recorded in a [`NodeRegistry`].
//! 2. **Predicates**: only if the structure is valid. Relationships between
//!    registered nodes are checked, see [`predicates`].
//! 3. **Actions**: only if both passes are valid and actions were requested.
//!
//! Matching is greedy first-match, not a globally optimal assignment.
//! Registry entries made while trying a candidate that loses are rolled back,
//! so later passes only see nodes from winning branches.

pub mod predicates;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::actions::{ActionRegistry, Context, ParentContext};
use crate::fs::FileSystem;
use crate::registry::NodeRegistry;
use crate::report::{ValidationReport, ValidationResult};
use crate::schema::{DirectoryNode, FileNode, SchemaNode};
use crate::validators::ValidatorRegistry;

pub use predicates::evaluate_predicates;

/// Caller-supplied extension points, built once and reused across runs
#[derive(Debug, Default)]
pub struct Extensions {
    pub validators: ValidatorRegistry,
    pub actions: ActionRegistry,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Validates schema trees against one filesystem
pub struct SchemaValidator<'a> {
    fs: &'a dyn FileSystem,
    extensions: &'a Extensions,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(fs: &'a dyn FileSystem, extensions: &'a Extensions) -> Self {
        Self { fs, extensions }
    }

    /// Validate `target` against `schema`: structure, then predicates, then
    /// after-validation actions.
    pub fn validate_schema(
        &self,
        schema: &SchemaNode,
        target: &Path,
        execute_actions: bool,
        context: &mut Context,
    ) -> ValidationReport {
        self.validate_schema_with_registry(schema, target, execute_actions, context)
            .0
    }

    /// Like [`validate_schema`](Self::validate_schema), also returning the
    /// registry of matched nodes for post-hoc inspection.
    pub fn validate_schema_with_registry<'s>(
        &self,
        schema: &'s SchemaNode,
        target: &Path,
        execute_actions: bool,
        context: &mut Context,
    ) -> (ValidationReport, NodeRegistry<'s>) {
        info!(
            schema = schema.semantical_name(),
            target = %target.display(),
            "validating schema"
        );
        let mut registry = NodeRegistry::new();
        let mut parents = Vec::new();

        let mut report = self.validate_structure(
            schema,
            target,
            &mut registry,
            execute_actions,
            &mut parents,
            context,
        );
        if !report.is_valid() {
            info!(
                failures = report.failures().count(),
                "structural validation failed, skipping predicates"
            );
            return (report, registry);
        }

        debug!(registered = registry.len(), "evaluating predicates");
        let predicate_report = evaluate_predicates(schema, target, &registry);
        let predicates_valid = predicate_report.is_valid();
        report.merge(predicate_report);
        if !predicates_valid {
            info!(
                failures = report.failures().count(),
                "predicate validation failed, skipping actions"
            );
            return (report, registry);
        }

        if execute_actions {
            let results = self
                .extensions
                .actions
                .execute_after_validation(&registry, context);
            report.record_action_results(results);
        }

        info!(results = report.len(), "validation passed");
        (report, registry)
    }

    /// Recursively match `path` against `schema`, registering nodes that pass.
    pub fn validate_structure<'s>(
        &self,
        schema: &'s SchemaNode,
        path: &Path,
        registry: &mut NodeRegistry<'s>,
        execute_actions: bool,
        parents: &mut Vec<ParentContext<'s>>,
        context: &mut Context,
    ) -> ValidationReport {
        debug!(
            node = schema.semantical_name(),
            path = %path.display(),
            "validating structure"
        );

        let mut report = self.validate_node(schema, path);
        report.add_results(self.extensions.validators.run_validators(schema, path));
        if !report.is_valid() {
            return report;
        }

        let parent_paths = parents.iter().map(|p| p.path.clone()).collect();
        registry.register_node(schema, path, parent_paths);

        if execute_actions {
            if let Some(result) =
                self.extensions
                    .actions
                    .run_during_validation(schema, path, parents, context)
            {
                report.record_action_results(vec![result]);
            }
        }

        let SchemaNode::Directory(dir) = schema else {
            return report;
        };
        if !self.fs.is_dir(path) {
            return report;
        }

        let children = match self.fs.list_children(path) {
            Ok(mut children) => {
                children.sort();
                children
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot list directory");
                report.add_result(ValidationResult::fail(
                    "directory_exists",
                    schema.semantical_name(),
                    path,
                    format!("Cannot list directory {}: {}", path.display(), e),
                ));
                Vec::new()
            }
        };

        parents.push(ParentContext {
            node: schema,
            path: path.to_path_buf(),
        });
        for child_path in &children {
            let child_report =
                self.match_child(dir, child_path, registry, execute_actions, parents, context);
            report.merge(child_report);
        }
        parents.pop();

        registry.register_processed_dir(path);
        report
    }

    /// Try every declared child against one observed path. The first success
    /// wins; if none succeeds, every attempt's results are kept.
    fn match_child<'s>(
        &self,
        dir: &'s DirectoryNode,
        child_path: &Path,
        registry: &mut NodeRegistry<'s>,
        execute_actions: bool,
        parents: &mut Vec<ParentContext<'s>>,
        context: &mut Context,
    ) -> ValidationReport {
        let mut attempts: Vec<ValidationReport> = Vec::new();

        for candidate in dir.children.iter().filter(|c| !c.is_predicate()) {
            let checkpoint = registry.checkpoint();
            let attempt = self.validate_structure(
                candidate,
                child_path,
                registry,
                execute_actions,
                parents,
                context,
            );

            if attempt.is_valid() {
                debug!(
                    node = candidate.semantical_name(),
                    path = %child_path.display(),
                    "candidate matched"
                );
                let mut report = ValidationReport::new();
                for lost in attempts {
                    report.record_action_results(lost.action_results());
                }
                report.merge(attempt);
                return report;
            }

            registry.rollback(checkpoint);
            attempts.push(attempt);
        }

        debug!(
            path = %child_path.display(),
            candidates = attempts.len(),
            "no candidate matched"
        );
        let mut report = ValidationReport::new();
        for attempt in attempts {
            report.merge(attempt);
        }
        report
    }

    /// Check one node against one path, without recursing.
    pub fn validate_node(&self, node: &SchemaNode, path: &Path) -> ValidationReport {
        match node {
            SchemaNode::File(file) => self.validate_file(file, path),
            SchemaNode::Directory(dir) => self.validate_directory(dir, path),
            // Predicates never match a filesystem entry.
            SchemaNode::Predicate(_) => ValidationReport::new(),
        }
    }

    fn validate_file(&self, node: &FileNode, path: &Path) -> ValidationReport {
        let mut report = ValidationReport::new();
        let origin = node.info.semantical_name.as_str();

        if !self.fs.is_file(path) {
            report.add_result(ValidationResult::fail(
                "file_exists",
                origin,
                path,
                format!("Path does not exist or is not a file: {}", path.display()),
            ));
            return report;
        }

        let name = entry_name(path);

        if let Some(extension) = &node.extension {
            if !has_extension(&name, extension) {
                report.add_result(ValidationResult::fail(
                    "file_extension",
                    origin,
                    path,
                    format!(
                        "File extension mismatch: expected {}, got {}",
                        extension,
                        observed_extension(&name)
                    ),
                ));
            }
        }

        if let Some(pattern) = &node.info.pattern_validation {
            let stem = file_stem(&name, node.extension.as_deref());
            if !pattern.is_full_match(stem) {
                report.add_result(ValidationResult::fail(
                    "file_pattern",
                    origin,
                    path,
                    format!("Filename does not match pattern: {}", pattern),
                ));
            }
        }

        report
    }

    fn validate_directory(&self, node: &DirectoryNode, path: &Path) -> ValidationReport {
        let mut report = ValidationReport::new();
        let origin = node.info.semantical_name.as_str();

        if !self.fs.is_dir(path) {
            report.add_result(ValidationResult::fail(
                "directory_exists",
                origin,
                path,
                format!("Path does not exist or is not a directory: {}", path.display()),
            ));
            return report;
        }

        if let Some(pattern) = &node.info.pattern_validation {
            if !pattern.is_full_match(&entry_name(path)) {
                report.add_result(ValidationResult::fail(
                    "directory_pattern",
                    origin,
                    path,
                    format!("Directory name does not match pattern: {}", pattern),
                ));
            }
        }

        report
    }
}

/// Validate `target` against `schema` on `fs` in one call.
pub fn validate_schema(
    schema: &SchemaNode,
    target: impl Into<PathBuf>,
    fs: &dyn FileSystem,
    extensions: &Extensions,
    execute_actions: bool,
    context: &mut Context,
) -> ValidationReport {
    let target = target.into();
    SchemaValidator::new(fs, extensions).validate_schema(schema, &target, execute_actions, context)
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn has_extension(name: &str, extension: &str) -> bool {
    name.len() > extension.len() + 1
        && name.ends_with(extension)
        && name[..name.len() - extension.len()].ends_with('.')
}

fn observed_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "(none)",
    }
}

/// Name with the declared extension removed, or the final extension when
/// the declared one does not apply
fn file_stem<'n>(name: &'n str, extension: Option<&str>) -> &'n str {
    if let Some(ext) = extension {
        if has_extension(name, ext) {
            return &name[..name.len() - ext.len() - 1];
        }
    }
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionTiming;
    use crate::fs::MemoryFileSystem;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn validate(schema: &SchemaNode, target: &str, fs: &MemoryFileSystem) -> ValidationReport {
        let extensions = Extensions::new();
        validate_schema(schema, target, fs, &extensions, false, &mut Context::new())
    }

    fn validator_names(report: &ValidationReport) -> Vec<&str> {
        report
            .failures()
            .map(|r| r.validator_name.as_str())
            .collect()
    }

    fn dataset(children: Vec<SchemaNode>) -> SchemaNode {
        SchemaNode::directory("data", "dataset", children)
    }

    #[test]
    fn test_extension_helpers() {
        assert!(has_extension("a.jpg", "jpg"));
        assert!(has_extension("a.tar.gz", "tar.gz"));
        assert!(!has_extension("a.json", "jpg"));
        assert!(!has_extension("ajpg", "jpg"));
        assert!(!has_extension(".jpg", "jpg"));
        assert_eq!(observed_extension("a.json"), "json");
        assert_eq!(observed_extension("README"), "(none)");
        assert_eq!(file_stem("a.tar.gz", Some("tar.gz")), "a");
        assert_eq!(file_stem("a.tar.gz", None), "a.tar");
        assert_eq!(file_stem("README", None), "README");
    }

    #[test]
    fn test_end_to_end_valid() {
        let schema = dataset(vec![SchemaNode::file("data/item", "item", Some("jpg"))]);
        let fs = MemoryFileSystem::with_files(["data/a.jpg"]);
        assert!(validate(&schema, "data", &fs).is_valid());
    }

    #[test]
    fn test_extension_mismatch_names_both() {
        let schema = dataset(vec![SchemaNode::file("data/item", "item", Some("jpg"))]);
        let fs = MemoryFileSystem::with_files(["data/a.json"]);
        let report = validate(&schema, "data", &fs);
        assert!(!report.is_valid());

        let failure = report
            .failures()
            .find(|r| r.validator_name == "file_extension")
            .unwrap();
        assert_eq!(failure.message, "File extension mismatch: expected jpg, got json");
        assert_eq!(failure.path, PathBuf::from("data/a.json"));
        assert_eq!(failure.node_origin, "item");
    }

    #[test]
    fn test_extension_and_pattern_both_reported() {
        let schema = dataset(vec![SchemaNode::file("data/item", "item", Some("jpg"))
            .with_pattern(r"\d+")
            .unwrap()]);
        let fs = MemoryFileSystem::with_files(["data/abc.png"]);
        let report = validate(&schema, "data", &fs);
        assert_eq!(validator_names(&report), vec!["file_extension", "file_pattern"]);
    }

    #[test]
    fn test_pattern_matches_stem() {
        let schema = dataset(vec![SchemaNode::file("data/item", "item", Some("jpg"))
            .with_pattern(r"\d+")
            .unwrap()]);
        let fs = MemoryFileSystem::with_files(["data/001.jpg"]);
        assert!(validate(&schema, "data", &fs).is_valid());

        let fs = MemoryFileSystem::with_files(["data/img_001.jpg"]);
        let report = validate(&schema, "data", &fs);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.validator_name, "file_pattern");
        assert_eq!(failure.message, r"Filename does not match pattern: \d+");
    }

    #[test]
    fn test_missing_file_is_fatal_for_file_checks() {
        let node = SchemaNode::file("data/item", "item", Some("jpg"))
            .with_pattern(r"\d+")
            .unwrap();
        let fs = MemoryFileSystem::with_files(["data/other.jpg"]);
        let extensions = Extensions::new();
        let validator = SchemaValidator::new(&fs, &extensions);
        let report = validator.validate_node(&node, Path::new("data/missing.png"));
        assert_eq!(validator_names(&report), vec!["file_exists"]);
    }

    #[test]
    fn test_missing_root_directory() {
        let schema = dataset(vec![]);
        let fs = MemoryFileSystem::new();
        let report = validate(&schema, "data", &fs);
        assert_eq!(validator_names(&report), vec!["directory_exists"]);
    }

    #[test]
    fn test_directory_pattern() {
        let schema = dataset(vec![SchemaNode::directory("data/split", "split", vec![])
            .with_pattern("train|val")
            .unwrap()]);
        let fs = MemoryFileSystem::with_files(["data/train/a.jpg", "data/test/b.jpg"]);
        let report = validate(&schema, "data", &fs);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].validator_name, "directory_pattern");
        assert_eq!(failures[0].path, PathBuf::from("data/test"));
    }

    #[test]
    fn test_empty_directory_schema_is_open() {
        let schema = dataset(vec![]);
        let fs = MemoryFileSystem::with_files(["data/a.jpg", "data/sub/b.txt"]);
        assert!(validate(&schema, "data", &fs).is_valid());

        let mut fs = MemoryFileSystem::new();
        fs.add_dir("data");
        assert!(validate(&schema, "data", &fs).is_valid());
    }

    #[test]
    fn test_backtracking_selects_directory_alternative() {
        let schema = dataset(vec![
            SchemaNode::file("data/a", "a", Some("txt")),
            SchemaNode::directory("data/b", "b", vec![]),
        ]);
        let mut fs = MemoryFileSystem::new();
        fs.add_dir("data/sub");

        let report = validate(&schema, "data", &fs);
        assert!(report.is_valid());
        assert!(report.results().iter().all(|r| r.validator_name != "file_extension"));
    }

    #[test]
    fn test_no_candidate_keeps_every_near_miss() {
        let schema = dataset(vec![
            SchemaNode::file("data/image", "image", Some("jpg")),
            SchemaNode::file("data/summary", "summary", Some("json")),
        ]);
        let fs = MemoryFileSystem::with_files(["data/notes.txt"]);
        let report = validate(&schema, "data", &fs);

        let origins: Vec<_> = report.failures().map(|r| r.node_origin.as_str()).collect();
        assert_eq!(origins, vec!["image", "summary"]);
    }

    #[test]
    fn test_many_entries_match_same_shape() {
        let schema = dataset(vec![SchemaNode::directory(
            "data/timestamp",
            "timestamp",
            vec![SchemaNode::file("data/timestamp/img", "img", Some("jpg"))],
        )
        .with_pattern(r"\d{2}\.\d{2}\.\d{4}")
        .unwrap()]);
        let fs = MemoryFileSystem::with_files([
            "data/01.01.2024/a.jpg",
            "data/02.01.2024/b.jpg",
            "data/03.01.2024/c.jpg",
        ]);
        let extensions = Extensions::new();
        let (report, registry) = SchemaValidator::new(&fs, &extensions)
            .validate_schema_with_registry(&schema, Path::new("data"), false, &mut Context::new());
        assert!(report.is_valid());
        assert_eq!(registry.get_paths_by_name("timestamp").len(), 3);
        assert_eq!(registry.get_paths_by_name("img").len(), 3);
        assert!(registry.is_dir_processed(Path::new("data/02.01.2024")));
    }

    #[test]
    fn test_losing_candidate_is_rolled_back() {
        // Both alternatives accept the directory itself; only the second
        // accepts its contents.
        let schema = dataset(vec![
            SchemaNode::directory(
                "data/images",
                "images",
                vec![SchemaNode::file("data/images/img", "img", Some("jpg"))],
            ),
            SchemaNode::directory(
                "data/labels",
                "labels",
                vec![SchemaNode::file("data/labels/label", "label", Some("txt"))],
            ),
        ]);
        let fs = MemoryFileSystem::with_files(["data/x/a.txt"]);
        let extensions = Extensions::new();
        let (report, registry) = SchemaValidator::new(&fs, &extensions)
            .validate_schema_with_registry(&schema, Path::new("data"), false, &mut Context::new());

        assert!(report.is_valid());
        assert!(registry.get_paths_by_name("images").is_empty());
        assert_eq!(registry.get_paths_by_name("labels"), vec![Path::new("data/x")]);
        assert_eq!(
            registry
                .get_context_by_path(Path::new("data/x"))
                .map(|c| c.node.semantical_name()),
            Some("labels")
        );
        assert_eq!(
            registry
                .get_context_by_path(Path::new("data/x/a.txt"))
                .map(|c| c.parent_paths.clone()),
            Some(vec![PathBuf::from("data"), PathBuf::from("data/x")])
        );
    }

    #[test]
    fn test_custom_validator_blocks_subtree() {
        let schema = dataset(vec![SchemaNode::file("data/item", "item", Some("jpg"))]);
        let fs = MemoryFileSystem::with_files(["data/a.jpg"]);
        let mut extensions = Extensions::new();
        extensions.validators.register_fn("no_a", |node, path| {
            let bad = path.file_name().map(|n| n == "a.jpg").unwrap_or(false);
            Ok(if bad {
                vec![ValidationResult::fail("", node.semantical_name(), path, "a is banned")]
            } else {
                Vec::new()
            })
        });

        let report = validate_schema(&schema, "data", &fs, &extensions, false, &mut Context::new());
        assert_eq!(validator_names(&report), vec!["no_a"]);
    }

    #[test]
    fn test_listing_error_degrades_to_failure() {
        struct BrokenListing;
        impl FileSystem for BrokenListing {
            fn exists(&self, _: &Path) -> bool {
                true
            }
            fn is_file(&self, _: &Path) -> bool {
                false
            }
            fn is_dir(&self, _: &Path) -> bool {
                true
            }
            fn list_children(&self, _: &Path) -> std::io::Result<Vec<PathBuf>> {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
            }
        }

        let schema = dataset(vec![]);
        let extensions = Extensions::new();
        let report = validate_schema(
            &schema,
            "data",
            &BrokenListing,
            &extensions,
            false,
            &mut Context::new(),
        );
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.validator_name, "directory_exists");
        assert!(failure.message.contains("denied"));
    }

    #[test]
    fn test_during_actions_fire_with_parent_stack() {
        let schema = dataset(vec![SchemaNode::directory(
            "data/ts",
            "timestamp",
            vec![SchemaNode::file("data/ts/img", "img", Some("jpg"))],
        )]);
        let fs = MemoryFileSystem::with_files(["data/d1/a.jpg"]);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut extensions = Extensions::new();
        extensions.actions.register(
            "img",
            ActionTiming::DuringValidation,
            move |_, path, parents, _| {
                let names: Vec<String> = parents
                    .iter()
                    .map(|p| p.node.semantical_name().to_string())
                    .collect();
                sink.borrow_mut().push((path.to_path_buf(), names));
                Ok(())
            },
        );

        let report = validate_schema(&schema, "data", &fs, &extensions, true, &mut Context::new());
        assert!(report.is_valid());
        assert_eq!(
            seen.borrow().as_slice(),
            &[(
                PathBuf::from("data/d1/a.jpg"),
                vec!["dataset".to_string(), "timestamp".to_string()]
            )]
        );
        assert_eq!(report.action_results().len(), 1);
    }

    #[test]
    fn test_actions_not_run_when_not_requested() {
        let schema = dataset(vec![SchemaNode::file("data/item", "item", Some("jpg"))]);
        let fs = MemoryFileSystem::with_files(["data/a.jpg"]);
        let mut extensions = Extensions::new();
        extensions
            .actions
            .register("item", ActionTiming::DuringValidation, |_, _, _, _| {
                anyhow::bail!("should not run")
            });
        let report = validate_schema(&schema, "data", &fs, &extensions, false, &mut Context::new());
        assert!(report.action_results().is_empty());
    }

    #[test]
    fn test_failing_action_does_not_invalidate() {
        let schema = dataset(vec![SchemaNode::file("data/item", "item", Some("jpg"))]);
        let fs = MemoryFileSystem::with_files(["data/a.jpg"]);
        let mut extensions = Extensions::new();
        extensions
            .actions
            .register("item", ActionTiming::DuringValidation, |_, _, _, _| {
                anyhow::bail!("thumbnail failed")
            });
        let report = validate_schema(&schema, "data", &fs, &extensions, true, &mut Context::new());
        assert!(report.is_valid());
        let actions = report.action_results();
        assert_eq!(actions.len(), 1);
        assert!(!actions[0].success);
    }

    #[test]
    fn test_after_actions_once_per_location() {
        let schema = dataset(vec![SchemaNode::file("data/item", "item", Some("jpg"))]);
        let fs = MemoryFileSystem::with_files(["data/a.jpg", "data/b.jpg"]);
        let mut extensions = Extensions::new();
        extensions
            .actions
            .register("item", ActionTiming::AfterValidation, |_, _, _, _| Ok(()));

        let report = validate_schema(&schema, "data", &fs, &extensions, true, &mut Context::new());
        let actions = report.action_results();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].path, PathBuf::from("data/a.jpg"));
        assert_eq!(actions[1].path, PathBuf::from("data/b.jpg"));
    }

    #[test]
    fn test_after_actions_skipped_on_structural_failure() {
        let schema = dataset(vec![SchemaNode::file("data/item", "item", Some("jpg"))]);
        let fs = MemoryFileSystem::with_files(["data/a.jpg", "data/b.png"]);
        let mut extensions = Extensions::new();
        extensions
            .actions
            .register("item", ActionTiming::AfterValidation, |_, _, _, _| Ok(()));

        let report = validate_schema(&schema, "data", &fs, &extensions, true, &mut Context::new());
        assert!(!report.is_valid());
        assert!(report.action_results().is_empty());
    }

    #[test]
    fn test_deterministic() {
        let schema = dataset(vec![
            SchemaNode::file("data/image", "image", Some("jpg")),
            SchemaNode::directory("data/nested", "nested", vec![]),
        ]);
        let fs = MemoryFileSystem::with_files(["data/a.jpg", "data/b.png", "data/c/d.txt"]);
        let first = validate(&schema, "data", &fs);
        let second = validate(&schema, "data", &fs);
        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_result_independent_of_listing_order() {
        struct ReversedListing(MemoryFileSystem);
        impl FileSystem for ReversedListing {
            fn exists(&self, path: &Path) -> bool {
                self.0.exists(path)
            }
            fn is_file(&self, path: &Path) -> bool {
                self.0.is_file(path)
            }
            fn is_dir(&self, path: &Path) -> bool {
                self.0.is_dir(path)
            }
            fn list_children(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
                let mut children = self.0.list_children(path)?;
                children.reverse();
                Ok(children)
            }
        }

        let schema = dataset(vec![
            SchemaNode::file("data/image", "image", Some("jpg")),
            SchemaNode::directory(
                "data/nested",
                "nested",
                vec![SchemaNode::file("data/nested/note", "note", Some("txt"))],
            ),
        ]);
        let files = [
            "data/a.jpg",
            "data/b.jpg",
            "data/c.png",
            "data/d/x.txt",
            "data/d/y.md",
            "data/e/z.txt",
        ];
        let sorted = MemoryFileSystem::with_files(files);
        let reversed = ReversedListing(MemoryFileSystem::with_files(files));
        assert_eq!(
            reversed.list_children(Path::new("data")).unwrap()[0],
            PathBuf::from("data/e")
        );

        let extensions = Extensions::new();
        let forward =
            validate_schema(&schema, "data", &sorted, &extensions, false, &mut Context::new());
        let backward =
            validate_schema(&schema, "data", &reversed, &extensions, false, &mut Context::new());
        assert!(!forward.is_valid());
        assert_eq!(forward, backward);
        assert_eq!(forward.fingerprint(), backward.fingerprint());
    }

    #[test]
    fn test_panicking_action_does_not_abort_run() {
        let schema = dataset(vec![SchemaNode::file("data/item", "item", Some("jpg"))]);
        let fs = MemoryFileSystem::with_files(["data/a.jpg", "data/b.jpg"]);
        let mut extensions = Extensions::new();
        extensions
            .actions
            .register("item", ActionTiming::DuringValidation, |_, path, _, _| {
                if path.ends_with("a.jpg") {
                    panic!("boom");
                }
                Ok(())
            });

        let (report, registry) = SchemaValidator::new(&fs, &extensions)
            .validate_schema_with_registry(&schema, Path::new("data"), true, &mut Context::new());
        assert!(report.is_valid());
        assert_eq!(registry.get_paths_by_name("item").len(), 2);
        let actions = report.action_results();
        assert_eq!(actions.len(), 2);
        assert!(!actions[0].success);
        assert!(actions[1].success);
    }
}
