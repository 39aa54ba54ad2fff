//! Custom validators
//!
//! Extension point run against every (node, path) pair the matcher visits.
//! Each validator is registered under a name; that name is stamped on every
//! result it produces so failures can be traced back to their source.

use std::fmt;
use std::path::Path;

use tracing::warn;

use crate::report::ValidationResult;
use crate::schema::SchemaNode;

/// A named check over one node/path pair
pub trait NodeValidator {
    fn validate(&self, node: &SchemaNode, path: &Path) -> anyhow::Result<Vec<ValidationResult>>;
}

impl<F> NodeValidator for F
where
    F: Fn(&SchemaNode, &Path) -> anyhow::Result<Vec<ValidationResult>>,
{
    fn validate(&self, node: &SchemaNode, path: &Path) -> anyhow::Result<Vec<ValidationResult>> {
        self(node, path)
    }
}

/// Registered custom validators, run in registration order
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: Vec<(String, Box<dyn NodeValidator>)>,
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.validators.iter().map(|(name, _)| name))
            .finish()
    }
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator. A second registration under the same name
    /// replaces the first.
    pub fn register(&mut self, name: impl Into<String>, validator: impl NodeValidator + 'static) {
        let name = name.into();
        let validator: Box<dyn NodeValidator> = Box::new(validator);
        match self.validators.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = validator,
            None => self.validators.push((name, validator)),
        }
    }

    /// Register a closure validator
    pub fn register_fn<F>(&mut self, name: impl Into<String>, validator: F)
    where
        F: Fn(&SchemaNode, &Path) -> anyhow::Result<Vec<ValidationResult>> + 'static,
    {
        self.register(name, validator);
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every validator. Results carry the validator's registered name;
    /// a validator error becomes a single failure under that name.
    pub fn run_validators(&self, node: &SchemaNode, path: &Path) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for (name, validator) in &self.validators {
            match validator.validate(node, path) {
                Ok(found) => results.extend(found.into_iter().map(|mut r| {
                    r.validator_name = name.clone();
                    r
                })),
                Err(e) => {
                    warn!(validator = %name, path = %path.display(), error = %e, "validator failed");
                    results.push(ValidationResult::fail(
                        name.as_str(),
                        node.semantical_name(),
                        path,
                        format!("Validator {} failed: {}", name, e),
                    ));
                }
            }
        }
        results
    }
}

/// Checks declared `permissions` against the mode bits on the local disk
///
/// Accepts octal (`755`, `0644`) or symbolic (`rwxr-xr-x`) declarations.
/// Nodes without a declaration and paths that cannot be stat'ed produce no
/// results; existence is the matcher's concern.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionsValidator;

#[cfg(unix)]
impl PermissionsValidator {
    pub const NAME: &'static str = "permissions";
}

#[cfg(unix)]
impl NodeValidator for PermissionsValidator {
    fn validate(&self, node: &SchemaNode, path: &Path) -> anyhow::Result<Vec<ValidationResult>> {
        use std::os::unix::fs::PermissionsExt;

        let Some(declared) = node.info().permissions.as_deref() else {
            return Ok(Vec::new());
        };
        let expected = parse_mode(declared)
            .ok_or_else(|| anyhow::anyhow!("invalid permission string '{}'", declared))?;
        let Ok(metadata) = std::fs::metadata(path) else {
            return Ok(Vec::new());
        };

        let actual = metadata.permissions().mode() & 0o777;
        let result = if actual == expected {
            ValidationResult::pass(
                Self::NAME,
                node.semantical_name(),
                path,
                format!("Permissions match {}", format_mode(expected)),
            )
        } else {
            ValidationResult::fail(
                Self::NAME,
                node.semantical_name(),
                path,
                format!(
                    "Permission mismatch: expected {}, got {}",
                    format_mode(expected),
                    format_mode(actual)
                ),
            )
        };
        Ok(vec![result])
    }
}

/// Parse `755`, `0o755`, `0755` or `rwxr-xr-x` into permission bits
pub fn parse_mode(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.len() == 9 && text.chars().all(|c| matches!(c, 'r' | 'w' | 'x' | '-')) {
        let mut mode = 0;
        for (i, c) in text.chars().enumerate() {
            let expected = ['r', 'w', 'x'][i % 3];
            match c {
                '-' => {}
                c if c == expected => mode |= 1 << (8 - i),
                _ => return None,
            }
        }
        return Some(mode);
    }

    let digits = text.strip_prefix("0o").unwrap_or(text);
    let mode = u32::from_str_radix(digits, 8).ok()?;
    (mode <= 0o777).then_some(mode)
}

/// Render permission bits as `rwxr-xr-x`
pub fn format_mode(mode: u32) -> String {
    (0..9)
        .map(|i| {
            if mode & (1 << (8 - i)) != 0 {
                ['r', 'w', 'x'][i % 3]
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_are_stamped_with_registered_name() {
        let mut validators = ValidatorRegistry::new();
        validators.register_fn("size_check", |node, path| {
            Ok(vec![ValidationResult::fail(
                "anything",
                node.semantical_name(),
                path,
                "too large",
            )])
        });

        let node = SchemaNode::file("data/img", "img", Some("jpg"));
        let results = validators.run_validators(&node, Path::new("data/a.jpg"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].validator_name, "size_check");
        assert!(!results[0].is_valid);
    }

    #[test]
    fn test_validator_error_becomes_failure() {
        let mut validators = ValidatorRegistry::new();
        validators.register_fn("exploding", |_, _| anyhow::bail!("unreadable header"));

        let node = SchemaNode::file("data/img", "img", None);
        let results = validators.run_validators(&node, Path::new("data/a.jpg"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].validator_name, "exploding");
        assert_eq!(results[0].node_origin, "img");
        assert!(results[0].message.contains("unreadable header"));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("755"), Some(0o755));
        assert_eq!(parse_mode("0644"), Some(0o644));
        assert_eq!(parse_mode("0o600"), Some(0o600));
        assert_eq!(parse_mode("rwxr-xr-x"), Some(0o755));
        assert_eq!(parse_mode("rw-r-----"), Some(0o640));
        assert_eq!(parse_mode("rxw------"), None);
        assert_eq!(parse_mode("1777"), None);
        assert_eq!(parse_mode("banana"), None);
    }

    #[test]
    fn test_format_mode() {
        assert_eq!(format_mode(0o755), "rwxr-xr-x");
        assert_eq!(format_mode(0o640), "rw-r-----");
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_validator_on_disk() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.jpg");
        std::fs::write(&file, "").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o640)).unwrap();

        let matching = SchemaNode::file("data/img", "img", Some("jpg")).with_permissions("rw-r-----");
        let results = PermissionsValidator.validate(&matching, &file).unwrap();
        assert!(results.iter().all(|r| r.is_valid));

        let mismatched = SchemaNode::file("data/img", "img", Some("jpg")).with_permissions("600");
        let results = PermissionsValidator.validate(&mismatched, &file).unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_valid);
        assert!(results[0].message.contains("expected rw-------, got rw-r-----"));

        let undeclared = SchemaNode::file("data/img", "img", Some("jpg"));
        assert!(PermissionsValidator.validate(&undeclared, &file).unwrap().is_empty());
    }
}
