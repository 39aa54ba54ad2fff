//! Validation results and reports

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::actions::ActionResult;

/// Key under which action outcomes are attached to a report's context
pub const ACTION_RESULTS_KEY: &str = "action_results";

/// Outcome of one validation check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: String,
    pub path: PathBuf,
    /// Check that produced this result, e.g. `file_extension`
    pub validator_name: String,
    /// Semantic name of the schema node being checked
    pub node_origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl ValidationResult {
    pub fn pass(
        validator_name: impl Into<String>,
        node_origin: impl Into<String>,
        path: impl AsRef<Path>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
            path: path.as_ref().to_path_buf(),
            validator_name: validator_name.into(),
            node_origin: node_origin.into(),
            context: None,
        }
    }

    pub fn fail(
        validator_name: impl Into<String>,
        node_origin: impl Into<String>,
        path: impl AsRef<Path>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            is_valid: false,
            ..Self::pass(validator_name, node_origin, path, message)
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = Some(context);
        self
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_valid { "ok" } else { "FAIL" };
        write!(
            f,
            "[{}] {} ({}) {}: {}",
            status,
            self.path.display(),
            self.node_origin,
            self.validator_name,
            self.message
        )
    }
}

/// Ordered, append-only collection of results plus a free-form context map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    results: Vec<ValidationResult>,
    #[serde(default)]
    context: Map<String, Value>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: ValidationResult) {
        self.results.push(result);
    }

    pub fn add_results(&mut self, results: impl IntoIterator<Item = ValidationResult>) {
        self.results.extend(results);
    }

    /// Append another report's results and action outcomes. Other context
    /// keys are not carried over.
    pub fn merge(&mut self, other: ValidationReport) {
        let actions = other.action_results();
        self.results.extend(other.results);
        self.record_action_results(actions);
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.context
    }

    /// True iff every contained result is valid
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|r| r.is_valid)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.is_valid)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Most specific paths first. Stable, so equal lengths keep their order.
    pub fn sort_by_longest_path(&mut self) {
        self.results
            .sort_by(|a, b| b.path.as_os_str().len().cmp(&a.path.as_os_str().len()));
    }

    /// Append action outcomes under [`ACTION_RESULTS_KEY`]
    pub fn record_action_results(&mut self, results: Vec<ActionResult>) {
        if results.is_empty() {
            return;
        }
        let entry = self
            .context
            .entry(ACTION_RESULTS_KEY)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.extend(results.iter().filter_map(|r| serde_json::to_value(r).ok()));
        }
    }

    /// Action outcomes attached to this report, in execution order
    pub fn action_results(&self) -> Vec<ActionResult> {
        self.context
            .get(ACTION_RESULTS_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// SHA-256 over the multiset of results; equal for equal outcomes
    /// regardless of result order
    pub fn fingerprint(&self) -> String {
        let mut lines: Vec<String> = self
            .results
            .iter()
            .filter_map(|r| serde_json::to_string(r).ok())
            .collect();
        lines.sort();

        let mut hasher = Sha256::new();
        for line in &lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    /// Export as JSON with a generation timestamp and summary counts
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        let failures = self.failures().count();
        let doc = serde_json::json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "valid": self.is_valid(),
            "total": self.results.len(),
            "failures": failures,
            "fingerprint": self.fingerprint(),
            "results": self.results,
            "context": self.context,
        });
        if pretty {
            serde_json::to_string_pretty(&doc)
        } else {
            serde_json::to_string(&doc)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidationReport with {} results", self.results.len())
    }
}
