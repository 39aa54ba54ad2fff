//! Tree Schemas
//!
//! Validates that a directory tree conforms to a declarative schema of
//! expected files, directories, and cross-entry relationships.
//!
//! ## Features
//!
//! - **Backtracking Matching**: every observed entry is tried against every
//!   declared alternative until one fits
//! - **Node Registry**: matched entries are queryable by semantic name across
//!   the whole tree
//! - **Predicates**: relationships between entries in different branches,
//!   checked after the structure matches
//! - **Extensions**: custom validators and timed actions, registered once and
//!   passed into every run
//! - **Pluggable Filesystems**: local disk, in-memory, or anything
//!   implementing [`FileSystem`]
//!
//! ## Example schema
//!
//! ```text
//! dataset/                      directory "dataset"
//! ├── 01.01.2024/               directory "timestamp"  pattern \d{2}\.\d{2}\.\d{4}
//! │   ├── 001.jpg               file "image"           extension jpg
//! │   └── 001.txt               file "label"           extension txt
//! │                             predicate pair_comparison [image, label]
//! └── summary.json              file "summary"         extension json
//! ```

pub mod actions;
pub mod config;
pub mod engine;
pub mod error;
pub mod fs;
pub mod lint;
pub mod loader;
pub mod registry;
pub mod report;
pub mod schema;
pub mod validators;

pub use actions::{ActionRegistry, ActionResult, ActionTiming, Context, ParentContext};
pub use config::TreeSchemasConfig;
pub use engine::{validate_schema, Extensions, SchemaValidator};
pub use error::{Result, SchemaError};
pub use fs::{FileSystem, LocalFileSystem, MemoryFileSystem};
pub use lint::{LintResult, SchemaLinter};
pub use loader::{load_schema, parse_schema, SchemaFormat, SchemaLoader, SchemaSource};
pub use registry::{NodeContext, NodeRegistry};
pub use report::{ValidationReport, ValidationResult, ACTION_RESULTS_KEY};
pub use schema::{DirectoryNode, FileNode, NamePattern, NodeInfo, PredicateNode, SchemaNode};
pub use validators::{NodeValidator, ValidatorRegistry};
