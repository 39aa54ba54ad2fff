//! Tree Schemas CLI
//!
//! Validates directory trees against schema files.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tree_schemas::config::{OutputFormat, ReportFormat};
use tree_schemas::{
    load_schema, validate_schema, Context, Extensions, LocalFileSystem, SchemaLinter, SchemaNode,
    TreeSchemasConfig, ValidationReport,
};

#[derive(Parser)]
#[command(name = "tree-schemas")]
#[command(about = "Validate directory trees against declarative schemas")]
struct Cli {
    /// Explicit config file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a directory against a schema
    Validate {
        /// Schema file (YAML or JSON)
        schema: PathBuf,
        /// Directory to validate
        target: PathBuf,
        /// Output format (overrides config)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// List passing results too
        #[arg(long)]
        all: bool,
    },

    /// Print the schema tree
    Describe {
        /// Schema file (YAML or JSON)
        schema: PathBuf,
        /// Directory the schema would be applied to
        #[arg(default_value = ".")]
        target: PathBuf,
    },

    /// Check a schema for broken predicate references and other mistakes
    Lint {
        /// Schema file (YAML or JSON)
        schema: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match TreeSchemasConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Returns whether the command succeeded
fn run(command: Commands, config: &TreeSchemasConfig) -> anyhow::Result<bool> {
    match command {
        Commands::Validate {
            schema,
            target,
            format,
            output,
            all,
        } => {
            let schema = load_schema(&schema, &target)?;

            let lint = SchemaLinter::new().lint(&schema);
            for error in &lint.errors {
                eprintln!("⚠️  {} [{}] {}", error.code, error.path, error.message);
            }

            let mut extensions = Extensions::new();
            #[cfg(unix)]
            if config.validation.check_permissions {
                use tree_schemas::validators::PermissionsValidator;
                extensions
                    .validators
                    .register(PermissionsValidator::NAME, PermissionsValidator);
            }

            let fs = LocalFileSystem::new();
            let mut report = validate_schema(
                &schema,
                &target,
                &fs,
                &extensions,
                false,
                &mut Context::new(),
            );
            if config.validation.sort_results {
                report.sort_by_longest_path();
            }

            let format = match format {
                Some(FormatArg::Text) => ReportFormat::Text,
                Some(FormatArg::Json) => ReportFormat::Json,
                None => config.report.format,
            };
            let rendered = match format {
                ReportFormat::Json => {
                    report.to_json(config.report.output_format == OutputFormat::Pretty)?
                }
                ReportFormat::Text => {
                    render_text(&report, &target, config.report.failures_only && !all)
                }
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, &rendered)?;
                    println!("✅ Report written to {:?}", path);
                }
                None => println!("{}", rendered),
            }

            Ok(report.is_valid())
        }

        Commands::Describe { schema, target } => {
            let schema = load_schema(&schema, &target)?;
            println!("🔍 Schema for {}", target.display());
            println!();
            print_tree(&schema, 0);
            Ok(true)
        }

        Commands::Lint { schema } => {
            let node = load_schema(&schema, ".")?;
            let result = SchemaLinter::new().lint(&node);

            for error in &result.errors {
                println!("❌ {} [{}] {}", error.code, error.path, error.message);
            }
            for warning in &result.warnings {
                println!("⚠️  {} [{}] {}", warning.code, warning.path, warning.message);
            }

            if result.is_clean() {
                println!(
                    "✅ {} - no errors ({} warnings)",
                    schema.display(),
                    result.warnings.len()
                );
            }
            Ok(result.is_clean())
        }
    }
}

fn render_text(report: &ValidationReport, target: &Path, failures_only: bool) -> String {
    let mut lines = Vec::new();
    for result in report.results() {
        if failures_only && result.is_valid {
            continue;
        }
        let mark = if result.is_valid { "✅" } else { "❌" };
        lines.push(format!(
            "{} {} ({}) {}: {}",
            mark,
            result.path.display(),
            result.node_origin,
            result.validator_name,
            result.message
        ));
    }

    for action in report.action_results() {
        let mark = if action.success { "✅" } else { "❌" };
        lines.push(format!("{} action {}", mark, action));
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    if report.is_valid() {
        lines.push(format!("✅ {} - validation successful", target.display()));
    } else {
        lines.push(format!(
            "❌ {} - {} failure(s)",
            target.display(),
            report.failures().count()
        ));
    }
    lines.join("\n")
}

fn print_tree(node: &SchemaNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let pattern = node
        .info()
        .pattern_validation
        .as_ref()
        .map(|p| format!(" /{}/", p))
        .unwrap_or_default();

    match node {
        SchemaNode::File(file) => {
            let extension = file
                .extension
                .as_ref()
                .map(|e| format!(" .{}", e))
                .unwrap_or_default();
            println!("{}📄 {}{}{}", indent, node.semantical_name(), extension, pattern);
        }
        SchemaNode::Directory(dir) => {
            println!("{}📁 {}/{}", indent, node.semantical_name(), pattern);
            for child in &dir.children {
                print_tree(child, depth + 1);
            }
        }
        SchemaNode::Predicate(predicate) => {
            println!(
                "{}🔗 {}: {}({})",
                indent,
                node.semantical_name(),
                predicate.predicate_type,
                predicate.elements.join(", ")
            );
        }
    }

    if let Some(description) = &node.info().description {
        println!("{}   {}", indent, description);
    }
}
