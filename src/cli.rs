//! Command-line interface for codeatlas.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{self, AnalysisConfig};
use crate::engine::{AnalysisRequest, Engine};
use crate::insights::Severity;
use crate::manifest::AnalysisManifest;
use crate::parser::ParserRegistry;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Source analysis engine - map modules, symbols, docs and dependencies.
///
/// Codeatlas parses a repository into a language-agnostic manifest: every
/// module with its exported symbols and doc comments, the import graph
/// between modules, and static insights such as cycles and undocumented
/// exports.
#[derive(Parser)]
#[command(name = "codeatlas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log verbosity flags shared by every command.
#[derive(Args)]
pub struct LoggingArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl LoggingArgs {
    /// Filter directive for the log subscriber.
    pub fn level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a repository and build its manifest
    Analyze(AnalyzeArgs),
    /// Create a codeatlas config from a template
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Repository root to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover in the root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the manifest JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Previous manifest; unchanged files are reused by content hash
    #[arg(long)]
    pub previous: Option<PathBuf>,

    /// Only re-analyze these files (comma-separated, requires --previous)
    #[arg(long, value_delimiter = ',', requires = "previous")]
    pub changed: Vec<String>,

    /// Exit non-zero when an insight at or above this severity exists
    #[arg(long)]
    pub fail_on: Option<String>,

    /// Skip the insights detectors
    #[arg(long)]
    pub no_insights: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "codeatlas.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "minimal")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Config templates for `init`.
struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

static TEMPLATES: &[Template] = &[
    Template {
        name: "minimal",
        description: "Default discovery and insight thresholds",
        content: include_str!("templates/minimal.yaml"),
    },
    Template {
        name: "strict",
        description: "Tighter size, coupling and documentation thresholds",
        content: include_str!("templates/strict.yaml"),
    },
    Template {
        name: "monorepo",
        description: "JS/TS workspace with path aliases",
        content: include_str!("templates/monorepo.yaml"),
    },
];

/// Load the config named on the command line, or the one found in `root`.
fn load_config(explicit: Option<&Path>, root: &Path) -> anyhow::Result<(AnalysisConfig, Option<PathBuf>)> {
    match explicit {
        Some(path) => Ok((AnalysisConfig::parse_file(path)?, Some(path.to_path_buf()))),
        None => match AnalysisConfig::discover(root) {
            Some(path) => Ok((AnalysisConfig::parse_file(&path)?, Some(path))),
            None => Ok((AnalysisConfig::default(), None)),
        },
    }
}

/// Whether any insight reaches the `--fail-on` severity.
pub fn should_fail(manifest: &AnalysisManifest, fail_on: Option<Severity>) -> bool {
    match fail_on {
        Some(threshold) => manifest.insights.iter().any(|i| i.severity.at_least(threshold)),
        None => false,
    }
}

/// Run the analyze command.
pub async fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!("Error: invalid format {:?}, must be 'pretty' or 'json'", args.format);
        return Ok(EXIT_ERROR);
    }

    let fail_on = match args.fail_on.as_deref().map(str::parse::<Severity>).transpose() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Error: --fail-on: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    // Resolve path
    let root = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    if !root.is_dir() {
        eprintln!("Error: {} is not a directory", root.display());
        return Ok(EXIT_ERROR);
    }

    let (mut config, config_path) = match load_config(args.config.as_deref(), &root) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error parsing config: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }
    if args.no_insights {
        config.insights.enabled = false;
    }
    if let Some(path) = &config_path {
        tracing::info!(config = %path.display(), "loaded config");
    }

    let previous = match &args.previous {
        Some(path) => match AnalysisManifest::load(path) {
            Ok(m) => Some(m),
            Err(e) => {
                eprintln!("Error: cannot load previous manifest {}: {}", path.display(), e);
                return Ok(EXIT_ERROR);
            }
        },
        None => None,
    };

    let mut request = AnalysisRequest::full(root.clone());
    if let Some(previous) = &previous {
        request = request.with_previous(previous);
        if !args.changed.is_empty() {
            request.changed = Some(args.changed.clone());
        }
    }

    let registry = ParserRegistry::with_defaults();
    let engine = Engine::new(config, &registry);
    let manifest = engine.analyze(request).await?;

    if let Some(output) = &args.output {
        manifest.save(output)?;
    }

    let failed = should_fail(&manifest, fail_on);
    let path_str = args.path.to_string_lossy().to_string();
    let output_str = args.output.as_ref().map(|p| p.to_string_lossy().to_string());

    match args.format.as_str() {
        "json" => report::write_json(&path_str, output_str.as_deref(), &manifest, !failed)?,
        _ => report::write_pretty(&path_str, output_str.as_deref(), &manifest, !failed),
    }

    if failed {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // List mode
    if args.list {
        return list_templates();
    }

    // Find template
    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'codeatlas init --list' to see available templates");
            return Ok(EXIT_ERROR);
        }
    };

    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, template.content) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {} from template '{}'", args.output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: codeatlas analyze . --config {} --output manifest.json", args.output.display());

    Ok(EXIT_SUCCESS)
}

/// List available templates.
fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "minimal" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  codeatlas init --template <name>");

    Ok(EXIT_SUCCESS)
}
