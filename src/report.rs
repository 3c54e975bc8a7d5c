//! Output formatting for analysis results.
//!
//! Two formats:
//! - Pretty: colored terminal summary
//! - JSON: summary for programmatic consumption (the manifest itself is
//!   written separately)

use colored::*;
use serde::{Deserialize, Serialize};

use crate::insights::{Insight, Severity};
use crate::manifest::{AnalysisManifest, SkippedFile};

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
    pub project: String,
    pub passed: bool,
    pub modules: usize,
    pub symbols: usize,
    pub exports: usize,
    pub edges: usize,
    pub reused_modules: usize,
    pub duration_ms: u64,
    pub languages: Vec<LanguageEntry>,
    pub skipped: Vec<SkippedFile>,
    pub insights: Vec<JsonInsight>,
}

/// Module count per language.
#[derive(Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: String,
    pub modules: usize,
}

/// Flattened insight.
#[derive(Serialize, Deserialize)]
pub struct JsonInsight {
    pub id: String,
    pub category: String,
    pub severity: String,
    pub title: String,
    pub files: Vec<String>,
}

/// Build the JSON summary of a manifest.
pub fn json_report(path: &str, manifest_path: Option<&str>, manifest: &AnalysisManifest, passed: bool) -> JsonReport {
    let stats = &manifest.stats;
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        manifest: manifest_path.map(str::to_string),
        project: manifest.project_meta.name.clone(),
        passed,
        modules: stats.total_files,
        symbols: stats.total_symbols,
        exports: stats.total_exports,
        edges: manifest.dependency_graph.edges.len(),
        reused_modules: stats.reused_modules,
        duration_ms: stats.duration_ms,
        languages: stats
            .by_language
            .iter()
            .map(|(language, modules)| LanguageEntry {
                language: language.clone(),
                modules: *modules,
            })
            .collect(),
        skipped: stats.skipped.clone(),
        insights: manifest.insights.iter().map(insight_to_json).collect(),
    }
}

/// Write the summary in JSON format to stdout.
pub fn write_json(path: &str, manifest_path: Option<&str>, manifest: &AnalysisManifest, passed: bool) -> anyhow::Result<()> {
    let report = json_report(path, manifest_path, manifest, passed);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

fn insight_to_json(insight: &Insight) -> JsonInsight {
    JsonInsight {
        id: insight.id.clone(),
        category: insight.category.to_string(),
        severity: insight.severity.to_string(),
        title: insight.title.clone(),
        files: insight.affected_files.clone(),
    }
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Maximum affected files listed under one insight.
const MAX_LISTED_FILES: usize = 5;

/// Write a colored summary to stdout.
pub fn write_pretty(path: &str, manifest_path: Option<&str>, manifest: &AnalysisManifest, passed: bool) {
    // Header
    println!();
    print!("  ");
    print!("{}", "codeatlas".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Project:  ".dimmed());
    println!("{}", manifest.project_meta.name);
    print!("  {}", "Scanned:  ".dimmed());
    println!("{}", path);
    if let Some(out) = manifest_path {
        print!("  {}", "Manifest: ".dimmed());
        println!("{}", out);
    }
    println!();

    write_counts(manifest);
    println!();

    if !manifest.stats.by_language.is_empty() {
        write_languages(manifest);
        println!();
    }

    if !manifest.stats.skipped.is_empty() {
        write_skipped(&manifest.stats.skipped);
        println!();
    }

    if !manifest.insights.is_empty() {
        write_insights(&manifest.insights);
        println!();
    }

    write_final_status(manifest, passed);
    println!();
}

fn write_counts(manifest: &AnalysisManifest) {
    let stats = &manifest.stats;
    print!("  {} modules", stats.total_files.to_string().bold());
    print!("  {} symbols", stats.total_symbols.to_string().bold());
    print!("  {} exports", stats.total_exports.to_string().bold());
    print!(
        "  {} edges",
        manifest.dependency_graph.edges.len().to_string().bold()
    );
    if stats.reused_modules > 0 {
        print!("  {}", format!("({} reused)", stats.reused_modules).dimmed());
    }
    println!();
}

fn write_languages(manifest: &AnalysisManifest) {
    println!("  {}", "Languages:".bold());

    // Sort by module count descending
    let mut languages: Vec<(&String, &usize)> = manifest.stats.by_language.iter().collect();
    languages.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

    for (language, count) in languages {
        let plural = if *count != 1 { "s" } else { "" };
        println!("    {:<14} {:>5} module{}", language, count, plural);
    }
}

fn write_skipped(skipped: &[SkippedFile]) {
    println!("  {} ({}):", "Skipped".bold(), skipped.len());
    for s in skipped {
        println!("    {}  {}", s.path.blue(), s.reason.dimmed());
    }
}

fn write_insights(insights: &[Insight]) {
    println!("  {} ({}):", "Insights".bold(), insights.len());
    println!();

    for insight in insights {
        write_severity_tag(&insight.severity);
        print!("   ");
        print!("{:<15}", insight.category.as_str().dimmed());
        println!("{}", insight.title);

        println!("            {}", insight.description);
        for file in insight.affected_files.iter().take(MAX_LISTED_FILES) {
            println!("            {}", file.blue());
        }
        let more = insight.affected_files.len().saturating_sub(MAX_LISTED_FILES);
        if more > 0 {
            println!("            {}", format!("... and {} more", more).dimmed());
        }
        if let Some(suggestion) = &insight.suggestion {
            println!("            {} {}", "hint:".dimmed(), suggestion);
        }
        println!();
    }
}

fn write_severity_tag(severity: &Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
    }
}

fn write_final_status(manifest: &AnalysisManifest, passed: bool) {
    let count = |severity: Severity| {
        manifest
            .insights
            .iter()
            .filter(|i| i.severity == severity)
            .count()
    };
    let summary = format!(
        "{} errors, {} warnings, {} info in {}ms",
        count(Severity::Error),
        count(Severity::Warning),
        count(Severity::Info),
        manifest.stats.duration_ms
    );
    if passed {
        println!("  {}  {}", "✓ DONE".green(), summary.dimmed());
    } else {
        println!("  {}  {}", "✗ FAIL".red(), summary.dimmed());
    }
}
