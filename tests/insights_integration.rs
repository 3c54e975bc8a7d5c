//! Integration tests for the insight detectors.
//!
//! Each test builds a repository in a temporary directory, runs a full
//! analysis and inspects the insights attached to the manifest.

use std::fs;
use std::path::Path;

use codeatlas::cli::should_fail;
use codeatlas::report::json_report;
use codeatlas::{
    AnalysisConfig, AnalysisManifest, AnalysisRequest, Engine, Insight, InsightCategory, ParserRegistry, Severity,
};
use tempfile::TempDir;

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}

async fn analyze_with(root: &Path, config: AnalysisConfig) -> AnalysisManifest {
    let registry = ParserRegistry::with_defaults();
    let engine = Engine::new(config, &registry);
    engine
        .analyze(AnalysisRequest::full(root))
        .await
        .expect("analysis should succeed")
}

async fn analyze(root: &Path) -> AnalysisManifest {
    analyze_with(root, AnalysisConfig::default()).await
}

fn find<'a>(manifest: &'a AnalysisManifest, id: &str) -> Option<&'a Insight> {
    manifest.insights.iter().find(|i| i.id == id)
}

/// A Python function spanning exactly `lines` lines.
fn python_function(lines: usize) -> String {
    let mut source = String::from("def big():\n");
    for _ in 1..lines {
        source.push_str("    x = 1\n");
    }
    source
}

// =============================================================================
// Complexity
// =============================================================================

#[tokio::test]
async fn test_oversized_module_threshold() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "over.py", &python_function(501));
    write(temp.path(), "limit.py", &python_function(500));

    let manifest = analyze(temp.path()).await;

    let over = find(&manifest, "oversized-module:over.py").expect("501 lines should be flagged");
    assert_eq!(over.category, InsightCategory::Complexity);
    assert_eq!(over.severity, Severity::Warning);
    assert!(over.description.contains("501 lines"));
    assert!(find(&manifest, "oversized-module:limit.py").is_none(), "Exactly 500 lines is within the limit");
}

#[tokio::test]
async fn test_thresholds_come_from_config() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "medium.py", &python_function(120));

    let config = AnalysisConfig::parse_str("insights:\n  max_lines: 100\n").unwrap();
    let manifest = analyze_with(temp.path(), config).await;
    assert!(find(&manifest, "oversized-module:medium.py").is_some());

    let manifest = analyze(temp.path()).await;
    assert!(find(&manifest, "oversized-module:medium.py").is_none());
}

#[tokio::test]
async fn test_deep_nesting() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a/b/c/d/e/f/deep.py", "def deep():\n    pass\n");
    write(temp.path(), "a/b/c/d/e/shallow.py", "def shallow():\n    pass\n");

    let manifest = analyze(temp.path()).await;
    let nesting = find(&manifest, "deep-nesting").expect("Expected deep nesting insight");
    assert_eq!(nesting.affected_files, vec!["a/b/c/d/e/f/deep.py".to_string()]);
    assert_eq!(nesting.severity, Severity::Info);
}

// =============================================================================
// Architecture
// =============================================================================

#[tokio::test]
async fn test_god_module() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "hub.ts", "export const hub = 1;\n");
    for i in 0..16 {
        write(
            temp.path(),
            &format!("m{:02}.ts", i),
            "import { hub } from \"./hub\";\nexport const v = hub;\n",
        );
    }

    let manifest = analyze(temp.path()).await;
    let god = find(&manifest, "god-module:hub.ts").expect("hub.ts has 16 dependents");
    assert_eq!(god.category, InsightCategory::Architecture);
    assert!(manifest.insights.iter().all(|i| i.id != "god-module:m00.ts"));
}

#[tokio::test]
async fn test_orphan_modules() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "main.py", "import lib\n");
    write(temp.path(), "lib.py", "def helper():\n    pass\n");
    write(temp.path(), "lonely.py", "def alone():\n    pass\n");
    write(temp.path(), "NOTES.md", "# Notes\n");

    let manifest = analyze(temp.path()).await;
    let orphan = find(&manifest, "orphan-module").expect("Expected orphan insight");
    assert_eq!(orphan.affected_files, vec!["lonely.py".to_string()]);
}

#[tokio::test]
async fn test_cycle_description() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.py", "from b import g\n\ndef f():\n    pass\n");
    write(temp.path(), "b.py", "from a import f\n\ndef g():\n    pass\n");

    let manifest = analyze(temp.path()).await;
    let cycle = find(&manifest, "circular-dependency:1").expect("Expected cycle");
    assert_eq!(cycle.description, "a.py -> b.py -> a.py");
    assert!(find(&manifest, "circular-dependency:2").is_none(), "One cycle is reported once");
}

// =============================================================================
// Documentation, Typing and Naming
// =============================================================================

#[tokio::test]
async fn test_undocumented_exports_escalate() {
    let temp = TempDir::new().unwrap();
    let few: String = (0..3).map(|i| format!("export function f{}(): void {{}}\n", i)).collect();
    write(temp.path(), "few/api.ts", &few);

    let manifest = analyze(temp.path()).await;
    let insight = find(&manifest, "undocumented-exports").expect("Expected undocumented exports");
    assert_eq!(insight.severity, Severity::Info);
    assert_eq!(insight.title, "3 undocumented exports");

    let many: String = (0..12).map(|i| format!("export function g{}(): void {{}}\n", i)).collect();
    write(temp.path(), "many/api.ts", &many);

    let manifest = analyze(temp.path()).await;
    let insight = find(&manifest, "undocumented-exports").unwrap();
    assert_eq!(insight.severity, Severity::Warning);
    assert_eq!(insight.affected_files, vec!["few/api.ts".to_string(), "many/api.ts".to_string()]);
}

#[tokio::test]
async fn test_weak_typing() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "loose.ts",
        "/** Parse. */\nexport function parse(input: any) { return input; }\n",
    );
    write(
        temp.path(),
        "strict.ts",
        "/** Parse. */\nexport function parse(input: string): number { return input.length; }\n",
    );

    let manifest = analyze(temp.path()).await;
    let weak = find(&manifest, "weak-typing:loose.ts").expect("Expected weak typing");
    assert_eq!(weak.category, InsightCategory::TypeSafety);
    assert!(find(&manifest, "weak-typing:strict.ts").is_none());
}

#[tokio::test]
async fn test_inconsistent_naming() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "users.ts",
        "export function fetchUser(): void {}\nexport function saveUser(): void {}\nexport function listUsers(): void {}\n",
    );
    write(temp.path(), "legacy.ts", "export function load_user(): void {}\n");

    let manifest = analyze(temp.path()).await;
    let naming = find(&manifest, "inconsistent-naming:typescript").expect("Expected naming insight");
    assert_eq!(naming.affected_files, vec!["legacy.ts".to_string()]);
    assert!(naming.description.starts_with("75%"));
}

// =============================================================================
// Reporting
// =============================================================================

#[tokio::test]
async fn test_fail_on_and_json_report() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.ts", "import { b } from \"./b\";\n/** A. */\nexport const a = 1;\n");
    write(temp.path(), "b.ts", "import { a } from \"./a\";\n/** B. */\nexport const b = 2;\n");

    let manifest = analyze(temp.path()).await;
    assert!(should_fail(&manifest, Some(Severity::Warning)), "The cycle is a warning");
    assert!(!should_fail(&manifest, Some(Severity::Error)));
    assert!(!should_fail(&manifest, None));

    let report = json_report(".", None, &manifest, false);
    assert!(!report.passed);
    assert_eq!(report.modules, 2);
    assert_eq!(report.edges, 2);
    assert!(report.insights.iter().any(|i| i.category == "architecture" && i.severity == "warning"));
}

#[tokio::test]
async fn test_disabled_insights() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "over.py", &python_function(600));

    let mut config = AnalysisConfig::default();
    config.insights.enabled = false;
    let manifest = analyze_with(temp.path(), config).await;
    assert!(manifest.insights.is_empty());
}
