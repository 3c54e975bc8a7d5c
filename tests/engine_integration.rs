//! Integration tests for full and incremental analysis runs.
//!
//! Full runs read the `sample_repo` fixture in place; tests that modify
//! files work on a copy in a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use codeatlas::graph::workspace::WorkspaceType;
use codeatlas::{AnalysisConfig, AnalysisManifest, AnalysisRequest, Engine, Language, ParserRegistry};
use tempfile::TempDir;

fn sample_repo() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join("sample_repo")
}

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}

async fn analyze(root: &Path) -> AnalysisManifest {
    let registry = ParserRegistry::with_defaults();
    let engine = Engine::new(AnalysisConfig::default(), &registry);
    engine
        .analyze(AnalysisRequest::full(root))
        .await
        .expect("analysis should succeed")
}

// =============================================================================
// Full Analysis
// =============================================================================

#[tokio::test]
async fn test_sample_repo_modules() {
    let manifest = analyze(&sample_repo()).await;

    let paths: Vec<&str> = manifest.modules.iter().map(|m| m.file_path.as_str()).collect();
    for expected in [
        "README.md",
        "deploy/main.tf",
        "packages/app/src/index.ts",
        "packages/core/src/math.ts",
        "service/models.py",
        "service/views.py",
    ] {
        assert!(paths.contains(&expected), "Expected module {}, got {:?}", expected, paths);
    }

    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted, "Modules should be sorted by path");

    assert_eq!(manifest.version, "1.0");
    assert_eq!(manifest.stats.total_files, manifest.modules.len());
    assert_eq!(manifest.stats.by_language.get("typescript"), Some(&5));
    assert_eq!(manifest.stats.by_language.get("python"), Some(&3));
    assert!(manifest.stats.skipped.is_empty(), "Unexpected skips: {:?}", manifest.stats.skipped);
}

#[tokio::test]
async fn test_sample_repo_project_meta() {
    let manifest = analyze(&sample_repo()).await;
    let meta = &manifest.project_meta;

    assert_eq!(meta.name, "sample-monorepo");
    assert_eq!(meta.version.as_deref(), Some("0.4.0"));
    assert!(meta.languages.contains(&Language::TypeScript));
    assert!(meta.languages.contains(&Language::Python));

    let workspace = meta.workspace.as_ref().expect("Expected workspace info");
    assert_eq!(workspace.workspace_type, WorkspaceType::Npm);
    assert_eq!(workspace.packages.get("@sample/core").map(String::as_str), Some("packages/core"));
    assert_eq!(workspace.packages.get("@sample/app").map(String::as_str), Some("packages/app"));
}

#[tokio::test]
async fn test_sample_repo_dependency_graph() {
    let manifest = analyze(&sample_repo()).await;
    let graph = &manifest.dependency_graph;

    let has_edge = |from: &str, to: &str| graph.edges.iter().any(|e| e.from == from && e.to == to);

    // Workspace package import resolves to the package entry.
    assert!(has_edge("packages/app/src/index.ts", "packages/core/src/index.ts"));
    assert!(has_edge("packages/core/src/index.ts", "packages/core/src/math.ts"));
    assert!(has_edge("packages/app/src/view.ts", "packages/app/src/format.ts"));
    assert!(has_edge("packages/app/src/format.ts", "packages/app/src/view.ts"));
    assert!(has_edge("service/views.py", "service/models.py"));
    assert!(has_edge("README.md", "docs/guide.md"));

    for edge in &graph.edges {
        assert!(graph.nodes.contains(&edge.from), "Dangling edge source {}", edge.from);
        assert!(graph.nodes.contains(&edge.to), "Dangling edge target {}", edge.to);
        assert_ne!(edge.from, edge.to, "Self edge on {}", edge.from);
    }

    let add_edge = graph
        .edges
        .iter()
        .find(|e| e.from == "packages/app/src/index.ts" && e.to == "packages/core/src/index.ts")
        .unwrap();
    assert_eq!(add_edge.imports, vec!["add".to_string()]);
}

#[tokio::test]
async fn test_sample_repo_insights() {
    let manifest = analyze(&sample_repo()).await;

    let cycle = manifest
        .insights
        .iter()
        .find(|i| i.id.starts_with("circular-dependency"))
        .expect("Expected the view/format cycle");
    assert!(cycle.affected_files.contains(&"packages/app/src/view.ts".to_string()));
    assert!(cycle.affected_files.contains(&"packages/app/src/format.ts".to_string()));

    assert!(
        manifest
            .insights
            .iter()
            .any(|i| i.id == "weak-typing:packages/core/src/index.ts"),
        "Expected weak typing on scale(value: any)"
    );
}

#[tokio::test]
async fn test_manifest_save_and_load() {
    let manifest = analyze(&sample_repo()).await;
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out").join("manifest.json");

    manifest.save(&path).unwrap();
    let loaded = AnalysisManifest::load(&path).unwrap();
    assert_eq!(loaded, manifest);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(json.get("dependencyGraph").is_some());
    assert!(json.get("projectMeta").is_some());
    assert!(json["modules"][0].get("contentHash").is_some());
}

// =============================================================================
// Determinism and Hashing
// =============================================================================

#[tokio::test]
async fn test_identical_content_has_identical_hash() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a/util.py", "def util():\n    return 1\n");
    write(temp.path(), "b/util.py", "def util():\n    return 1\n");

    let manifest = analyze(temp.path()).await;
    let a = manifest.module("a/util.py").unwrap();
    let b = manifest.module("b/util.py").unwrap();
    assert_eq!(a.content_hash, b.content_hash);
    assert_eq!(a.symbols[0].id, "a/util.py:util");
    assert_eq!(b.symbols[0].id, "b/util.py:util");
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let first = analyze(&sample_repo()).await;
    let second = analyze(&sample_repo()).await;

    assert_eq!(first.dependency_graph, second.dependency_graph);
    assert_eq!(first.insights, second.insights);
    let hashes = |m: &AnalysisManifest| m.modules.iter().map(|m| m.content_hash.clone()).collect::<Vec<_>>();
    assert_eq!(hashes(&first), hashes(&second));
}

// =============================================================================
// Incremental Analysis
// =============================================================================

#[tokio::test]
async fn test_incremental_touches_only_targets() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.ts", "export function a(): number { return 1; }\n");
    write(temp.path(), "b.ts", "import { a } from \"./a\";\nexport function b(): number { return a(); }\n");
    write(temp.path(), "c.ts", "export function c(): number { return 3; }\n");

    let registry = ParserRegistry::with_defaults();
    let engine = Engine::new(AnalysisConfig::default(), &registry);
    let previous = engine.analyze(AnalysisRequest::full(temp.path())).await.unwrap();

    write(temp.path(), "a.ts", "export function a2(): number { return 2; }\n");
    // c.ts changes on disk but is not a target, so its old module stays.
    write(temp.path(), "c.ts", "export function c2(): number { return 3; }\n");

    let next = engine
        .analyze(AnalysisRequest::incremental(temp.path(), &previous, vec!["a.ts".to_string()]))
        .await
        .unwrap();

    assert_eq!(next.modules.len(), 3);
    assert_eq!(next.module("a.ts").unwrap().symbols[0].name, "a2");
    assert_ne!(next.module("a.ts").unwrap().content_hash, previous.module("a.ts").unwrap().content_hash);
    assert_eq!(next.module("b.ts"), previous.module("b.ts"));
    assert_eq!(next.module("c.ts"), previous.module("c.ts"));

    // The graph is rebuilt from the merged module list.
    assert!(next.dependency_graph.edges.iter().any(|e| e.from == "b.ts" && e.to == "a.ts"));
}

#[tokio::test]
async fn test_incremental_drops_deleted_targets() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "keep.py", "def keep():\n    pass\n");
    write(temp.path(), "gone.py", "def gone():\n    pass\n");

    let registry = ParserRegistry::with_defaults();
    let engine = Engine::new(AnalysisConfig::default(), &registry);
    let previous = engine.analyze(AnalysisRequest::full(temp.path())).await.unwrap();

    fs::remove_file(temp.path().join("gone.py")).unwrap();
    let next = engine
        .analyze(AnalysisRequest::incremental(temp.path(), &previous, vec!["gone.py".to_string()]))
        .await
        .unwrap();

    let paths: Vec<&str> = next.modules.iter().map(|m| m.file_path.as_str()).collect();
    assert_eq!(paths, vec!["keep.py"]);
    assert_eq!(next.stats.skipped_files, 0);
    assert!(!next.dependency_graph.nodes.contains(&"gone.py".to_string()));
}

#[tokio::test]
async fn test_incremental_adds_new_files() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "one.go", "package main\n\nfunc One() int { return 1 }\n");

    let registry = ParserRegistry::with_defaults();
    let engine = Engine::new(AnalysisConfig::default(), &registry);
    let previous = engine.analyze(AnalysisRequest::full(temp.path())).await.unwrap();

    write(temp.path(), "two.go", "package main\n\nfunc Two() int { return 2 }\n");
    let next = engine
        .analyze(AnalysisRequest::incremental(temp.path(), &previous, vec!["./two.go".to_string()]))
        .await
        .unwrap();

    let paths: Vec<&str> = next.modules.iter().map(|m| m.file_path.as_str()).collect();
    assert_eq!(paths, vec!["one.go", "two.go"]);
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn test_config_filters_and_disables_insights() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/app.py", "def run():\n    pass\n");
    write(temp.path(), "scripts/tool.py", "def tool():\n    pass\n");
    write(temp.path(), "src/notes.md", "# Notes\n");

    let config = AnalysisConfig::parse_str(
        "include:\n  - \"src/**\"\nextensions:\n  - py\ninsights:\n  enabled: false\n",
    )
    .unwrap();
    codeatlas::config::validate(&config).unwrap();

    let registry = ParserRegistry::with_defaults();
    let engine = Engine::new(config, &registry);
    let manifest = engine.analyze(AnalysisRequest::full(temp.path())).await.unwrap();

    let paths: Vec<&str> = manifest.modules.iter().map(|m| m.file_path.as_str()).collect();
    assert_eq!(paths, vec!["src/app.py"]);
    assert!(manifest.insights.is_empty());
}
