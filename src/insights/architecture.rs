//! Graph-shaped findings: cycles, hubs and unconnected modules.

use std::collections::{btree_set, HashSet};

use super::{Insight, InsightCategory, InsightsConfig, Severity};
use crate::manifest::AnalysisManifest;

/// File stems that are expected to have no importers.
const ENTRY_POINT_STEMS: &[&str] = &["index", "main", "app"];

/// Find import cycles with an iterative depth-first search.
///
/// Every node is tried as a root in sorted order. Reaching a node that is on
/// the current path records the path from that node. The search stops once
/// `max_cycles` cycles have been recorded, so a cap of 0 reports none.
/// Cycles are neither deduplicated across roots nor guaranteed minimal.
pub fn detect_circular_dependencies(manifest: &AnalysisManifest, config: &InsightsConfig) -> Vec<Insight> {
    if config.max_cycles == 0 {
        return Vec::new();
    }
    let adjacency = manifest.dependency_graph.adjacency();
    let mut cycles: Vec<Vec<&str>> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();

    'roots: for &root in adjacency.keys() {
        if visited.contains(root) {
            continue;
        }
        let Some(first) = adjacency.get(root) else {
            continue;
        };

        let mut stack: Vec<(&str, btree_set::Iter<'_, &str>)> = vec![(root, first.iter())];
        let mut path: Vec<&str> = vec![root];
        let mut on_path: HashSet<&str> = HashSet::from([root]);
        visited.insert(root);

        while let Some((_, neighbours)) = stack.last_mut() {
            let Some(&next) = neighbours.next() else {
                if let Some(done) = path.pop() {
                    on_path.remove(done);
                }
                stack.pop();
                continue;
            };

            if on_path.contains(next) {
                if let Some(start) = path.iter().position(|n| *n == next) {
                    cycles.push(path[start..].to_vec());
                    if cycles.len() >= config.max_cycles {
                        break 'roots;
                    }
                }
            } else if visited.insert(next) {
                if let Some(neighbours) = adjacency.get(next) {
                    stack.push((next, neighbours.iter()));
                    path.push(next);
                    on_path.insert(next);
                }
            }
        }
    }

    cycles
        .into_iter()
        .enumerate()
        .map(|(i, cycle)| {
            let mut chain: Vec<&str> = cycle.clone();
            chain.push(cycle[0]);
            Insight {
                id: format!("circular-dependency:{}", i + 1),
                category: InsightCategory::Architecture,
                severity: Severity::Warning,
                title: format!("Circular dependency between {} modules", cycle.len()),
                description: chain.join(" -> "),
                affected_files: cycle.iter().map(|s| s.to_string()).collect(),
                suggestion: Some(
                    "Extract the shared pieces into a module both sides can import".to_string(),
                ),
            }
        })
        .collect()
}

/// Modules connected to more than `god_threshold` distinct modules.
pub fn detect_god_modules(manifest: &AnalysisManifest, config: &InsightsConfig) -> Vec<Insight> {
    let graph = &manifest.dependency_graph;
    graph
        .nodes
        .iter()
        .filter_map(|node| {
            let count = graph.neighbour_count(node);
            (count > config.god_threshold).then(|| Insight {
                id: format!("god-module:{}", node),
                category: InsightCategory::Architecture,
                severity: Severity::Warning,
                title: format!("{} is coupled to {} modules", node, count),
                description: format!(
                    "{} imports or is imported by {} distinct modules (threshold {})",
                    node, count, config.god_threshold
                ),
                affected_files: vec![node.clone()],
                suggestion: Some("Split the module along its responsibilities".to_string()),
            })
        })
        .collect()
}

/// Code modules with no incoming or outgoing edges.
///
/// Only languages whose extractor records imports are considered, and
/// entry points (`index.*`, `main.*`, `app.*`) are exempt.
pub fn detect_orphan_modules(manifest: &AnalysisManifest, _config: &InsightsConfig) -> Vec<Insight> {
    let graph = &manifest.dependency_graph;
    let orphans: Vec<String> = manifest
        .modules
        .iter()
        .filter(|m| m.language.is_structural())
        .filter(|m| !is_entry_point(&m.file_path))
        .filter(|m| !graph.is_connected(&m.file_path))
        .map(|m| m.file_path.clone())
        .collect();

    if orphans.is_empty() {
        return Vec::new();
    }

    vec![Insight {
        id: "orphan-module".to_string(),
        category: InsightCategory::Organization,
        severity: Severity::Info,
        title: format!("{} modules are not connected to any other module", orphans.len()),
        description: format!(
            "These modules neither import nor are imported by other analyzed modules: {}",
            orphans.join(", ")
        ),
        affected_files: orphans,
        suggestion: Some("Remove dead modules or wire them into the project".to_string()),
    }]
}

fn is_entry_point(path: &str) -> bool {
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = file.split('.').next().unwrap_or(file);
    ENTRY_POINT_STEMS.contains(&stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::fixtures::{manifest, module, with_imports};
    use crate::language::Language;

    fn ts(path: &str, imports: &[&str]) -> crate::model::ModuleInfo {
        with_imports(module(path, Language::TypeScript), imports)
    }

    #[test]
    fn test_two_module_cycle() {
        let m = manifest(vec![ts("a.ts", &["./b"]), ts("b.ts", &["./a"])]);
        let insights = detect_circular_dependencies(&m, &InsightsConfig::default());

        assert!(!insights.is_empty());
        assert!(insights[0].affected_files.contains(&"a.ts".to_string()));
        assert!(insights[0].affected_files.contains(&"b.ts".to_string()));
        assert_eq!(insights[0].description, "a.ts -> b.ts -> a.ts");
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let m = manifest(vec![ts("a.ts", &["./b", "./c"]), ts("b.ts", &["./c"]), ts("c.ts", &[])]);
        assert!(detect_circular_dependencies(&m, &InsightsConfig::default()).is_empty());
    }

    #[test]
    fn test_cycle_cap() {
        // A hub with many two-module cycles.
        let mut modules = vec![];
        let spokes: Vec<String> = (0..6).map(|i| format!("./s{}", i)).collect();
        let spoke_refs: Vec<&str> = spokes.iter().map(String::as_str).collect();
        modules.push(ts("hub.ts", &spoke_refs));
        for i in 0..6 {
            modules.push(ts(&format!("s{}.ts", i), &["./hub"]));
        }
        let config = InsightsConfig {
            max_cycles: 3,
            ..Default::default()
        };

        let insights = detect_circular_dependencies(&manifest(modules), &config);
        assert_eq!(insights.len(), 3);
    }

    #[test]
    fn test_zero_cycle_cap_reports_nothing() {
        let m = manifest(vec![ts("a.ts", &["./b"]), ts("b.ts", &["./a"])]);
        let config = InsightsConfig {
            max_cycles: 0,
            ..Default::default()
        };
        assert!(detect_circular_dependencies(&m, &config).is_empty());
    }

    #[test]
    fn test_god_module() {
        let mut modules = vec![];
        let deps: Vec<String> = (0..4).map(|i| format!("./d{}", i)).collect();
        let dep_refs: Vec<&str> = deps.iter().map(String::as_str).collect();
        modules.push(ts("core.ts", &dep_refs));
        for i in 0..4 {
            modules.push(ts(&format!("d{}.ts", i), &[]));
        }
        let config = InsightsConfig {
            god_threshold: 3,
            ..Default::default()
        };

        let insights = detect_god_modules(&manifest(modules), &config);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].affected_files, vec!["core.ts"]);
    }

    #[test]
    fn test_orphans_skip_entry_points_and_docs() {
        let m = manifest(vec![
            ts("src/index.ts", &[]),
            ts("src/lonely.ts", &[]),
            ts("src/a.ts", &["./b"]),
            ts("src/b.ts", &[]),
            module("README.md", Language::Markdown),
        ]);
        let insights = detect_orphan_modules(&m, &InsightsConfig::default());

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].affected_files, vec!["src/lonely.ts"]);
    }
}
