//! Module dependency graph.
//!
//! Nodes are module paths; an edge means the `from` module imports something
//! that resolves to the `to` module. External imports never produce edges.

pub mod resolve;
pub mod workspace;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::ModuleInfo;
pub use resolve::Resolver;
pub use workspace::{resolve_workspace, WorkspaceInfo, WorkspaceType};

/// One resolved import between two modules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Imported binding names.
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub is_type_only: bool,
}

/// Import graph over all analyzed modules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// Every module path, sorted.
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
}

impl DependencyGraph {
    /// Distinct outgoing neighbours per node. Multi-edges collapse to one.
    pub fn adjacency(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut adjacency: BTreeMap<&str, BTreeSet<&str>> =
            self.nodes.iter().map(|n| (n.as_str(), BTreeSet::new())).collect();
        for edge in &self.edges {
            adjacency
                .entry(edge.from.as_str())
                .or_default()
                .insert(edge.to.as_str());
        }
        adjacency
    }

    /// Number of distinct modules connected to `node` in either direction.
    pub fn neighbour_count(&self, node: &str) -> usize {
        self.edges
            .iter()
            .filter_map(|e| {
                if e.from == node {
                    Some(e.to.as_str())
                } else if e.to == node {
                    Some(e.from.as_str())
                } else {
                    None
                }
            })
            .collect::<HashSet<_>>()
            .len()
    }

    /// Whether any edge touches `node`.
    pub fn is_connected(&self, node: &str) -> bool {
        self.edges.iter().any(|e| e.from == node || e.to == node)
    }

    /// Modules that import `node`, sorted and distinct.
    pub fn dependents(&self, node: &str) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .edges
            .iter()
            .filter(|e| e.to == node)
            .map(|e| e.from.as_str())
            .collect();
        set.into_iter().collect()
    }
}

/// Build the dependency graph for a set of modules.
///
/// `aliases` maps import prefixes to root-relative targets (`"@/" -> "src/"`).
pub fn build_dependency_graph(
    modules: &[ModuleInfo],
    workspace: Option<&WorkspaceInfo>,
    aliases: &BTreeMap<String, String>,
) -> DependencyGraph {
    let node_set: BTreeSet<String> = modules.iter().map(|m| m.file_path.clone()).collect();
    let resolver = Resolver::new(&node_set, workspace, aliases);

    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for module in modules {
        for import in &module.imports {
            let names = import.names();
            let Some(target) = resolver.resolve(&module.file_path, module.language, &import.source, &names) else {
                continue;
            };
            if target == module.file_path {
                continue;
            }
            if !seen.insert((module.file_path.clone(), target.clone(), names.clone())) {
                continue;
            }
            edges.push(Edge {
                from: module.file_path.clone(),
                to: target,
                imports: names,
                is_type_only: import.is_type_only,
            });
        }
    }

    debug!(nodes = node_set.len(), edges = edges.len(), "dependency graph built");

    DependencyGraph {
        nodes: node_set.into_iter().collect(),
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::model::{Import, ImportSpecifier};
    use chrono::Utc;

    fn module(path: &str, language: Language, imports: &[&str]) -> ModuleInfo {
        ModuleInfo {
            file_path: path.to_string(),
            language,
            symbols: Vec::new(),
            imports: imports
                .iter()
                .map(|s| {
                    let mut import = Import::new(*s);
                    import.specifiers.push(ImportSpecifier::named("x"));
                    import
                })
                .collect(),
            exports: Vec::new(),
            module_doc: None,
            file_size: 0,
            line_count: 0,
            content_hash: String::new(),
            analyzed_at: Utc::now(),
            ai_summary: None,
        }
    }

    #[test]
    fn test_edges_only_between_known_nodes() {
        let modules = vec![
            module("src/b.ts", Language::TypeScript, &["./a", "react", "./b"]),
            module("src/a.ts", Language::TypeScript, &[]),
        ];
        let graph = build_dependency_graph(&modules, None, &BTreeMap::new());

        assert_eq!(graph.nodes, vec!["src/a.ts", "src/b.ts"]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from, "src/b.ts");
        assert_eq!(graph.edges[0].to, "src/a.ts");
        assert_eq!(graph.edges[0].imports, vec!["x"]);
        for edge in &graph.edges {
            assert!(graph.nodes.contains(&edge.from));
            assert!(graph.nodes.contains(&edge.to));
        }
    }

    #[test]
    fn test_duplicate_triples_collapse() {
        let modules = vec![
            module("a.ts", Language::TypeScript, &["./b", "./b.ts"]),
            module("b.ts", Language::TypeScript, &[]),
        ];
        let graph = build_dependency_graph(&modules, None, &BTreeMap::new());
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_neighbours_and_adjacency() {
        let modules = vec![
            module("a.ts", Language::TypeScript, &["./b", "./c"]),
            module("b.ts", Language::TypeScript, &["./a"]),
            module("c.ts", Language::TypeScript, &[]),
            module("d.ts", Language::TypeScript, &[]),
        ];
        let graph = build_dependency_graph(&modules, None, &BTreeMap::new());

        assert_eq!(graph.neighbour_count("a.ts"), 2);
        assert_eq!(graph.neighbour_count("c.ts"), 1);
        assert!(!graph.is_connected("d.ts"));
        assert_eq!(graph.dependents("a.ts"), vec!["b.ts"]);
        assert_eq!(graph.adjacency()["a.ts"].len(), 2);
        assert!(graph.adjacency()["d.ts"].is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let edge = Edge {
            from: "a".to_string(),
            to: "b".to_string(),
            imports: vec![],
            is_type_only: true,
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["isTypeOnly"], true);
    }
}
