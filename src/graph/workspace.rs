//! Monorepo workspace discovery.
//!
//! Strategies are tried in order: `package.json` workspaces, then
//! `pnpm-workspace.yaml`, then `lerna.json`. The first one that yields at
//! least one package wins. Nothing here is fatal: a broken manifest is
//! logged at debug level and the next strategy is tried.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

/// Which workspace manifest the packages came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceType {
    Npm,
    Pnpm,
    Lerna,
    #[default]
    None,
}

impl std::fmt::Display for WorkspaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkspaceType::Npm => write!(f, "npm"),
            WorkspaceType::Pnpm => write!(f, "pnpm"),
            WorkspaceType::Lerna => write!(f, "lerna"),
            WorkspaceType::None => write!(f, "none"),
        }
    }
}

/// Packages of a monorepo, keyed by package name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    /// Package name to repo-relative directory.
    pub packages: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub workspace_type: WorkspaceType,
    /// Module path from a root `go.mod`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go_module: Option<String>,
}

impl WorkspaceInfo {
    pub fn is_monorepo(&self) -> bool {
        !self.packages.is_empty()
    }

    /// Find the package a bare specifier refers to. Returns the package
    /// directory and the remaining subpath (empty for the package itself).
    pub fn match_package<'a>(&'a self, specifier: &'a str) -> Option<(&'a str, &'a str)> {
        if let Some(dir) = self.packages.get(specifier) {
            return Some((dir.as_str(), ""));
        }
        // Longest name first so `@scope/a-b` beats `@scope/a`.
        self.packages
            .iter()
            .filter_map(|(name, dir)| {
                specifier
                    .strip_prefix(name.as_str())
                    .and_then(|rest| rest.strip_prefix('/'))
                    .map(|sub| (name.len(), dir.as_str(), sub))
            })
            .max_by_key(|(len, _, _)| *len)
            .map(|(_, dir, sub)| (dir, sub))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NpmWorkspaces {
    List(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    workspaces: Option<NpmWorkspaces>,
}

#[derive(Deserialize)]
struct PnpmWorkspace {
    #[serde(default)]
    packages: Vec<String>,
}

#[derive(Deserialize)]
struct LernaJson {
    #[serde(default)]
    packages: Option<Vec<String>>,
}

/// Discover workspace packages under `root`.
pub fn resolve_workspace(root: &Path) -> WorkspaceInfo {
    let mut info = WorkspaceInfo {
        go_module: read_go_module(root),
        ..Default::default()
    };

    let strategies: [(WorkspaceType, fn(&Path) -> anyhow::Result<Option<Vec<String>>>); 3] = [
        (WorkspaceType::Npm, npm_patterns),
        (WorkspaceType::Pnpm, pnpm_patterns),
        (WorkspaceType::Lerna, lerna_patterns),
    ];

    for (kind, strategy) in strategies {
        let patterns = match strategy(root) {
            Ok(Some(patterns)) => patterns,
            Ok(None) => continue,
            Err(e) => {
                debug!(strategy = %kind, error = %e, "workspace manifest unreadable");
                continue;
            }
        };
        match expand_packages(root, &patterns) {
            Ok(packages) if !packages.is_empty() => {
                debug!(strategy = %kind, count = packages.len(), "workspace packages found");
                info.packages = packages;
                info.workspace_type = kind;
                return info;
            }
            Ok(_) => debug!(strategy = %kind, "workspace patterns matched no packages"),
            Err(e) => debug!(strategy = %kind, error = %e, "workspace expansion failed"),
        }
    }

    info
}

fn npm_patterns(root: &Path) -> anyhow::Result<Option<Vec<String>>> {
    let path = root.join("package.json");
    if !path.is_file() {
        return Ok(None);
    }
    let pkg: PackageJson = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(pkg.workspaces.map(|w| match w {
        NpmWorkspaces::List(list) => list,
        NpmWorkspaces::Object { packages } => packages,
    }))
}

fn pnpm_patterns(root: &Path) -> anyhow::Result<Option<Vec<String>>> {
    let path = root.join("pnpm-workspace.yaml");
    if !path.is_file() {
        return Ok(None);
    }
    let ws: PnpmWorkspace = serde_yaml::from_str(&fs::read_to_string(path)?)?;
    Ok(Some(ws.packages))
}

fn lerna_patterns(root: &Path) -> anyhow::Result<Option<Vec<String>>> {
    let path = root.join("lerna.json");
    if !path.is_file() {
        return Ok(None);
    }
    let lerna: LernaJson = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(Some(
        lerna.packages.unwrap_or_else(|| vec!["packages/*".to_string()]),
    ))
}

fn build_globset<'a>(patterns: impl Iterator<Item = &'a str>) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
        builder.add(GlobBuilder::new(pattern).literal_separator(true).build()?);
    }
    Ok(builder.build()?)
}

/// Expand directory globs to `name -> dir` for every matching `package.json`.
fn expand_packages(root: &Path, patterns: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let include = build_globset(
        patterns
            .iter()
            .map(String::as_str)
            .filter(|p| !p.starts_with('!')),
    )?;
    let exclude = build_globset(patterns.iter().filter_map(|p| p.strip_prefix('!')))?;

    let mut packages = BTreeMap::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        !(e.depth() > 0 && e.file_type().is_dir() && (name == "node_modules" || name.starts_with('.')))
    });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || entry.file_name() != "package.json" || entry.depth() < 2 {
            continue;
        }
        let Some(dir) = entry.path().parent() else {
            continue;
        };
        let Ok(rel) = dir.strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        if !include.is_match(&rel) || exclude.is_match(&rel) {
            continue;
        }
        let pkg: PackageJson = match fs::read_to_string(entry.path())
            .map_err(anyhow::Error::from)
            .and_then(|c| serde_json::from_str(&c).map_err(anyhow::Error::from))
        {
            Ok(pkg) => pkg,
            Err(e) => {
                debug!(path = %rel, error = %e, "skipping unreadable package.json");
                continue;
            }
        };
        if let Some(name) = pkg.name.filter(|n| !n.is_empty()) {
            packages.insert(name, rel);
        }
    }

    Ok(packages)
}

/// The `module` line of a root `go.mod`, if any.
pub fn read_go_module(root: &Path) -> Option<String> {
    let content = fs::read_to_string(root.join("go.mod")).ok()?;
    parse_go_module(&content)
}

pub(crate) fn parse_go_module(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let module = line.trim().strip_prefix("module ")?;
        let module = module.split("//").next().unwrap_or("").trim().trim_matches('"');
        (!module.is_empty()).then(|| module.to_string())
    })
}
