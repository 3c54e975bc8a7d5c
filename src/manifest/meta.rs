//! Project metadata read from the root package manifest.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::workspace::{parse_go_module, WorkspaceInfo};
use crate::language::Language;

/// Name and description of the analyzed project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub root: String,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspaceInfo>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct NpmPackage {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct CargoManifest {
    package: Option<TomlPackage>,
}

#[derive(Deserialize)]
struct PyProject {
    project: Option<TomlPackage>,
    tool: Option<PyTools>,
}

#[derive(Deserialize)]
struct PyTools {
    poetry: Option<TomlPackage>,
}

#[derive(Deserialize)]
struct TomlPackage {
    name: Option<String>,
    // `version.workspace = true` in Cargo is a table, not a string.
    version: Option<toml::Value>,
    description: Option<String>,
}

struct Identity {
    name: String,
    version: Option<String>,
    description: Option<String>,
}

impl TomlPackage {
    fn into_identity(self) -> Option<Identity> {
        Some(Identity {
            name: self.name?,
            version: self.version.and_then(|v| v.as_str().map(str::to_string)),
            description: self.description,
        })
    }
}

impl ProjectMeta {
    /// Metadata with only the directory name filled in.
    pub fn fallback(root: &Path) -> Self {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());
        Self {
            name,
            version: None,
            description: None,
            root: root.to_string_lossy().to_string(),
            languages: Vec::new(),
            workspace: None,
            generated_at: Utc::now(),
        }
    }

    /// Read the first of `package.json`, `Cargo.toml`, `pyproject.toml`,
    /// `go.mod` that names the project.
    pub fn read(root: &Path, languages: Vec<Language>, workspace: Option<WorkspaceInfo>) -> Self {
        let mut meta = Self::fallback(root);
        meta.languages = languages;
        meta.workspace = workspace;

        let readers: [(&str, fn(&str) -> anyhow::Result<Option<Identity>>); 4] = [
            ("package.json", read_package_json),
            ("Cargo.toml", read_cargo_toml),
            ("pyproject.toml", read_pyproject),
            ("go.mod", read_go_mod),
        ];
        for (file, reader) in readers {
            let Ok(content) = fs::read_to_string(root.join(file)) else {
                continue;
            };
            match reader(&content) {
                Ok(Some(identity)) => {
                    meta.name = identity.name;
                    meta.version = identity.version;
                    meta.description = identity.description;
                    break;
                }
                Ok(None) => {}
                Err(e) => debug!(file, error = %e, "could not read project metadata"),
            }
        }
        meta
    }
}

fn read_package_json(content: &str) -> anyhow::Result<Option<Identity>> {
    let pkg: NpmPackage = serde_json::from_str(content)?;
    Ok(pkg.name.map(|name| Identity {
        name,
        version: pkg.version,
        description: pkg.description,
    }))
}

fn read_cargo_toml(content: &str) -> anyhow::Result<Option<Identity>> {
    let manifest: CargoManifest = toml::from_str(content)?;
    Ok(manifest.package.and_then(TomlPackage::into_identity))
}

fn read_pyproject(content: &str) -> anyhow::Result<Option<Identity>> {
    let project: PyProject = toml::from_str(content)?;
    let pkg = project.project.or_else(|| project.tool.and_then(|t| t.poetry));
    Ok(pkg.and_then(TomlPackage::into_identity))
}

fn read_go_mod(content: &str) -> anyhow::Result<Option<Identity>> {
    Ok(parse_go_module(content).map(|name| Identity {
        name,
        version: None,
        description: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_package_json_wins() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{"name": "web-app", "version": "2.1.0", "description": "Storefront"}"#,
        )
        .unwrap();
        fs::write(temp.path().join("Cargo.toml"), "[package]\nname = \"other\"\n").unwrap();

        let meta = ProjectMeta::read(temp.path(), vec![Language::TypeScript], None);
        assert_eq!(meta.name, "web-app");
        assert_eq!(meta.version.as_deref(), Some("2.1.0"));
        assert_eq!(meta.description.as_deref(), Some("Storefront"));
        assert_eq!(meta.languages, vec![Language::TypeScript]);
    }

    #[test]
    fn test_cargo_workspace_version_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Cargo.toml"),
            "[package]\nname = \"engine\"\nversion.workspace = true\n",
        )
        .unwrap();

        let meta = ProjectMeta::read(temp.path(), Vec::new(), None);
        assert_eq!(meta.name, "engine");
        assert_eq!(meta.version, None);
    }

    #[test]
    fn test_poetry_and_go_mod() {
        assert_eq!(
            read_pyproject("[tool.poetry]\nname = \"svc\"\nversion = \"0.3.0\"\n")
                .unwrap()
                .map(|i| i.name),
            Some("svc".to_string())
        );
        assert_eq!(
            read_go_mod("module example.com/tool\n").unwrap().map(|i| i.name),
            Some("example.com/tool".to_string())
        );
    }

    #[test]
    fn test_fallback_to_directory_name() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("my-repo");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("package.json"), "{ broken").unwrap();

        let meta = ProjectMeta::read(&dir, Vec::new(), None);
        assert_eq!(meta.name, "my-repo");
    }
}
