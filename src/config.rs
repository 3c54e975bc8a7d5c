//! Analysis configuration.
//!
//! Loaded from `codeatlas.yaml` (or `.codeatlas.yaml`) at the repository
//! root. Every field is optional; missing fields take their defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use globset::Glob;
use serde::{Deserialize, Serialize};

use crate::insights::InsightsConfig;

/// Config file names searched for, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["codeatlas.yaml", ".codeatlas.yaml"];

/// 1 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Glob patterns of files to analyze (default: `**/*`)
    pub include: Vec<String>,
    /// Glob patterns of files to skip, matched against repo-relative paths
    pub exclude: Vec<String>,
    /// Files larger than this many bytes are skipped (default: 1 MiB)
    pub max_file_size: u64,
    /// Resolve npm/pnpm/lerna workspaces for import resolution (default: true)
    pub detect_monorepo: bool,
    /// Only analyze files with these extensions (default: all detected languages)
    pub extensions: Option<Vec<String>>,
    /// Import prefix to root-relative target, e.g. `"@/": "src/"`
    pub aliases: BTreeMap<String, String>,
    pub insights: InsightsConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*".to_string()],
            exclude: default_excludes(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            detect_monorepo: true,
            extensions: None,
            aliases: BTreeMap::new(),
            insights: InsightsConfig::default(),
        }
    }
}

fn default_excludes() -> Vec<String> {
    [
        "**/node_modules/**",
        "**/.git/**",
        "**/dist/**",
        "**/build/**",
        "**/target/**",
        "**/vendor/**",
        "**/__pycache__/**",
        "**/.venv/**",
        "**/package-lock.json",
        "**/yarn.lock",
        "**/pnpm-lock.yaml",
        "**/Cargo.lock",
        "**/poetry.lock",
        "**/*.min.js",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl AnalysisConfig {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // An empty file is a valid, all-default config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: AnalysisConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Find a config file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load the discovered config for `root`, or defaults when there is none.
    pub fn load_or_default(root: &Path) -> anyhow::Result<Self> {
        match Self::discover(root) {
            Some(path) => Self::parse_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Whether the extension allow-list (if any) admits `path`.
    pub fn allows_extension(&self, path: &str) -> bool {
        let Some(allowed) = &self.extensions else {
            return true;
        };
        let ext = path.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
        allowed
            .iter()
            .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Validate a config.
pub fn validate(config: &AnalysisConfig) -> anyhow::Result<()> {
    if config.include.is_empty() {
        anyhow::bail!("include must list at least one pattern");
    }
    for (i, pattern) in config.include.iter().enumerate() {
        if let Err(e) = Glob::new(pattern) {
            anyhow::bail!("include[{}]: invalid glob {:?}: {}", i, pattern, e);
        }
    }
    for (i, pattern) in config.exclude.iter().enumerate() {
        if let Err(e) = Glob::new(pattern) {
            anyhow::bail!("exclude[{}]: invalid glob {:?}: {}", i, pattern, e);
        }
    }
    if config.max_file_size == 0 {
        anyhow::bail!("max_file_size must be greater than 0");
    }
    for (prefix, target) in &config.aliases {
        if prefix.is_empty() {
            anyhow::bail!("alias for {:?} has an empty prefix", target);
        }
    }
    config.insights.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
include:
  - "src/**"
max_file_size: 2048
aliases:
  "@/": "src/"
insights:
  max_lines: 800
"#;
        let config = AnalysisConfig::parse_str(yaml).unwrap();
        assert_eq!(config.include, vec!["src/**"]);
        assert_eq!(config.max_file_size, 2048);
        assert_eq!(config.aliases["@/"], "src/");
        assert_eq!(config.insights.max_lines, 800);
        // Unset fields keep their defaults.
        assert!(config.detect_monorepo);
        assert_eq!(config.insights.max_symbols, 30);
        assert!(config.exclude.iter().any(|e| e.contains("node_modules")));
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(AnalysisConfig::parse_str("\n").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn test_discover() {
        let temp = TempDir::new().unwrap();
        assert!(AnalysisConfig::discover(temp.path()).is_none());

        fs::write(temp.path().join(".codeatlas.yaml"), "max_file_size: 10\n").unwrap();
        let found = AnalysisConfig::discover(temp.path()).unwrap();
        assert!(found.ends_with(".codeatlas.yaml"));
        assert_eq!(AnalysisConfig::load_or_default(temp.path()).unwrap().max_file_size, 10);
    }

    #[test]
    fn test_validate() {
        assert!(validate(&AnalysisConfig::default()).is_ok());

        let config = AnalysisConfig {
            exclude: vec!["src/[".to_string()],
            ..Default::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("exclude[0]"));

        let mut config = AnalysisConfig::default();
        config.insights.naming_min_dominance = 0.99;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_extension_allow_list() {
        let config = AnalysisConfig {
            extensions: Some(vec![".ts".to_string(), "py".to_string()]),
            ..Default::default()
        };
        assert!(config.allows_extension("src/a.ts"));
        assert!(config.allows_extension("b.PY"));
        assert!(!config.allows_extension("c.go"));
        assert!(AnalysisConfig::default().allows_extension("Dockerfile"));
    }
}
