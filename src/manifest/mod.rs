//! The analysis manifest: everything one engine run knows about a repository.
//!
//! A manifest is immutable once returned. Incremental runs borrow the
//! previous manifest and build a new one.

pub mod merge;
pub mod meta;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisSkipReason, EngineError};
use crate::graph::DependencyGraph;
use crate::insights::Insight;
use crate::model::ModuleInfo;

pub use merge::{carry_summary_cache, merge_modules};
pub use meta::ProjectMeta;

/// Manifest schema version.
pub const SCHEMA_VERSION: &str = "1.0";

/// A file left out of the manifest, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    /// Machine-readable tag, e.g. `file-too-large`.
    pub code: String,
    pub reason: String,
}

/// Aggregate counts over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    pub total_files: usize,
    pub total_symbols: usize,
    pub total_exports: usize,
    pub total_imports: usize,
    pub by_language: BTreeMap<String, usize>,
    pub by_kind: BTreeMap<String, usize>,
    pub skipped_files: usize,
    #[serde(default)]
    pub skipped: Vec<SkippedFile>,
    /// Modules taken unchanged from a previous manifest.
    #[serde(default)]
    pub reused_modules: usize,
    pub duration_ms: u64,
}

impl AnalysisStats {
    /// Count modules, symbols and skips.
    pub fn compute(modules: &[ModuleInfo], skipped: &[(String, AnalysisSkipReason)]) -> Self {
        let mut stats = AnalysisStats {
            total_files: modules.len(),
            skipped_files: skipped.len(),
            skipped: skipped
                .iter()
                .map(|(path, reason)| SkippedFile {
                    path: path.clone(),
                    code: reason.code().to_string(),
                    reason: reason.to_string(),
                })
                .collect(),
            ..Default::default()
        };

        for module in modules {
            stats.total_symbols += module.symbols.len();
            stats.total_exports += module.exports.len();
            stats.total_imports += module.imports.len();
            *stats
                .by_language
                .entry(module.language.to_string())
                .or_default() += 1;
            for symbol in &module.symbols {
                *stats.by_kind.entry(symbol.kind.to_string()).or_default() += 1;
            }
        }

        stats
    }
}

/// The complete result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisManifest {
    pub version: String,
    pub modules: Vec<ModuleInfo>,
    pub dependency_graph: DependencyGraph,
    pub project_meta: ProjectMeta,
    pub stats: AnalysisStats,
    /// Content hash to previously generated summary.
    #[serde(default)]
    pub summary_cache: BTreeMap<String, String>,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

impl AnalysisManifest {
    /// Read a manifest written by [`AnalysisManifest::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path.as_ref())?;
        let manifest: AnalysisManifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    /// Write the manifest as pretty JSON, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn module(&self, path: &str) -> Option<&ModuleInfo> {
        self.modules.iter().find(|m| m.file_path == path)
    }
}
