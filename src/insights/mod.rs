//! Static insights over a finished manifest.
//!
//! Each detector is a pure function of the manifest and an [`InsightsConfig`]:
//! - Documentation: exported symbols without a summary
//! - Architecture: circular dependencies, god modules, orphans
//! - Complexity: oversized modules
//! - Type safety: `any` and missing return types in TypeScript exports
//! - Consistency: mixed naming conventions
//! - Organization: deeply nested files

mod architecture;
mod complexity;
mod documentation;
mod naming;
mod typing;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::manifest::AnalysisManifest;

pub use architecture::{detect_circular_dependencies, detect_god_modules, detect_orphan_modules};
pub use complexity::{detect_deep_nesting, detect_oversized_modules};
pub use documentation::detect_undocumented_exports;
pub use naming::{detect_inconsistent_naming, NamingStyle};
pub use typing::detect_weak_typing;

/// Severity of an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Whether `self` is at least as severe as `threshold`.
    pub fn at_least(&self, threshold: Severity) -> bool {
        // Declaration order runs from most to least severe.
        *self <= threshold
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// What an insight is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightCategory {
    Documentation,
    Architecture,
    Complexity,
    TypeSafety,
    Consistency,
    Organization,
}

impl InsightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightCategory::Documentation => "documentation",
            InsightCategory::Architecture => "architecture",
            InsightCategory::Complexity => "complexity",
            InsightCategory::TypeSafety => "type-safety",
            InsightCategory::Consistency => "consistency",
            InsightCategory::Organization => "organization",
        }
    }
}

impl std::fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Stable identifier, `{rule}` or `{rule}:{subject}`.
    pub id: String,
    pub category: InsightCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub affected_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Thresholds for every detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Run detectors at all (default: true)
    pub enabled: bool,
    /// Undocumented exports above this count escalate to a warning (default: 10)
    pub undocumented_escalation: usize,
    /// Stop after this many cycles (default: 10)
    pub max_cycles: usize,
    /// Lines per module before flagging (default: 500)
    pub max_lines: usize,
    /// Symbols per module before flagging (default: 30)
    pub max_symbols: usize,
    /// Distinct neighbours before a module is a god module (default: 15)
    pub god_threshold: usize,
    /// Dominant naming style share at or above which mixing is reported (default: 0.60)
    pub naming_min_dominance: f64,
    /// Dominant share at or above which the minority is ignored (default: 0.95)
    pub naming_max_dominance: f64,
    /// Directory depth before flagging (default: 5)
    pub max_depth: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            undocumented_escalation: 10,
            max_cycles: 10,
            max_lines: 500,
            max_symbols: 30,
            god_threshold: 15,
            naming_min_dominance: 0.60,
            naming_max_dominance: 0.95,
            max_depth: 5,
        }
    }
}

impl InsightsConfig {
    /// Tighter thresholds for small, young codebases.
    pub fn strict() -> Self {
        Self {
            undocumented_escalation: 0,
            max_lines: 300,
            max_symbols: 20,
            god_threshold: 10,
            max_depth: 4,
            ..Self::default()
        }
    }

    /// Looser thresholds for large, mature codebases.
    pub fn relaxed() -> Self {
        Self {
            undocumented_escalation: 50,
            max_lines: 1000,
            max_symbols: 60,
            god_threshold: 25,
            max_depth: 8,
            ..Self::default()
        }
    }

    /// Check the naming thresholds form a valid range.
    pub fn validate(&self) -> anyhow::Result<()> {
        let (min, max) = (self.naming_min_dominance, self.naming_max_dominance);
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) {
            anyhow::bail!("naming dominance thresholds must be between 0 and 1");
        }
        if min >= max {
            anyhow::bail!(
                "naming_min_dominance ({}) must be below naming_max_dominance ({})",
                min,
                max
            );
        }
        Ok(())
    }
}

/// A detector over the whole manifest.
pub type Detector = fn(&AnalysisManifest, &InsightsConfig) -> Vec<Insight>;

/// Every built-in detector, in report order.
pub const DETECTORS: &[(&str, Detector)] = &[
    ("undocumented-exports", detect_undocumented_exports),
    ("circular-dependency", detect_circular_dependencies),
    ("oversized-module", detect_oversized_modules),
    ("god-module", detect_god_modules),
    ("orphan-module", detect_orphan_modules),
    ("weak-typing", detect_weak_typing),
    ("inconsistent-naming", detect_inconsistent_naming),
    ("deep-nesting", detect_deep_nesting),
];

/// Runs every detector over a manifest.
pub struct InsightsEngine {
    config: InsightsConfig,
}

impl InsightsEngine {
    pub fn new(config: InsightsConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, manifest: &AnalysisManifest) -> Vec<Insight> {
        if !self.config.enabled {
            return Vec::new();
        }
        let mut insights = Vec::new();
        for (name, detector) in DETECTORS {
            let found = detector(manifest, &self.config);
            debug!(detector = *name, count = found.len(), "insight detector finished");
            insights.extend(found);
        }
        insights
    }
}

impl Default for InsightsEngine {
    fn default() -> Self {
        Self::new(InsightsConfig::default())
    }
}

/// Shared fixtures for the detector tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use crate::graph::{build_dependency_graph, DependencyGraph};
    use crate::language::Language;
    use crate::manifest::{AnalysisManifest, AnalysisStats, ProjectMeta, SCHEMA_VERSION};
    use crate::model::{Import, Location, ModuleInfo, Symbol, SymbolKind};

    pub fn module(path: &str, language: Language) -> ModuleInfo {
        ModuleInfo {
            file_path: path.to_string(),
            language,
            symbols: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            module_doc: None,
            file_size: 0,
            line_count: 10,
            content_hash: String::new(),
            analyzed_at: Utc::now(),
            ai_summary: None,
        }
    }

    pub fn with_imports(mut module: ModuleInfo, sources: &[&str]) -> ModuleInfo {
        module.imports = sources.iter().map(|s| Import::new(*s)).collect();
        module
    }

    pub fn exported(module: &mut ModuleInfo, name: &str, kind: SymbolKind) -> usize {
        let mut symbol = Symbol::new(name, kind, Location::at(&module.file_path, 1, 1));
        symbol.id = format!("{}:{}", module.file_path, name);
        symbol.exported = true;
        module.symbols.push(symbol);
        module.symbols.len() - 1
    }

    pub fn manifest(modules: Vec<ModuleInfo>) -> AnalysisManifest {
        let graph: DependencyGraph = build_dependency_graph(&modules, None, &BTreeMap::new());
        AnalysisManifest {
            version: SCHEMA_VERSION.to_string(),
            stats: AnalysisStats::compute(&modules, &[]),
            modules,
            dependency_graph: graph,
            project_meta: ProjectMeta::fallback(std::path::Path::new("/tmp/project")),
            summary_cache: BTreeMap::new(),
            insights: Vec::new(),
        }
    }
}
