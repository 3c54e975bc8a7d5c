//! Exported symbols without documentation.

use std::collections::BTreeSet;

use super::{Insight, InsightCategory, InsightsConfig, Severity};
use crate::manifest::AnalysisManifest;

/// Report exported symbols that have no doc summary.
///
/// Severity is info up to `undocumented_escalation` missing docs and
/// warning beyond it.
pub fn detect_undocumented_exports(manifest: &AnalysisManifest, config: &InsightsConfig) -> Vec<Insight> {
    let mut missing = Vec::new();
    let mut files = BTreeSet::new();
    for module in &manifest.modules {
        for symbol in module.exported_symbols().filter(|s| !s.is_documented()) {
            missing.push(symbol.name.as_str());
            files.insert(module.file_path.clone());
        }
    }

    if missing.is_empty() {
        return Vec::new();
    }

    let severity = if missing.len() > config.undocumented_escalation {
        Severity::Warning
    } else {
        Severity::Info
    };

    let total: usize = manifest
        .modules
        .iter()
        .map(|m| m.exported_symbols().count())
        .sum();
    let preview: Vec<&str> = missing.iter().take(5).copied().collect();
    let more = missing.len().saturating_sub(preview.len());
    let mut description = format!(
        "{} of {} exported symbols have no documentation: {}",
        missing.len(),
        total,
        preview.join(", ")
    );
    if more > 0 {
        description.push_str(&format!(" and {} more", more));
    }

    vec![Insight {
        id: "undocumented-exports".to_string(),
        category: InsightCategory::Documentation,
        severity,
        title: format!("{} undocumented exports", missing.len()),
        description,
        affected_files: files.into_iter().collect(),
        suggestion: Some("Add a doc comment summarizing each public symbol".to_string()),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::fixtures::{exported, manifest, module};
    use crate::language::Language;
    use crate::model::{DocComment, SymbolKind};

    #[test]
    fn test_documented_exports_not_reported() {
        let mut m = module("src/a.ts", Language::TypeScript);
        let idx = exported(&mut m, "run", SymbolKind::Function);
        m.symbols[idx].docs = Some(DocComment::summary("Runs it."));

        assert!(detect_undocumented_exports(&manifest(vec![m]), &InsightsConfig::default()).is_empty());
    }

    #[test]
    fn test_info_below_escalation() {
        let mut m = module("src/a.ts", Language::TypeScript);
        exported(&mut m, "run", SymbolKind::Function);
        let idx = exported(&mut m, "stop", SymbolKind::Function);
        m.symbols[idx].docs = Some(DocComment::summary("Stops it."));

        let insights = detect_undocumented_exports(&manifest(vec![m]), &InsightsConfig::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].severity, Severity::Info);
        assert_eq!(insights[0].affected_files, vec!["src/a.ts"]);
        assert!(insights[0].description.starts_with("1 of 2 exported symbols"));
    }

    #[test]
    fn test_warning_above_escalation() {
        let mut m = module("src/a.ts", Language::TypeScript);
        for i in 0..3 {
            exported(&mut m, &format!("fn{}", i), SymbolKind::Function);
        }
        let config = InsightsConfig {
            undocumented_escalation: 2,
            ..Default::default()
        };

        let insights = detect_undocumented_exports(&manifest(vec![m]), &config);
        assert_eq!(insights[0].severity, Severity::Warning);
    }
}
