//! Size and layout findings.

use super::{Insight, InsightCategory, InsightsConfig, Severity};
use crate::manifest::AnalysisManifest;

/// Modules with more than `max_lines` lines or more than `max_symbols` symbols.
pub fn detect_oversized_modules(manifest: &AnalysisManifest, config: &InsightsConfig) -> Vec<Insight> {
    let mut insights = Vec::new();

    for module in &manifest.modules {
        let mut reasons = Vec::new();
        if module.line_count > config.max_lines {
            reasons.push(format!("{} lines (limit {})", module.line_count, config.max_lines));
        }
        if module.symbols.len() > config.max_symbols {
            reasons.push(format!(
                "{} symbols (limit {})",
                module.symbols.len(),
                config.max_symbols
            ));
        }
        if reasons.is_empty() {
            continue;
        }

        insights.push(Insight {
            id: format!("oversized-module:{}", module.file_path),
            category: InsightCategory::Complexity,
            severity: Severity::Warning,
            title: format!("{} is oversized", module.file_path),
            description: format!("{} has {}", module.file_path, reasons.join(" and ")),
            affected_files: vec![module.file_path.clone()],
            suggestion: Some("Split the module into smaller, focused modules".to_string()),
        });
    }

    insights
}

/// Files nested more than `max_depth` directories deep.
pub fn detect_deep_nesting(manifest: &AnalysisManifest, config: &InsightsConfig) -> Vec<Insight> {
    let deep: Vec<String> = manifest
        .modules
        .iter()
        .filter(|m| directory_depth(&m.file_path) > config.max_depth)
        .map(|m| m.file_path.clone())
        .collect();

    if deep.is_empty() {
        return Vec::new();
    }

    let deepest = deep.iter().map(|p| directory_depth(p)).max().unwrap_or(0);
    vec![Insight {
        id: "deep-nesting".to_string(),
        category: InsightCategory::Organization,
        severity: Severity::Info,
        title: format!("{} files are nested more than {} directories deep", deep.len(), config.max_depth),
        description: format!(
            "The deepest file sits {} directories below the root: {}",
            deepest,
            deep.join(", ")
        ),
        affected_files: deep,
        suggestion: Some("Flatten the directory layout".to_string()),
    }]
}

/// Number of directories above a repo-relative file.
fn directory_depth(path: &str) -> usize {
    path.matches('/').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::fixtures::{exported, manifest, module};
    use crate::language::Language;
    use crate::model::SymbolKind;

    #[test]
    fn test_oversized_by_lines_is_strict() {
        let mut at_limit = module("a.py", Language::Python);
        at_limit.line_count = 500;
        let mut over = module("b.py", Language::Python);
        over.line_count = 501;

        let insights = detect_oversized_modules(&manifest(vec![at_limit, over]), &InsightsConfig::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].affected_files, vec!["b.py"]);
        assert!(insights[0].description.contains("501 lines"));
    }

    #[test]
    fn test_oversized_by_symbols() {
        let mut m = module("a.py", Language::Python);
        for i in 0..4 {
            exported(&mut m, &format!("f{}", i), SymbolKind::Function);
        }
        let config = InsightsConfig {
            max_symbols: 3,
            ..Default::default()
        };

        let insights = detect_oversized_modules(&manifest(vec![m]), &config);
        assert_eq!(insights.len(), 1);
        assert!(insights[0].description.contains("4 symbols"));
    }

    #[test]
    fn test_deep_nesting() {
        let shallow = module("src/a/b/c/d/e.ts", Language::TypeScript);
        let deep = module("src/a/b/c/d/e/f.ts", Language::TypeScript);

        let insights = detect_deep_nesting(&manifest(vec![shallow, deep]), &InsightsConfig::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].affected_files, vec!["src/a/b/c/d/e/f.ts"]);
    }
}
