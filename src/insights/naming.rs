//! Mixed naming conventions among exported callables.

use std::collections::{BTreeMap, BTreeSet};

use super::{Insight, InsightCategory, InsightsConfig, Severity};
use crate::language::Language;
use crate::manifest::AnalysisManifest;

/// Identifier casing convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamingStyle {
    CamelCase,
    PascalCase,
    SnakeCase,
}

impl NamingStyle {
    /// Classify a name. Single lowercase words and SCREAMING_CASE are ambiguous.
    pub fn classify(name: &str) -> Option<Self> {
        let name = name.trim_start_matches('_');
        let first = name.chars().next()?;
        if !first.is_alphabetic() {
            return None;
        }
        let has_upper = name.chars().any(char::is_uppercase);
        let has_lower = name.chars().any(char::is_lowercase);
        let has_underscore = name.contains('_');

        if has_underscore {
            return (has_lower && !has_upper).then_some(NamingStyle::SnakeCase);
        }
        if first.is_uppercase() {
            return has_lower.then_some(NamingStyle::PascalCase);
        }
        has_upper.then_some(NamingStyle::CamelCase)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NamingStyle::CamelCase => "camelCase",
            NamingStyle::PascalCase => "PascalCase",
            NamingStyle::SnakeCase => "snake_case",
        }
    }
}

/// Report languages whose exported functions mix naming styles.
///
/// Styles are compared per language. A language is flagged when its dominant
/// style covers at least `naming_min_dominance` but less than
/// `naming_max_dominance` of the classified names.
pub fn detect_inconsistent_naming(manifest: &AnalysisManifest, config: &InsightsConfig) -> Vec<Insight> {
    // language -> style -> (count, files using it)
    let mut by_language: BTreeMap<Language, BTreeMap<NamingStyle, (usize, BTreeSet<&str>)>> = BTreeMap::new();

    for module in &manifest.modules {
        for symbol in module.exported_symbols().filter(|s| s.kind.is_callable()) {
            let Some(style) = NamingStyle::classify(&symbol.name) else {
                continue;
            };
            let entry = by_language
                .entry(module.language)
                .or_default()
                .entry(style)
                .or_default();
            entry.0 += 1;
            entry.1.insert(module.file_path.as_str());
        }
    }

    let mut insights = Vec::new();
    for (language, styles) in by_language {
        let total: usize = styles.values().map(|(count, _)| count).sum();
        let Some((&dominant, (dominant_count, _))) = styles.iter().max_by_key(|(_, (count, _))| *count) else {
            continue;
        };
        let share = *dominant_count as f64 / total as f64;
        if share < config.naming_min_dominance || share >= config.naming_max_dominance {
            continue;
        }

        let minority: BTreeSet<&str> = styles
            .iter()
            .filter(|(style, _)| **style != dominant)
            .flat_map(|(_, (_, files))| files.iter().copied())
            .collect();
        let breakdown: Vec<String> = styles
            .iter()
            .map(|(style, (count, _))| format!("{} {}", count, style.as_str()))
            .collect();

        insights.push(Insight {
            id: format!("inconsistent-naming:{}", language),
            category: InsightCategory::Consistency,
            severity: Severity::Info,
            title: format!("Mixed naming styles in {} exports", language),
            description: format!(
                "{:.0}% of exported {} functions use {} ({})",
                share * 100.0,
                language,
                dominant.as_str(),
                breakdown.join(", ")
            ),
            affected_files: minority.into_iter().map(str::to_string).collect(),
            suggestion: Some(format!("Rename the outliers to {}", dominant.as_str())),
        });
    }

    insights
}
