//! Incremental merge of freshly parsed modules into a previous manifest.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::model::ModuleInfo;

/// Combine previous modules with the results of re-analyzing `targets`.
///
/// Fresh modules replace previous entries for target paths. Previous modules
/// outside the target set are carried over unchanged. A target with no fresh
/// module (deleted, or failed to parse) is dropped. The result holds exactly
/// one module per path, sorted by path.
pub fn merge_modules(
    previous: &[ModuleInfo],
    fresh: Vec<ModuleInfo>,
    targets: &BTreeSet<String>,
) -> Vec<ModuleInfo> {
    let mut merged: BTreeMap<String, ModuleInfo> = previous
        .iter()
        .filter(|m| !targets.contains(&m.file_path))
        .map(|m| (m.file_path.clone(), m.clone()))
        .collect();

    for module in fresh {
        if targets.contains(&module.file_path) {
            merged.insert(module.file_path.clone(), module);
        }
    }

    merged.into_values().collect()
}

/// Keep cached summaries whose content hash still belongs to some module.
pub fn carry_summary_cache(
    previous: &BTreeMap<String, String>,
    modules: &[ModuleInfo],
) -> BTreeMap<String, String> {
    let live: HashSet<&str> = modules.iter().map(|m| m.content_hash.as_str()).collect();
    previous
        .iter()
        .filter(|(hash, _)| live.contains(hash.as_str()))
        .map(|(hash, summary)| (hash.clone(), summary.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use chrono::Utc;

    fn module(path: &str, hash: &str) -> ModuleInfo {
        ModuleInfo {
            file_path: path.to_string(),
            language: Language::TypeScript,
            symbols: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            module_doc: None,
            file_size: 0,
            line_count: 0,
            content_hash: hash.to_string(),
            analyzed_at: Utc::now(),
            ai_summary: None,
        }
    }

    fn targets(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_untouched_modules_carry_over() {
        let previous = vec![module("a.ts", "1"), module("b.ts", "2"), module("c.ts", "3")];
        let merged = merge_modules(&previous, vec![module("a.ts", "9")], &targets(&["a.ts"]));

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].content_hash, "9");
        assert_eq!(merged[1], previous[1]);
        assert_eq!(merged[2], previous[2]);
    }

    #[test]
    fn test_failed_or_deleted_targets_dropped() {
        let previous = vec![module("a.ts", "1"), module("b.ts", "2")];
        let merged = merge_modules(&previous, Vec::new(), &targets(&["b.ts"]));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].file_path, "a.ts");
    }

    #[test]
    fn test_new_files_added_sorted() {
        let previous = vec![module("b.ts", "2")];
        let merged = merge_modules(
            &previous,
            vec![module("c.ts", "3"), module("a.ts", "1")],
            &targets(&["a.ts", "c.ts"]),
        );

        let paths: Vec<&str> = merged.iter().map(|m| m.file_path.as_str()).collect();
        assert_eq!(paths, vec!["a.ts", "b.ts", "c.ts"]);
    }

    #[test]
    fn test_summary_cache_pruned() {
        let mut cache = BTreeMap::new();
        cache.insert("1".to_string(), "old a".to_string());
        cache.insert("gone".to_string(), "stale".to_string());

        let kept = carry_summary_cache(&cache, &[module("a.ts", "1")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept["1"], "old a");
    }
}
