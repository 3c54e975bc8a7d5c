//! Weakly typed TypeScript exports.

use std::collections::HashSet;

use super::{Insight, InsightCategory, InsightsConfig, Severity};
use crate::language::Language;
use crate::manifest::AnalysisManifest;
use crate::model::{Symbol, Visibility};

/// Exported TypeScript functions and public methods of exported classes that
/// take an `any` parameter, or return `any` or nothing declared.
pub fn detect_weak_typing(manifest: &AnalysisManifest, _config: &InsightsConfig) -> Vec<Insight> {
    let mut insights = Vec::new();

    for module in manifest
        .modules
        .iter()
        .filter(|m| m.language == Language::TypeScript)
    {
        let exported_parents: HashSet<&str> = module
            .symbols
            .iter()
            .filter(|s| s.exported)
            .map(|s| s.id.as_str())
            .collect();

        let mut weak = Vec::new();
        for symbol in module.symbols.iter().filter(|s| s.kind.is_callable()) {
            let public = symbol.exported
                || (symbol.visibility == Visibility::Public
                    && symbol
                        .parent_id
                        .as_deref()
                        .is_some_and(|p| exported_parents.contains(p)));
            if !public {
                continue;
            }
            if let Some(problem) = weakness(symbol) {
                weak.push(format!("{} ({})", symbol.name, problem));
            }
        }

        if weak.is_empty() {
            continue;
        }
        insights.push(Insight {
            id: format!("weak-typing:{}", module.file_path),
            category: InsightCategory::TypeSafety,
            severity: Severity::Info,
            title: format!("{} public functions in {} are weakly typed", weak.len(), module.file_path),
            description: weak.join(", "),
            affected_files: vec![module.file_path.clone()],
            suggestion: Some("Replace `any` with concrete types and declare return types".to_string()),
        });
    }

    insights
}

fn weakness(symbol: &Symbol) -> Option<&'static str> {
    if symbol
        .parameters
        .iter()
        .any(|p| p.type_name.as_deref().is_some_and(is_any))
    {
        return Some("any parameter");
    }
    if symbol.name == "constructor" || is_setter(symbol) {
        return None;
    }
    match symbol.returns.as_ref().and_then(|r| r.type_name.as_deref()) {
        None => Some("no return type"),
        Some(t) if is_any(t) => Some("returns any"),
        Some(_) => None,
    }
}

/// `set name(value)` accessors cannot declare a return type.
fn is_setter(symbol: &Symbol) -> bool {
    let Some(signature) = symbol.signature.as_deref() else {
        return false;
    };
    signature
        .split_whitespace()
        .take_while(|token| !token.starts_with(symbol.name.as_str()))
        .any(|token| token == "set")
}

fn is_any(type_name: &str) -> bool {
    matches!(type_name.trim(), "any" | "any[]" | "Array<any>" | "Promise<any>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::fixtures::{exported, manifest, module};
    use crate::model::{Parameter, Returns, SymbolKind};

    fn typed(name: &str, param: &str, ret: Option<&str>) -> (String, Parameter, Option<Returns>) {
        let param = Parameter {
            name: "x".to_string(),
            type_name: Some(param.to_string()),
            ..Default::default()
        };
        let returns = ret.map(|r| Returns {
            type_name: Some(r.to_string()),
        });
        (name.to_string(), param, returns)
    }

    #[test]
    fn test_flags_any_and_missing_returns() {
        let mut m = module("src/api.ts", Language::TypeScript);
        for (name, param, returns) in [
            typed("good", "number", Some("string")),
            typed("anyParam", "any", Some("string")),
            typed("noReturn", "number", None),
            typed("anyReturn", "string", Some("any")),
        ] {
            let idx = exported(&mut m, &name, SymbolKind::Function);
            m.symbols[idx].parameters = vec![param];
            m.symbols[idx].returns = returns;
        }

        let insights = detect_weak_typing(&manifest(vec![m]), &InsightsConfig::default());
        assert_eq!(insights.len(), 1);
        let description = &insights[0].description;
        assert!(description.contains("anyParam (any parameter)"));
        assert!(description.contains("noReturn (no return type)"));
        assert!(description.contains("anyReturn (returns any)"));
        assert!(!description.contains("good"));
    }

    #[test]
    fn test_ignores_javascript_and_private() {
        let mut js = module("src/api.js", Language::JavaScript);
        exported(&mut js, "loose", SymbolKind::Function);
        let mut ts = module("src/internal.ts", Language::TypeScript);
        let idx = exported(&mut ts, "hidden", SymbolKind::Function);
        ts.symbols[idx].exported = false;

        assert!(detect_weak_typing(&manifest(vec![js, ts]), &InsightsConfig::default()).is_empty());
    }

    #[test]
    fn test_setters_need_no_return_type() {
        let mut m = module("src/model.ts", Language::TypeScript);
        exported(&mut m, "Account", SymbolKind::Class);
        for (name, signature) in [("balance", "set balance(value: number)"), ("reset", "reset(value: number)")] {
            let idx = exported(&mut m, name, SymbolKind::Method);
            let method = &mut m.symbols[idx];
            method.exported = false;
            method.parent_id = Some("src/model.ts:Account".to_string());
            method.signature = Some(signature.to_string());
            method.parameters = vec![typed(name, "number", None).1];
        }

        let insights = detect_weak_typing(&manifest(vec![m]), &InsightsConfig::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].description, "reset (no return type)");
    }
}
