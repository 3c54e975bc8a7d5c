//! Import specifier resolution against the set of analyzed files.
//!
//! A specifier resolves to a node only when a candidate path is actually in
//! the node set; anything else is treated as external.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::workspace::WorkspaceInfo;
use crate::language::Language;

/// Extensions tried, in order, when a specifier has none.
pub const PROBE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "rb", "php", "go", "rs", "java", "cs", "tf", "md",
];

/// Directory entry files tried after the extension probes.
const INDEX_FILES: &[&str] = &["__init__.py", "mod.rs", "main.tf"];

/// Resolves import specifiers to module paths.
pub struct Resolver<'a> {
    nodes: &'a BTreeSet<String>,
    workspace: Option<&'a WorkspaceInfo>,
    aliases: &'a BTreeMap<String, String>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        nodes: &'a BTreeSet<String>,
        workspace: Option<&'a WorkspaceInfo>,
        aliases: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            nodes,
            workspace,
            aliases,
        }
    }

    /// Resolve `source` as imported from `importer`. `names` are the imported
    /// bindings, used by Python's `from . import x`.
    pub fn resolve(&self, importer: &str, language: Language, source: &str, names: &[String]) -> Option<String> {
        if source.is_empty() {
            return None;
        }
        match language {
            Language::Python => return self.resolve_python(importer, source, names),
            Language::Rust => return self.resolve_rust(importer, source),
            _ => {}
        }

        if source.starts_with('.') {
            return self.probe(&join(parent_dir(importer), source)?);
        }
        if let Some(path) = self.resolve_alias(source) {
            return Some(path);
        }
        if let Some(path) = self.resolve_workspace(source) {
            return Some(path);
        }

        match language {
            Language::Go => self.resolve_go(source),
            Language::Java | Language::Kotlin | Language::Scala => {
                self.resolve_qualified(source, '.', &["java", "kt", "scala"])
            }
            Language::Php => self.resolve_qualified(source, '\\', &["php"]),
            Language::Ruby => self
                .probe(source)
                .or_else(|| self.probe(&format!("lib/{}", source))),
            Language::Hcl | Language::Markdown | Language::Shell => self.probe(&normalize(source)?),
            _ => None,
        }
    }

    /// First candidate for `base` that exists in the node set.
    pub fn probe(&self, base: &str) -> Option<String> {
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            return self.probe_dir("");
        }
        if self.nodes.contains(base) {
            return Some(base.to_string());
        }
        // `./util.js` written against a TypeScript source.
        if let Some(stem) = base.strip_suffix(".js").or_else(|| base.strip_suffix(".mjs")) {
            for ext in ["ts", "tsx"] {
                let candidate = format!("{}.{}", stem, ext);
                if self.nodes.contains(&candidate) {
                    return Some(candidate);
                }
            }
        }
        for ext in PROBE_EXTENSIONS {
            let candidate = format!("{}.{}", base, ext);
            if self.nodes.contains(&candidate) {
                return Some(candidate);
            }
        }
        self.probe_dir(base)
    }

    fn probe_dir(&self, dir: &str) -> Option<String> {
        let prefix = if dir.is_empty() { String::new() } else { format!("{}/", dir) };
        PROBE_EXTENSIONS
            .iter()
            .map(|ext| format!("{}index.{}", prefix, ext))
            .chain(INDEX_FILES.iter().map(|f| format!("{}{}", prefix, f)))
            .find(|candidate| self.nodes.contains(candidate))
    }

    fn resolve_alias(&self, source: &str) -> Option<String> {
        // Longest prefix wins.
        let (prefix, target) = self
            .aliases
            .iter()
            .map(|(p, t)| (p.trim_end_matches('*'), t.trim_end_matches('*')))
            .filter(|(p, _)| !p.is_empty() && source.starts_with(p))
            .max_by_key(|(p, _)| p.len())?;
        let rest = &source[prefix.len()..];
        let joined = format!("{}/{}", target.trim_end_matches('/'), rest.trim_start_matches('/'));
        self.probe(&normalize(&joined)?)
    }

    fn resolve_workspace(&self, source: &str) -> Option<String> {
        let (dir, sub) = self.workspace?.match_package(source)?;
        if sub.is_empty() {
            return self
                .probe_dir(&format!("{}/src", dir))
                .or_else(|| self.probe_dir(dir));
        }
        self.probe(&format!("{}/src/{}", dir, sub))
            .or_else(|| self.probe(&format!("{}/{}", dir, sub)))
    }

    fn resolve_python(&self, importer: &str, source: &str, names: &[String]) -> Option<String> {
        let dots = source.chars().take_while(|c| *c == '.').count();
        if dots == 0 {
            let path = source.replace('.', "/");
            return self
                .probe(&path)
                .or_else(|| self.probe(&format!("src/{}", path)));
        }

        let mut dir = parent_dir(importer).to_string();
        for _ in 1..dots {
            dir = parent_dir(&dir).to_string();
        }
        let rest = source[dots..].replace('.', "/");
        let base = match (dir.is_empty(), rest.is_empty()) {
            (_, true) => dir.clone(),
            (true, false) => rest,
            (false, false) => format!("{}/{}", dir, rest),
        };
        if source[dots..].is_empty() {
            // `from . import x` names submodules or members of the package.
            for name in names {
                let candidate = if base.is_empty() { name.clone() } else { format!("{}/{}", base, name) };
                if let Some(path) = self.probe(&candidate) {
                    return Some(path);
                }
            }
        }
        self.probe(&base)
    }

    fn resolve_rust(&self, importer: &str, source: &str) -> Option<String> {
        let mut segments: Vec<&str> = source.split("::").filter(|s| !s.is_empty()).collect();
        let mut dir = match segments.first().copied() {
            Some("crate") => self.rust_crate_root(importer)?,
            Some("self") => rust_module_dir(importer),
            Some("super") => {
                let mut dir = rust_module_dir(importer);
                while segments.first() == Some(&"super") {
                    dir = parent_dir(&dir).to_string();
                    segments.remove(0);
                }
                segments.insert(0, "super");
                dir
            }
            _ => return None,
        };
        segments.remove(0);
        if !dir.is_empty() {
            dir.push('/');
        }

        // `use crate::a::b::Item` may name an item, so shorter prefixes are tried too.
        for len in (1..=segments.len()).rev() {
            let base = format!("{}{}", dir, segments[..len].join("/"));
            for candidate in [format!("{}.rs", base), format!("{}/mod.rs", base)] {
                if self.nodes.contains(&candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Directory holding the `lib.rs` or `main.rs` the importer belongs to.
    fn rust_crate_root(&self, importer: &str) -> Option<String> {
        let mut dir = parent_dir(importer);
        loop {
            let prefix = if dir.is_empty() { String::new() } else { format!("{}/", dir) };
            if ["lib.rs", "main.rs"]
                .iter()
                .any(|f| self.nodes.contains(&format!("{}{}", prefix, f)))
            {
                return Some(dir.to_string());
            }
            if dir.is_empty() {
                return None;
            }
            dir = parent_dir(dir);
        }
    }

    fn resolve_go(&self, source: &str) -> Option<String> {
        let module = self.workspace?.go_module.as_deref()?;
        let package_dir = if source == module {
            ""
        } else {
            source.strip_prefix(module)?.strip_prefix('/')?
        };
        self.nodes
            .iter()
            .find(|node| {
                parent_dir(node) == package_dir && node.ends_with(".go") && !node.ends_with("_test.go")
            })
            .cloned()
    }

    /// `a.b.C` to a node ending in `a/b/C.<ext>`, dropping trailing members
    /// (static imports) until something matches.
    fn resolve_qualified(&self, source: &str, separator: char, extensions: &[&str]) -> Option<String> {
        let segments: Vec<&str> = source
            .trim_start_matches(separator)
            .split(separator)
            .filter(|s| !s.is_empty() && *s != "*")
            .collect();
        for len in (1..=segments.len()).rev() {
            let stem = segments[..len].join("/");
            for ext in extensions {
                let suffix = format!("{}.{}", stem, ext);
                let tail = format!("/{}", suffix);
                if let Some(node) = self
                    .nodes
                    .iter()
                    .find(|n| **n == suffix || n.ends_with(&tail))
                {
                    return Some(node.clone());
                }
            }
            if len <= 2 {
                break;
            }
        }
        None
    }
}

/// Directory part of a POSIX path (empty for root files).
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Rust module directory: a file's own directory for `lib.rs`, `main.rs`
/// and `mod.rs`, else a directory named after the file.
fn rust_module_dir(path: &str) -> String {
    let dir = parent_dir(path);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file {
        "lib.rs" | "main.rs" | "mod.rs" => dir.to_string(),
        _ => path.trim_end_matches(".rs").to_string(),
    }
}

/// Join a relative specifier onto a directory.
pub fn join(dir: &str, relative: &str) -> Option<String> {
    if dir.is_empty() {
        normalize(relative)
    } else {
        normalize(&format!("{}/{}", dir, relative))
    }
}

/// Collapse `.` and `..` segments. Returns `None` when the path escapes the root.
pub fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("src/./a/../b.ts"), Some("src/b.ts".to_string()));
        assert_eq!(normalize("../outside"), None);
        assert_eq!(join("src/lib", "../util"), Some("src/util".to_string()));
    }

    #[test]
    fn test_relative_probing() {
        let nodes = nodes(&["src/a.ts", "src/util/index.ts", "src/helpers.ts"]);
        let aliases = BTreeMap::new();
        let resolver = Resolver::new(&nodes, None, &aliases);

        assert_eq!(resolver.resolve("src/a.ts", Language::TypeScript, "./util", &[]), Some("src/util/index.ts".to_string()));
        assert_eq!(resolver.resolve("src/a.ts", Language::TypeScript, "./helpers.js", &[]), Some("src/helpers.ts".to_string()));
        assert_eq!(resolver.resolve("src/a.ts", Language::TypeScript, "./missing", &[]), None);
        assert_eq!(resolver.resolve("src/a.ts", Language::TypeScript, "react", &[]), None);
    }

    #[test]
    fn test_alias() {
        let nodes = nodes(&["src/components/button.tsx", "src/app.ts"]);
        let mut aliases = BTreeMap::new();
        aliases.insert("@/".to_string(), "src/".to_string());
        let resolver = Resolver::new(&nodes, None, &aliases);

        assert_eq!(
            resolver.resolve("src/app.ts", Language::TypeScript, "@/components/button", &[]),
            Some("src/components/button.tsx".to_string())
        );
    }

    #[test]
    fn test_python_relative_and_absolute() {
        let nodes = nodes(&["pkg/__init__.py", "pkg/models.py", "pkg/sub/views.py", "src/core/engine.py"]);
        let aliases = BTreeMap::new();
        let resolver = Resolver::new(&nodes, None, &aliases);

        assert_eq!(resolver.resolve("pkg/sub/views.py", Language::Python, "..models", &[]), Some("pkg/models.py".to_string()));
        assert_eq!(
            resolver.resolve("pkg/sub/views.py", Language::Python, "..", &["models".to_string()]),
            Some("pkg/models.py".to_string())
        );
        assert_eq!(resolver.resolve("pkg/models.py", Language::Python, ".", &["nothing".to_string()]), Some("pkg/__init__.py".to_string()));
        assert_eq!(resolver.resolve("pkg/models.py", Language::Python, "core.engine", &[]), Some("src/core/engine.py".to_string()));
        assert_eq!(resolver.resolve("pkg/models.py", Language::Python, "os.path", &[]), None);
    }

    #[test]
    fn test_rust_paths() {
        let nodes = nodes(&["src/lib.rs", "src/graph/mod.rs", "src/graph/resolve.rs", "src/model.rs"]);
        let aliases = BTreeMap::new();
        let resolver = Resolver::new(&nodes, None, &aliases);

        assert_eq!(resolver.resolve("src/lib.rs", Language::Rust, "self::graph", &[]), Some("src/graph/mod.rs".to_string()));
        assert_eq!(
            resolver.resolve("src/graph/mod.rs", Language::Rust, "crate::model::Symbol", &[]),
            Some("src/model.rs".to_string())
        );
        assert_eq!(resolver.resolve("src/graph/mod.rs", Language::Rust, "self::resolve", &[]), Some("src/graph/resolve.rs".to_string()));
        assert_eq!(resolver.resolve("src/graph/resolve.rs", Language::Rust, "super::super::model", &[]), Some("src/model.rs".to_string()));
        assert_eq!(resolver.resolve("src/lib.rs", Language::Rust, "std::collections", &[]), None);
    }

    #[test]
    fn test_go_module_packages() {
        let nodes = nodes(&["cmd/main.go", "internal/store/store.go", "internal/store/store_test.go"]);
        let aliases = BTreeMap::new();
        let workspace = WorkspaceInfo {
            go_module: Some("github.com/acme/app".to_string()),
            ..Default::default()
        };
        let resolver = Resolver::new(&nodes, Some(&workspace), &aliases);

        assert_eq!(
            resolver.resolve("cmd/main.go", Language::Go, "github.com/acme/app/internal/store", &[]),
            Some("internal/store/store.go".to_string())
        );
        assert_eq!(resolver.resolve("cmd/main.go", Language::Go, "fmt", &[]), None);
    }

    #[test]
    fn test_java_qualified() {
        let nodes = nodes(&["src/main/java/com/acme/Service.java", "src/main/java/com/acme/util/Strings.java"]);
        let aliases = BTreeMap::new();
        let resolver = Resolver::new(&nodes, None, &aliases);

        assert_eq!(
            resolver.resolve("src/main/java/com/acme/Service.java", Language::Java, "com.acme.util.Strings", &[]),
            Some("src/main/java/com/acme/util/Strings.java".to_string())
        );
        assert_eq!(
            resolver.resolve("src/main/java/com/acme/Service.java", Language::Java, "com.acme.util.Strings.join", &[]),
            Some("src/main/java/com/acme/util/Strings.java".to_string())
        );
        assert_eq!(resolver.resolve("x.java", Language::Java, "java.util.List", &[]), None);
    }

    #[test]
    fn test_workspace_package_entry() {
        let nodes = nodes(&["packages/a/src/index.ts", "packages/a/src/util.ts", "packages/b/index.js"]);
        let aliases = BTreeMap::new();
        let mut workspace = WorkspaceInfo::default();
        workspace.packages.insert("a".to_string(), "packages/a".to_string());
        workspace.packages.insert("b".to_string(), "packages/b".to_string());
        let resolver = Resolver::new(&nodes, Some(&workspace), &aliases);

        assert_eq!(resolver.resolve("x.ts", Language::TypeScript, "a", &[]), Some("packages/a/src/index.ts".to_string()));
        assert_eq!(resolver.resolve("x.ts", Language::TypeScript, "a/util", &[]), Some("packages/a/src/util.ts".to_string()));
        assert_eq!(resolver.resolve("x.ts", Language::TypeScript, "b", &[]), Some("packages/b/index.js".to_string()));
    }
}
