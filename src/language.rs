//! Language detection from file paths.
//!
//! Detection is a pure function of the file name: an extension table plus a
//! handful of filename rules for extensionless files such as `Dockerfile`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A source language the engine knows how to detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    Go,
    Rust,
    Java,
    CSharp,
    Ruby,
    Php,
    Yaml,
    Shell,
    Hcl,
    Sql,
    Markdown,
    Dockerfile,
    Toml,
    Json,
    C,
    Cpp,
    Kotlin,
    Swift,
    Scala,
    Lua,
}

/// Extension (lowercase, without dot) to language.
static EXTENSIONS: phf::Map<&'static str, Language> = phf::phf_map! {
    "ts" => Language::TypeScript,
    "tsx" => Language::TypeScript,
    "mts" => Language::TypeScript,
    "cts" => Language::TypeScript,
    "js" => Language::JavaScript,
    "jsx" => Language::JavaScript,
    "mjs" => Language::JavaScript,
    "cjs" => Language::JavaScript,
    "py" => Language::Python,
    "pyi" => Language::Python,
    "go" => Language::Go,
    "rs" => Language::Rust,
    "java" => Language::Java,
    "cs" => Language::CSharp,
    "rb" => Language::Ruby,
    "rake" => Language::Ruby,
    "php" => Language::Php,
    "yml" => Language::Yaml,
    "yaml" => Language::Yaml,
    "sh" => Language::Shell,
    "bash" => Language::Shell,
    "zsh" => Language::Shell,
    "tf" => Language::Hcl,
    "hcl" => Language::Hcl,
    "tfvars" => Language::Hcl,
    "sql" => Language::Sql,
    "md" => Language::Markdown,
    "markdown" => Language::Markdown,
    "mdx" => Language::Markdown,
    "dockerfile" => Language::Dockerfile,
    "toml" => Language::Toml,
    "json" => Language::Json,
    "c" => Language::C,
    "h" => Language::C,
    "cpp" => Language::Cpp,
    "cc" => Language::Cpp,
    "cxx" => Language::Cpp,
    "hpp" => Language::Cpp,
    "hh" => Language::Cpp,
    "kt" => Language::Kotlin,
    "kts" => Language::Kotlin,
    "swift" => Language::Swift,
    "scala" => Language::Scala,
    "sc" => Language::Scala,
    "lua" => Language::Lua,
};

/// Extensionless file names with a well-known language.
static FILENAMES: phf::Map<&'static str, Language> = phf::phf_map! {
    "rakefile" => Language::Ruby,
    "gemfile" => Language::Ruby,
    ".bashrc" => Language::Shell,
    ".zshrc" => Language::Shell,
};

impl Language {
    /// Every language, in declaration order.
    pub const ALL: &'static [Language] = &[
        Language::TypeScript,
        Language::JavaScript,
        Language::Python,
        Language::Go,
        Language::Rust,
        Language::Java,
        Language::CSharp,
        Language::Ruby,
        Language::Php,
        Language::Yaml,
        Language::Shell,
        Language::Hcl,
        Language::Sql,
        Language::Markdown,
        Language::Dockerfile,
        Language::Toml,
        Language::Json,
        Language::C,
        Language::Cpp,
        Language::Kotlin,
        Language::Swift,
        Language::Scala,
        Language::Lua,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Yaml => "yaml",
            Language::Shell => "shell",
            Language::Hcl => "hcl",
            Language::Sql => "sql",
            Language::Markdown => "markdown",
            Language::Dockerfile => "dockerfile",
            Language::Toml => "toml",
            Language::Json => "json",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Scala => "scala",
            Language::Lua => "lua",
        }
    }

    /// Whether a tree-sitter extractor produces full symbol tables for this language.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Language::TypeScript
                | Language::JavaScript
                | Language::Python
                | Language::Go
                | Language::Rust
                | Language::Java
                | Language::CSharp
                | Language::Ruby
                | Language::Php
        )
    }

    /// Whether files of this language are program code (as opposed to docs or config).
    pub fn is_code(&self) -> bool {
        !matches!(
            self,
            Language::Yaml
                | Language::Markdown
                | Language::Toml
                | Language::Json
                | Language::Dockerfile
                | Language::Hcl
                | Language::Sql
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.as_str() == lower)
            .ok_or_else(|| format!("unknown language: {}", s))
    }
}

/// Detect the language of a file from its path.
///
/// Only the final path component is inspected; no I/O happens.
pub fn detect(file_path: &str) -> Option<Language> {
    let file_name = file_path.rsplit(['/', '\\']).next().unwrap_or(file_path);
    let lower = file_name.to_lowercase();

    if lower == "dockerfile" || lower.starts_with("dockerfile.") || lower.starts_with("dockerfile-") {
        return Some(Language::Dockerfile);
    }

    if let Some(lang) = FILENAMES.get(lower.as_str()) {
        return Some(*lang);
    }

    let (stem, ext) = lower.rsplit_once('.')?;
    if stem.is_empty() {
        // Dotfiles such as `.gitignore` have no extension.
        return None;
    }
    EXTENSIONS.get(ext).copied()
}

/// Return the lowercase extension of a path, if any.
pub fn extension(file_path: &str) -> Option<&str> {
    let file_name = file_path.rsplit('/').next().unwrap_or(file_path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => Some(ext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect("src/index.ts"), Some(Language::TypeScript));
        assert_eq!(detect("src/App.tsx"), Some(Language::TypeScript));
        assert_eq!(detect("lib/util.mjs"), Some(Language::JavaScript));
        assert_eq!(detect("pkg/main.go"), Some(Language::Go));
        assert_eq!(detect("app/models/user.rb"), Some(Language::Ruby));
        assert_eq!(detect("infra/main.tf"), Some(Language::Hcl));
        assert_eq!(detect("docs/README.MD"), Some(Language::Markdown));
    }

    #[test]
    fn test_detect_dockerfile_variants() {
        assert_eq!(detect("Dockerfile"), Some(Language::Dockerfile));
        assert_eq!(detect("deploy/Dockerfile.prod"), Some(Language::Dockerfile));
        assert_eq!(detect("deploy/api.dockerfile"), Some(Language::Dockerfile));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect("LICENSE"), None);
        assert_eq!(detect(".gitignore"), None);
        assert_eq!(detect("image.png"), None);
    }

    #[test]
    fn test_detect_well_known_filenames() {
        assert_eq!(detect("Rakefile"), Some(Language::Ruby));
        assert_eq!(detect("app/Gemfile"), Some(Language::Ruby));
        assert_eq!(detect(".bashrc"), Some(Language::Shell));
        // Make syntax is not shell.
        assert_eq!(detect("Makefile"), None);
        assert_eq!(detect("build/makefile"), None);
    }

    #[test]
    fn test_round_trip_names() {
        for lang in Language::ALL {
            assert_eq!(lang.as_str().parse::<Language>(), Ok(*lang));
        }
    }
}
