//! Pluggable per-language parsers.
//!
//! This module provides:
//! - `LanguageParser` trait: turns file content into symbols, imports and exports
//! - `ParserRegistry`: the explicit parser context, built once then read-only
//! - Tree-sitter extractors for the structural languages and line-oriented
//!   extractors for config and docs formats

use std::collections::HashMap;

pub mod docs;
pub mod languages;
pub mod output;
pub mod treesitter;

pub use output::{ModuleBuilder, ParseOutput};

use crate::error::ParseError;
use crate::language::Language;

/// Extracts a uniform module model from one file.
pub trait LanguageParser: Send + Sync {
    /// The language this parser handles.
    fn language(&self) -> Language;

    /// Parse file content. `file_path` is repo-relative and becomes the prefix of symbol ids.
    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError>;
}

/// Parser lookup by language.
///
/// Built once with [`ParserRegistry::with_defaults`] and shared by reference.
/// Grammars are loaded lazily the first time a parser is used.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<Language, Box<dyn LanguageParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in parser, including the text fallback.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        languages::register_all(&mut registry);
        registry
    }

    /// Register a parser, replacing any previous one for the same language.
    pub fn register(&mut self, parser: Box<dyn LanguageParser>) {
        self.parsers.insert(parser.language(), parser);
    }

    pub fn get(&self, language: Language) -> Option<&dyn LanguageParser> {
        self.parsers.get(&language).map(|p| p.as_ref())
    }

    pub fn supports(&self, language: Language) -> bool {
        self.parsers.contains_key(&language)
    }

    /// Registered languages, sorted.
    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self.parsers.keys().copied().collect();
        langs.sort();
        langs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Symbol, SymbolKind};

    struct MockParser;

    impl LanguageParser for MockParser {
        fn language(&self) -> Language {
            Language::Lua
        }

        fn parse(&self, _content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
            let mut builder = ModuleBuilder::new(file_path);
            builder.add(Symbol::new("test", SymbolKind::Function, Location::at(file_path, 1, 1)));
            Ok(builder.finish())
        }
    }

    #[test]
    fn test_registry() {
        let mut registry = ParserRegistry::new();
        assert!(registry.get(Language::Lua).is_none());

        registry.register(Box::new(MockParser));

        let parser = registry.get(Language::Lua).unwrap();
        assert_eq!(parser.language(), Language::Lua);

        let output = parser.parse("anything", "a.lua").unwrap();
        assert_eq!(output.symbols.len(), 1);
        assert_eq!(output.symbols[0].id, "a.lua:test");
    }

    #[test]
    fn test_defaults_cover_every_language() {
        let registry = ParserRegistry::with_defaults();
        for lang in Language::ALL {
            assert!(registry.supports(*lang), "missing parser for {}", lang);
        }
    }
}
