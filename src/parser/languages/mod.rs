//! Language-specific extractors.
//!
//! Each structural module provides:
//! - A lazily loaded tree-sitter grammar
//! - A `NodeKind` mapping for the node kinds it dispatches on
//! - A `LanguageParser` implementation that walks top-level declarations
//!
//! `text` holds the line-oriented extractors and the module-summary fallback.

pub mod csharp;
pub mod go;
pub mod java;
pub mod php;
pub mod python;
pub mod ruby;
pub mod rust_lang;
pub mod text;
pub mod typescript;

use crate::language::Language;
use crate::parser::ParserRegistry;

/// Register every built-in parser. Languages without an extractor of their
/// own get the text fallback.
pub fn register_all(registry: &mut ParserRegistry) {
    registry.register(Box::new(typescript::EcmaParser::typescript()));
    registry.register(Box::new(typescript::EcmaParser::javascript()));
    registry.register(Box::new(python::PythonParser::new()));
    registry.register(Box::new(go::GoParser::new()));
    registry.register(Box::new(rust_lang::RustParser::new()));
    registry.register(Box::new(java::JavaParser::new()));
    registry.register(Box::new(csharp::CSharpParser::new()));
    registry.register(Box::new(ruby::RubyParser::new()));
    registry.register(Box::new(php::PhpParser::new()));

    registry.register(Box::new(text::YamlParser));
    registry.register(Box::new(text::ShellParser));
    registry.register(Box::new(text::HclParser));
    registry.register(Box::new(text::SqlParser));
    registry.register(Box::new(text::MarkdownParser));

    for language in Language::ALL {
        if !registry.supports(*language) {
            registry.register(Box::new(text::TextParser::new(*language)));
        }
    }
}
