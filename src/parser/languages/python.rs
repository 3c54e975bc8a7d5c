//! Python extractor.

use std::collections::HashSet;

use tree_sitter::{Language as TsLanguage, Node};

use crate::error::ParseError;
use crate::language::Language;
use crate::model::{DocComment, Import, ImportSpecifier, Parameter, Returns, Symbol, SymbolKind, Visibility};
use crate::parser::docs::docstring;
use crate::parser::treesitter::{self, has_token, named_children, unquote, Grammar, ParsedFile};
use crate::parser::{LanguageParser, ModuleBuilder, ParseOutput};

fn python_language() -> TsLanguage {
    tree_sitter_python::LANGUAGE.into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Function,
    Class,
    Decorated,
    Expression,
    Import,
    ImportFrom,
    Other,
}

impl NodeKind {
    fn from_kind(kind: &str) -> Self {
        match kind {
            "function_definition" => NodeKind::Function,
            "class_definition" => NodeKind::Class,
            "decorated_definition" => NodeKind::Decorated,
            "expression_statement" => NodeKind::Expression,
            "import_statement" => NodeKind::Import,
            "import_from_statement" | "future_import_statement" => NodeKind::ImportFrom,
            _ => NodeKind::Other,
        }
    }
}

pub struct PythonParser {
    grammar: Grammar,
}

impl PythonParser {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::new(python_language),
        }
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let tree = self.grammar.parse(content)?;
        let root = tree.root_node();

        let mut extractor = Extractor {
            file: ParsedFile::new(content, file_path),
            builder: ModuleBuilder::new(file_path),
            all: None,
        };
        extractor.all = extractor.dunder_all(root);
        extractor.builder.set_module_doc(extractor.docstring(root));

        for child in named_children(root) {
            extractor.visit_statement(child, Vec::new());
        }

        extractor.builder.export_flagged_symbols();
        Ok(extractor.builder.finish())
    }
}

struct Extractor<'a> {
    file: ParsedFile<'a>,
    builder: ModuleBuilder,
    /// Names listed in `__all__`, when the module declares it.
    all: Option<HashSet<String>>,
}

impl<'a> Extractor<'a> {
    /// Collect string entries of top-level `__all__` assignments, including
    /// `__all__ += [...]`, `__all__.extend([...])` and `__all__.append("x")`.
    fn dunder_all(&self, root: Node) -> Option<HashSet<String>> {
        let mut all: Option<HashSet<String>> = None;
        for stmt in named_children(root) {
            let Some(expr) = stmt.named_child(0) else {
                continue;
            };
            let entries = match expr.kind() {
                "assignment" if self.file.field_text(expr, "left") == Some("__all__") => {
                    // A plain assignment replaces anything collected before it.
                    all = Some(HashSet::new());
                    expr.child_by_field_name("right")
                }
                "augmented_assignment" if self.file.field_text(expr, "left") == Some("__all__") => {
                    expr.child_by_field_name("right")
                }
                "call" => self.dunder_all_call(expr),
                _ => continue,
            };
            let Some(entries) = entries else {
                continue;
            };
            all.get_or_insert_with(HashSet::new).extend(self.string_entries(entries));
        }
        all
    }

    /// Argument list of `__all__.extend(...)` / `__all__.append(...)`.
    fn dunder_all_call<'t>(&self, call: Node<'t>) -> Option<Node<'t>> {
        let function = call.child_by_field_name("function").filter(|f| f.kind() == "attribute")?;
        if self.file.field_text(function, "object") != Some("__all__") {
            return None;
        }
        match self.file.field_text(function, "attribute")? {
            "extend" | "append" => call.child_by_field_name("arguments"),
            _ => None,
        }
    }

    /// Strings in a list/tuple literal, or the string itself.
    fn string_entries(&self, node: Node) -> Vec<String> {
        if node.kind() == "string" {
            return vec![unquote(self.file.text(node)).to_string()];
        }
        named_children(node)
            .into_iter()
            .flat_map(|child| match child.kind() {
                "string" => vec![unquote(self.file.text(child)).to_string()],
                "list" | "tuple" => self.string_entries(child),
                _ => Vec::new(),
            })
            .collect()
    }

    /// Docstring of a module, class or function body.
    fn docstring(&self, block: Node) -> Option<DocComment> {
        let first = named_children(block).into_iter().find(|n| n.kind() != "comment")?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let string = first.named_child(0).filter(|n| n.kind() == "string")?;
        docstring::parse(self.file.text(string))
    }

    fn is_private_name(name: &str) -> bool {
        name.starts_with('_') && !(name.starts_with("__") && name.ends_with("__"))
    }

    /// Top-level export and visibility: `__all__` wins over the underscore rule.
    fn top_level_access(&self, name: &str) -> (bool, Visibility) {
        match &self.all {
            Some(all) if all.contains(name) => (true, Visibility::Public),
            Some(_) => {
                let vis = if Self::is_private_name(name) {
                    Visibility::Private
                } else {
                    Visibility::Public
                };
                (false, vis)
            }
            None if Self::is_private_name(name) => (false, Visibility::Private),
            None => (true, Visibility::Public),
        }
    }

    fn visit_statement(&mut self, node: Node, decorators: Vec<String>) {
        match NodeKind::from_kind(node.kind()) {
            NodeKind::Function => {
                if let Some(mut symbol) = self.function(node, SymbolKind::Function, false) {
                    let (exported, visibility) = self.top_level_access(&symbol.name);
                    symbol.exported = exported;
                    symbol.visibility = visibility;
                    symbol.decorators = decorators;
                    self.builder.add(symbol);
                }
            }
            NodeKind::Class => self.visit_class(node, decorators),
            NodeKind::Decorated => {
                let decorators = self.decorators(node);
                if let Some(def) = node.child_by_field_name("definition") {
                    self.visit_statement(def, decorators);
                }
            }
            NodeKind::Expression => {
                let Some(assign) = node.named_child(0).filter(|n| n.kind() == "assignment") else {
                    return;
                };
                if let Some(mut symbol) = self.assignment(assign, node) {
                    if symbol.name == "__all__" {
                        return;
                    }
                    let (exported, visibility) = self.top_level_access(&symbol.name);
                    symbol.exported = exported;
                    symbol.visibility = visibility;
                    self.builder.add(symbol);
                }
            }
            NodeKind::Import => self.visit_import(node),
            NodeKind::ImportFrom => self.visit_import_from(node),
            NodeKind::Other => {}
        }
    }

    fn decorators(&self, decorated: Node) -> Vec<String> {
        named_children(decorated)
            .into_iter()
            .filter(|n| n.kind() == "decorator")
            .map(|n| self.file.text(n).trim_start_matches('@').trim().to_string())
            .collect()
    }

    /// Build a function or method symbol. Visibility and export are set by the caller.
    fn function(&self, node: Node, kind: SymbolKind, is_method: bool) -> Option<Symbol> {
        let name = self.file.field_text(node, "name")?;
        let mut symbol = Symbol::new(name, kind, self.file.location(node));
        let body = node.child_by_field_name("body");

        symbol.parameters = self.parameters(node, is_method);
        symbol.returns = node.child_by_field_name("return_type").map(|t| Returns {
            type_name: Some(treesitter::collapse_whitespace(self.file.text(t))),
        });
        if has_token(node, "async") {
            symbol.is_async = Some(true);
        }
        if body.map(contains_yield).unwrap_or(false) {
            symbol.is_generator = Some(true);
        }
        let signature = self.file.signature(node, body);
        symbol.signature = Some(signature.trim_end_matches(':').trim_end().to_string());
        symbol.docs = body.and_then(|b| self.docstring(b));
        Some(symbol)
    }

    fn parameters(&self, func: Node, is_method: bool) -> Vec<Parameter> {
        let Some(params) = func.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut out: Vec<Parameter> = named_children(params)
            .into_iter()
            .filter_map(|p| self.parameter(p))
            .collect();
        if is_method && out.first().map(|p| p.name == "self" || p.name == "cls").unwrap_or(false) {
            out.remove(0);
        }
        out
    }

    fn parameter(&self, node: Node) -> Option<Parameter> {
        let type_name = node
            .child_by_field_name("type")
            .map(|t| treesitter::collapse_whitespace(self.file.text(t)));
        match node.kind() {
            "identifier" => Some(Parameter::named(self.file.text(node))),
            "typed_parameter" => {
                let inner = node.named_child(0)?;
                let mut param = self.splat(inner);
                param.type_name = type_name;
                Some(param)
            }
            "default_parameter" | "typed_default_parameter" => {
                let name = self.file.field_text(node, "name")?;
                Some(Parameter {
                    name: name.to_string(),
                    type_name,
                    optional: true,
                    rest: false,
                    default_value: self.file.field_text(node, "value").map(str::to_string),
                })
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => Some(self.splat(node)),
            _ => None,
        }
    }

    /// `*args` / `**kwargs` are rest parameters; anything else is a plain name.
    fn splat(&self, node: Node) -> Parameter {
        match node.kind() {
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                let name = node.named_child(0).map(|n| self.file.text(n)).unwrap_or("");
                let mut param = Parameter::named(name);
                param.rest = true;
                param
            }
            _ => Parameter::named(self.file.text(node)),
        }
    }

    /// A simple `name = value` or `name: type = value` assignment.
    fn assignment(&self, assign: Node, stmt: Node) -> Option<Symbol> {
        let left = assign.child_by_field_name("left")?;
        if left.kind() != "identifier" {
            return None;
        }
        let name = self.file.text(left);
        let kind = if treesitter::is_constant_name(name) {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        let mut symbol = Symbol::new(name, kind, self.file.location(stmt));
        symbol.signature = Some(match assign.child_by_field_name("type") {
            Some(t) => format!("{}: {}", name, self.file.text(t)),
            None => name.to_string(),
        });
        // A bare string right after an assignment documents it.
        symbol.docs = stmt
            .next_named_sibling()
            .filter(|n| n.kind() == "expression_statement" && n.start_position().row == stmt.end_position().row + 1)
            .and_then(|n| n.named_child(0))
            .filter(|n| n.kind() == "string")
            .and_then(|n| docstring::parse(self.file.text(n)));
        Some(symbol)
    }

    fn visit_class(&mut self, node: Node, decorators: Vec<String>) {
        let Some(name) = self.file.field_text(node, "name") else {
            return;
        };
        let mut symbol = Symbol::new(name, SymbolKind::Class, self.file.location(node));
        let (exported, visibility) = self.top_level_access(name);
        symbol.exported = exported;
        symbol.visibility = visibility;
        symbol.decorators = decorators;

        let body = node.child_by_field_name("body");
        symbol.signature = Some(
            self.file
                .signature(node, body)
                .trim_end_matches(':')
                .trim_end()
                .to_string(),
        );
        symbol.docs = body.and_then(|b| self.docstring(b));

        if let Some(supers) = node.child_by_field_name("superclasses") {
            let bases: Vec<String> = named_children(supers)
                .into_iter()
                .filter(|n| n.kind() != "keyword_argument")
                .map(|n| self.file.text(n).to_string())
                .collect();
            let mut bases = bases.into_iter();
            symbol.extends = bases.next();
            symbol.implements = bases.collect();
        }

        let class_id = self.builder.add(symbol);
        let Some(body) = body else {
            return;
        };
        for member in named_children(body) {
            let (def, decorators) = if member.kind() == "decorated_definition" {
                match member.child_by_field_name("definition") {
                    Some(def) => (def, self.decorators(member)),
                    None => continue,
                }
            } else {
                (member, Vec::new())
            };

            match def.kind() {
                "function_definition" => {
                    let is_property = decorators.iter().any(|d| d == "property" || d.ends_with(".setter"));
                    let kind = if is_property {
                        SymbolKind::Property
                    } else {
                        SymbolKind::Method
                    };
                    if let Some(mut method) = self.function(def, kind, true) {
                        method.visibility = if Self::is_private_name(&method.name) {
                            Visibility::Private
                        } else {
                            Visibility::Public
                        };
                        method.decorators = decorators;
                        self.builder.add_member(&class_id, method);
                    }
                }
                "expression_statement" => {
                    let Some(assign) = def.named_child(0).filter(|n| n.kind() == "assignment") else {
                        continue;
                    };
                    if let Some(mut field) = self.assignment(assign, def) {
                        field.kind = SymbolKind::Property;
                        field.visibility = if Self::is_private_name(&field.name) {
                            Visibility::Private
                        } else {
                            Visibility::Public
                        };
                        self.builder.add_member(&class_id, field);
                    }
                }
                _ => {}
            }
        }
    }

    /// `import a.b as c, d`
    fn visit_import(&mut self, node: Node) {
        for child in named_children(node) {
            let (module, alias) = match child.kind() {
                "dotted_name" => (self.file.text(child), None),
                "aliased_import" => match child.child_by_field_name("name") {
                    Some(n) => (self.file.text(n), self.file.field_text(child, "alias")),
                    None => continue,
                },
                _ => continue,
            };
            let mut import = Import::new(module);
            import.specifiers.push(ImportSpecifier {
                name: module.to_string(),
                alias: alias.map(str::to_string),
                is_namespace: true,
                ..Default::default()
            });
            self.builder.import(import);
        }
    }

    /// `from .models import User as U, Group` / `from x import *`
    fn visit_import_from(&mut self, node: Node) {
        let source = match node.child_by_field_name("module_name") {
            Some(m) => self.file.text(m),
            None if node.kind() == "future_import_statement" => "__future__",
            None => return,
        };
        let mut import = Import::new(source);

        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let spec = match name.kind() {
                "aliased_import" => ImportSpecifier {
                    name: self.file.field_text(name, "name").unwrap_or("").to_string(),
                    alias: self.file.field_text(name, "alias").map(str::to_string),
                    ..Default::default()
                },
                _ => ImportSpecifier::named(self.file.text(name)),
            };
            import.specifiers.push(spec);
        }
        if named_children(node).iter().any(|n| n.kind() == "wildcard_import") {
            import.specifiers.push(ImportSpecifier::namespace("*"));
        }
        self.builder.import(import);
    }
}

/// Whether a function body yields, ignoring nested functions and classes.
fn contains_yield(node: Node) -> bool {
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        match n.kind() {
            "yield" => return true,
            "function_definition" | "class_definition" | "lambda" if n != node => continue,
            _ => stack.extend(named_children(n)),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseOutput {
        PythonParser::new().parse(source, "pkg/mod.py").unwrap()
    }

    fn find<'o>(output: &'o ParseOutput, name: &str) -> &'o Symbol {
        output
            .symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("Expected symbol {}", name))
    }

    #[test]
    fn test_private_helper() {
        let output = parse("def _helper(): pass\n");
        let helper = find(&output, "_helper");
        assert_eq!(helper.visibility, Visibility::Private);
        assert!(!helper.exported);
        assert!(output.exports.is_empty());
    }

    #[test]
    fn test_dunder_all_overrides_underscore() {
        let source = "__all__ = [\"_internal\"]\n\ndef _internal(): pass\n\ndef public(): pass\n";
        let output = parse(source);
        assert!(find(&output, "_internal").exported);
        assert_eq!(find(&output, "_internal").visibility, Visibility::Public);
        assert!(!find(&output, "public").exported);
        assert!(output.symbols.iter().all(|s| s.name != "__all__"));
    }

    #[test]
    fn test_dunder_all_extended_after_assignment() {
        let source = "__all__ = [\"a\"]\n__all__ += [\"b\"]\n__all__.extend([\"c\"])\n__all__.append(\"d\")\n\n\
def a(): pass\n\ndef b(): pass\n\ndef c(): pass\n\ndef d(): pass\n\ndef e(): pass\n";
        let output = parse(source);
        for name in ["a", "b", "c", "d"] {
            assert!(find(&output, name).exported, "{} should be exported", name);
        }
        assert!(!find(&output, "e").exported);
        assert!(output.exports.iter().any(|e| e.name == "b"));
    }

    #[test]
    fn test_function_details() {
        let source = r#"
async def fetch(url: str, *args, retries: int = 3, **kwargs) -> bytes:
    """Fetch a URL.

    Args:
        url: Where to go.
    """
    yield b""
"#;
        let output = parse(source);
        let fetch = find(&output, "fetch");
        assert_eq!(fetch.is_async, Some(true));
        assert_eq!(fetch.is_generator, Some(true));
        assert_eq!(fetch.returns.as_ref().and_then(|r| r.type_name.as_deref()), Some("bytes"));
        let names: Vec<&str> = fetch.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["url", "args", "retries", "kwargs"]);
        assert_eq!(fetch.parameters[0].type_name.as_deref(), Some("str"));
        assert!(fetch.parameters[1].rest);
        assert!(fetch.parameters[2].optional);
        assert_eq!(fetch.parameters[2].default_value.as_deref(), Some("3"));
        let docs = fetch.docs.as_ref().unwrap();
        assert_eq!(docs.summary, "Fetch a URL.");
        assert_eq!(docs.params["url"], "Where to go.");
        assert_eq!(
            fetch.signature.as_deref(),
            Some("async def fetch(url: str, *args, retries: int = 3, **kwargs) -> bytes")
        );
    }

    #[test]
    fn test_class_with_methods() {
        let source = r#"
class Repo(Base, Mixin):
    """Stores things."""

    limit = 10

    def __init__(self, path):
        self.path = path

    @property
    def size(self) -> int:
        return 0

    def _scan(self):
        pass
"#;
        let output = parse(source);
        let repo = find(&output, "Repo");
        assert_eq!(repo.extends.as_deref(), Some("Base"));
        assert_eq!(repo.implements, vec!["Mixin".to_string()]);
        assert_eq!(repo.docs.as_ref().map(|d| d.summary.as_str()), Some("Stores things."));
        assert_eq!(repo.children.len(), 4);

        let init = find(&output, "__init__");
        assert_eq!(init.kind, SymbolKind::Method);
        assert_eq!(init.visibility, Visibility::Public);
        assert_eq!(init.parameters.len(), 1);
        assert_eq!(init.id, "pkg/mod.py:Repo.__init__");

        assert_eq!(find(&output, "size").kind, SymbolKind::Property);
        assert_eq!(find(&output, "_scan").visibility, Visibility::Private);
        assert_eq!(find(&output, "limit").kind, SymbolKind::Property);
    }

    #[test]
    fn test_imports_and_module_doc() {
        let source = r#""""Utilities for the app."""
import os
import numpy as np
from . import sibling
from ..core.models import User as U, Group
from typing import *
"#;
        let output = parse(source);
        assert_eq!(output.module_doc.as_ref().map(|d| d.summary.as_str()), Some("Utilities for the app."));
        let sources: Vec<&str> = output.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["os", "numpy", ".", "..core.models", "typing"]);
        assert_eq!(output.imports[1].specifiers[0].alias.as_deref(), Some("np"));
        let models = &output.imports[3];
        assert_eq!(models.specifiers[0].name, "User");
        assert_eq!(models.specifiers[0].alias.as_deref(), Some("U"));
        assert_eq!(models.specifiers[1].name, "Group");
        assert!(output.imports[4].specifiers[0].is_namespace);
    }

    #[test]
    fn test_constants() {
        let output = parse("MAX_RETRIES: int = 5\nlogger = None\n");
        assert_eq!(find(&output, "MAX_RETRIES").kind, SymbolKind::Constant);
        assert_eq!(find(&output, "MAX_RETRIES").signature.as_deref(), Some("MAX_RETRIES: int"));
        assert_eq!(find(&output, "logger").kind, SymbolKind::Variable);
    }
}
