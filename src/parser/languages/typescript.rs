//! TypeScript and JavaScript extractor.
//!
//! Both languages share one walker; the grammars differ only in how
//! parameters and class fields are wrapped. `.tsx` files use the TSX grammar.

use std::collections::HashSet;

use tree_sitter::{Language as TsLanguage, Node};

use crate::error::ParseError;
use crate::language::{self, Language};
use crate::model::{Export, Import, ImportSpecifier, Parameter, Returns, Symbol, SymbolKind, Visibility};
use crate::parser::docs::{strip_block_comment, tags};
use crate::parser::treesitter::{self, has_token, named_children, unquote, Grammar, ParsedFile};
use crate::parser::{LanguageParser, ModuleBuilder, ParseOutput};

/// ES module imports anywhere in the file.
const IMPORT_QUERY: &str = r#"
(import_statement) @import
"#;

/// CommonJS `require("...")` calls anywhere in the file.
const REQUIRE_QUERY: &str = r#"
(call_expression
  function: (identifier) @require_func (#eq? @require_func "require")
  arguments: (arguments (string) @require_source)
) @require
"#;

fn typescript_language() -> TsLanguage {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn tsx_language() -> TsLanguage {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

fn javascript_language() -> TsLanguage {
    tree_sitter_javascript::LANGUAGE.into()
}

/// Top-level statement kinds the walker dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Import,
    Export,
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Variable,
    Namespace,
    Module,
    Ambient,
    Expression,
    Comment,
    Other,
}

impl NodeKind {
    fn from_kind(kind: &str) -> Self {
        match kind {
            "import_statement" => NodeKind::Import,
            "export_statement" => NodeKind::Export,
            "function_declaration" | "generator_function_declaration" | "function_signature" => NodeKind::Function,
            "class_declaration" | "abstract_class_declaration" => NodeKind::Class,
            "interface_declaration" => NodeKind::Interface,
            "type_alias_declaration" => NodeKind::TypeAlias,
            "enum_declaration" => NodeKind::Enum,
            "lexical_declaration" | "variable_declaration" => NodeKind::Variable,
            "internal_module" => NodeKind::Namespace,
            "module" => NodeKind::Module,
            "ambient_declaration" => NodeKind::Ambient,
            "expression_statement" => NodeKind::Expression,
            "comment" => NodeKind::Comment,
            _ => NodeKind::Other,
        }
    }
}

/// Extractor for TypeScript or JavaScript.
pub struct EcmaParser {
    language: Language,
    grammar: Grammar,
    jsx_grammar: Option<Grammar>,
}

impl EcmaParser {
    pub fn typescript() -> Self {
        Self {
            language: Language::TypeScript,
            grammar: Grammar::new(typescript_language),
            jsx_grammar: Some(Grammar::new(tsx_language)),
        }
    }

    pub fn javascript() -> Self {
        Self {
            language: Language::JavaScript,
            grammar: Grammar::new(javascript_language),
            jsx_grammar: None,
        }
    }

    fn grammar_for(&self, file_path: &str) -> &Grammar {
        match (&self.jsx_grammar, language::extension(file_path)) {
            (Some(jsx), Some(ext)) if ext.eq_ignore_ascii_case("tsx") => jsx,
            _ => &self.grammar,
        }
    }
}

impl LanguageParser for EcmaParser {
    fn language(&self) -> Language {
        self.language
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let grammar = self.grammar_for(file_path);
        let tree = grammar.parse(content)?;
        let root = tree.root_node();

        let mut extractor = Extractor {
            file: ParsedFile::new(content, file_path),
            builder: ModuleBuilder::new(file_path),
            handled_requires: HashSet::new(),
            pending_exports: Vec::new(),
        };

        for node in treesitter::query_nodes(grammar.get(), IMPORT_QUERY, "import", root, content) {
            extractor.visit_import(node);
        }

        extractor.module_doc(root);
        for child in named_children(root) {
            extractor.visit_statement(child, child, false);
        }

        for call in treesitter::query_nodes(grammar.get(), REQUIRE_QUERY, "require", root, content) {
            extractor.visit_require(call, Vec::new());
        }

        extractor.resolve_pending_exports();
        extractor.builder.export_flagged_symbols();
        Ok(extractor.builder.finish())
    }
}

struct Extractor<'a> {
    file: ParsedFile<'a>,
    builder: ModuleBuilder,
    handled_requires: HashSet<usize>,
    /// `(local, export_name, is_default)` from export clauses and `module.exports`.
    pending_exports: Vec<(String, String, bool)>,
}

impl<'a> Extractor<'a> {
    /// A leading `/** */` or `/* */` block is the module doc when it is tagged
    /// `@file`/`@fileoverview`/`@module` or separated from the next statement by a blank line.
    fn module_doc(&mut self, root: Node) {
        let children = named_children(root);
        let Some(first) = children.iter().find(|c| c.kind() != "hash_bang_line") else {
            return;
        };
        let text = self.file.text(*first);
        if first.kind() != "comment" || !text.starts_with("/*") {
            return;
        }
        let tagged = ["@file", "@fileoverview", "@module", "@packageDocumentation"]
            .iter()
            .any(|t| text.contains(t));
        let detached = match first.next_named_sibling() {
            Some(next) => next.start_position().row > first.end_position().row + 1,
            None => true,
        };
        if tagged || detached {
            self.builder.set_module_doc(tags::parse_block(text));
        }
    }

    fn docs_for(&self, anchor: Node) -> Option<crate::model::DocComment> {
        let comments = self.file.leading_comments(anchor, |k| k == "comment", &["decorator"]);
        let last = comments.last()?;
        let text = self.file.text(*last);
        if !text.starts_with("/**") {
            return None;
        }
        // The module doc block is not also a declaration doc.
        if let Some(parent) = last.parent() {
            if parent.parent().is_none() && last.prev_named_sibling().is_none() {
                let body = strip_block_comment(text);
                if ["@file", "@fileoverview", "@module"].iter().any(|t| body.contains(t)) {
                    return None;
                }
            }
        }
        tags::parse_block(text)
    }

    /// Dispatch one statement. `anchor` is the node whose leading comments hold the docs.
    fn visit_statement(&mut self, node: Node, anchor: Node, exported: bool) -> Option<String> {
        match NodeKind::from_kind(node.kind()) {
            NodeKind::Export => {
                self.visit_export(node);
                None
            }
            NodeKind::Function => self.visit_function(node, anchor, exported),
            NodeKind::Class => self.visit_class(node, anchor, exported),
            NodeKind::Interface => self.visit_interface(node, anchor, exported),
            NodeKind::TypeAlias => {
                let name = self.file.field_text(node, "name")?;
                let mut symbol = self.symbol(name, SymbolKind::Type, node, anchor, exported);
                symbol.type_parameters = self.type_parameters(node);
                symbol.signature = Some(self.file.signature(node, None));
                Some(self.builder.add(symbol))
            }
            NodeKind::Enum => {
                let name = self.file.field_text(node, "name")?;
                let mut symbol = self.symbol(name, SymbolKind::Enum, node, anchor, exported);
                symbol.signature = Some(self.file.signature(node, node.child_by_field_name("body")));
                Some(self.builder.add(symbol))
            }
            NodeKind::Variable => {
                self.visit_variables(node, anchor, exported);
                None
            }
            NodeKind::Namespace | NodeKind::Module => {
                let name = unquote(self.file.field_text(node, "name")?);
                let kind = if NodeKind::from_kind(node.kind()) == NodeKind::Namespace {
                    SymbolKind::Namespace
                } else {
                    SymbolKind::Module
                };
                let mut symbol = self.symbol(name, kind, node, anchor, exported);
                symbol.signature = Some(self.file.signature(node, node.child_by_field_name("body")));
                Some(self.builder.add(symbol))
            }
            NodeKind::Ambient => {
                let mut last = None;
                for inner in named_children(node) {
                    last = self.visit_statement(inner, anchor, exported).or(last);
                }
                last
            }
            NodeKind::Expression => {
                self.visit_commonjs(node);
                None
            }
            NodeKind::Import | NodeKind::Comment | NodeKind::Other => None,
        }
    }

    fn symbol(&self, name: &str, kind: SymbolKind, node: Node, anchor: Node, exported: bool) -> Symbol {
        let mut symbol = Symbol::new(name, kind, self.file.location(node));
        symbol.exported = exported;
        symbol.visibility = if exported { Visibility::Public } else { Visibility::Private };
        symbol.docs = self.docs_for(anchor);
        symbol.decorators = self.decorators(node);
        if anchor != node {
            symbol.decorators.extend(self.decorators(anchor));
        }
        symbol
    }

    fn decorators(&self, node: Node) -> Vec<String> {
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "decorator")
            .map(|c| self.file.text(c).trim_start_matches('@').to_string())
            .collect()
    }

    fn type_parameters(&self, node: Node) -> Vec<String> {
        let Some(params) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        named_children(params)
            .into_iter()
            .filter(|p| p.kind() == "type_parameter")
            .map(|p| {
                self.file
                    .field_text(p, "name")
                    .unwrap_or_else(|| self.file.text(p))
                    .to_string()
            })
            .collect()
    }

    fn visit_function(&mut self, node: Node, anchor: Node, exported: bool) -> Option<String> {
        let name = self.file.field_text(node, "name")?;
        let mut symbol = self.symbol(name, SymbolKind::Function, node, anchor, exported);
        self.fill_callable(&mut symbol, node, node);
        Some(self.builder.add(symbol))
    }

    /// Parameters, return type, async/generator flags and signature.
    /// `decl` is the node the signature starts at; `func` carries the parameters.
    fn fill_callable(&self, symbol: &mut Symbol, decl: Node, func: Node) {
        symbol.parameters = self.parameters(func);
        symbol.returns = func
            .child_by_field_name("return_type")
            .map(|r| Returns {
                type_name: Some(type_text(self.file.text(r))),
            });
        symbol.type_parameters = self.type_parameters(func);
        if has_token(func, "async") {
            symbol.is_async = Some(true);
        }
        if func.kind().starts_with("generator") || has_token(func, "*") {
            symbol.is_generator = Some(true);
        }
        symbol.signature = Some(self.file.signature(decl, func.child_by_field_name("body")));
    }

    fn parameters(&self, func: Node) -> Vec<Parameter> {
        if let Some(single) = func.child_by_field_name("parameter") {
            return vec![Parameter::named(self.file.text(single))];
        }
        let Some(params) = func.child_by_field_name("parameters") else {
            return Vec::new();
        };
        named_children(params)
            .into_iter()
            .filter_map(|p| self.parameter(p))
            .collect()
    }

    fn parameter(&self, node: Node) -> Option<Parameter> {
        match node.kind() {
            "required_parameter" | "optional_parameter" => {
                let pattern = node.child_by_field_name("pattern")?;
                let mut param = self.pattern_parameter(pattern);
                param.type_name = node
                    .child_by_field_name("type")
                    .map(|t| type_text(self.file.text(t)));
                param.default_value = self.file.field_text(node, "value").map(str::to_string);
                param.optional = node.kind() == "optional_parameter" || param.default_value.is_some();
                Some(param)
            }
            "assignment_pattern" => {
                let left = node.child_by_field_name("left")?;
                let mut param = self.pattern_parameter(left);
                param.default_value = self.file.field_text(node, "right").map(str::to_string);
                param.optional = true;
                Some(param)
            }
            "comment" => None,
            _ => Some(self.pattern_parameter(node)),
        }
    }

    fn pattern_parameter(&self, pattern: Node) -> Parameter {
        if pattern.kind() == "rest_pattern" {
            let inner = pattern.named_child(0).map(|n| self.file.text(n)).unwrap_or("");
            let mut param = Parameter::named(inner);
            param.rest = true;
            return param;
        }
        Parameter::named(treesitter::collapse_whitespace(self.file.text(pattern)))
    }

    fn visit_class(&mut self, node: Node, anchor: Node, exported: bool) -> Option<String> {
        let name = self.file.field_text(node, "name")?;
        let mut symbol = self.symbol(name, SymbolKind::Class, node, anchor, exported);
        symbol.type_parameters = self.type_parameters(node);
        symbol.signature = Some(self.file.signature(node, node.child_by_field_name("body")));

        if let Some(heritage) = named_children(node).into_iter().find(|c| c.kind() == "class_heritage") {
            for clause in named_children(heritage) {
                match clause.kind() {
                    "extends_clause" => {
                        symbol.extends = clause
                            .child_by_field_name("value")
                            .or_else(|| clause.named_child(0))
                            .map(|v| self.file.text(v).to_string());
                    }
                    "implements_clause" => {
                        symbol.implements = named_children(clause)
                            .into_iter()
                            .map(|t| self.file.text(t).to_string())
                            .collect();
                    }
                    // JavaScript: `class A extends B` has the expression directly.
                    _ if symbol.extends.is_none() => {
                        symbol.extends = Some(self.file.text(clause).to_string());
                    }
                    _ => {}
                }
            }
        }

        let class_id = self.builder.add(symbol);
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_class_body(&class_id, body);
        }
        Some(class_id)
    }

    fn visit_class_body(&mut self, class_id: &str, body: Node) {
        let mut pending_decorators = Vec::new();
        for member in named_children(body) {
            match member.kind() {
                "decorator" => {
                    pending_decorators.push(self.file.text(member).trim_start_matches('@').to_string());
                }
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    let Some(name) = self.file.field_text(member, "name") else {
                        continue;
                    };
                    let mut symbol = Symbol::new(name, SymbolKind::Method, self.file.location(member));
                    symbol.visibility = self.member_visibility(name, member);
                    symbol.docs = self.docs_for(member);
                    symbol.decorators = std::mem::take(&mut pending_decorators);
                    self.fill_callable(&mut symbol, member, member);
                    self.builder.add_member(class_id, symbol);
                }
                "public_field_definition" | "field_definition" => {
                    let name_node = member
                        .child_by_field_name("name")
                        .or_else(|| member.child_by_field_name("property"));
                    let Some(name) = name_node.map(|n| self.file.text(n)) else {
                        continue;
                    };
                    let mut symbol = Symbol::new(name, SymbolKind::Property, self.file.location(member));
                    symbol.visibility = self.member_visibility(name, member);
                    symbol.docs = self.docs_for(member);
                    symbol.decorators = std::mem::take(&mut pending_decorators);
                    symbol.decorators.extend(self.decorators(member));
                    symbol.signature = Some(self.file.signature(member, None));
                    self.builder.add_member(class_id, symbol);
                }
                _ => pending_decorators.clear(),
            }
        }
    }

    fn visit_interface(&mut self, node: Node, anchor: Node, exported: bool) -> Option<String> {
        let name = self.file.field_text(node, "name")?;
        let mut symbol = self.symbol(name, SymbolKind::Interface, node, anchor, exported);
        symbol.type_parameters = self.type_parameters(node);
        symbol.signature = Some(self.file.signature(node, node.child_by_field_name("body")));
        if let Some(clause) = named_children(node).into_iter().find(|c| c.kind() == "extends_type_clause") {
            let parents: Vec<&str> = named_children(clause).into_iter().map(|t| self.file.text(t)).collect();
            if !parents.is_empty() {
                symbol.extends = Some(parents.join(", "));
            }
        }

        let interface_id = self.builder.add(symbol);
        let Some(body) = node.child_by_field_name("body") else {
            return Some(interface_id);
        };
        for member in named_children(body) {
            let kind = match member.kind() {
                "property_signature" => SymbolKind::Property,
                "method_signature" => SymbolKind::Method,
                _ => continue,
            };
            let Some(name) = self.file.field_text(member, "name") else {
                continue;
            };
            let mut symbol = Symbol::new(name, kind, self.file.location(member));
            symbol.docs = self.docs_for(member);
            if kind == SymbolKind::Method {
                self.fill_callable(&mut symbol, member, member);
            } else {
                symbol.signature = Some(self.file.signature(member, None));
            }
            self.builder.add_member(&interface_id, symbol);
        }
        Some(interface_id)
    }

    fn visit_variables(&mut self, node: Node, anchor: Node, exported: bool) {
        let is_const = has_token(node, "const");
        for declarator in named_children(node) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            let value = declarator.child_by_field_name("value");

            if let Some(v) = value {
                if self.is_require_call(v) {
                    self.visit_require(v, self.binding_specifiers(name_node));
                    continue;
                }
            }
            if name_node.kind() != "identifier" {
                continue;
            }
            let name = self.file.text(name_node);

            let function = value.filter(|v| {
                matches!(
                    v.kind(),
                    "arrow_function" | "function_expression" | "function" | "generator_function"
                )
            });
            let symbol = match function {
                Some(func) => {
                    let mut symbol = self.symbol(name, SymbolKind::Function, node, anchor, exported);
                    self.fill_callable(&mut symbol, node, func);
                    symbol
                }
                None => {
                    let kind = if is_const && treesitter::is_constant_name(name) {
                        SymbolKind::Constant
                    } else {
                        SymbolKind::Variable
                    };
                    let mut symbol = self.symbol(name, kind, node, anchor, exported);
                    if let Some(t) = declarator.child_by_field_name("type") {
                        symbol.signature = Some(format!("{}: {}", name, type_text(self.file.text(t))));
                    } else {
                        symbol.signature = Some(treesitter::collapse_whitespace(self.file.text(declarator)));
                    }
                    symbol
                }
            };
            self.builder.add(symbol);
        }
    }

    fn visit_import(&mut self, node: Node) {
        let source_node = node.child_by_field_name("source").or_else(|| {
            named_children(node)
                .into_iter()
                .find(|c| c.kind() == "import_require_clause")
                .and_then(|c| c.child_by_field_name("source"))
        });
        let Some(source_node) = source_node else {
            return;
        };

        let mut import = Import::new(unquote(self.file.text(source_node)));
        import.is_type_only = has_token(node, "type");

        for child in named_children(node) {
            match child.kind() {
                "import_clause" => self.import_clause(child, &mut import),
                "import_require_clause" => {
                    if let Some(id) = child.named_child(0).filter(|n| n.kind() == "identifier") {
                        import.specifiers.push(ImportSpecifier::namespace(self.file.text(id)));
                    }
                }
                _ => {}
            }
        }
        self.builder.import(import);
    }

    fn import_clause(&self, clause: Node, import: &mut Import) {
        for part in named_children(clause) {
            match part.kind() {
                "identifier" => import.specifiers.push(ImportSpecifier {
                    name: self.file.text(part).to_string(),
                    is_default: true,
                    ..Default::default()
                }),
                "namespace_import" => {
                    if let Some(id) = part.named_child(0) {
                        import.specifiers.push(ImportSpecifier::namespace(self.file.text(id)));
                    }
                }
                "named_imports" => {
                    for spec in named_children(part) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = self.file.field_text(spec, "name") else {
                            continue;
                        };
                        import.specifiers.push(ImportSpecifier {
                            name: unquote(name).to_string(),
                            alias: self.file.field_text(spec, "alias").map(str::to_string),
                            ..Default::default()
                        });
                    }
                }
                _ => {}
            }
        }
    }

    fn is_require_call(&self, node: Node) -> bool {
        node.kind() == "call_expression"
            && self.file.field_text(node, "function") == Some("require")
            && node
                .child_by_field_name("arguments")
                .and_then(|a| a.named_child(0))
                .map(|a| a.kind() == "string")
                .unwrap_or(false)
    }

    /// Record a `require("...")` call once, with the bindings it was assigned to.
    fn visit_require(&mut self, call: Node, specifiers: Vec<ImportSpecifier>) {
        if !self.handled_requires.insert(call.start_byte()) {
            return;
        }
        let Some(source) = call
            .child_by_field_name("arguments")
            .and_then(|a| a.named_child(0))
            .map(|s| unquote(self.file.text(s)))
        else {
            return;
        };
        let mut import = Import::new(source);
        import.specifiers = specifiers;
        self.builder.import(import);
    }

    fn binding_specifiers(&self, pattern: Node) -> Vec<ImportSpecifier> {
        match pattern.kind() {
            "identifier" => vec![ImportSpecifier::namespace(self.file.text(pattern))],
            "object_pattern" => named_children(pattern)
                .into_iter()
                .filter_map(|p| match p.kind() {
                    "shorthand_property_identifier_pattern" => Some(ImportSpecifier::named(self.file.text(p))),
                    "pair_pattern" => Some(ImportSpecifier {
                        name: self.file.field_text(p, "key")?.to_string(),
                        alias: self.file.field_text(p, "value").map(str::to_string),
                        ..Default::default()
                    }),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn visit_export(&mut self, node: Node) {
        let is_default = has_token(node, "default");

        if let Some(decl) = node.child_by_field_name("declaration") {
            let id = self.visit_statement(decl, node, true);
            if is_default {
                if let Some(id) = id {
                    let name = self.builder.symbol_mut(&id).map(|s| s.name.clone()).unwrap_or_default();
                    self.builder.export(Export {
                        name,
                        is_default: true,
                        symbol_id: Some(id),
                        ..Default::default()
                    });
                }
            }
            return;
        }

        if let Some(source_node) = node.child_by_field_name("source") {
            self.visit_re_export(node, unquote(self.file.text(source_node)));
            return;
        }

        if let Some(value) = node.child_by_field_name("value") {
            let named_declaration = match value.kind() {
                "function_expression" | "function" | "generator_function" => self.visit_function(value, node, true),
                "class" => self.visit_class(value, node, true),
                _ => None,
            };
            if let Some(id) = named_declaration {
                let name = self.builder.symbol_mut(&id).map(|s| s.name.clone()).unwrap_or_default();
                self.builder.export(Export {
                    name,
                    is_default: true,
                    symbol_id: Some(id),
                    ..Default::default()
                });
            } else if value.kind() == "identifier" {
                self.mark_exported(self.file.text(value), "default", true);
            } else {
                self.builder.export(Export {
                    name: "default".to_string(),
                    is_default: true,
                    ..Default::default()
                });
            }
            return;
        }

        for clause in named_children(node).into_iter().filter(|c| c.kind() == "export_clause") {
            for spec in named_children(clause) {
                let Some(name) = self.file.field_text(spec, "name") else {
                    continue;
                };
                let alias = self.file.field_text(spec, "alias").unwrap_or(name);
                self.mark_exported(name, alias, alias == "default");
            }
        }
    }

    /// `export { a } from "./x"` / `export * from "./x"`: an export plus an import edge.
    fn visit_re_export(&mut self, node: Node, source: &str) {
        let mut import = Import::new(source);
        import.is_type_only = has_token(node, "type");

        let mut exported_any = false;
        for child in named_children(node) {
            match child.kind() {
                "export_clause" => {
                    for spec in named_children(child) {
                        let Some(name) = self.file.field_text(spec, "name") else {
                            continue;
                        };
                        let alias = self.file.field_text(spec, "alias").map(str::to_string);
                        import.specifiers.push(ImportSpecifier::named(name));
                        self.builder.export(Export {
                            name: name.to_string(),
                            alias,
                            is_re_export: true,
                            source: Some(source.to_string()),
                            ..Default::default()
                        });
                        exported_any = true;
                    }
                }
                "namespace_export" => {
                    let alias = child.named_child(0).map(|n| self.file.text(n).to_string());
                    import.specifiers.push(ImportSpecifier::namespace("*"));
                    self.builder.export(Export {
                        name: "*".to_string(),
                        alias,
                        is_re_export: true,
                        source: Some(source.to_string()),
                        ..Default::default()
                    });
                    exported_any = true;
                }
                _ => {}
            }
        }

        if !exported_any {
            import.specifiers.push(ImportSpecifier::namespace("*"));
            self.builder.export(Export {
                name: "*".to_string(),
                is_re_export: true,
                source: Some(source.to_string()),
                ..Default::default()
            });
        }
        self.builder.import(import);
    }

    /// `module.exports = ...`, `exports.name = ...`, `module.exports.name = ...`.
    fn visit_commonjs(&mut self, stmt: Node) {
        let Some(expr) = stmt.named_child(0).filter(|e| e.kind() == "assignment_expression") else {
            return;
        };
        let (Some(left), Some(right)) = (expr.child_by_field_name("left"), expr.child_by_field_name("right")) else {
            return;
        };
        let target = self.file.text(left);

        if target == "module.exports" {
            match right.kind() {
                "identifier" => self.mark_exported(self.file.text(right), "default", true),
                "object" => {
                    for prop in named_children(right) {
                        match prop.kind() {
                            "shorthand_property_identifier" => {
                                let name = self.file.text(prop);
                                self.mark_exported(name, name, false);
                            }
                            "pair" => {
                                let (Some(key), Some(value)) = (prop.child_by_field_name("key"), prop.child_by_field_name("value")) else {
                                    continue;
                                };
                                let key = unquote(self.file.text(key));
                                if value.kind() == "identifier" {
                                    self.mark_exported(self.file.text(value), key, false);
                                } else {
                                    self.builder.export(Export::named(key));
                                }
                            }
                            _ => {}
                        }
                    }
                }
                _ => self.builder.export(Export {
                    name: "default".to_string(),
                    is_default: true,
                    ..Default::default()
                }),
            }
            return;
        }

        let property = target
            .strip_prefix("module.exports.")
            .or_else(|| target.strip_prefix("exports."));
        let Some(property) = property else {
            return;
        };

        match right.kind() {
            "identifier" => self.mark_exported(self.file.text(right), property, false),
            "arrow_function" | "function_expression" | "function" => {
                let mut symbol = self.symbol(property, SymbolKind::Function, right, stmt, true);
                self.fill_callable(&mut symbol, stmt, right);
                self.builder.add(symbol);
            }
            _ => self.builder.export(Export::named(property)),
        }
    }

    /// Member visibility from an accessibility modifier or a `#private` name.
    fn member_visibility(&self, name: &str, member: Node) -> Visibility {
        if name.starts_with('#') {
            return Visibility::Private;
        }
        named_children(member)
            .into_iter()
            .find(|c| c.kind() == "accessibility_modifier")
            .and_then(|m| Visibility::from_keyword(self.file.text(m).trim()))
            .unwrap_or(Visibility::Public)
    }

    /// Queue `local` for export under `export_name`; resolved once every declaration is seen.
    fn mark_exported(&mut self, local: &str, export_name: &str, is_default: bool) {
        self.pending_exports
            .push((local.to_string(), export_name.to_string(), is_default));
    }

    /// Flag each queued local top-level symbol as exported, now that later declarations are known.
    fn resolve_pending_exports(&mut self) {
        for (local, export_name, is_default) in std::mem::take(&mut self.pending_exports) {
            let symbol_id = self.builder.find_top_level(&local).map(|s| s.id.clone());
            if let Some(id) = &symbol_id {
                if let Some(symbol) = self.builder.symbol_mut(id) {
                    symbol.exported = true;
                    symbol.visibility = Visibility::Public;
                }
            }
            let alias = if export_name != local && !is_default {
                Some(export_name)
            } else {
                None
            };
            self.builder.export(Export {
                name: local,
                alias,
                is_default,
                symbol_id,
                ..Default::default()
            });
        }
    }
}

/// `: string` -> `string`
fn type_text(annotation: &str) -> String {
    treesitter::collapse_whitespace(annotation.trim().trim_start_matches(':').trim())
}
