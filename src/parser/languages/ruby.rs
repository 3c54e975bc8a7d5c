//! Ruby extractor.
//!
//! Classes and modules nest, so member ids follow the lexical path
//! (`Acme.Client.fetch`). A bare `private`/`protected`/`public` inside a body
//! switches the visibility of the methods that follow it.

use tree_sitter::{Language as TsLanguage, Node};

use crate::error::ParseError;
use crate::language::Language;
use crate::model::{DocComment, Import, ImportSpecifier, Parameter, Symbol, SymbolKind, Visibility};
use crate::parser::docs::tags;
use crate::parser::treesitter::{self, named_children, unquote, Grammar, ParsedFile};
use crate::parser::{LanguageParser, ModuleBuilder, ParseOutput};

fn ruby_language() -> TsLanguage {
    tree_sitter_ruby::LANGUAGE.into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Class,
    Module,
    Method,
    SingletonMethod,
    Call,
    Assignment,
    /// A bare identifier statement such as `private`.
    Identifier,
    Other,
}

impl NodeKind {
    fn from_kind(kind: &str) -> Self {
        match kind {
            "class" | "singleton_class" => NodeKind::Class,
            "module" => NodeKind::Module,
            "method" => NodeKind::Method,
            "singleton_method" => NodeKind::SingletonMethod,
            "call" => NodeKind::Call,
            "assignment" => NodeKind::Assignment,
            "identifier" => NodeKind::Identifier,
            _ => NodeKind::Other,
        }
    }
}

pub struct RubyParser {
    grammar: Grammar,
}

impl RubyParser {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::new(ruby_language),
        }
    }
}

impl Default for RubyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for RubyParser {
    fn language(&self) -> Language {
        Language::Ruby
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let tree = self.grammar.parse(content)?;
        let root = tree.root_node();

        let mut extractor = Extractor {
            file: ParsedFile::new(content, file_path),
            builder: ModuleBuilder::new(file_path),
        };
        extractor.module_doc(root);
        extractor.visit_body(root, None);

        extractor.builder.export_flagged_symbols();
        Ok(extractor.builder.finish())
    }
}

fn name_access(name: &str) -> Visibility {
    if name.starts_with('_') {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

/// Magic comments are not documentation.
fn is_magic_comment(text: &str) -> bool {
    let body = text.trim_start_matches('#').trim();
    body.starts_with("frozen_string_literal:")
        || body.starts_with("encoding:")
        || body.starts_with("-*-")
        || text.starts_with("#!")
}

struct Extractor<'a> {
    file: ParsedFile<'a>,
    builder: ModuleBuilder,
}

impl<'a> Extractor<'a> {
    /// A leading comment block separated from the first statement by a blank line.
    fn module_doc(&mut self, root: Node) {
        let children = named_children(root);
        let block: Vec<Node> = children
            .iter()
            .copied()
            .take_while(|c| c.kind() == "comment")
            .filter(|c| !is_magic_comment(self.file.text(*c)))
            .collect();
        let Some(last) = block.last() else {
            return;
        };
        let detached = match last.next_named_sibling() {
            Some(next) => next.start_position().row > last.end_position().row + 1,
            None => true,
        };
        if detached {
            let lines = self.file.comment_texts(&block);
            self.builder.set_module_doc(tags::parse_hash_lines(&lines));
        }
    }

    fn docs_for(&self, node: Node) -> Option<DocComment> {
        let comments = self.file.leading_comments(node, |k| k == "comment", &[]);
        let lines: Vec<&str> = self
            .file
            .comment_texts(&comments)
            .into_iter()
            .filter(|t| !is_magic_comment(t))
            .collect();
        if lines.is_empty() {
            return None;
        }
        tags::parse_hash_lines(&lines)
    }

    fn add(&mut self, parent: Option<&str>, mut symbol: Symbol) -> String {
        match parent {
            Some(parent_id) => self.builder.add_member(parent_id, symbol),
            None => {
                symbol.exported = symbol.visibility == Visibility::Public;
                self.builder.add(symbol)
            }
        }
    }

    /// Statements of a program, class or module body.
    fn visit_body(&mut self, body: Node, parent: Option<&str>) {
        let mut current = Visibility::Public;
        for child in named_children(body) {
            match NodeKind::from_kind(child.kind()) {
                NodeKind::Class | NodeKind::Module => self.visit_container(child, parent),
                NodeKind::Method => self.visit_method(child, child, parent, current),
                NodeKind::SingletonMethod => self.visit_method(child, child, parent, Visibility::Public),
                NodeKind::Identifier => {
                    if parent.is_some() {
                        if let Some(v) = Visibility::from_keyword(self.file.text(child)) {
                            current = v;
                        }
                    }
                }
                NodeKind::Call => self.visit_call(child, parent),
                NodeKind::Assignment => self.visit_assignment(child, parent),
                NodeKind::Other => {}
            }
        }
    }

    fn visit_container(&mut self, node: Node, parent: Option<&str>) {
        let name = match node.child_by_field_name("name") {
            Some(n) => self.file.text(n),
            // `class << self`
            None => return self.visit_inner_body(node, parent),
        };
        let kind = if node.kind() == "module" {
            SymbolKind::Module
        } else {
            SymbolKind::Class
        };

        let mut symbol = Symbol::new(name, kind, self.file.location(node));
        symbol.visibility = name_access(name);
        symbol.docs = self.docs_for(node);
        symbol.extends = node
            .child_by_field_name("superclass")
            .and_then(|s| named_children(s).into_iter().next())
            .map(|s| self.file.text(s).to_string());
        symbol.signature = Some(match &symbol.extends {
            Some(base) => format!("{} {} < {}", node.kind(), name, base),
            None => format!("{} {}", node.kind(), name),
        });
        let id = self.add(parent, symbol);
        self.collect_mixins(node, &id);
        self.visit_inner_body(node, Some(&id));
    }

    fn visit_inner_body(&mut self, node: Node, parent: Option<&str>) {
        match node
            .child_by_field_name("body")
            .or_else(|| named_children(node).into_iter().find(|c| c.kind() == "body_statement"))
        {
            Some(body) => self.visit_body(body, parent),
            None => self.visit_body(node, parent),
        }
    }

    /// `include Comparable` / `extend Forwardable` land in `implements`.
    fn collect_mixins(&mut self, node: Node, id: &str) {
        let body = node
            .child_by_field_name("body")
            .or_else(|| named_children(node).into_iter().find(|c| c.kind() == "body_statement"))
            .unwrap_or(node);
        let mut mixins = Vec::new();
        for stmt in named_children(body) {
            if stmt.kind() != "call" || stmt.child_by_field_name("receiver").is_some() {
                continue;
            }
            let method = self.file.field_text(stmt, "method").unwrap_or("");
            if !matches!(method, "include" | "extend" | "prepend") {
                continue;
            }
            if let Some(args) = stmt.child_by_field_name("arguments") {
                mixins.extend(named_children(args).into_iter().map(|a| self.file.text(a).to_string()));
            }
        }
        if let Some(symbol) = self.builder.symbol_mut(id) {
            symbol.implements.extend(mixins);
        }
    }

    fn visit_method(&mut self, node: Node, doc_anchor: Node, parent: Option<&str>, visibility: Visibility) {
        let Some(name) = self.file.field_text(node, "name") else {
            return;
        };
        let singleton = node.kind() == "singleton_method";
        let kind = if parent.is_some() {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };
        let visibility = if name_access(name) == Visibility::Private {
            Visibility::Private
        } else {
            visibility
        };

        let mut symbol = Symbol::new(name, kind, self.file.location(node));
        symbol.visibility = visibility;
        symbol.docs = self.docs_for(doc_anchor);
        symbol.parameters = self.parameters(node.child_by_field_name("parameters"));
        let header_end = node
            .child_by_field_name("parameters")
            .map(|p| p.end_byte())
            .unwrap_or_else(|| node.child_by_field_name("name").map(|n| n.end_byte()).unwrap_or(node.end_byte()));
        let header = self.file.source.get(node.start_byte()..header_end).unwrap_or("");
        symbol.signature = Some(treesitter::collapse_whitespace(header));
        if singleton {
            symbol.decorators.push("self".to_string());
        }
        self.add(parent, symbol);
    }

    fn parameters(&self, list: Option<Node>) -> Vec<Parameter> {
        let Some(list) = list else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for param in named_children(list) {
            let (name, rest, default_value) = match param.kind() {
                "identifier" => (Some(self.file.text(param)), false, None),
                "optional_parameter" | "keyword_parameter" => (
                    self.file.field_text(param, "name"),
                    false,
                    self.file.field_text(param, "value").map(str::to_string),
                ),
                "splat_parameter" | "hash_splat_parameter" | "block_parameter" => {
                    (self.file.field_text(param, "name"), param.kind() != "block_parameter", None)
                }
                _ => (None, false, None),
            };
            let Some(name) = name else {
                continue;
            };
            out.push(Parameter {
                name: name.to_string(),
                optional: default_value.is_some(),
                rest,
                default_value,
                ..Default::default()
            });
        }
        out
    }

    fn visit_call(&mut self, node: Node, parent: Option<&str>) {
        if node.child_by_field_name("receiver").is_some() {
            return;
        }
        let Some(method) = self.file.field_text(node, "method") else {
            return;
        };
        let args: Vec<Node> = node
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default();

        match method {
            "require" | "require_relative" | "load" => {
                let Some(path) = args.first().filter(|a| a.kind() == "string") else {
                    return;
                };
                // Interpolated paths cannot be resolved.
                if named_children(*path).iter().any(|c| c.kind() == "interpolation") {
                    return;
                }
                let raw = unquote(self.file.text(*path));
                let source = if method == "require_relative" && !raw.starts_with('.') {
                    format!("./{}", raw)
                } else {
                    raw.to_string()
                };
                let mut import = Import::new(source);
                let local = raw.rsplit('/').next().unwrap_or(raw);
                import.specifiers.push(ImportSpecifier::namespace(local));
                self.builder.import(import);
            }
            "attr_accessor" | "attr_reader" | "attr_writer" => {
                let Some(parent_id) = parent else {
                    return;
                };
                for arg in args {
                    if !matches!(arg.kind(), "simple_symbol" | "symbol") {
                        continue;
                    }
                    let name = self.file.text(arg).trim_start_matches(':');
                    let mut symbol = Symbol::new(name, SymbolKind::Property, self.file.location(node));
                    symbol.docs = self.docs_for(node);
                    symbol.signature = Some(format!("{} :{}", method, name));
                    self.builder.add_member(parent_id, symbol);
                }
            }
            "private" | "protected" | "public" | "module_function" | "private_class_method" => {
                // `private def helper ... end`
                let visibility = Visibility::from_keyword(method).unwrap_or(Visibility::Public);
                for arg in args {
                    if matches!(arg.kind(), "method" | "singleton_method") {
                        self.visit_method(arg, node, parent, visibility);
                    }
                }
            }
            _ => {}
        }
    }

    /// `VERSION = "1.0"` at top level or in a body.
    fn visit_assignment(&mut self, node: Node, parent: Option<&str>) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "constant" {
            return;
        }
        let name = self.file.text(left);
        let mut symbol = Symbol::new(name, SymbolKind::Constant, self.file.location(node));
        symbol.docs = self.docs_for(node);
        symbol.signature = Some(treesitter::collapse_whitespace(self.file.text(node)));
        self.add(parent, symbol);
    }
}
