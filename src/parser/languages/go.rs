//! Go extractor.
//!
//! Exported identifiers start with an upper-case letter. Methods are attached
//! to their receiver type when that type is declared in the same file.

use tree_sitter::{Language as TsLanguage, Node};

use crate::error::ParseError;
use crate::language::Language;
use crate::model::{DocComment, Import, ImportSpecifier, Parameter, Returns, Symbol, SymbolKind, Visibility};
use crate::parser::docs::{line, strip_block_comment};
use crate::parser::treesitter::{self, named_children, unquote, Grammar, ParsedFile};
use crate::parser::{LanguageParser, ModuleBuilder, ParseOutput};

fn go_language() -> TsLanguage {
    tree_sitter_go::LANGUAGE.into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Package,
    Import,
    Function,
    Method,
    Type,
    Const,
    Var,
    Other,
}

impl NodeKind {
    fn from_kind(kind: &str) -> Self {
        match kind {
            "package_clause" => NodeKind::Package,
            "import_declaration" => NodeKind::Import,
            "function_declaration" => NodeKind::Function,
            "method_declaration" => NodeKind::Method,
            "type_declaration" => NodeKind::Type,
            "const_declaration" => NodeKind::Const,
            "var_declaration" => NodeKind::Var,
            _ => NodeKind::Other,
        }
    }
}

pub struct GoParser {
    grammar: Grammar,
}

impl GoParser {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::new(go_language),
        }
    }
}

impl Default for GoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for GoParser {
    fn language(&self) -> Language {
        Language::Go
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let tree = self.grammar.parse(content)?;
        let root = tree.root_node();

        let mut extractor = Extractor {
            file: ParsedFile::new(content, file_path),
            builder: ModuleBuilder::new(file_path),
        };

        let mut methods = Vec::new();
        for child in named_children(root) {
            match NodeKind::from_kind(child.kind()) {
                NodeKind::Package => {
                    let doc = extractor.docs_for(child);
                    extractor.builder.set_module_doc(doc);
                }
                NodeKind::Import => extractor.visit_import(child),
                NodeKind::Function => extractor.visit_function(child),
                // Receivers may be declared later in the file.
                NodeKind::Method => methods.push(child),
                NodeKind::Type => extractor.visit_type_declaration(child),
                NodeKind::Const => extractor.visit_values(child, "const_spec", SymbolKind::Constant),
                NodeKind::Var => extractor.visit_values(child, "var_spec", SymbolKind::Variable),
                NodeKind::Other => {}
            }
        }
        for method in methods {
            extractor.visit_method(method);
        }

        extractor.builder.export_flagged_symbols();
        Ok(extractor.builder.finish())
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

fn access(name: &str) -> Visibility {
    if is_exported(name) {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

struct Extractor<'a> {
    file: ParsedFile<'a>,
    builder: ModuleBuilder,
}

impl<'a> Extractor<'a> {
    fn docs_for(&self, node: Node) -> Option<DocComment> {
        let comments = self.file.leading_comments(node, |k| k == "comment", &[]);
        if comments.is_empty() {
            return None;
        }
        let texts = self.file.comment_texts(&comments);
        if texts.len() == 1 && texts[0].starts_with("/*") {
            let body = strip_block_comment(texts[0]);
            let lines: Vec<&str> = body.lines().collect();
            return line::parse_go(&lines);
        }
        line::parse_go(&texts)
    }

    fn symbol(&self, name: &str, kind: SymbolKind, node: Node, doc_anchor: Node) -> Symbol {
        let mut symbol = Symbol::new(name, kind, self.file.location(node));
        symbol.visibility = access(name);
        symbol.docs = self.docs_for(doc_anchor);
        symbol
    }

    fn visit_import(&mut self, decl: Node) {
        let mut specs = Vec::new();
        for child in named_children(decl) {
            match child.kind() {
                "import_spec" => specs.push(child),
                "import_spec_list" => specs.extend(named_children(child).into_iter().filter(|c| c.kind() == "import_spec")),
                _ => {}
            }
        }
        for spec in specs {
            let Some(path) = self.file.field_text(spec, "path").map(unquote) else {
                continue;
            };
            let local = self
                .file
                .field_text(spec, "name")
                .map(str::to_string)
                .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path).to_string());
            let mut import = Import::new(path);
            import.specifiers.push(ImportSpecifier::namespace(local));
            self.builder.import(import);
        }
    }

    fn fill_callable(&self, symbol: &mut Symbol, node: Node) {
        symbol.parameters = self.parameters(node.child_by_field_name("parameters"));
        symbol.returns = node.child_by_field_name("result").map(|r| Returns {
            type_name: Some(treesitter::collapse_whitespace(self.file.text(r))),
        });
        symbol.type_parameters = node
            .child_by_field_name("type_parameters")
            .map(|tp| {
                named_children(tp)
                    .into_iter()
                    .map(|p| treesitter::collapse_whitespace(self.file.text(p)))
                    .collect()
            })
            .unwrap_or_default();
        symbol.signature = Some(self.file.signature(node, node.child_by_field_name("body")));
    }

    fn parameters(&self, list: Option<Node>) -> Vec<Parameter> {
        let Some(list) = list else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for decl in named_children(list) {
            let rest = decl.kind() == "variadic_parameter_declaration";
            if !rest && decl.kind() != "parameter_declaration" {
                continue;
            }
            let type_name = decl
                .child_by_field_name("type")
                .map(|t| treesitter::collapse_whitespace(self.file.text(t)));
            let mut cursor = decl.walk();
            let names: Vec<&str> = decl
                .children_by_field_name("name", &mut cursor)
                .map(|n| self.file.text(n))
                .collect();
            if names.is_empty() {
                out.push(Parameter {
                    name: "_".to_string(),
                    type_name,
                    rest,
                    ..Default::default()
                });
                continue;
            }
            for name in names {
                out.push(Parameter {
                    name: name.to_string(),
                    type_name: type_name.clone(),
                    rest,
                    ..Default::default()
                });
            }
        }
        out
    }

    fn visit_function(&mut self, node: Node) {
        let Some(name) = self.file.field_text(node, "name") else {
            return;
        };
        let mut symbol = self.symbol(name, SymbolKind::Function, node, node);
        symbol.exported = is_exported(name);
        self.fill_callable(&mut symbol, node);
        self.builder.add(symbol);
    }

    fn visit_method(&mut self, node: Node) {
        let Some(name) = self.file.field_text(node, "name") else {
            return;
        };
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|r| named_children(r).into_iter().next())
            .and_then(|p| p.child_by_field_name("type"))
            .map(|t| receiver_type_name(self.file.text(t)));

        let mut symbol = self.symbol(name, SymbolKind::Method, node, node);
        self.fill_callable(&mut symbol, node);

        let parent_id = receiver
            .as_deref()
            .and_then(|r| self.builder.find_top_level(r))
            .map(|s| s.id.clone());
        match parent_id {
            Some(parent) => {
                self.builder.add_member(&parent, symbol);
            }
            None => {
                symbol.exported = is_exported(name) && receiver.as_deref().map(is_exported).unwrap_or(false);
                self.builder.add(symbol);
            }
        }
    }

    fn visit_type_declaration(&mut self, decl: Node) {
        let specs: Vec<Node> = named_children(decl)
            .into_iter()
            .filter(|c| c.kind() == "type_spec" || c.kind() == "type_alias")
            .collect();
        let grouped = specs.len() > 1 || treesitter::has_token(decl, "(");
        for spec in specs {
            let anchor = if grouped { spec } else { decl };
            self.visit_type_spec(spec, anchor);
        }
    }

    fn visit_type_spec(&mut self, spec: Node, anchor: Node) {
        let Some(name) = self.file.field_text(spec, "name") else {
            return;
        };
        let type_node = spec.child_by_field_name("type");
        let kind = match type_node.map(|t| t.kind()) {
            Some("struct_type") => SymbolKind::Class,
            Some("interface_type") => SymbolKind::Interface,
            _ => SymbolKind::Type,
        };

        let mut symbol = self.symbol(name, kind, spec, anchor);
        symbol.exported = is_exported(name);
        symbol.type_parameters = spec
            .child_by_field_name("type_parameters")
            .map(|tp| {
                named_children(tp)
                    .into_iter()
                    .map(|p| treesitter::collapse_whitespace(self.file.text(p)))
                    .collect()
            })
            .unwrap_or_default();
        symbol.signature = Some(match kind {
            SymbolKind::Type => format!("type {}", treesitter::collapse_whitespace(self.file.text(spec))),
            _ => format!("type {} {}", name, if kind == SymbolKind::Class { "struct" } else { "interface" }),
        });
        let type_id = self.builder.add(symbol);

        let Some(type_node) = type_node else {
            return;
        };
        match kind {
            SymbolKind::Class => self.visit_struct_fields(&type_id, type_node),
            SymbolKind::Interface => self.visit_interface_methods(&type_id, type_node),
            _ => {}
        }
    }

    fn visit_struct_fields(&mut self, type_id: &str, struct_type: Node) {
        let Some(list) = named_children(struct_type)
            .into_iter()
            .find(|c| c.kind() == "field_declaration_list")
        else {
            return;
        };
        for field in named_children(list) {
            if field.kind() != "field_declaration" {
                continue;
            }
            let type_text = field
                .child_by_field_name("type")
                .map(|t| treesitter::collapse_whitespace(self.file.text(t)))
                .unwrap_or_default();
            let mut cursor = field.walk();
            let names: Vec<&str> = field
                .children_by_field_name("name", &mut cursor)
                .map(|n| self.file.text(n))
                .collect();
            // Embedded fields are named after their type.
            let names = if names.is_empty() {
                vec![type_text.trim_start_matches('*').rsplit('.').next().unwrap_or("")]
            } else {
                names
            };
            for name in names.into_iter().filter(|n| !n.is_empty()) {
                let mut symbol = self.symbol(name, SymbolKind::Property, field, field);
                symbol.signature = Some(format!("{} {}", name, type_text));
                self.builder.add_member(type_id, symbol);
            }
        }
    }

    fn visit_interface_methods(&mut self, type_id: &str, interface: Node) {
        for member in named_children(interface) {
            if member.kind() != "method_elem" && member.kind() != "method_spec" {
                continue;
            }
            let Some(name) = self.file.field_text(member, "name") else {
                continue;
            };
            let mut symbol = self.symbol(name, SymbolKind::Method, member, member);
            self.fill_callable(&mut symbol, member);
            self.builder.add_member(type_id, symbol);
        }
    }

    fn visit_values(&mut self, decl: Node, spec_kind: &str, kind: SymbolKind) {
        let mut specs = Vec::new();
        for child in named_children(decl) {
            if child.kind() == spec_kind {
                specs.push(child);
            } else if child.kind().ends_with("_spec_list") {
                specs.extend(named_children(child).into_iter().filter(|c| c.kind() == spec_kind));
            }
        }
        let grouped = specs.len() > 1 || treesitter::has_token(decl, "(");
        for spec in specs {
            let anchor = if grouped { spec } else { decl };
            let mut cursor = spec.walk();
            let names: Vec<&str> = spec
                .children_by_field_name("name", &mut cursor)
                .map(|n| self.file.text(n))
                .collect();
            for name in names {
                if name == "_" {
                    continue;
                }
                let mut symbol = self.symbol(name, kind, spec, anchor);
                symbol.exported = is_exported(name);
                symbol.signature = Some(treesitter::collapse_whitespace(self.file.text(spec)));
                self.builder.add(symbol);
            }
        }
    }
}

/// `*Server` / `Server[T]` -> `Server`
fn receiver_type_name(text: &str) -> String {
    let t = text.trim().trim_start_matches('*');
    t.split('[').next().unwrap_or(t).trim().to_string()
}
