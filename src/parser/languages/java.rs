//! Java extractor.
//!
//! Members without an access modifier are package-private and reported as
//! `internal`; interface members are implicitly public. Only `public`
//! top-level types are exported.

use tree_sitter::{Language as TsLanguage, Node};

use crate::error::ParseError;
use crate::language::Language;
use crate::model::{DocComment, Import, ImportSpecifier, Parameter, Returns, Symbol, SymbolKind, Visibility};
use crate::parser::docs::tags;
use crate::parser::treesitter::{self, named_children, Grammar, ParsedFile};
use crate::parser::{LanguageParser, ModuleBuilder, ParseOutput};

fn java_language() -> TsLanguage {
    tree_sitter_java::LANGUAGE.into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Package,
    Import,
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
    Method,
    Constructor,
    Field,
    EnumConstant,
    Other,
}

impl NodeKind {
    fn from_kind(kind: &str) -> Self {
        match kind {
            "package_declaration" => NodeKind::Package,
            "import_declaration" => NodeKind::Import,
            "class_declaration" => NodeKind::Class,
            "interface_declaration" => NodeKind::Interface,
            "enum_declaration" => NodeKind::Enum,
            "record_declaration" => NodeKind::Record,
            "annotation_type_declaration" => NodeKind::Annotation,
            "method_declaration" | "annotation_type_element_declaration" => NodeKind::Method,
            "constructor_declaration" | "compact_constructor_declaration" => NodeKind::Constructor,
            "field_declaration" | "constant_declaration" => NodeKind::Field,
            "enum_constant" => NodeKind::EnumConstant,
            _ => NodeKind::Other,
        }
    }

    fn is_type(&self) -> bool {
        matches!(
            self,
            NodeKind::Class | NodeKind::Interface | NodeKind::Enum | NodeKind::Record | NodeKind::Annotation
        )
    }
}

pub struct JavaParser {
    grammar: Grammar,
}

impl JavaParser {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::new(java_language),
        }
    }
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for JavaParser {
    fn language(&self) -> Language {
        Language::Java
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let tree = self.grammar.parse(content)?;
        let root = tree.root_node();

        let mut extractor = Extractor {
            file: ParsedFile::new(content, file_path),
            builder: ModuleBuilder::new(file_path),
        };

        for child in named_children(root) {
            let kind = NodeKind::from_kind(child.kind());
            match kind {
                NodeKind::Package => {
                    let doc = extractor.docs_for(child);
                    extractor.builder.set_module_doc(doc);
                }
                NodeKind::Import => extractor.visit_import(child),
                k if k.is_type() => {
                    extractor.visit_type(child, k, None);
                }
                _ => {}
            }
        }

        extractor.builder.export_flagged_symbols();
        Ok(extractor.builder.finish())
    }
}

fn modifiers(node: Node) -> Option<Node> {
    named_children(node).into_iter().find(|c| c.kind() == "modifiers")
}

fn is_comment(kind: &str) -> bool {
    kind == "block_comment" || kind == "line_comment"
}

struct Extractor<'a> {
    file: ParsedFile<'a>,
    builder: ModuleBuilder,
}

impl<'a> Extractor<'a> {
    /// Javadoc directly above a declaration.
    fn docs_for(&self, node: Node) -> Option<DocComment> {
        let comments = self.file.leading_comments(node, is_comment, &[]);
        let last = comments.last()?;
        let text = self.file.text(*last);
        if !text.starts_with("/**") {
            return None;
        }
        tags::parse_block(text)
    }

    fn visibility(node: Node, default: Visibility) -> Visibility {
        let Some(mods) = modifiers(node) else {
            return default;
        };
        ["public", "protected", "private"]
            .iter()
            .find(|kw| treesitter::has_token(mods, kw))
            .and_then(|kw| Visibility::from_keyword(kw))
            .unwrap_or(default)
    }

    fn annotations(&self, node: Node) -> Vec<String> {
        let Some(mods) = modifiers(node) else {
            return Vec::new();
        };
        named_children(mods)
            .into_iter()
            .filter(|c| c.kind() == "marker_annotation" || c.kind() == "annotation")
            .map(|c| treesitter::collapse_whitespace(self.file.text(c)))
            .collect()
    }

    fn symbol(&self, name: &str, kind: SymbolKind, node: Node, visibility: Visibility) -> Symbol {
        let mut symbol = Symbol::new(name, kind, self.file.location(node));
        symbol.visibility = visibility;
        symbol.decorators = self.annotations(node);
        symbol.docs = self.docs_for(node);
        let deprecated = symbol
            .decorators
            .iter()
            .any(|d| d == "@Deprecated" || d.starts_with("@Deprecated("));
        if deprecated {
            let docs = symbol.docs.get_or_insert_with(DocComment::default);
            docs.deprecated.get_or_insert_with(String::new);
        }
        symbol
    }

    fn type_parameters(&self, node: Node) -> Vec<String> {
        node.child_by_field_name("type_parameters")
            .map(|tp| {
                named_children(tp)
                    .into_iter()
                    .filter(|p| p.kind() == "type_parameter")
                    .map(|p| treesitter::collapse_whitespace(self.file.text(p)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `import a.b.C;`, `import static a.b.C.m;`, `import a.b.*;`
    fn visit_import(&mut self, node: Node) {
        let Some(path) = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "scoped_identifier" || c.kind() == "identifier")
        else {
            return;
        };
        let path = self.file.text(path);
        let wildcard = named_children(node).iter().any(|c| c.kind() == "asterisk");

        let mut import = Import::new(path);
        if wildcard {
            import.specifiers.push(ImportSpecifier::namespace("*"));
        } else {
            let name = path.rsplit('.').next().unwrap_or(path);
            import.specifiers.push(ImportSpecifier::named(name));
        }
        self.builder.import(import);
    }

    fn type_list(&self, node: Node) -> Vec<String> {
        let list = named_children(node).into_iter().find(|c| c.kind() == "type_list");
        list.map(|l| {
            named_children(l)
                .into_iter()
                .map(|t| treesitter::collapse_whitespace(self.file.text(t)))
                .collect()
        })
        .unwrap_or_default()
    }

    /// A type declaration, top-level when `parent` is `None`.
    fn visit_type(&mut self, node: Node, kind: NodeKind, parent: Option<(&str, bool)>) -> Option<String> {
        let name = self.file.field_text(node, "name")?;
        let symbol_kind = match kind {
            NodeKind::Interface | NodeKind::Annotation => SymbolKind::Interface,
            NodeKind::Enum => SymbolKind::Enum,
            _ => SymbolKind::Class,
        };
        let default = match parent {
            Some((_, true)) => Visibility::Public,
            _ => Visibility::Internal,
        };

        let mut symbol = self.symbol(name, symbol_kind, node, Self::visibility(node, default));
        symbol.type_parameters = self.type_parameters(node);
        symbol.signature = Some(self.file.signature(node, node.child_by_field_name("body")));

        if let Some(superclass) = node.child_by_field_name("superclass") {
            symbol.extends = named_children(superclass)
                .first()
                .map(|t| treesitter::collapse_whitespace(self.file.text(*t)));
        }
        if let Some(interfaces) = node.child_by_field_name("interfaces") {
            symbol.implements = self.type_list(interfaces);
        }
        if let Some(extends) = named_children(node).into_iter().find(|c| c.kind() == "extends_interfaces") {
            symbol.implements = self.type_list(extends);
        }

        let id = match parent {
            None => {
                symbol.exported = symbol.visibility == Visibility::Public;
                self.builder.add(symbol)
            }
            Some((parent_id, _)) => self.builder.add_member(parent_id, symbol),
        };

        // Nested types are recorded but not descended into.
        if parent.is_none() {
            if let Some(body) = node.child_by_field_name("body") {
                self.visit_body(&id, body, kind == NodeKind::Interface || kind == NodeKind::Annotation);
            }
            if kind == NodeKind::Record {
                self.visit_record_components(&id, node);
            }
        }
        Some(id)
    }

    fn visit_body(&mut self, type_id: &str, body: Node, in_interface: bool) {
        let default = if in_interface {
            Visibility::Public
        } else {
            Visibility::Internal
        };
        for member in named_children(body) {
            let kind = NodeKind::from_kind(member.kind());
            match kind {
                NodeKind::Method | NodeKind::Constructor => self.visit_method(type_id, member, kind, default),
                NodeKind::Field => self.visit_field(type_id, member, default, in_interface),
                NodeKind::EnumConstant => {
                    if let Some(name) = self.file.field_text(member, "name") {
                        let mut symbol = self.symbol(name, SymbolKind::Constant, member, Visibility::Public);
                        symbol.signature = Some(treesitter::collapse_whitespace(self.file.text(member)));
                        self.builder.add_member(type_id, symbol);
                    }
                }
                k if k.is_type() => {
                    self.visit_type(member, k, Some((type_id, in_interface)));
                }
                // enum constants come first, then ordinary members
                _ if member.kind() == "enum_body_declarations" => self.visit_body(type_id, member, in_interface),
                _ => {}
            }
        }
    }

    fn visit_method(&mut self, type_id: &str, node: Node, kind: NodeKind, default: Visibility) {
        let Some(name) = self.file.field_text(node, "name") else {
            return;
        };
        let mut symbol = self.symbol(name, SymbolKind::Method, node, Self::visibility(node, default));
        symbol.type_parameters = self.type_parameters(node);
        symbol.parameters = self.parameters(node.child_by_field_name("parameters"));
        if kind == NodeKind::Method {
            symbol.returns = node.child_by_field_name("type").map(|t| Returns {
                type_name: Some(treesitter::collapse_whitespace(self.file.text(t))),
            });
        }
        symbol.signature = Some(self.file.signature(node, node.child_by_field_name("body")));
        self.builder.add_member(type_id, symbol);
    }

    fn parameters(&self, list: Option<Node>) -> Vec<Parameter> {
        let Some(list) = list else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for param in named_children(list) {
            match param.kind() {
                "formal_parameter" => {
                    let Some(name) = self.file.field_text(param, "name") else {
                        continue;
                    };
                    out.push(Parameter {
                        name: name.to_string(),
                        type_name: param
                            .child_by_field_name("type")
                            .map(|t| treesitter::collapse_whitespace(self.file.text(t))),
                        ..Default::default()
                    });
                }
                "spread_parameter" => {
                    let children = named_children(param);
                    let type_name = children
                        .iter()
                        .find(|c| c.kind() != "modifiers" && c.kind() != "variable_declarator")
                        .map(|t| treesitter::collapse_whitespace(self.file.text(*t)));
                    let name = children
                        .iter()
                        .find(|c| c.kind() == "variable_declarator")
                        .and_then(|d| self.file.field_text(*d, "name"))
                        .unwrap_or("args");
                    out.push(Parameter {
                        name: name.to_string(),
                        type_name,
                        rest: true,
                        ..Default::default()
                    });
                }
                _ => {}
            }
        }
        out
    }

    fn visit_field(&mut self, type_id: &str, node: Node, default: Visibility, in_interface: bool) {
        let type_text = node
            .child_by_field_name("type")
            .map(|t| treesitter::collapse_whitespace(self.file.text(t)));
        let constant = in_interface
            || modifiers(node)
                .map(|m| treesitter::has_token(m, "static") && treesitter::has_token(m, "final"))
                .unwrap_or(false);
        let signature = self.file.signature(node, None);

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node.children_by_field_name("declarator", &mut cursor).collect();
        for declarator in declarators {
            let Some(name) = self.file.field_text(declarator, "name") else {
                continue;
            };
            let kind = if constant {
                SymbolKind::Constant
            } else {
                SymbolKind::Property
            };
            let mut symbol = self.symbol(name, kind, node, Self::visibility(node, default));
            symbol.returns = type_text.clone().map(|t| Returns { type_name: Some(t) });
            symbol.signature = Some(signature.clone());
            self.builder.add_member(type_id, symbol);
        }
    }

    /// `record Point(int x, int y)` components become properties.
    fn visit_record_components(&mut self, type_id: &str, node: Node) {
        let Some(params) = node.child_by_field_name("parameters") else {
            return;
        };
        for param in self.parameters(Some(params)) {
            let mut symbol = Symbol::new(&param.name, SymbolKind::Property, self.file.location(params));
            symbol.returns = param.type_name.clone().map(|t| Returns { type_name: Some(t) });
            self.builder.add_member(type_id, symbol);
        }
    }
}
