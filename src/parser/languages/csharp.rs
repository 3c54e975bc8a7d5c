//! C# extractor.
//!
//! Children are located by node kind rather than by field name so the walk
//! holds up across grammar revisions. Namespaces become `namespace` symbols;
//! the types inside them are still treated as top-level.

use tree_sitter::{Language as TsLanguage, Node};

use crate::error::ParseError;
use crate::language::Language;
use crate::model::{DocComment, Import, ImportSpecifier, Parameter, Returns, Symbol, SymbolKind, Visibility};
use crate::parser::docs::{strip_block_comment, tags, xml};
use crate::parser::treesitter::{self, children, named_children, Grammar, ParsedFile};
use crate::parser::{LanguageParser, ModuleBuilder, ParseOutput};

fn csharp_language() -> TsLanguage {
    tree_sitter_c_sharp::LANGUAGE.into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Using,
    Namespace,
    FileScopedNamespace,
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    Delegate,
    Method,
    Constructor,
    Property,
    Field,
    Event,
    EnumMember,
    Other,
}

impl NodeKind {
    fn from_kind(kind: &str) -> Self {
        match kind {
            "using_directive" => NodeKind::Using,
            "namespace_declaration" => NodeKind::Namespace,
            "file_scoped_namespace_declaration" => NodeKind::FileScopedNamespace,
            "class_declaration" => NodeKind::Class,
            "struct_declaration" => NodeKind::Struct,
            "interface_declaration" => NodeKind::Interface,
            "enum_declaration" => NodeKind::Enum,
            "record_declaration" | "record_struct_declaration" => NodeKind::Record,
            "delegate_declaration" => NodeKind::Delegate,
            "method_declaration" | "operator_declaration" => NodeKind::Method,
            "constructor_declaration" => NodeKind::Constructor,
            "property_declaration" | "indexer_declaration" => NodeKind::Property,
            "field_declaration" => NodeKind::Field,
            "event_field_declaration" | "event_declaration" => NodeKind::Event,
            "enum_member_declaration" => NodeKind::EnumMember,
            _ => NodeKind::Other,
        }
    }

    fn is_type(&self) -> bool {
        matches!(
            self,
            NodeKind::Class | NodeKind::Struct | NodeKind::Interface | NodeKind::Enum | NodeKind::Record | NodeKind::Delegate
        )
    }
}

pub struct CSharpParser {
    grammar: Grammar,
}

impl CSharpParser {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::new(csharp_language),
        }
    }
}

impl Default for CSharpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for CSharpParser {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let tree = self.grammar.parse(content)?;
        let root = tree.root_node();

        let mut extractor = Extractor {
            file: ParsedFile::new(content, file_path),
            builder: ModuleBuilder::new(file_path),
        };
        extractor.visit_declarations(root);

        extractor.builder.export_flagged_symbols();
        Ok(extractor.builder.finish())
    }
}

const TYPE_KINDS: &[&str] = &[
    "predefined_type",
    "identifier",
    "qualified_name",
    "generic_name",
    "array_type",
    "nullable_type",
    "tuple_type",
    "pointer_type",
    "alias_qualified_name",
];

/// Modifier keywords of a declaration.
fn modifier_words<'s>(file: &ParsedFile<'s>, node: Node) -> Vec<&'s str> {
    let mut words = Vec::new();
    for child in children(node) {
        match child.kind() {
            "modifier" => words.push(file.text(child).trim()),
            "params" | "static" | "const" | "readonly" => words.push(child.kind()),
            _ => {}
        }
    }
    words
}

fn visibility_of(words: &[&str], default: Visibility) -> Visibility {
    if words.contains(&"protected") {
        return Visibility::Protected;
    }
    words
        .iter()
        .find_map(|w| Visibility::from_keyword(w))
        .unwrap_or(default)
}

/// Name of a declaration: the `name` field, else the last identifier before `stop` kinds.
fn name_node<'t>(node: Node<'t>, stop: &[&str]) -> Option<Node<'t>> {
    if let Some(name) = node.child_by_field_name("name") {
        if name.kind() == "identifier" {
            return Some(name);
        }
    }
    let kids = children(node);
    let end = kids
        .iter()
        .position(|c| stop.contains(&c.kind()))
        .unwrap_or(kids.len());
    kids[..end].iter().rev().find(|c| c.kind() == "identifier").copied()
}

/// The type node written right before the name node.
fn type_before<'t>(node: Node<'t>, name: Node<'t>) -> Option<Node<'t>> {
    let kids = children(node);
    let pos = kids.iter().position(|c| c.id() == name.id())?;
    kids[..pos]
        .iter()
        .rev()
        .find(|c| TYPE_KINDS.contains(&c.kind()))
        .copied()
}

/// Interfaces are named `IThing` by convention.
fn looks_like_interface(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I') && chars.next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
}

struct Extractor<'a> {
    file: ParsedFile<'a>,
    builder: ModuleBuilder,
}

impl<'a> Extractor<'a> {
    /// Walk a compilation unit or namespace body.
    fn visit_declarations(&mut self, container: Node) {
        for child in named_children(container) {
            let kind = NodeKind::from_kind(child.kind());
            match kind {
                NodeKind::Using => self.visit_using(child),
                NodeKind::Namespace | NodeKind::FileScopedNamespace => self.visit_namespace(child),
                k if k.is_type() => {
                    self.visit_type(child, k, None);
                }
                _ => {}
            }
        }
    }

    fn docs_for(&self, node: Node) -> Option<DocComment> {
        let comments = self.file.leading_comments(node, |k| k == "comment", &[]);
        let texts = self.file.comment_texts(&comments);
        let xml_lines: Vec<&str> = texts.iter().copied().filter(|t| t.starts_with("///")).collect();
        if !xml_lines.is_empty() {
            return xml::parse_lines(&xml_lines);
        }
        match texts.last() {
            Some(t) if t.starts_with("/**") => {
                let body = strip_block_comment(t);
                if body.contains('<') {
                    xml::parse(&body)
                } else {
                    tags::parse_block(t)
                }
            }
            _ => None,
        }
    }

    fn attributes(&self, node: Node) -> Vec<String> {
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "attribute_list")
            .map(|c| treesitter::collapse_whitespace(self.file.text(c)))
            .collect()
    }

    fn symbol(&self, name: &str, kind: SymbolKind, node: Node, visibility: Visibility) -> Symbol {
        let mut symbol = Symbol::new(name, kind, self.file.location(node));
        symbol.visibility = visibility;
        symbol.decorators = self.attributes(node);
        symbol.docs = self.docs_for(node);
        if let Some(notice) = symbol.decorators.iter().find_map(|a| obsolete_notice(a)) {
            symbol.docs.get_or_insert_with(DocComment::default).deprecated = Some(notice);
        }
        symbol
    }

    fn type_parameters(&self, node: Node) -> Vec<String> {
        named_children(node)
            .into_iter()
            .find(|c| c.kind() == "type_parameter_list")
            .map(|list| {
                named_children(list)
                    .into_iter()
                    .map(|p| treesitter::collapse_whitespace(self.file.text(p)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `using A.B;`, `using static A.B;`, `using Alias = A.B;`
    fn visit_using(&mut self, node: Node) {
        let kids = named_children(node);
        let target = kids
            .iter()
            .rev()
            .find(|c| matches!(c.kind(), "qualified_name" | "identifier" | "alias_qualified_name" | "generic_name"));
        let Some(target) = target else {
            return;
        };
        let source = self.file.text(*target);

        let alias = kids
            .iter()
            .find(|c| c.kind() == "name_equals")
            .and_then(|ne| named_children(*ne).into_iter().find(|c| c.kind() == "identifier"))
            .or_else(|| {
                // newer grammars put the alias directly before `=`
                if treesitter::has_token(node, "=") {
                    kids.iter().find(|c| c.kind() == "identifier" && c.id() != target.id()).copied()
                } else {
                    None
                }
            })
            .map(|n| self.file.text(n).to_string());

        let mut import = Import::new(source);
        let last = source.rsplit('.').next().unwrap_or(source);
        import.specifiers.push(match alias {
            Some(alias) => ImportSpecifier {
                name: last.to_string(),
                alias: Some(alias),
                ..Default::default()
            },
            None => ImportSpecifier::namespace(last),
        });
        self.builder.import(import);
    }

    fn visit_namespace(&mut self, node: Node) {
        let Some(name) = named_children(node)
            .into_iter()
            .find(|c| matches!(c.kind(), "qualified_name" | "identifier"))
        else {
            return;
        };
        let name = self.file.text(name);

        let doc = self.docs_for(node);
        self.builder.set_module_doc(doc.clone());

        let mut symbol = Symbol::new(name, SymbolKind::Namespace, self.file.location(node));
        symbol.docs = doc;
        symbol.signature = Some(format!("namespace {}", name));
        self.builder.add(symbol);

        match named_children(node).into_iter().find(|c| c.kind() == "declaration_list") {
            Some(body) => self.visit_declarations(body),
            // file-scoped: declarations are children of the namespace node itself
            None => self.visit_declarations(node),
        }
    }

    /// A type declaration, top-level when `parent` is `None`.
    fn visit_type(&mut self, node: Node, kind: NodeKind, parent: Option<(&str, bool)>) -> Option<String> {
        let name = name_node(node, &["type_parameter_list", "parameter_list", "base_list", "declaration_list"])?;
        let name = self.file.text(name);

        let words = modifier_words(&self.file, node);
        let default = match parent {
            None => Visibility::Internal,
            Some((_, true)) => Visibility::Public,
            Some((_, false)) => Visibility::Private,
        };
        let symbol_kind = match kind {
            NodeKind::Interface => SymbolKind::Interface,
            NodeKind::Enum => SymbolKind::Enum,
            NodeKind::Delegate => SymbolKind::Type,
            _ => SymbolKind::Class,
        };

        let mut symbol = self.symbol(name, symbol_kind, node, visibility_of(&words, default));
        symbol.type_parameters = self.type_parameters(node);
        let body = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "declaration_list" || c.kind() == "enum_member_declaration_list");
        symbol.signature = Some(self.file.signature(node, body));

        if let Some(bases) = named_children(node).into_iter().find(|c| c.kind() == "base_list") {
            let mut bases: Vec<String> = named_children(bases)
                .into_iter()
                .map(|b| treesitter::collapse_whitespace(self.file.text(b)))
                .collect();
            if matches!(kind, NodeKind::Class | NodeKind::Record) {
                if let Some(pos) = bases.iter().position(|b| !looks_like_interface(b)) {
                    symbol.extends = Some(bases.remove(pos));
                }
            }
            symbol.implements = bases;
        }
        if kind == NodeKind::Delegate {
            symbol.parameters = self.parameters(node);
        }

        let id = match parent {
            None => {
                symbol.exported = symbol.visibility == Visibility::Public;
                self.builder.add(symbol)
            }
            Some((parent_id, _)) => self.builder.add_member(parent_id, symbol),
        };

        if parent.is_none() {
            if let Some(body) = body {
                self.visit_body(&id, body, kind == NodeKind::Interface);
            }
            if kind == NodeKind::Record {
                self.visit_record_parameters(&id, node);
            }
        }
        Some(id)
    }

    fn visit_body(&mut self, type_id: &str, body: Node, in_interface: bool) {
        let default = if in_interface {
            Visibility::Public
        } else {
            Visibility::Private
        };
        for member in named_children(body) {
            let kind = NodeKind::from_kind(member.kind());
            match kind {
                NodeKind::Method | NodeKind::Constructor => self.visit_method(type_id, member, kind, default),
                NodeKind::Property => self.visit_property(type_id, member, default),
                NodeKind::Field | NodeKind::Event => self.visit_field(type_id, member, default),
                NodeKind::EnumMember => {
                    if let Some(name) = name_node(member, &["="]) {
                        let name = self.file.text(name);
                        let mut symbol = self.symbol(name, SymbolKind::Constant, member, Visibility::Public);
                        symbol.signature = Some(treesitter::collapse_whitespace(self.file.text(member)));
                        self.builder.add_member(type_id, symbol);
                    }
                }
                k if k.is_type() => {
                    self.visit_type(member, k, Some((type_id, in_interface)));
                }
                _ => {}
            }
        }
    }

    fn visit_method(&mut self, type_id: &str, node: Node, kind: NodeKind, default: Visibility) {
        let Some(name) = name_node(node, &["type_parameter_list", "parameter_list"]) else {
            return;
        };
        let words = modifier_words(&self.file, node);
        let mut symbol = self.symbol(self.file.text(name), SymbolKind::Method, node, visibility_of(&words, default));
        if words.contains(&"async") {
            symbol.is_async = Some(true);
        }
        symbol.type_parameters = self.type_parameters(node);
        symbol.parameters = self.parameters(node);
        if kind == NodeKind::Method {
            symbol.returns = node
                .child_by_field_name("returns")
                .or_else(|| node.child_by_field_name("type"))
                .or_else(|| type_before(node, name))
                .map(|t| Returns {
                    type_name: Some(treesitter::collapse_whitespace(self.file.text(t))),
                });
        }
        let body = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "block" || c.kind() == "arrow_expression_clause");
        symbol.signature = Some(self.file.signature(node, body));
        self.builder.add_member(type_id, symbol);
    }

    fn parameters(&self, node: Node) -> Vec<Parameter> {
        let Some(list) = named_children(node).into_iter().find(|c| c.kind() == "parameter_list") else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for param in named_children(list) {
            if param.kind() != "parameter" && param.kind() != "parameter_array" {
                continue;
            }
            let Some(name) = name_node(param, &["equals_value_clause"]) else {
                continue;
            };
            let default_value = named_children(param)
                .into_iter()
                .find(|c| c.kind() == "equals_value_clause")
                .map(|c| {
                    let text = self.file.text(c).trim_start();
                    text.strip_prefix('=').unwrap_or(text).trim().to_string()
                });
            let rest = param.kind() == "parameter_array"
                || modifier_words(&self.file, param).contains(&"params")
                || self.file.text(param).trim_start().starts_with("params ");
            out.push(Parameter {
                name: self.file.text(name).to_string(),
                type_name: param
                    .child_by_field_name("type")
                    .or_else(|| type_before(param, name))
                    .map(|t| treesitter::collapse_whitespace(self.file.text(t))),
                optional: default_value.is_some(),
                rest,
                default_value,
            });
        }
        out
    }

    fn visit_property(&mut self, type_id: &str, node: Node, default: Visibility) {
        let stop = ["accessor_list", "arrow_expression_clause", "equals_value_clause", "bracketed_parameter_list"];
        let name = if node.kind() == "indexer_declaration" {
            None
        } else {
            name_node(node, &stop)
        };
        let name_text = name.map(|n| self.file.text(n)).unwrap_or("this[]");
        let words = modifier_words(&self.file, node);

        let mut symbol = self.symbol(name_text, SymbolKind::Property, node, visibility_of(&words, default));
        let type_node = node
            .child_by_field_name("type")
            .or_else(|| name.and_then(|n| type_before(node, n)));
        symbol.returns = type_node.map(|t| Returns {
            type_name: Some(treesitter::collapse_whitespace(self.file.text(t))),
        });
        let body = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "accessor_list" || c.kind() == "arrow_expression_clause");
        symbol.signature = Some(self.file.signature(node, body));
        self.builder.add_member(type_id, symbol);
    }

    fn visit_field(&mut self, type_id: &str, node: Node, default: Visibility) {
        let Some(declaration) = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "variable_declaration")
        else {
            return;
        };
        let words = modifier_words(&self.file, node);
        let constant = words.contains(&"const") || (words.contains(&"static") && words.contains(&"readonly"));
        let kind = if constant {
            SymbolKind::Constant
        } else {
            SymbolKind::Property
        };
        let type_text = named_children(declaration)
            .into_iter()
            .find(|c| c.kind() != "variable_declarator")
            .map(|t| treesitter::collapse_whitespace(self.file.text(t)));
        let signature = self.file.signature(node, None);

        for declarator in named_children(declaration) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name) = name_node(declarator, &["equals_value_clause", "="]) else {
                continue;
            };
            let mut symbol = self.symbol(self.file.text(name), kind, node, visibility_of(&words, default));
            symbol.returns = type_text.clone().map(|t| Returns { type_name: Some(t) });
            symbol.signature = Some(signature.clone());
            self.builder.add_member(type_id, symbol);
        }
    }

    /// `record Point(int X, int Y)` positional parameters become public properties.
    fn visit_record_parameters(&mut self, type_id: &str, node: Node) {
        for param in self.parameters(node) {
            let mut symbol = Symbol::new(&param.name, SymbolKind::Property, self.file.location(node));
            symbol.returns = param.type_name.clone().map(|t| Returns { type_name: Some(t) });
            self.builder.add_member(type_id, symbol);
        }
    }
}

/// `[Obsolete("use Y")]` -> `use Y`
fn obsolete_notice(attribute: &str) -> Option<String> {
    let inner = attribute.trim_start_matches('[').trim_end_matches(']').trim();
    let rest = inner
        .strip_prefix("Obsolete")
        .or_else(|| inner.strip_prefix("System.Obsolete"))?;
    let message = rest
        .trim()
        .strip_prefix('(')
        .and_then(|r| r.split('"').nth(1))
        .unwrap_or("");
    Some(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseOutput {
        CSharpParser::new().parse(source, "src/Billing/Invoice.cs").unwrap()
    }

    fn find<'o>(output: &'o ParseOutput, name: &str) -> &'o Symbol {
        output
            .symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("Expected symbol {}", name))
    }

    const SOURCE: &str = r#"using System;
using System.Collections.Generic;
using Json = Newtonsoft.Json;

namespace Acme.Billing
{
    /// <summary>
    /// An invoice for one customer.
    /// </summary>
    public class Invoice : EntityBase, IComparable, IDisposable
    {
        public const int MaxLines = 50;
        private readonly List<Line> lines;

        public string Number { get; set; }

        public Invoice(string number) { Number = number; }

        /// <summary>Adds a line.</summary>
        /// <param name="amount">Line amount.</param>
        /// <returns>The new total.</returns>
        public decimal Add(decimal amount, params string[] tags) { return amount; }

        [Obsolete("use Add")]
        internal async Task<bool> Legacy(int count = 1) => true;

        void Helper() {}
    }

    interface IRepository<T>
    {
        T Find(int id);
    }

    public enum Status { Draft, Paid }
}
"#;

    #[test]
    fn test_usings() {
        let output = parse(SOURCE);
        let sources: Vec<&str> = output.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["System", "System.Collections.Generic", "Newtonsoft.Json"]);
        assert_eq!(output.imports[2].specifiers[0].alias.as_deref(), Some("Json"));
    }

    #[test]
    fn test_namespace_and_class() {
        let output = parse(SOURCE);
        let ns = find(&output, "Acme.Billing");
        assert_eq!(ns.kind, SymbolKind::Namespace);
        assert!(!ns.exported);

        let invoice = find(&output, "Invoice");
        assert_eq!(invoice.kind, SymbolKind::Class);
        assert!(invoice.exported);
        assert!(invoice.parent_id.is_none());
        assert_eq!(invoice.extends.as_deref(), Some("EntityBase"));
        assert_eq!(invoice.implements, vec!["IComparable", "IDisposable"]);
        assert_eq!(
            invoice.docs.as_ref().map(|d| d.summary.as_str()),
            Some("An invoice for one customer.")
        );
    }

    #[test]
    fn test_members() {
        let output = parse(SOURCE);
        assert_eq!(find(&output, "MaxLines").kind, SymbolKind::Constant);
        assert_eq!(find(&output, "lines").visibility, Visibility::Private);
        assert_eq!(find(&output, "Number").kind, SymbolKind::Property);

        let add = find(&output, "Add");
        assert_eq!(add.id, "src/Billing/Invoice.cs:Invoice.Add");
        assert_eq!(add.returns.as_ref().and_then(|r| r.type_name.as_deref()), Some("decimal"));
        assert_eq!(add.parameters.len(), 2);
        assert_eq!(add.parameters[0].type_name.as_deref(), Some("decimal"));
        assert!(add.parameters[1].rest);
        let docs = add.docs.as_ref().unwrap();
        assert_eq!(docs.summary, "Adds a line.");
        assert_eq!(docs.params.get("amount").map(String::as_str), Some("Line amount."));

        let legacy = find(&output, "Legacy");
        assert_eq!(legacy.visibility, Visibility::Internal);
        assert_eq!(legacy.is_async, Some(true));
        assert_eq!(legacy.parameters[0].default_value.as_deref(), Some("1"));
        assert!(legacy.parameters[0].optional);
        assert_eq!(legacy.docs.as_ref().and_then(|d| d.deprecated.as_deref()), Some("use Add"));

        assert_eq!(find(&output, "Helper").visibility, Visibility::Private);
    }

    #[test]
    fn test_default_visibility() {
        let output = parse(SOURCE);
        let repo = find(&output, "IRepository");
        assert_eq!(repo.kind, SymbolKind::Interface);
        assert_eq!(repo.visibility, Visibility::Internal);
        assert_eq!(repo.type_parameters, vec!["T"]);
        assert_eq!(find(&output, "Find").visibility, Visibility::Public);

        assert_eq!(find(&output, "Status").kind, SymbolKind::Enum);
        assert_eq!(find(&output, "Paid").kind, SymbolKind::Constant);

        let exported: Vec<&str> = output.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(exported, vec!["Invoice", "Status"]);
    }

    #[test]
    fn test_obsolete_notice() {
        assert_eq!(obsolete_notice("[Obsolete(\"gone\")]").as_deref(), Some("gone"));
        assert_eq!(obsolete_notice("[Obsolete]").as_deref(), Some(""));
        assert_eq!(obsolete_notice("[Serializable]"), None);
    }
}
