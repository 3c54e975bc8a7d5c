//! PHP extractor.
//!
//! Members without a visibility modifier are public. Literal
//! `require`/`include` paths and `use` clauses become imports.

use tree_sitter::{Language as TsLanguage, Node};

use crate::error::ParseError;
use crate::language::Language;
use crate::model::{DocComment, Import, ImportSpecifier, Parameter, Returns, Symbol, SymbolKind, Visibility};
use crate::parser::docs::tags;
use crate::parser::treesitter::{self, children, named_children, unquote, Grammar, ParsedFile};
use crate::parser::{LanguageParser, ModuleBuilder, ParseOutput};

fn php_language() -> TsLanguage {
    tree_sitter_php::LANGUAGE_PHP.into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Namespace,
    Use,
    Function,
    Class,
    Interface,
    Trait,
    Enum,
    Method,
    Property,
    Const,
    EnumCase,
    Expression,
    Other,
}

impl NodeKind {
    fn from_kind(kind: &str) -> Self {
        match kind {
            "namespace_definition" => NodeKind::Namespace,
            "namespace_use_declaration" => NodeKind::Use,
            "function_definition" => NodeKind::Function,
            "class_declaration" => NodeKind::Class,
            "interface_declaration" => NodeKind::Interface,
            "trait_declaration" => NodeKind::Trait,
            "enum_declaration" => NodeKind::Enum,
            "method_declaration" => NodeKind::Method,
            "property_declaration" => NodeKind::Property,
            "const_declaration" => NodeKind::Const,
            "enum_case" => NodeKind::EnumCase,
            "expression_statement" => NodeKind::Expression,
            _ => NodeKind::Other,
        }
    }
}

pub struct PhpParser {
    grammar: Grammar,
}

impl PhpParser {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::new(php_language),
        }
    }
}

impl Default for PhpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for PhpParser {
    fn language(&self) -> Language {
        Language::Php
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let tree = self.grammar.parse(content)?;
        let root = tree.root_node();

        let mut extractor = Extractor {
            file: ParsedFile::new(content, file_path),
            builder: ModuleBuilder::new(file_path),
        };
        extractor.module_doc(root);
        extractor.visit_statements(root);

        extractor.builder.export_flagged_symbols();
        Ok(extractor.builder.finish())
    }
}

fn modifier_words<'s>(file: &ParsedFile<'s>, node: Node) -> Vec<&'s str> {
    children(node)
        .into_iter()
        .filter_map(|c| match c.kind() {
            "visibility_modifier" => Some(file.text(c).trim()),
            "abstract_modifier" => Some("abstract"),
            "static_modifier" => Some("static"),
            "final_modifier" => Some("final"),
            "readonly_modifier" => Some("readonly"),
            _ => None,
        })
        .collect()
}

fn visibility_of(words: &[&str]) -> Visibility {
    words
        .iter()
        .find_map(|w| Visibility::from_keyword(&w.to_ascii_lowercase()))
        .unwrap_or(Visibility::Public)
}

/// `$name` -> `name`
fn variable_name(text: &str) -> &str {
    text.trim_start_matches('$')
}

struct Extractor<'a> {
    file: ParsedFile<'a>,
    builder: ModuleBuilder,
}

impl<'a> Extractor<'a> {
    /// The file docblock: the first `/** */` comment when it is detached from
    /// the next statement or followed by a namespace or use clause.
    fn module_doc(&mut self, root: Node) {
        let Some(first) = named_children(root).into_iter().find(|c| c.kind() != "php_tag") else {
            return;
        };
        let text = self.file.text(first);
        if first.kind() != "comment" || !text.starts_with("/**") {
            return;
        }
        let standalone = match first.next_named_sibling() {
            Some(next) => {
                next.start_position().row > first.end_position().row + 1
                    || matches!(next.kind(), "namespace_definition" | "namespace_use_declaration" | "comment")
            }
            None => true,
        };
        if standalone {
            self.builder.set_module_doc(tags::parse_block(text));
        }
    }

    fn docs_for(&self, node: Node) -> Option<DocComment> {
        let comments = self.file.leading_comments(node, |k| k == "comment", &[]);
        let last = comments.last()?;
        let text = self.file.text(*last);
        if !text.starts_with("/**") {
            return None;
        }
        // The file docblock is not also a declaration doc.
        if last.prev_named_sibling().map(|p| p.kind() == "php_tag").unwrap_or(false)
            && last.next_named_sibling().map(|n| n.id() != node.id()).unwrap_or(false)
        {
            return None;
        }
        tags::parse_block(text)
    }

    fn symbol(&self, name: &str, kind: SymbolKind, node: Node, visibility: Visibility) -> Symbol {
        let mut symbol = Symbol::new(name, kind, self.file.location(node));
        symbol.visibility = visibility;
        symbol.docs = self.docs_for(node);
        symbol.decorators = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "attribute_list")
            .map(|c| treesitter::collapse_whitespace(self.file.text(c)))
            .collect();
        symbol
    }

    fn visit_statements(&mut self, container: Node) {
        for child in named_children(container) {
            match NodeKind::from_kind(child.kind()) {
                NodeKind::Namespace => self.visit_namespace(child),
                NodeKind::Use => self.visit_use(child),
                NodeKind::Function => self.visit_function(child, None),
                NodeKind::Class | NodeKind::Interface | NodeKind::Trait | NodeKind::Enum => self.visit_type(child),
                NodeKind::Const => self.visit_const(child, None),
                NodeKind::Expression => self.visit_include(child),
                _ => {}
            }
        }
    }

    fn visit_namespace(&mut self, node: Node) {
        let name = self.file.field_text(node, "name").unwrap_or("");
        if !name.is_empty() {
            let mut symbol = Symbol::new(name, SymbolKind::Namespace, self.file.location(node));
            symbol.docs = self.docs_for(node);
            symbol.signature = Some(format!("namespace {}", name));
            self.builder.add(symbol);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_statements(body);
        }
    }

    /// `use A\B;`, `use A\B as C;`, `use function A\f;`, `use A\{B, C};`
    fn visit_use(&mut self, node: Node) {
        let kids = named_children(node);
        let prefix = kids
            .iter()
            .find(|c| c.kind() == "namespace_name")
            .map(|n| self.file.text(*n).to_string());

        let mut clauses: Vec<Node> = kids.iter().copied().filter(|c| c.kind() == "namespace_use_clause").collect();
        if let Some(group) = kids.iter().find(|c| c.kind() == "namespace_use_group") {
            clauses.extend(
                named_children(*group)
                    .into_iter()
                    .filter(|c| c.kind() == "namespace_use_clause" || c.kind() == "namespace_use_group_clause"),
            );
        }

        for clause in clauses {
            let parts = named_children(clause);
            let Some(target) = parts
                .iter()
                .find(|c| matches!(c.kind(), "qualified_name" | "name" | "namespace_name"))
            else {
                continue;
            };
            let path = self.file.text(*target).trim_start_matches('\\');
            let source = match &prefix {
                Some(p) => format!("{}\\{}", p.trim_start_matches('\\'), path),
                None => path.to_string(),
            };
            let alias = parts
                .iter()
                .find(|c| c.kind() == "namespace_aliasing_clause")
                .and_then(|a| named_children(*a).into_iter().last())
                .or_else(|| {
                    // newer grammars: `alias: (name)` field
                    clause.child_by_field_name("alias")
                })
                .or_else(|| {
                    if treesitter::has_token(clause, "as") {
                        parts.iter().rev().find(|c| c.kind() == "name" && c.id() != target.id()).copied()
                    } else {
                        None
                    }
                })
                .map(|a| self.file.text(a).to_string());

            let last = source.rsplit('\\').next().unwrap_or(&source).to_string();
            let mut import = Import::new(source.clone());
            import.specifiers.push(ImportSpecifier {
                name: last,
                alias,
                ..Default::default()
            });
            self.builder.import(import);
        }
    }

    /// Literal `require`/`include` expressions.
    fn visit_include(&mut self, statement: Node) {
        for expr in named_children(statement) {
            if !matches!(
                expr.kind(),
                "require_expression" | "require_once_expression" | "include_expression" | "include_once_expression"
            ) {
                continue;
            }
            let Some(arg) = named_children(expr).into_iter().find(|c| {
                matches!(c.kind(), "string" | "encapsed_string") || c.kind() == "parenthesized_expression"
            }) else {
                continue;
            };
            let arg = if arg.kind() == "parenthesized_expression" {
                match named_children(arg).into_iter().next() {
                    Some(inner) => inner,
                    None => continue,
                }
            } else {
                arg
            };
            let text = self.file.text(arg).trim();
            if !(text.starts_with('\'') || text.starts_with('"')) || text.contains('$') {
                continue;
            }
            let path = unquote(text);
            let source = if path.starts_with('.') || path.starts_with('/') {
                path.to_string()
            } else {
                format!("./{}", path)
            };
            let mut import = Import::new(source);
            let local = path.rsplit('/').next().unwrap_or(path);
            import.specifiers.push(ImportSpecifier::namespace(local));
            self.builder.import(import);
        }
    }

    fn visit_function(&mut self, node: Node, parent: Option<&str>) {
        let Some(name) = self.file.field_text(node, "name") else {
            return;
        };
        let words = modifier_words(&self.file, node);
        let kind = if parent.is_some() {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };
        let mut symbol = self.symbol(name, kind, node, visibility_of(&words));
        symbol.parameters = self.parameters(node.child_by_field_name("parameters"));
        symbol.returns = node.child_by_field_name("return_type").map(|t| Returns {
            type_name: Some(treesitter::collapse_whitespace(
                self.file.text(t).trim_start_matches(':').trim(),
            )),
        });
        symbol.is_generator = contains_yield(node).then_some(true);
        symbol.signature = Some(self.file.signature(node, node.child_by_field_name("body")));
        match parent {
            Some(parent_id) => {
                self.builder.add_member(parent_id, symbol);
            }
            None => {
                symbol.exported = true;
                self.builder.add(symbol);
            }
        }
    }

    fn parameters(&self, list: Option<Node>) -> Vec<Parameter> {
        let Some(list) = list else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for param in named_children(list) {
            if !matches!(
                param.kind(),
                "simple_parameter" | "variadic_parameter" | "property_promotion_parameter"
            ) {
                continue;
            }
            let Some(name) = self.file.field_text(param, "name") else {
                continue;
            };
            let default_value = param
                .child_by_field_name("default_value")
                .map(|d| treesitter::collapse_whitespace(self.file.text(d)));
            out.push(Parameter {
                name: variable_name(name).to_string(),
                type_name: param
                    .child_by_field_name("type")
                    .map(|t| treesitter::collapse_whitespace(self.file.text(t))),
                optional: default_value.is_some(),
                rest: param.kind() == "variadic_parameter",
                default_value,
            });
        }
        out
    }

    fn visit_type(&mut self, node: Node) {
        let Some(name) = self.file.field_text(node, "name") else {
            return;
        };
        let kind = match NodeKind::from_kind(node.kind()) {
            NodeKind::Interface | NodeKind::Trait => SymbolKind::Interface,
            NodeKind::Enum => SymbolKind::Enum,
            _ => SymbolKind::Class,
        };
        let mut symbol = self.symbol(name, kind, node, Visibility::Public);
        symbol.exported = true;

        let kids = named_children(node);
        let base_names = |kind: &str| -> Vec<String> {
            kids.iter()
                .filter(|c| c.kind() == kind)
                .flat_map(|c| named_children(*c))
                .map(|n| self.file.text(n).trim_start_matches('\\').to_string())
                .collect()
        };
        let bases = base_names("base_clause");
        let interfaces = base_names("class_interface_clause");
        if kind == SymbolKind::Interface {
            symbol.implements = bases;
        } else {
            symbol.extends = bases.into_iter().next();
            symbol.implements = interfaces;
        }

        let body = node.child_by_field_name("body");
        symbol.signature = Some(self.file.signature(node, body));
        let id = self.builder.add(symbol);

        if let Some(body) = body {
            self.visit_members(&id, body);
        }
    }

    fn visit_members(&mut self, type_id: &str, body: Node) {
        for member in named_children(body) {
            match NodeKind::from_kind(member.kind()) {
                NodeKind::Method => self.visit_function(member, Some(type_id)),
                NodeKind::Property => self.visit_property(type_id, member),
                NodeKind::Const => self.visit_const(member, Some(type_id)),
                NodeKind::EnumCase => {
                    if let Some(name) = self.file.field_text(member, "name") {
                        let mut symbol = self.symbol(name, SymbolKind::Constant, member, Visibility::Public);
                        symbol.signature = Some(self.file.signature(member, None));
                        self.builder.add_member(type_id, symbol);
                    }
                }
                // `use SomeTrait;` inside a class body
                _ if member.kind() == "use_declaration" => {
                    let traits: Vec<String> = named_children(member)
                        .into_iter()
                        .filter(|c| matches!(c.kind(), "name" | "qualified_name"))
                        .map(|c| self.file.text(c).trim_start_matches('\\').to_string())
                        .collect();
                    if let Some(symbol) = self.builder.symbol_mut(type_id) {
                        symbol.implements.extend(traits);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_property(&mut self, type_id: &str, node: Node) {
        let words = modifier_words(&self.file, node);
        let type_name = node
            .child_by_field_name("type")
            .map(|t| treesitter::collapse_whitespace(self.file.text(t)));
        let signature = self.file.signature(node, None);
        for element in named_children(node) {
            if element.kind() != "property_element" {
                continue;
            }
            let Some(var) = named_children(element).into_iter().find(|c| c.kind() == "variable_name") else {
                continue;
            };
            let name = variable_name(self.file.text(var));
            let mut symbol = self.symbol(name, SymbolKind::Property, node, visibility_of(&words));
            symbol.returns = type_name.clone().map(|t| Returns { type_name: Some(t) });
            symbol.signature = Some(signature.clone());
            self.builder.add_member(type_id, symbol);
        }
    }

    fn visit_const(&mut self, node: Node, parent: Option<&str>) {
        let words = modifier_words(&self.file, node);
        let signature = self.file.signature(node, None);
        for element in named_children(node) {
            if element.kind() != "const_element" {
                continue;
            }
            let Some(name) = named_children(element).into_iter().find(|c| c.kind() == "name") else {
                continue;
            };
            let name = self.file.text(name);
            let mut symbol = self.symbol(name, SymbolKind::Constant, node, visibility_of(&words));
            symbol.signature = Some(signature.clone());
            match parent {
                Some(parent_id) => {
                    self.builder.add_member(parent_id, symbol);
                }
                None => {
                    symbol.exported = true;
                    self.builder.add(symbol);
                }
            }
        }
    }
}

/// Whether a function body yields, skipping nested closures.
fn contains_yield(node: Node) -> bool {
    let Some(body) = node.child_by_field_name("body") else {
        return false;
    };
    let mut stack = vec![body];
    while let Some(n) = stack.pop() {
        match n.kind() {
            "yield_expression" => return true,
            "anonymous_function" | "anonymous_function_creation_expression" | "arrow_function" | "function_definition" => {
                continue
            }
            _ => stack.extend(named_children(n)),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseOutput {
        PhpParser::new().parse(source, "src/Models/User.php").unwrap()
    }

    fn find<'o>(output: &'o ParseOutput, name: &str) -> &'o Symbol {
        output
            .symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("Expected symbol {}", name))
    }

    const SOURCE: &str = r#"<?php
/**
 * User model.
 */

namespace App\Models;

use App\Contracts\Auth;
use Illuminate\Support\Str as Text;

require_once 'helpers.php';
require_once $dynamic;

/**
 * A registered user.
 */
class User extends Model implements Auth, \JsonSerializable
{
    use HasFactory;

    const ROLE = 'user';

    private string $email;

    /**
     * Rename the user.
     *
     * @param string $name new name
     * @return bool
     */
    public function rename(string $name, bool $force = false, ...$extra): bool
    {
        return true;
    }

    protected function audit() {}
}

function helper($value)
{
    yield $value;
}
"#;

    #[test]
    fn test_module_doc_and_imports() {
        let output = parse(SOURCE);
        assert_eq!(output.module_doc.as_ref().map(|d| d.summary.as_str()), Some("User model."));
        let sources: Vec<&str> = output.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["App\\Contracts\\Auth", "Illuminate\\Support\\Str", "./helpers.php"]);
        assert_eq!(output.imports[1].specifiers[0].alias.as_deref(), Some("Text"));
    }

    #[test]
    fn test_class() {
        let output = parse(SOURCE);
        assert_eq!(find(&output, "App\\Models").kind, SymbolKind::Namespace);

        let user = find(&output, "User");
        assert!(user.exported);
        assert_eq!(user.extends.as_deref(), Some("Model"));
        assert_eq!(user.implements, vec!["Auth", "JsonSerializable", "HasFactory"]);
        assert_eq!(user.docs.as_ref().map(|d| d.summary.as_str()), Some("A registered user."));

        assert_eq!(find(&output, "ROLE").kind, SymbolKind::Constant);
        let email = find(&output, "email");
        assert_eq!(email.visibility, Visibility::Private);
        assert_eq!(email.kind, SymbolKind::Property);
    }

    #[test]
    fn test_methods_and_functions() {
        let output = parse(SOURCE);
        let rename = find(&output, "rename");
        assert_eq!(rename.id, "src/Models/User.php:User.rename");
        assert_eq!(rename.visibility, Visibility::Public);
        assert_eq!(rename.returns.as_ref().and_then(|r| r.type_name.as_deref()), Some("bool"));
        let names: Vec<&str> = rename.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "force", "extra"]);
        assert_eq!(rename.parameters[0].type_name.as_deref(), Some("string"));
        assert_eq!(rename.parameters[1].default_value.as_deref(), Some("false"));
        assert!(rename.parameters[2].rest);
        assert_eq!(
            rename.docs.as_ref().and_then(|d| d.params.get("name")).map(String::as_str),
            Some("new name")
        );

        assert_eq!(find(&output, "audit").visibility, Visibility::Protected);

        let helper = find(&output, "helper");
        assert_eq!(helper.kind, SymbolKind::Function);
        assert!(helper.exported);
        assert_eq!(helper.is_generator, Some(true));
    }
}
