//! Rust extractor.

use tree_sitter::{Language as TsLanguage, Node};

use crate::error::ParseError;
use crate::language::Language;
use crate::model::{DocComment, Import, ImportSpecifier, Parameter, Returns, Symbol, SymbolKind, Visibility};
use crate::parser::docs::{line, strip_block_comment};
use crate::parser::treesitter::{self, has_token, named_children, Grammar, ParsedFile};
use crate::parser::{LanguageParser, ModuleBuilder, ParseOutput};

fn rust_language() -> TsLanguage {
    tree_sitter_rust::LANGUAGE.into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Function,
    Struct,
    Enum,
    Union,
    Trait,
    Impl,
    TypeAlias,
    Const,
    Static,
    Mod,
    Use,
    Macro,
    Other,
}

impl NodeKind {
    fn from_kind(kind: &str) -> Self {
        match kind {
            "function_item" | "function_signature_item" => NodeKind::Function,
            "struct_item" => NodeKind::Struct,
            "enum_item" => NodeKind::Enum,
            "union_item" => NodeKind::Union,
            "trait_item" => NodeKind::Trait,
            "impl_item" => NodeKind::Impl,
            "type_item" => NodeKind::TypeAlias,
            "const_item" => NodeKind::Const,
            "static_item" => NodeKind::Static,
            "mod_item" => NodeKind::Mod,
            "use_declaration" => NodeKind::Use,
            "macro_definition" => NodeKind::Macro,
            _ => NodeKind::Other,
        }
    }
}

pub struct RustParser {
    grammar: Grammar,
}

impl RustParser {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::new(rust_language),
        }
    }
}

impl Default for RustParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for RustParser {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let tree = self.grammar.parse(content)?;
        let root = tree.root_node();

        let mut extractor = Extractor {
            file: ParsedFile::new(content, file_path),
            builder: ModuleBuilder::new(file_path),
        };
        let module_doc = extractor.inner_docs(root);
        extractor.builder.set_module_doc(module_doc);

        let mut impls = Vec::new();
        for child in named_children(root) {
            match NodeKind::from_kind(child.kind()) {
                // Impl blocks can precede the type they extend.
                NodeKind::Impl => impls.push(child),
                kind => extractor.visit_item(child, kind),
            }
        }
        for block in impls {
            extractor.visit_impl(block);
        }

        extractor.builder.export_flagged_symbols();
        Ok(extractor.builder.finish())
    }
}

fn is_comment(kind: &str) -> bool {
    kind == "line_comment" || kind == "block_comment"
}

struct Extractor<'a> {
    file: ParsedFile<'a>,
    builder: ModuleBuilder,
}

impl<'a> Extractor<'a> {
    /// `//!` lines at the top of the file.
    fn inner_docs(&self, root: Node) -> Option<DocComment> {
        let lines: Vec<&str> = named_children(root)
            .into_iter()
            .take_while(|n| is_comment(n.kind()))
            .map(|n| self.file.text(n).trim())
            .filter(|t| t.starts_with("//!"))
            .collect();
        if lines.is_empty() {
            return None;
        }
        line::parse_rust(&lines)
    }

    /// Outer docs (`///` or `/** */`) plus a `#[deprecated]` attribute.
    fn docs_for(&self, item: Node) -> Option<DocComment> {
        let comments = self.file.leading_comments(item, is_comment, &["attribute_item"]);
        let texts = self.file.comment_texts(&comments);
        let doc_lines: Vec<&str> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| t.starts_with("///") && !t.starts_with("////"))
            .collect();

        let mut doc = if !doc_lines.is_empty() {
            line::parse_rust(&doc_lines)
        } else {
            texts
                .iter()
                .rev()
                .find(|t| t.starts_with("/**"))
                .and_then(|t| {
                    let body = strip_block_comment(t);
                    let lines: Vec<&str> = body.lines().collect();
                    line::parse_markdown(&lines)
                })
        };

        if let Some(notice) = self.attributes(item).iter().find_map(|a| line::rust_deprecation(a)) {
            doc.get_or_insert_with(DocComment::default).deprecated = Some(notice);
        }
        doc
    }

    /// Attribute texts (`#[...]`) directly above an item.
    fn attributes(&self, item: Node) -> Vec<&'a str> {
        let mut attrs = Vec::new();
        let mut current = item.prev_sibling();
        while let Some(prev) = current {
            match prev.kind() {
                "attribute_item" => attrs.push(self.file.text(prev)),
                kind if is_comment(kind) => {}
                _ => break,
            }
            current = prev.prev_sibling();
        }
        attrs.reverse();
        attrs
    }

    fn visibility(&self, item: Node) -> Visibility {
        match named_children(item).into_iter().find(|c| c.kind() == "visibility_modifier") {
            Some(v) if self.file.text(v).trim() == "pub" => Visibility::Public,
            Some(_) => Visibility::Internal,
            None => Visibility::Private,
        }
    }

    fn symbol(&self, name: &str, kind: SymbolKind, item: Node) -> Symbol {
        let mut symbol = Symbol::new(name, kind, self.file.location(item));
        symbol.visibility = self.visibility(item);
        symbol.docs = self.docs_for(item);
        symbol.decorators = self
            .attributes(item)
            .iter()
            .map(|a| a.trim().trim_start_matches("#[").trim_end_matches(']').to_string())
            .collect();
        symbol
    }

    fn type_parameters(&self, item: Node) -> Vec<String> {
        item.child_by_field_name("type_parameters")
            .map(|tp| {
                named_children(tp)
                    .into_iter()
                    .map(|p| treesitter::collapse_whitespace(self.file.text(p)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn visit_item(&mut self, item: Node, kind: NodeKind) {
        let symbol_kind = match kind {
            NodeKind::Function => SymbolKind::Function,
            NodeKind::Struct | NodeKind::Union => SymbolKind::Class,
            NodeKind::Enum => SymbolKind::Enum,
            NodeKind::Trait => SymbolKind::Interface,
            NodeKind::TypeAlias => SymbolKind::Type,
            NodeKind::Const => SymbolKind::Constant,
            NodeKind::Static => SymbolKind::Variable,
            NodeKind::Mod => SymbolKind::Module,
            NodeKind::Macro => SymbolKind::Function,
            NodeKind::Use => {
                self.visit_use(item);
                return;
            }
            NodeKind::Impl | NodeKind::Other => return,
        };
        let Some(name) = self.file.field_text(item, "name") else {
            return;
        };

        let mut symbol = self.symbol(name, symbol_kind, item);
        let body = item.child_by_field_name("body");
        symbol.type_parameters = self.type_parameters(item);
        symbol.signature = Some(self.file.signature(item, body));
        match kind {
            NodeKind::Function => self.fill_callable(&mut symbol, item),
            NodeKind::Macro => {
                symbol.signature = Some(format!("macro_rules! {}", name));
                if symbol.decorators.iter().any(|d| d == "macro_export") {
                    symbol.visibility = Visibility::Public;
                }
            }
            NodeKind::Mod if body.is_none() => {
                let mut import = Import::new(format!("self::{}", name));
                import.specifiers.push(ImportSpecifier::namespace(name));
                self.builder.import(import);
            }
            _ => {}
        }
        // Any `pub(...)` form counts as exported.
        symbol.exported = symbol.visibility != Visibility::Private;
        let id = self.builder.add(symbol);

        let Some(body) = body else {
            return;
        };
        match kind {
            NodeKind::Struct | NodeKind::Union => self.visit_fields(&id, body),
            NodeKind::Trait => self.visit_functions(&id, body, Some(Visibility::Public)),
            _ => {}
        }
    }

    fn fill_callable(&self, symbol: &mut Symbol, item: Node) {
        if let Some(modifiers) = named_children(item).into_iter().find(|c| c.kind() == "function_modifiers") {
            if has_token(modifiers, "async") || self.file.text(modifiers).contains("async") {
                symbol.is_async = Some(true);
            }
        }
        symbol.returns = item.child_by_field_name("return_type").map(|r| Returns {
            type_name: Some(treesitter::collapse_whitespace(self.file.text(r))),
        });
        let Some(params) = item.child_by_field_name("parameters") else {
            return;
        };
        symbol.parameters = named_children(params)
            .into_iter()
            .filter_map(|p| match p.kind() {
                "parameter" => Some(Parameter {
                    name: self.file.field_text(p, "pattern").unwrap_or("_").to_string(),
                    type_name: self
                        .file
                        .field_text(p, "type")
                        .map(treesitter::collapse_whitespace),
                    ..Default::default()
                }),
                "variadic_parameter" => Some(Parameter {
                    name: "...".to_string(),
                    rest: true,
                    ..Default::default()
                }),
                _ => None,
            })
            .collect();
    }

    fn visit_fields(&mut self, parent_id: &str, body: Node) {
        for field in named_children(body) {
            if field.kind() != "field_declaration" {
                continue;
            }
            let Some(name) = self.file.field_text(field, "name") else {
                continue;
            };
            let mut symbol = self.symbol(name, SymbolKind::Property, field);
            symbol.signature = Some(treesitter::collapse_whitespace(self.file.text(field)));
            self.builder.add_member(parent_id, symbol);
        }
    }

    /// Functions inside a trait or impl body. `forced` overrides declared visibility.
    fn visit_functions(&mut self, parent_id: &str, body: Node, forced: Option<Visibility>) {
        for member in named_children(body) {
            match member.kind() {
                "function_item" | "function_signature_item" => {
                    let Some(name) = self.file.field_text(member, "name") else {
                        continue;
                    };
                    let mut symbol = self.symbol(name, SymbolKind::Method, member);
                    if let Some(vis) = forced {
                        symbol.visibility = vis;
                    }
                    self.fill_callable(&mut symbol, member);
                    symbol.signature = Some(self.file.signature(member, member.child_by_field_name("body")));
                    self.builder.add_member(parent_id, symbol);
                }
                "const_item" | "associated_type" | "type_item" => {
                    let Some(name) = self.file.field_text(member, "name") else {
                        continue;
                    };
                    let mut symbol = self.symbol(name, SymbolKind::Property, member);
                    if let Some(vis) = forced {
                        symbol.visibility = vis;
                    }
                    symbol.signature = Some(self.file.signature(member, None));
                    self.builder.add_member(parent_id, symbol);
                }
                _ => {}
            }
        }
    }

    /// `impl Type` and `impl Trait for Type`: methods join the type when it is local.
    fn visit_impl(&mut self, block: Node) {
        let Some(type_text) = self.file.field_text(block, "type") else {
            return;
        };
        let type_name = type_text.split('<').next().unwrap_or(type_text).trim();
        let trait_name = self.file.field_text(block, "trait");

        let parent_id = self.builder.find_top_level(type_name).map(|s| s.id.clone());
        let parent_id = match parent_id {
            Some(id) => {
                if let (Some(t), Some(symbol)) = (trait_name, self.builder.symbol_mut(&id)) {
                    symbol.implements.push(t.to_string());
                }
                id
            }
            None => {
                // Type lives elsewhere: record the impl block itself as a namespace.
                let mut symbol = Symbol::new(type_name, SymbolKind::Namespace, self.file.location(block));
                symbol.signature = Some(self.file.signature(block, block.child_by_field_name("body")));
                symbol.docs = self.docs_for(block);
                if let Some(t) = trait_name {
                    symbol.implements.push(t.to_string());
                }
                self.builder.add(symbol)
            }
        };

        if let Some(body) = block.child_by_field_name("body") {
            let forced = trait_name.map(|_| Visibility::Public);
            self.visit_functions(&parent_id, body, forced);
        }
    }

    fn visit_use(&mut self, decl: Node) {
        let Some(arg) = decl.child_by_field_name("argument") else {
            return;
        };
        let import = match arg.kind() {
            "scoped_identifier" => {
                let path = self.file.field_text(arg, "path").unwrap_or("");
                let name = self.file.field_text(arg, "name").unwrap_or("");
                let mut import = Import::new(path);
                import.specifiers.push(ImportSpecifier::named(name));
                import
            }
            "use_as_clause" => {
                let path = self.file.field_text(arg, "path").unwrap_or("");
                let (module, name) = path.rsplit_once("::").unwrap_or((path, path));
                let mut import = Import::new(module);
                import.specifiers.push(ImportSpecifier {
                    name: name.to_string(),
                    alias: self.file.field_text(arg, "alias").map(str::to_string),
                    ..Default::default()
                });
                import
            }
            "scoped_use_list" => {
                let path = self.file.field_text(arg, "path").unwrap_or("");
                let mut import = Import::new(path);
                if let Some(list) = arg.child_by_field_name("list") {
                    for item in named_children(list) {
                        let text = self.file.text(item);
                        let spec = match text {
                            "self" => ImportSpecifier::namespace(path.rsplit("::").next().unwrap_or(path)),
                            _ => ImportSpecifier::named(text.rsplit("::").next().unwrap_or(text)),
                        };
                        import.specifiers.push(spec);
                    }
                }
                import
            }
            "use_wildcard" => {
                let text = self.file.text(arg);
                let mut import = Import::new(text.trim_end_matches('*').trim_end_matches("::"));
                import.specifiers.push(ImportSpecifier::namespace("*"));
                import
            }
            _ => {
                let text = self.file.text(arg);
                let mut import = Import::new(text);
                import.specifiers.push(ImportSpecifier::namespace(text));
                import
            }
        };
        self.builder.import(import);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseOutput {
        RustParser::new().parse(source, "src/cache.rs").unwrap()
    }

    fn find<'o>(output: &'o ParseOutput, name: &str) -> &'o Symbol {
        output
            .symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("Expected symbol {}", name))
    }

    const SOURCE: &str = r#"//! In-memory cache.
//!
//! Entries expire after a TTL.

use std::collections::HashMap;
use crate::config::{Config, Limits};
use super::store::Store as Backend;

mod eviction;

/// Maximum number of entries.
pub const MAX_ENTRIES: usize = 1024;

/// A keyed cache.
#[derive(Debug, Default)]
pub struct Cache {
    /// Stored values.
    pub entries: HashMap<String, String>,
    hits: u64,
}

impl Cache {
    /// Look up a key.
    pub async fn get(&self, key: &str) -> Option<String> {
        None
    }

    fn touch(&mut self) {}
}

impl Display for Cache {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

#[deprecated(note = "use Cache")]
pub(crate) fn legacy() {}
"#;

    #[test]
    fn test_module_doc() {
        let output = parse(SOURCE);
        let doc = output.module_doc.as_ref().unwrap();
        assert_eq!(doc.summary, "In-memory cache.");
        assert_eq!(doc.description.as_deref(), Some("Entries expire after a TTL."));
    }

    #[test]
    fn test_struct_impl_and_traits() {
        let output = parse(SOURCE);
        let cache = find(&output, "Cache");
        assert_eq!(cache.kind, SymbolKind::Class);
        assert!(cache.exported);
        assert_eq!(cache.decorators, vec!["derive(Debug, Default)".to_string()]);
        assert_eq!(cache.implements, vec!["Display".to_string()]);
        assert_eq!(cache.docs.as_ref().map(|d| d.summary.as_str()), Some("A keyed cache."));

        let get = find(&output, "get");
        assert_eq!(get.kind, SymbolKind::Method);
        assert_eq!(get.is_async, Some(true));
        assert_eq!(get.parent_id.as_deref(), Some("src/cache.rs:Cache"));
        assert_eq!(get.parameters.len(), 1);
        assert_eq!(get.parameters[0].name, "key");
        assert_eq!(get.returns.as_ref().and_then(|r| r.type_name.as_deref()), Some("Option<String>"));

        assert_eq!(find(&output, "touch").visibility, Visibility::Private);
        assert_eq!(find(&output, "fmt").visibility, Visibility::Public);
        assert_eq!(find(&output, "hits").visibility, Visibility::Private);
        assert_eq!(find(&output, "entries").visibility, Visibility::Public);
    }

    #[test]
    fn test_visibility_and_deprecation() {
        let output = parse(SOURCE);
        let legacy = find(&output, "legacy");
        assert_eq!(legacy.visibility, Visibility::Internal);
        assert!(legacy.exported);
        assert_eq!(legacy.docs.as_ref().and_then(|d| d.deprecated.as_deref()), Some("use Cache"));
        assert_eq!(find(&output, "MAX_ENTRIES").kind, SymbolKind::Constant);
    }

    #[test]
    fn test_restricted_pub_is_exported() {
        let output = parse("pub(super) struct Shared;\npub(in crate::a) fn scoped() {}\nfn hidden() {}\n");
        for name in ["Shared", "scoped"] {
            let symbol = find(&output, name);
            assert_eq!(symbol.visibility, Visibility::Internal);
            assert!(symbol.exported, "{} should be exported", name);
        }
        assert!(!find(&output, "hidden").exported);
        assert!(output.exports.iter().any(|e| e.name == "Shared"));
    }

    #[test]
    fn test_use_and_mod_imports() {
        let output = parse(SOURCE);
        let sources: Vec<&str> = output.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["std::collections", "crate::config", "super::store", "self::eviction"]);
        assert_eq!(output.imports[1].specifiers.len(), 2);
        assert_eq!(output.imports[2].specifiers[0].alias.as_deref(), Some("Backend"));
        assert_eq!(find(&output, "eviction").kind, SymbolKind::Module);
    }
}
