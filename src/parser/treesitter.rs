//! Shared tree-sitter plumbing for the structural extractors.
//!
//! Grammars are loaded lazily and cached per parser instance. Each parse
//! creates a fresh `tree_sitter::Parser`, so a registry can be shared across
//! threads without locking.

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language as TsLanguage, Node, Parser as TsParser, Query, QueryCursor, Tree};

use crate::error::ParseError;
use crate::model::Location;

/// A grammar that is constructed on first use.
pub struct Grammar {
    cell: OnceCell<TsLanguage>,
    load: fn() -> TsLanguage,
}

impl Grammar {
    pub const fn new(load: fn() -> TsLanguage) -> Self {
        Self {
            cell: OnceCell::new(),
            load,
        }
    }

    pub fn get(&self) -> &TsLanguage {
        self.cell.get_or_init(self.load)
    }

    /// Parse `source` and reject trees that are mostly errors.
    pub fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        let mut parser = TsParser::new();
        parser
            .set_language(self.get())
            .map_err(|e| ParseError::Grammar(e.to_string()))?;
        let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
        check_syntax(&tree, source.len())?;
        Ok(tree)
    }
}

/// Reject a tree whose root is an error node or whose error nodes cover
/// more than half of the file.
pub fn check_syntax(tree: &Tree, source_len: usize) -> Result<(), ParseError> {
    let root = tree.root_node();
    if root.is_error() {
        return Err(ParseError::Syntax {
            line: root.start_position().row + 1,
        });
    }
    if !root.has_error() || source_len == 0 {
        return Ok(());
    }

    let mut error_bytes = 0;
    let mut first_error_line = None;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() {
            error_bytes += node.end_byte() - node.start_byte();
            first_error_line.get_or_insert(node.start_position().row + 1);
            continue;
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }

    if error_bytes * 2 > source_len {
        return Err(ParseError::Syntax {
            line: first_error_line.unwrap_or(1),
        });
    }
    Ok(())
}

/// Source text plus path, with node helpers.
pub struct ParsedFile<'a> {
    pub source: &'a str,
    pub path: &'a str,
}

impl<'a> ParsedFile<'a> {
    pub fn new(source: &'a str, path: &'a str) -> Self {
        Self { source, path }
    }

    /// Text of a node (empty on invalid UTF-8 boundaries).
    pub fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Text of a named field of `node`, if present.
    pub fn field_text(&self, node: Node, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    /// 1-indexed location spanning the node.
    pub fn location(&self, node: Node) -> Location {
        let start = node.start_position();
        let end = node.end_position();
        Location {
            file: self.path.to_string(),
            line: start.row + 1,
            column: start.column + 1,
            end_line: Some(end.row + 1),
            end_column: Some(end.column + 1),
        }
    }

    /// Declaration text up to the body block (or terminating `;`), whitespace collapsed.
    pub fn signature(&self, node: Node, body: Option<Node>) -> String {
        let end = match body {
            Some(b) if b.start_byte() > node.start_byte() => b.start_byte(),
            _ => node.end_byte(),
        };
        let raw = self.source.get(node.start_byte()..end).unwrap_or("");
        let raw = raw.trim_end();
        let raw = raw.strip_suffix(';').unwrap_or(raw);
        collapse_whitespace(raw.trim_end_matches(|c: char| c == '{' || c.is_whitespace()))
    }

    /// Contiguous comment siblings directly above `node`, in source order.
    ///
    /// Stops at a blank line gap or any non-comment node. Attribute-like
    /// nodes listed in `skip` are stepped over.
    pub fn leading_comments<'t>(&self, node: Node<'t>, is_comment: impl Fn(&str) -> bool, skip: &[&str]) -> Vec<Node<'t>> {
        let mut comments = Vec::new();
        let mut expected_row = node.start_position().row;
        let mut current = node.prev_sibling();
        while let Some(prev) = current {
            let kind = prev.kind();
            if skip.contains(&kind) {
                expected_row = prev.start_position().row;
                current = prev.prev_sibling();
                continue;
            }
            if !is_comment(kind) {
                break;
            }
            if prev.end_position().row + 1 < expected_row {
                break;
            }
            expected_row = prev.start_position().row;
            comments.push(prev);
            current = prev.prev_sibling();
        }
        comments.reverse();
        comments
    }

    /// Texts of the given comment nodes.
    pub fn comment_texts(&self, comments: &[Node]) -> Vec<&'a str> {
        comments.iter().map(|n| self.text(*n)).collect()
    }
}

/// Run `query` over `root` and collect every node captured under `capture`.
pub fn query_nodes<'t>(language: &TsLanguage, query_src: &str, capture: &str, root: Node<'t>, source: &str) -> Vec<Node<'t>> {
    let query = match Query::new(language, query_src) {
        Ok(q) => q,
        Err(e) => {
            tracing::debug!(error = %e, "invalid query");
            return Vec::new();
        }
    };
    let Some(index) = query.capture_index_for_name(capture) else {
        return Vec::new();
    };

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, root, source.as_bytes());
    let mut nodes = Vec::new();
    while let Some(m) = matches.next() {
        for c in m.captures {
            if c.index == index {
                nodes.push(c.node);
            }
        }
    }
    nodes
}

/// Named children of a node.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children (named and anonymous) of a node.
pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Whether `node` has a direct anonymous child token equal to `token`.
pub fn has_token(node: Node, token: &str) -> bool {
    children(node).iter().any(|c| !c.is_named() && c.kind() == token)
}

/// Strip matching string quotes from a literal.
pub fn unquote(text: &str) -> &str {
    let t = text.trim();
    for q in ['"', '\'', '`'] {
        if t.len() >= 2 && t.starts_with(q) && t.ends_with(q) {
            return &t[1..t.len() - 1];
        }
    }
    t
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Upper-case constant heuristic: `MAX_SIZE`, `API_URL`.
pub fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
