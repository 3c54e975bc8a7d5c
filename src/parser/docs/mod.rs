//! Doc-comment parsers.
//!
//! Every dialect is normalized into [`DocComment`]:
//! - `tags`: JSDoc, Javadoc, PHPDoc and YARD `@tag` blocks
//! - `docstring`: Python docstrings (Google, NumPy, reST)
//! - `xml`: C# `///` XML documentation
//! - `line`: Rust `///`/`//!` and Go `//` comment blocks

pub mod docstring;
pub mod line;
pub mod tags;
pub mod xml;

use crate::model::DocComment;

/// Strip the delimiters of a `/** ... */` or `/* ... */` block and the
/// leading `*` gutter from each line.
pub fn strip_block_comment(text: &str) -> String {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("/**")
        .or_else(|| trimmed.strip_prefix("/*"))
        .unwrap_or(trimmed);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);

    let lines: Vec<&str> = inner
        .lines()
        .map(|line| {
            let line = line.trim();
            match line.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => line,
            }
        })
        .collect();
    trim_blank_lines(&lines).join("\n")
}

/// Strip a line-comment prefix (`///`, `//!`, `//`, `#`) from each line.
pub fn strip_line_prefix<'a>(lines: &[&'a str], prefixes: &[&str]) -> Vec<&'a str> {
    lines
        .iter()
        .map(|line| {
            let line = line.trim();
            for prefix in prefixes {
                if let Some(rest) = line.strip_prefix(prefix) {
                    return rest.strip_prefix(' ').unwrap_or(rest);
                }
            }
            line
        })
        .collect()
}

/// Drop leading and trailing blank lines.
pub fn trim_blank_lines<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].to_vec(),
        _ => Vec::new(),
    }
}

/// Split free text into a summary (first paragraph) and an optional description.
pub fn split_summary(text: &str) -> (String, Option<String>) {
    let lines: Vec<&str> = text.lines().collect();
    let lines = trim_blank_lines(&lines);

    let split_at = lines.iter().position(|l| l.trim().is_empty());
    let (head, tail) = match split_at {
        Some(pos) => (&lines[..pos], &lines[pos..]),
        None => (&lines[..], &[][..]),
    };

    let summary = head
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join(" ");
    let tail = trim_blank_lines(tail);
    let description = if tail.is_empty() {
        None
    } else {
        Some(tail.join("\n"))
    };
    (summary, description)
}

/// Build a doc from plain prose with no tag syntax.
pub fn from_plain_text(text: &str) -> Option<DocComment> {
    let (summary, description) = split_summary(text);
    let doc = DocComment {
        summary,
        description,
        ..Default::default()
    };
    if doc.is_empty() {
        None
    } else {
        Some(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_block_comment() {
        let text = "/**\n * Adds two numbers.\n *\n * @param a first\n */";
        assert_eq!(strip_block_comment(text), "Adds two numbers.\n\n@param a first");
    }

    #[test]
    fn test_split_summary() {
        let (summary, description) = split_summary("First line\ncontinues.\n\nMore detail.");
        assert_eq!(summary, "First line continues.");
        assert_eq!(description.as_deref(), Some("More detail."));

        let (summary, description) = split_summary("Only one.");
        assert_eq!(summary, "Only one.");
        assert!(description.is_none());
    }

    #[test]
    fn test_from_plain_text_empty() {
        assert!(from_plain_text("   \n ").is_none());
    }
}
