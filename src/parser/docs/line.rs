//! Line-comment documentation: Rust `///`/`//!` markdown and Go `//` blocks.

use lazy_static::lazy_static;
use regex::Regex;

use super::{split_summary, strip_line_prefix, trim_blank_lines};
use crate::model::DocComment;

lazy_static! {
    static ref MD_HEADING: Regex = Regex::new(r"^#{1,3}\s+(.+?)\s*$").unwrap();
    /// `* `name` - description` bullets in an `# Arguments` section.
    static ref ARG_BULLET: Regex = Regex::new(r"^[*-]\s+`?(\w+)`?\s*(?:[-:]\s*)?(.*)$").unwrap();
    static ref DEPRECATED_NOTE: Regex =
        Regex::new(r#"deprecated\s*(?:=\s*"([^"]*)"|\(.*?note\s*=\s*"([^"]*)".*\))"#).unwrap();
}

/// Parse Rust doc lines (`///` or `//!`).
pub fn parse_rust(lines: &[&str]) -> Option<DocComment> {
    let stripped = strip_line_prefix(lines, &["///", "//!"]);
    parse_markdown(&stripped)
}

/// Parse a markdown doc body split into sections by `#` headings.
pub fn parse_markdown(lines: &[&str]) -> Option<DocComment> {
    let mut prose: Vec<&str> = Vec::new();
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();
    let mut in_fence = false;

    for line in lines {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
        }
        if !in_fence {
            if let Some(caps) = MD_HEADING.captures(trimmed) {
                sections.push((caps[1].to_string(), Vec::new()));
                continue;
            }
        }
        match sections.last_mut() {
            Some((_, body)) => body.push(line),
            None => prose.push(line),
        }
    }

    let (summary, description) = split_summary(&trim_blank_lines(&prose).join("\n"));
    let mut doc = DocComment {
        summary,
        description,
        ..Default::default()
    };

    for (heading, body) in sections {
        let body = trim_blank_lines(&body);
        match heading.to_lowercase().as_str() {
            "examples" | "example" => {
                let code: Vec<&str> = body
                    .iter()
                    .copied()
                    .filter(|l| !l.trim().starts_with("```"))
                    .collect();
                let text = trim_blank_lines(&code).join("\n");
                if !text.is_empty() {
                    doc.examples.push(text);
                }
            }
            "errors" => doc.throws.push(collapse(&body)),
            "panics" => doc.push_tag("panics", &collapse(&body)),
            "arguments" | "parameters" => {
                for line in &body {
                    if let Some(caps) = ARG_BULLET.captures(line.trim()) {
                        doc.params.insert(caps[1].to_string(), caps[2].trim().to_string());
                    }
                }
            }
            "returns" => doc.returns = Some(collapse(&body)),
            other => doc.push_tag(&other.replace(' ', "_"), &body.join("\n")),
        }
    }

    if doc.is_empty() {
        None
    } else {
        Some(doc)
    }
}

/// Extract the notice from a `#[deprecated]` attribute.
///
/// Returns `None` when the attribute is not a deprecation marker.
pub fn rust_deprecation(attribute: &str) -> Option<String> {
    let inner = attribute
        .trim()
        .trim_start_matches("#[")
        .trim_end_matches(']')
        .trim();
    if !inner.starts_with("deprecated") {
        return None;
    }
    let note = DEPRECATED_NOTE
        .captures(inner)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    Some(note)
}

/// Parse a Go `//` comment block.
///
/// A paragraph starting with `Deprecated:` becomes the deprecation notice.
pub fn parse_go(lines: &[&str]) -> Option<DocComment> {
    let stripped = strip_line_prefix(lines, &["//"]);
    let stripped = trim_blank_lines(&stripped);

    let mut paragraphs: Vec<Vec<&str>> = vec![Vec::new()];
    for line in stripped {
        if line.trim().is_empty() {
            if paragraphs.last().map(|p| !p.is_empty()).unwrap_or(false) {
                paragraphs.push(Vec::new());
            }
        } else if let Some(last) = paragraphs.last_mut() {
            last.push(line);
        }
    }

    let mut deprecated = None;
    let mut kept = Vec::new();
    for paragraph in paragraphs.into_iter().filter(|p| !p.is_empty()) {
        let text = paragraph.join("\n");
        match text.strip_prefix("Deprecated:") {
            Some(rest) => deprecated = Some(collapse_str(rest)),
            None => kept.push(text),
        }
    }

    let (summary, description) = split_summary(&kept.join("\n\n"));
    let doc = DocComment {
        summary,
        description,
        deprecated,
        ..Default::default()
    };
    if doc.is_empty() {
        None
    } else {
        Some(doc)
    }
}

fn collapse(lines: &[&str]) -> String {
    collapse_str(&lines.join(" "))
}

fn collapse_str(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
