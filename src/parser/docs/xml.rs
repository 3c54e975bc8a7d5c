//! C# `///` XML documentation comments.

use lazy_static::lazy_static;
use regex::Regex;

use super::{split_summary, strip_line_prefix};
use crate::model::DocComment;

lazy_static! {
    static ref ELEMENT: Regex =
        Regex::new(r#"(?s)<(\w+)((?:\s+\w+\s*=\s*"[^"]*")*)\s*>(.*?)</\w+>"#).unwrap();
    static ref SELF_CLOSING: Regex = Regex::new(r#"<(?:see|seealso|paramref|typeparamref)\s+\w+\s*=\s*"([^"]*)"\s*/>"#).unwrap();
    static ref ATTR: Regex = Regex::new(r#"(\w+)\s*=\s*"([^"]*)""#).unwrap();
    static ref TAG: Regex = Regex::new(r"</?\w+[^>]*>").unwrap();
}

/// Parse consecutive `///` lines.
pub fn parse_lines(lines: &[&str]) -> Option<DocComment> {
    let body = strip_line_prefix(lines, &["///"]).join("\n");
    parse(&body)
}

/// Parse an XML documentation body.
pub fn parse(body: &str) -> Option<DocComment> {
    let body = SELF_CLOSING.replace_all(body, "$1");
    let mut doc = DocComment::default();
    let mut matched = false;

    for caps in ELEMENT.captures_iter(&body) {
        matched = true;
        let element = &caps[1];
        let attr = ATTR
            .captures(&caps[2])
            .map(|a| a[2].to_string())
            .unwrap_or_default();
        let text = inner_text(&caps[3]);

        match element {
            "summary" => {
                let (summary, description) = split_summary(&text);
                doc.summary = summary;
                if description.is_some() {
                    doc.description = description;
                }
            }
            "remarks" => {
                doc.description = Some(match doc.description.take() {
                    Some(existing) => format!("{}\n\n{}", existing, text),
                    None => text,
                });
            }
            "param" => {
                doc.params.insert(attr, collapse(&text));
            }
            "returns" => doc.returns = Some(collapse(&text)),
            "exception" => doc.throws.push(format!("{} {}", attr, collapse(&text)).trim().to_string()),
            "example" => doc.examples.push(text),
            "typeparam" => doc.push_tag(&format!("typeparam {}", attr), &collapse(&text)),
            other => doc.push_tag(other, &collapse(&text)),
        }
    }

    if !matched {
        // Comments written without any XML elements.
        let (summary, description) = split_summary(&TAG.replace_all(&body, ""));
        doc.summary = summary;
        doc.description = description;
    }

    if doc.is_empty() {
        None
    } else {
        Some(doc)
    }
}

fn inner_text(raw: &str) -> String {
    let stripped = TAG.replace_all(raw, "");
    let lines: Vec<&str> = stripped.lines().map(str::trim).collect();
    super::trim_blank_lines(&lines).join("\n")
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
