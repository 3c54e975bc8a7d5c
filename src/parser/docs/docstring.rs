//! Python docstrings.
//!
//! Styles are tried in order Google, NumPy, reST; the first one that
//! recognizes a section wins. Docstrings with no sections become plain prose.

use lazy_static::lazy_static;
use regex::Regex;

use super::{from_plain_text, split_summary, trim_blank_lines};
use crate::model::DocComment;

lazy_static! {
    static ref GOOGLE_SECTION: Regex = Regex::new(
        r"^(Args|Arguments|Parameters|Params|Keyword Args|Returns|Return|Yields|Raises|Throws|Example|Examples|Note|Notes|Deprecated|Attributes|Todo|Warning|Warnings|See Also)\s*:\s*$"
    )
    .unwrap();

    /// `name (type): description`
    static ref GOOGLE_ENTRY: Regex = Regex::new(r"^\*{0,2}(\w+)\s*(?:\(([^)]*)\))?\s*:\s*(.*)$").unwrap();

    static ref NUMPY_UNDERLINE: Regex = Regex::new(r"^\s*-{3,}\s*$").unwrap();

    /// `name : type`
    static ref NUMPY_ENTRY: Regex = Regex::new(r"^\*{0,2}(\w+)\s*(?::\s*(.*))?$").unwrap();

    /// `:param name:`, `:param int name:`, `:returns:`, `:raises ValueError:`
    static ref REST_FIELD: Regex = Regex::new(r"^:(\w+)(?:\s+([^:]+?))?\s*:\s*(.*)$").unwrap();
}

/// Strip string prefixes and quotes from a docstring literal.
pub fn strip_quotes(literal: &str) -> &str {
    let mut s = literal.trim();
    if let Some(pos) = s.find(['"', '\'']) {
        let prefix = &s[..pos];
        if prefix.len() <= 2 && prefix.chars().all(|c| "rRuUbBfF".contains(c)) {
            s = &s[pos..];
        }
    }
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if s.len() >= quote.len() * 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[quote.len()..s.len() - quote.len()];
        }
    }
    s
}

/// Remove the common indentation of every line after the first.
pub fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let indent = lines[1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = vec![lines[0].trim().to_string()];
    for line in &lines[1..] {
        if line.len() >= indent {
            out.push(line[indent..].trim_end().to_string());
        } else {
            out.push(line.trim().to_string());
        }
    }
    out.join("\n")
}

/// Parse a raw docstring literal (quotes included or not).
pub fn parse(literal: &str) -> Option<DocComment> {
    let text = dedent(strip_quotes(literal));
    let lines: Vec<&str> = text.lines().collect();

    parse_google(&lines)
        .or_else(|| parse_numpy(&lines))
        .or_else(|| parse_rest(&lines))
        .or_else(|| from_plain_text(&text))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn prose_doc(lines: &[&str]) -> DocComment {
    let (summary, description) = split_summary(&trim_blank_lines(lines).join("\n"));
    DocComment {
        summary,
        description,
        ..Default::default()
    }
}

/// Group `(header, body lines)` pairs from a list of section start indices.
fn sections<'a>(lines: &[&'a str], starts: &[usize], body_offset: usize) -> Vec<(String, Vec<&'a str>)> {
    let mut out = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(lines.len());
        let header = lines[start].trim().trim_end_matches(':').trim().to_string();
        let body_start = (start + body_offset).min(end);
        out.push((header, lines[body_start..end].to_vec()));
    }
    out
}

/// Split a section body into entries: a line at the minimum indent starts an entry,
/// deeper lines continue it.
fn entries(body: &[&str]) -> Vec<(String, String)> {
    let base = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);

    let mut out: Vec<(String, String)> = Vec::new();
    for line in body {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) <= base {
            out.push((line.trim().to_string(), String::new()));
        } else if let Some((_, cont)) = out.last_mut() {
            if !cont.is_empty() {
                cont.push(' ');
            }
            cont.push_str(line.trim());
        }
    }
    out
}

fn block_text(body: &[&str]) -> String {
    let trimmed = trim_blank_lines(body);
    let indent = trimmed
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);
    trimmed
        .iter()
        .map(|l| if l.len() >= indent { &l[indent..] } else { l.trim() })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_text(head: &str, cont: &str) -> String {
    match (head.is_empty(), cont.is_empty()) {
        (true, _) => cont.to_string(),
        (false, true) => head.to_string(),
        (false, false) => format!("{} {}", head, cont),
    }
}

fn parse_google(lines: &[&str]) -> Option<DocComment> {
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(i, l)| {
            GOOGLE_SECTION.is_match(l.trim())
                && !lines.get(i + 1).map(|n| NUMPY_UNDERLINE.is_match(n)).unwrap_or(false)
        })
        .map(|(i, _)| i)
        .collect();
    let first = *starts.first()?;

    let mut doc = prose_doc(&lines[..first]);
    for (header, body) in sections(lines, &starts, 1) {
        match header.as_str() {
            "Args" | "Arguments" | "Parameters" | "Params" | "Keyword Args" => {
                for (head, cont) in entries(&body) {
                    if let Some(caps) = GOOGLE_ENTRY.captures(&head) {
                        doc.params.insert(caps[1].to_string(), join_text(caps[3].trim(), &cont));
                    }
                }
            }
            "Returns" | "Return" | "Yields" => {
                let text = entries(&body)
                    .into_iter()
                    .map(|(head, cont)| join_text(&strip_google_type(&head), &cont))
                    .collect::<Vec<_>>()
                    .join(" ");
                if header == "Yields" {
                    doc.push_tag("yields", &text);
                } else {
                    doc.returns = Some(text);
                }
            }
            "Raises" | "Throws" => {
                for (head, cont) in entries(&body) {
                    let text = match head.split_once(':') {
                        Some((exc, desc)) => join_text(&format!("{} {}", exc.trim(), desc.trim()).trim().to_string(), &cont),
                        None => join_text(&head, &cont),
                    };
                    doc.throws.push(text);
                }
            }
            "Example" | "Examples" => {
                let text = block_text(&body);
                if !text.is_empty() {
                    doc.examples.push(text);
                }
            }
            "Deprecated" => doc.deprecated = Some(block_text(&body).replace('\n', " ")),
            other => {
                let text = block_text(&body);
                doc.push_tag(&other.to_lowercase().replace(' ', "_"), &text);
            }
        }
    }
    Some(doc)
}

/// `int: the count` -> `the count`; bare text is kept.
fn strip_google_type(head: &str) -> String {
    match head.split_once(':') {
        Some((ty, desc)) if !ty.contains(' ') || ty.contains('[') => {
            let desc = desc.trim();
            if desc.is_empty() {
                ty.trim().to_string()
            } else {
                desc.to_string()
            }
        }
        _ => head.to_string(),
    }
}

fn parse_numpy(lines: &[&str]) -> Option<DocComment> {
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(i, l)| {
            !l.trim().is_empty()
                && !NUMPY_UNDERLINE.is_match(l)
                && lines.get(i + 1).map(|n| NUMPY_UNDERLINE.is_match(n)).unwrap_or(false)
        })
        .map(|(i, _)| i)
        .collect();
    let first = *starts.first()?;

    let mut doc = prose_doc(&lines[..first]);
    for (header, body) in sections(lines, &starts, 2) {
        match header.as_str() {
            "Parameters" | "Other Parameters" | "Keyword Arguments" => {
                for (head, cont) in entries(&body) {
                    if let Some(caps) = NUMPY_ENTRY.captures(&head) {
                        doc.params.insert(caps[1].to_string(), cont);
                    }
                }
            }
            "Returns" | "Yields" => {
                let text = entries(&body)
                    .into_iter()
                    .map(|(head, cont)| if cont.is_empty() { head } else { cont })
                    .collect::<Vec<_>>()
                    .join(" ");
                if header == "Yields" {
                    doc.push_tag("yields", &text);
                } else {
                    doc.returns = Some(text);
                }
            }
            "Raises" | "Warns" => {
                for (head, cont) in entries(&body) {
                    doc.throws.push(join_text(&head, &cont));
                }
            }
            "Examples" | "Example" => {
                let text = block_text(&body);
                if !text.is_empty() {
                    doc.examples.push(text);
                }
            }
            "Deprecated" => doc.deprecated = Some(block_text(&body).replace('\n', " ")),
            other => {
                let text = block_text(&body);
                doc.push_tag(&other.to_lowercase().replace(' ', "_"), &text);
            }
        }
    }
    Some(doc)
}

fn parse_rest(lines: &[&str]) -> Option<DocComment> {
    let first = lines.iter().position(|l| REST_FIELD.is_match(l.trim()))?;

    let mut doc = prose_doc(&lines[..first]);
    let mut fields: Vec<(String, Option<String>, String)> = Vec::new();
    for line in &lines[first..] {
        let trimmed = line.trim();
        if let Some(caps) = REST_FIELD.captures(trimmed) {
            fields.push((
                caps[1].to_string(),
                caps.get(2).map(|m| m.as_str().trim().to_string()),
                caps[3].trim().to_string(),
            ));
        } else if let Some((_, _, text)) = fields.last_mut() {
            if !trimmed.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(trimmed);
            }
        }
    }

    for (field, arg, text) in fields {
        match field.as_str() {
            "param" | "parameter" | "arg" | "argument" | "key" | "keyword" => {
                if let Some(arg) = arg {
                    // `:param int x:` carries the type before the name.
                    let name = arg.rsplit(' ').next().unwrap_or(&arg).to_string();
                    doc.params.insert(name, text);
                }
            }
            "returns" | "return" => doc.returns = Some(text),
            "raises" | "raise" | "except" | "exception" => {
                let entry = match arg {
                    Some(exc) => join_text(&exc, &text),
                    None => text,
                };
                doc.throws.push(entry);
            }
            "deprecated" => doc.deprecated = Some(text),
            "since" | "versionadded" => doc.since = Some(text),
            "type" | "rtype" | "vartype" => {}
            other => doc.push_tag(other, &text),
        }
    }
    Some(doc)
}
