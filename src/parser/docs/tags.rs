//! `@tag` style documentation blocks (JSDoc, Javadoc, PHPDoc, YARD).

use lazy_static::lazy_static;
use regex::Regex;

use super::{split_summary, strip_block_comment, strip_line_prefix};
use crate::model::DocComment;

lazy_static! {
    /// `@tag rest-of-line`
    static ref TAG_LINE: Regex = Regex::new(r"^@([A-Za-z][\w-]*)\s*(.*)$").unwrap();

    /// `{Type} name - description`, `name description`, or YARD `name [Type] description`.
    static ref PARAM_BODY: Regex =
        Regex::new(r"^(?:\{[^}]*\}\s*)?\[?\$?([\w.]+)(?:=[^\]]*)?\]?\s*(?:\[[^\]]*\]\s*)?(?:-\s*)?(.*)$").unwrap();

    /// Leading `{Type}` of a returns/throws body.
    static ref TYPE_PREFIX: Regex = Regex::new(r"^\{([^}]*)\}\s*(.*)$").unwrap();

    /// Javadoc-style typed parameter: `Type $name description` (PHPDoc).
    static ref PHP_PARAM: Regex = Regex::new(r"^([\w\\|?\[\]<>]+)\s+\$(\w+)\s*(.*)$").unwrap();
}

/// Parse a `/** ... */` block comment.
pub fn parse_block(comment: &str) -> Option<DocComment> {
    parse_body(&strip_block_comment(comment))
}

/// Parse consecutive `#` comment lines (YARD).
pub fn parse_hash_lines(lines: &[&str]) -> Option<DocComment> {
    let stripped = strip_line_prefix(lines, &["#"]);
    parse_body(&stripped.join("\n"))
}

/// Parse the already de-commented body of a tag block.
pub fn parse_body(body: &str) -> Option<DocComment> {
    let mut prose = Vec::new();
    let mut tags: Vec<(String, String)> = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();
        if let Some(caps) = TAG_LINE.captures(trimmed) {
            tags.push((caps[1].to_string(), caps[2].to_string()));
        } else if let Some((_, value)) = tags.last_mut() {
            // Continuation of the previous tag, keeping line breaks for examples.
            value.push('\n');
            value.push_str(line);
        } else {
            prose.push(line);
        }
    }

    let (summary, description) = split_summary(&prose.join("\n"));
    let mut doc = DocComment {
        summary,
        description,
        ..Default::default()
    };

    for (tag, value) in tags {
        apply_tag(&mut doc, &tag, &value);
    }

    if doc.is_empty() {
        None
    } else {
        Some(doc)
    }
}

fn apply_tag(doc: &mut DocComment, tag: &str, value: &str) {
    let single = collapse(value);
    match tag {
        "param" | "arg" | "argument" => {
            if let Some(caps) = PHP_PARAM.captures(&single) {
                doc.params.insert(caps[2].to_string(), caps[3].trim().to_string());
            } else if let Some(caps) = PARAM_BODY.captures(&single) {
                doc.params.insert(caps[1].to_string(), caps[2].trim().to_string());
            }
        }
        "returns" | "return" => {
            let text = match TYPE_PREFIX.captures(&single) {
                Some(caps) if caps[2].trim().is_empty() => caps[1].to_string(),
                Some(caps) => caps[2].trim().to_string(),
                None => single,
            };
            doc.returns = Some(text);
        }
        "deprecated" => doc.deprecated = Some(single),
        "since" => doc.since = Some(single),
        "throws" | "throw" | "exception" | "raise" => {
            let text = match TYPE_PREFIX.captures(&single) {
                Some(caps) => format!("{} {}", &caps[1], caps[2].trim()).trim().to_string(),
                None => single,
            };
            doc.throws.push(text);
        }
        "example" => {
            let lines: Vec<&str> = value.lines().collect();
            let example = super::trim_blank_lines(&lines).join("\n");
            if !example.is_empty() {
                doc.examples.push(example);
            }
        }
        other => doc.push_tag(other, &single),
    }
}

fn collapse(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsdoc_block() {
        let comment = r#"/**
 * Format a user's name.
 *
 * Handles missing parts gracefully.
 * @param {string} first - The first name
 * @param [last] optional last name
 * @returns {string} The formatted name
 * @deprecated use formatFullName
 * @throws {TypeError} when first is empty
 * @example
 * formatName("Ada", "Lovelace");
 * @see formatFullName
 */"#;
        let doc = parse_block(comment).unwrap();
        assert_eq!(doc.summary, "Format a user's name.");
        assert_eq!(doc.description.as_deref(), Some("Handles missing parts gracefully."));
        assert_eq!(doc.params["first"], "The first name");
        assert_eq!(doc.params["last"], "optional last name");
        assert_eq!(doc.returns.as_deref(), Some("The formatted name"));
        assert_eq!(doc.deprecated.as_deref(), Some("use formatFullName"));
        assert_eq!(doc.throws, vec!["TypeError when first is empty".to_string()]);
        assert_eq!(doc.examples, vec!["formatName(\"Ada\", \"Lovelace\");".to_string()]);
        assert_eq!(doc.tags["see"], "formatFullName");
    }

    #[test]
    fn test_javadoc_params() {
        let doc = parse_block("/** Sum.\n * @param a the left\n * @return the total\n * @since 1.2 */").unwrap();
        assert_eq!(doc.params["a"], "the left");
        assert_eq!(doc.returns.as_deref(), Some("the total"));
        assert_eq!(doc.since.as_deref(), Some("1.2"));
    }

    #[test]
    fn test_phpdoc_params() {
        let doc = parse_block("/**\n * Find a user.\n * @param int $id The id\n */").unwrap();
        assert_eq!(doc.params["id"], "The id");
    }

    #[test]
    fn test_yard_lines() {
        let lines = ["# Greets someone.", "# @param name [String] who to greet", "# @return [String]"];
        let doc = parse_hash_lines(&lines).unwrap();
        assert_eq!(doc.summary, "Greets someone.");
        assert_eq!(doc.params["name"], "who to greet");
        assert_eq!(doc.returns.as_deref(), Some("[String]"));
    }

    #[test]
    fn test_empty_block() {
        assert!(parse_block("/** */").is_none());
    }

    #[test]
    fn test_deprecated_without_notice() {
        let doc = parse_block("/** Old.\n * @deprecated\n */").unwrap();
        assert_eq!(doc.deprecated.as_deref(), Some(""));
    }
}
