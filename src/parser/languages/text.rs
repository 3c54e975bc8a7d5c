//! Line-oriented extractors for configuration, script and docs formats, plus
//! the module-summary fallback for languages without a structural extractor.
//!
//! None of these build a syntax tree, so they never fail.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ParseError;
use crate::language::Language;
use crate::model::{DocComment, Import, ImportSpecifier, Location, Symbol, SymbolKind, Visibility};
use crate::parser::docs::{from_plain_text, strip_block_comment, strip_line_prefix, trim_blank_lines};
use crate::parser::treesitter::{collapse_whitespace, unquote};
use crate::parser::{LanguageParser, ModuleBuilder, ParseOutput};

lazy_static! {
    static ref YAML_KEY: Regex = Regex::new(r#"^("[^"]+"|'[^']+'|[A-Za-z_$][\w.$-]*)\s*:(?:\s|$)"#).unwrap();

    static ref SHELL_FUNCTION: Regex =
        Regex::new(r"^(?:function\s+([A-Za-z_][\w:.-]*)\s*(?:\(\s*\))?|([A-Za-z_][\w:.-]*)\s*\(\s*\))\s*\{?").unwrap();
    static ref SHELL_EXPORT: Regex = Regex::new(r"^export\s+([A-Za-z_]\w*)=").unwrap();
    static ref SHELL_SOURCE: Regex = Regex::new(r#"^(?:source|\.)\s+("[^"]+"|'[^']+'|[^\s;&|]+)"#).unwrap();

    static ref HCL_BLOCK: Regex =
        Regex::new(r#"^(resource|data|variable|output|module)\s+"([^"]+)"(?:\s+"([^"]+)")?\s*\{"#).unwrap();
    static ref HCL_ATTR: Regex = Regex::new(r#"^\s*(description|source)\s*=\s*"((?:[^"\\]|\\.)*)""#).unwrap();

    static ref SQL_CREATE: Regex = Regex::new(
        r#"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:GLOBAL|LOCAL)\s+)?(?:TEMP(?:ORARY)?\s+)?(?:UNLOGGED\s+)?(?:MATERIALIZED\s+)?(TABLE|VIEW|FUNCTION|PROCEDURE|TYPE)\s+(?:IF\s+NOT\s+EXISTS\s+)?([\w."`\[\]]+)"#
    ).unwrap();

    static ref MD_HEADING: Regex = Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").unwrap();
    static ref MD_LINK: Regex = Regex::new(r"!?\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+[^)]*)?\)").unwrap();
}

/// Contiguous comment lines directly above `index`, in source order, prefix stripped.
fn comment_block_above<'s>(lines: &[&'s str], index: usize, prefixes: &[&str]) -> Vec<&'s str> {
    let mut start = index;
    while start > 0 {
        let prev = lines[start - 1].trim_start();
        if prev.starts_with("#!") || !prefixes.iter().any(|p| prev.starts_with(p)) {
            break;
        }
        start -= 1;
    }
    strip_line_prefix(&lines[start..index], prefixes)
}

/// The comment block at the top of a file (after a shebang) and the index of the
/// first line after it. `None` when the file does not start with a comment.
fn leading_comment<'s>(lines: &[&'s str], prefixes: &[&str]) -> Option<(Vec<&'s str>, usize)> {
    let mut i = 0;
    while i < lines.len() && (lines[i].trim().is_empty() || lines[i].starts_with("#!")) {
        i += 1;
    }
    let start = i;
    while i < lines.len() && prefixes.iter().any(|p| lines[i].trim_start().starts_with(p)) {
        i += 1;
    }
    if i == start {
        return None;
    }
    Some((strip_line_prefix(&lines[start..i], prefixes), i))
}

/// A leading comment counts as the module doc when a blank line (or the end
/// of the file) follows it.
fn detached_module_doc(lines: &[&str], prefixes: &[&str]) -> Option<DocComment> {
    let (block, end) = leading_comment(lines, prefixes)?;
    let detached = lines.get(end).map(|l| l.trim().is_empty()).unwrap_or(true);
    if !detached {
        return None;
    }
    from_plain_text(&block.join("\n"))
}

fn docs_above(lines: &[&str], index: usize, prefixes: &[&str]) -> Option<DocComment> {
    let block = comment_block_above(lines, index, prefixes);
    from_plain_text(&block.join("\n"))
}

fn line_location(file: &str, index: usize, line: &str) -> Location {
    let column = line.len() - line.trim_start().len() + 1;
    Location::at(file, index + 1, column)
}

/// YAML: top-level keys become exported properties.
pub struct YamlParser;

impl LanguageParser for YamlParser {
    fn language(&self) -> Language {
        Language::Yaml
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let lines: Vec<&str> = content.lines().collect();
        let mut builder = ModuleBuilder::new(file_path);
        builder.set_module_doc(detached_module_doc(&lines, &["#"]));

        for (i, line) in lines.iter().enumerate() {
            if line.starts_with(char::is_whitespace) || line.starts_with('#') || line.starts_with('-') {
                continue;
            }
            let Some(caps) = YAML_KEY.captures(line) else {
                continue;
            };
            let key = unquote(&caps[1]);
            let mut symbol = Symbol::new(key, SymbolKind::Property, line_location(file_path, i, line));
            symbol.exported = true;
            symbol.docs = docs_above(&lines, i, &["#"]);
            symbol.signature = Some(line.trim_end().to_string());
            builder.add(symbol);
        }

        builder.export_flagged_symbols();
        Ok(builder.finish())
    }
}

/// Shell: functions, exported variables and sourced files.
pub struct ShellParser;

impl LanguageParser for ShellParser {
    fn language(&self) -> Language {
        Language::Shell
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let lines: Vec<&str> = content.lines().collect();
        let mut builder = ModuleBuilder::new(file_path);
        builder.set_module_doc(detached_module_doc(&lines, &["#"]));

        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                continue;
            }

            if let Some(caps) = SHELL_SOURCE.captures(trimmed) {
                let path = unquote(&caps[1]);
                if !path.contains('$') && !path.contains('`') {
                    let mut import = Import::new(relative_source(path));
                    import.specifiers.push(ImportSpecifier::namespace(
                        path.rsplit('/').next().unwrap_or(path),
                    ));
                    builder.import(import);
                }
                continue;
            }

            // Only top-level definitions.
            if line.starts_with(char::is_whitespace) {
                continue;
            }
            if let Some(caps) = SHELL_FUNCTION.captures(line) {
                let Some(name) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
                    continue;
                };
                let mut symbol = Symbol::new(name, SymbolKind::Function, line_location(file_path, i, line));
                symbol.visibility = if name.starts_with('_') {
                    Visibility::Private
                } else {
                    Visibility::Public
                };
                symbol.exported = symbol.visibility == Visibility::Public;
                symbol.docs = docs_above(&lines, i, &["#"]);
                symbol.signature = Some(collapse_whitespace(caps[0].trim_end_matches('{')));
                builder.add(symbol);
            } else if let Some(caps) = SHELL_EXPORT.captures(line) {
                let mut symbol = Symbol::new(&caps[1], SymbolKind::Variable, line_location(file_path, i, line));
                symbol.exported = true;
                symbol.docs = docs_above(&lines, i, &["#"]);
                symbol.signature = Some(line.trim_end().to_string());
                builder.add(symbol);
            }
        }

        builder.export_flagged_symbols();
        Ok(builder.finish())
    }
}

/// Paths written without a leading `./` are still relative to the script.
fn relative_source(path: &str) -> String {
    if path.starts_with('.') || path.starts_with('/') || path.starts_with('~') {
        path.to_string()
    } else {
        format!("./{}", path)
    }
}

/// HCL / Terraform blocks.
pub struct HclParser;

impl LanguageParser for HclParser {
    fn language(&self) -> Language {
        Language::Hcl
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let lines: Vec<&str> = content.lines().collect();
        let mut builder = ModuleBuilder::new(file_path);
        builder.set_module_doc(detached_module_doc(&lines, &["#", "//"]));

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let Some(caps) = HCL_BLOCK.captures(line) else {
                i += 1;
                continue;
            };
            let block = &caps[1];
            let (name, kind) = match (block, caps.get(3)) {
                ("resource" | "data", Some(second)) => (format!("{}.{}", &caps[2], second.as_str()), SymbolKind::Class),
                ("variable", _) => (caps[2].to_string(), SymbolKind::Variable),
                ("output", _) => (caps[2].to_string(), SymbolKind::Constant),
                ("module", _) => (caps[2].to_string(), SymbolKind::Module),
                _ => {
                    i += 1;
                    continue;
                }
            };

            let end = block_end(&lines, i);
            let mut description = None;
            let mut source = None;
            for inner in &lines[i + 1..end.min(lines.len())] {
                if let Some(attr) = HCL_ATTR.captures(inner) {
                    match &attr[1] {
                        "description" if description.is_none() => description = Some(attr[2].to_string()),
                        "source" if source.is_none() => source = Some(attr[2].to_string()),
                        _ => {}
                    }
                }
            }

            let mut location = line_location(file_path, i, line);
            location.end_line = Some(end.min(lines.len().saturating_sub(1)) + 1);
            let mut symbol = Symbol::new(name, kind, location);
            symbol.exported = matches!(block, "variable" | "output" | "module");
            symbol.docs = description
                .and_then(|d| from_plain_text(&d))
                .or_else(|| docs_above(&lines, i, &["#", "//"]));
            symbol.signature = Some(collapse_whitespace(line.trim_end_matches('{')));
            if block == "data" {
                symbol.decorators.push("data".to_string());
            }
            builder.add(symbol);

            if let Some(source) = source {
                let mut import = Import::new(source);
                import.specifiers.push(ImportSpecifier::namespace(&caps[2]));
                builder.import(import);
            }
            i = end + 1;
        }

        builder.export_flagged_symbols();
        Ok(builder.finish())
    }
}

/// Index of the line closing the block opened on `start`, by brace depth.
fn block_end(lines: &[&str], start: usize) -> usize {
    let mut depth = 0i32;
    for (offset, line) in lines[start..].iter().enumerate() {
        let mut in_string = false;
        let mut prev = '\0';
        for c in line.chars() {
            match c {
                '"' if prev != '\\' => in_string = !in_string,
                '#' if !in_string => break,
                '{' if !in_string => depth += 1,
                '}' if !in_string => depth -= 1,
                _ => {}
            }
            prev = c;
        }
        if depth <= 0 {
            return start + offset;
        }
    }
    lines.len()
}

/// SQL `CREATE` statements.
pub struct SqlParser;

impl LanguageParser for SqlParser {
    fn language(&self) -> Language {
        Language::Sql
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let lines: Vec<&str> = content.lines().collect();
        let mut builder = ModuleBuilder::new(file_path);
        builder.set_module_doc(detached_module_doc(&lines, &["--"]));

        for (i, line) in lines.iter().enumerate() {
            let Some(caps) = SQL_CREATE.captures(line) else {
                continue;
            };
            let kind = match caps[1].to_ascii_uppercase().as_str() {
                "TABLE" => SymbolKind::Class,
                "VIEW" => SymbolKind::Interface,
                "FUNCTION" | "PROCEDURE" => SymbolKind::Function,
                _ => SymbolKind::Type,
            };
            let name: String = caps[2]
                .chars()
                .filter(|c| !matches!(c, '"' | '`' | '[' | ']'))
                .collect();
            let mut symbol = Symbol::new(name, kind, line_location(file_path, i, line));
            symbol.exported = true;
            symbol.docs = docs_above(&lines, i, &["--"]);
            let header = line.trim().trim_end_matches(|c: char| c == '(' || c == ';' || c.is_whitespace());
            symbol.signature = Some(collapse_whitespace(header));
            builder.add(symbol);
        }

        builder.export_flagged_symbols();
        Ok(builder.finish())
    }
}

/// Markdown: headings, the first paragraph and links to local files.
pub struct MarkdownParser;

/// Paragraph accumulator: a finished paragraph documents the heading above
/// it, or the module when no heading precedes it.
#[derive(Default)]
struct Paragraphs<'s> {
    current: Vec<&'s str>,
    pending_heading: Option<String>,
    module: Option<Vec<&'s str>>,
}

impl<'s> Paragraphs<'s> {
    fn flush(&mut self, builder: &mut ModuleBuilder) {
        if self.current.is_empty() {
            return;
        }
        match self.pending_heading.take() {
            Some(id) => {
                if let Some(symbol) = builder.symbol_mut(&id) {
                    symbol.docs = from_plain_text(&self.current.join("\n"));
                }
            }
            None => {
                if self.module.is_none() {
                    self.module = Some(self.current.clone());
                }
            }
        }
        self.current.clear();
    }
}

impl LanguageParser for MarkdownParser {
    fn language(&self) -> Language {
        Language::Markdown
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let lines: Vec<&str> = content.lines().collect();
        let mut builder = ModuleBuilder::new(file_path);

        let mut start = 0;
        // YAML front matter
        if lines.first().map(|l| l.trim() == "---").unwrap_or(false) {
            if let Some(close) = lines.iter().skip(1).position(|l| l.trim() == "---" || l.trim() == "...") {
                start = close + 2;
            }
        }

        // (level, id) of the open headings
        let mut stack: Vec<(usize, String)> = Vec::new();
        let mut paragraphs = Paragraphs::default();
        let mut in_fence = false;

        for (i, line) in lines.iter().enumerate().skip(start) {
            let trimmed = line.trim();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
                paragraphs.flush(&mut builder);
                continue;
            }
            if in_fence {
                continue;
            }

            for caps in MD_LINK.captures_iter(line) {
                if let Some(source) = local_link(&caps[1]) {
                    builder.import(Import::new(source));
                }
            }

            if let Some(caps) = MD_HEADING.captures(trimmed) {
                paragraphs.flush(&mut builder);
                let level = caps[1].len();
                let title = caps[2].trim().to_string();
                while stack.last().map(|(l, _)| *l >= level).unwrap_or(false) {
                    stack.pop();
                }
                let mut symbol = Symbol::new(title, SymbolKind::Namespace, line_location(file_path, i, line));
                symbol.signature = Some(trimmed.to_string());
                let id = match stack.last() {
                    Some((_, parent)) => {
                        let parent = parent.clone();
                        builder.add_member(&parent, symbol)
                    }
                    None => builder.add(symbol),
                };
                stack.push((level, id.clone()));
                paragraphs.pending_heading = Some(id);
                continue;
            }

            if trimmed.is_empty() {
                paragraphs.flush(&mut builder);
            } else if !trimmed.starts_with("<!--") && !trimmed.starts_with('|') && !trimmed.starts_with("![") {
                paragraphs.current.push(trimmed);
            }
        }
        paragraphs.flush(&mut builder);

        // Without an introductory paragraph the first section's text stands in.
        let doc = paragraphs
            .module
            .and_then(|p| from_plain_text(&p.join("\n")))
            .or_else(|| {
                builder
                    .symbols()
                    .iter()
                    .find(|s| s.parent_id.is_none())
                    .and_then(|s| s.docs.clone())
            });
        builder.set_module_doc(doc);

        Ok(builder.finish())
    }
}

/// A link target that points into the repository, without its anchor.
fn local_link(target: &str) -> Option<String> {
    let lower = target.to_ascii_lowercase();
    if target.starts_with('#')
        || target.starts_with("//")
        || lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("mailto:")
        || lower.starts_with("data:")
        || lower.contains("://")
    {
        return None;
    }
    let path = target.split(['#', '?']).next().unwrap_or(target);
    if path.is_empty() {
        return None;
    }
    Some(relative_source(path))
}

/// Module-summary fallback: reads a leading comment and nothing else.
pub struct TextParser {
    language: Language,
}

impl TextParser {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl LanguageParser for TextParser {
    fn language(&self) -> Language {
        self.language
    }

    fn parse(&self, content: &str, file_path: &str) -> Result<ParseOutput, ParseError> {
        let mut builder = ModuleBuilder::new(file_path);
        builder.set_module_doc(leading_summary(content, line_comment_prefixes(self.language)));
        Ok(builder.finish())
    }
}

/// Line comment markers per language. `#` is a preprocessor line in C.
fn line_comment_prefixes(language: Language) -> &'static [&'static str] {
    match language {
        Language::C | Language::Cpp | Language::Kotlin | Language::Swift | Language::Scala | Language::Json => &["//"],
        Language::Lua | Language::Sql => &["--"],
        _ => &["#", "//"],
    }
}

/// Summary from the first comment in the file: a block comment of any
/// syntax or a run of lines starting with one of `prefixes`.
pub fn leading_summary(content: &str, prefixes: &[&str]) -> Option<DocComment> {
    let lines: Vec<&str> = content
        .lines()
        .skip_while(|l| l.trim().is_empty() || l.starts_with("#!") || is_directive(l))
        .collect();
    let first = lines.first()?.trim_start();

    for (open, close) in [("/*", "*/"), ("<!--", "-->"), ("--[[", "]]")] {
        if first.starts_with(open) {
            let joined = lines.join("\n");
            let end = joined.find(close).map(|e| e + close.len()).unwrap_or(joined.len());
            let block = &joined[..end];
            let body = if open == "/*" {
                strip_block_comment(block)
            } else {
                let inner = block.trim().trim_start_matches(open).trim_end_matches(close);
                let inner_lines: Vec<&str> = inner.lines().map(str::trim).collect();
                trim_blank_lines(&inner_lines).join("\n")
            };
            return from_plain_text(&body);
        }
    }

    for prefix in prefixes {
        if first.starts_with(prefix) {
            let block: Vec<&str> = lines
                .iter()
                .copied()
                .take_while(|l| l.trim_start().starts_with(prefix))
                .collect();
            let stripped = strip_line_prefix(&block, &[*prefix]);
            return from_plain_text(&stripped.join("\n"));
        }
    }
    None
}

/// Dockerfile parser directives and similar pragmas that are not prose.
fn is_directive(line: &str) -> bool {
    let body = line.trim_start_matches('#').trim().to_ascii_lowercase();
    line.starts_with('#') && (body.starts_with("syntax=") || body.starts_with("escape=") || body.starts_with("check="))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(output: &ParseOutput) -> Vec<&str> {
        output.symbols.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_yaml_top_level_keys() {
        let source = "# CI pipeline.\n\n# Build settings.\nbuild:\n  image: rust\n  steps: []\n\"deploy\": true\n- stray\n";
        let output = YamlParser.parse(source, ".ci/pipeline.yml").unwrap();
        assert_eq!(names(&output), vec!["build", "deploy"]);
        assert!(output.symbols.iter().all(|s| s.exported && s.kind == SymbolKind::Property));
        assert_eq!(output.module_doc.as_ref().map(|d| d.summary.as_str()), Some("CI pipeline."));
        assert_eq!(
            output.symbols[0].docs.as_ref().map(|d| d.summary.as_str()),
            Some("Build settings.")
        );
        assert_eq!(output.exports.len(), 2);
    }

    #[test]
    fn test_shell_functions_exports_and_sources() {
        let source = r#"#!/usr/bin/env bash
# Deployment helpers.

source ./lib/common.sh
. "$HOME/.profile"

export APP_ENV=production

# Deploy the app.
deploy() {
  echo deploying
}

function _cleanup {
  rm -rf tmp
}
"#;
        let output = ShellParser.parse(source, "scripts/deploy.sh").unwrap();
        assert_eq!(output.module_doc.as_ref().map(|d| d.summary.as_str()), Some("Deployment helpers."));
        assert_eq!(output.imports.len(), 1);
        assert_eq!(output.imports[0].source, "./lib/common.sh");

        assert_eq!(names(&output), vec!["APP_ENV", "deploy", "_cleanup"]);
        let deploy = &output.symbols[1];
        assert_eq!(deploy.kind, SymbolKind::Function);
        assert_eq!(deploy.docs.as_ref().map(|d| d.summary.as_str()), Some("Deploy the app."));
        assert_eq!(deploy.location.line, 10);
        let cleanup = &output.symbols[2];
        assert_eq!(cleanup.visibility, Visibility::Private);
        assert!(!cleanup.exported);
    }

    #[test]
    fn test_hcl_blocks() {
        let source = r#"# Network module.

variable "region" {
  description = "AWS region"
  default     = "us-east-1"
}

resource "aws_vpc" "main" {
  cidr_block = "10.0.0.0/16"
  tags = {
    Name = "main"
  }
}

module "db" {
  source = "./modules/db"
}

output "vpc_id" {
  value = aws_vpc.main.id
}
"#;
        let output = HclParser.parse(source, "infra/main.tf").unwrap();
        assert_eq!(names(&output), vec!["region", "aws_vpc.main", "db", "vpc_id"]);
        assert_eq!(output.symbols[0].kind, SymbolKind::Variable);
        assert_eq!(
            output.symbols[0].docs.as_ref().map(|d| d.summary.as_str()),
            Some("AWS region")
        );
        assert_eq!(output.symbols[1].kind, SymbolKind::Class);
        assert_eq!(output.symbols[1].location.end_line, Some(13));
        assert_eq!(output.symbols[2].kind, SymbolKind::Module);
        assert_eq!(output.symbols[3].kind, SymbolKind::Constant);
        assert_eq!(output.imports.len(), 1);
        assert_eq!(output.imports[0].source, "./modules/db");
        assert_eq!(output.module_doc.as_ref().map(|d| d.summary.as_str()), Some("Network module."));
    }

    #[test]
    fn test_sql_create_statements() {
        let source = r#"-- Schema for billing.

-- Customer accounts.
CREATE TABLE IF NOT EXISTS "accounts" (
  id serial primary key
);
create or replace view active_accounts as select * from accounts;
CREATE FUNCTION billing.total(a int) RETURNS int AS $$ SELECT a $$ LANGUAGE sql;
CREATE TYPE mood AS ENUM ('happy', 'sad');
"#;
        let output = SqlParser.parse(source, "db/schema.sql").unwrap();
        assert_eq!(names(&output), vec!["accounts", "active_accounts", "billing.total", "mood"]);
        let kinds: Vec<SymbolKind> = output.symbols.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SymbolKind::Class, SymbolKind::Interface, SymbolKind::Function, SymbolKind::Type]
        );
        assert_eq!(
            output.symbols[0].docs.as_ref().map(|d| d.summary.as_str()),
            Some("Customer accounts.")
        );
        assert_eq!(output.module_doc.as_ref().map(|d| d.summary.as_str()), Some("Schema for billing."));
    }

    #[test]
    fn test_markdown_headings_and_links() {
        let source = r#"---
title: Guide
---
# Guide

Start here for setup.

## Install

Run the installer. See [config](config.md#options) and [site](https://example.com).

```
# not a heading
```

### Linux

## Usage

![diagram](./img/flow.png)
"#;
        let output = MarkdownParser.parse(source, "docs/guide.md").unwrap();
        assert_eq!(names(&output), vec!["Guide", "Install", "Linux", "Usage"]);
        let linux = &output.symbols[2];
        assert_eq!(linux.id, "docs/guide.md:Guide.Install.Linux");
        assert_eq!(output.symbols[3].parent_id.as_deref(), Some("docs/guide.md:Guide"));
        assert_eq!(
            output.symbols[1].docs.as_ref().map(|d| d.summary.as_str()),
            Some("Run the installer. See [config](config.md#options) and [site](https://example.com).")
        );
        assert_eq!(output.module_doc.as_ref().map(|d| d.summary.as_str()), Some("Start here for setup."));

        let sources: Vec<&str> = output.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["./config.md", "./img/flow.png"]);
    }

    #[test]
    fn test_text_fallback_summaries() {
        let c = TextParser::new(Language::C)
            .parse("/*\n * Ring buffer.\n */\n#include <stdio.h>\n", "src/ring.c")
            .unwrap();
        assert_eq!(c.module_doc.as_ref().map(|d| d.summary.as_str()), Some("Ring buffer."));
        assert!(c.symbols.is_empty());

        let docker = TextParser::new(Language::Dockerfile)
            .parse("# syntax=docker/dockerfile:1\n# Build image.\nFROM rust\n", "Dockerfile")
            .unwrap();
        assert_eq!(docker.module_doc.as_ref().map(|d| d.summary.as_str()), Some("Build image."));

        let lua = TextParser::new(Language::Lua)
            .parse("-- Plugin entry.\nlocal M = {}\n", "init.lua")
            .unwrap();
        assert_eq!(lua.module_doc.as_ref().map(|d| d.summary.as_str()), Some("Plugin entry."));

        let json = TextParser::new(Language::Json).parse("{\"a\": 1}", "a.json").unwrap();
        assert!(json.module_doc.is_none());

        let header = TextParser::new(Language::Cpp)
            .parse("#include <vector>\n// not the summary\n", "src/a.cpp")
            .unwrap();
        assert!(header.module_doc.is_none());
    }
}
