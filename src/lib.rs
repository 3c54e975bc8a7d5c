//! Codeatlas - source analysis engine.
//!
//! Codeatlas turns an arbitrary repository into a language-agnostic
//! manifest: modules, exported symbols, doc comments, the import graph and
//! static insights over it.
//!
//! # Architecture
//!
//! Data flows one way through the crate:
//!
//! - `language`: detect a file's language from its path
//! - `parser`: the `ParserRegistry` and one extractor per language
//! - `engine`: discover, read, hash and parse files into `ModuleInfo`
//! - `graph`: workspace discovery and import resolution into a `DependencyGraph`
//! - `manifest`: the `AnalysisManifest`, incremental merge and project metadata
//! - `insights`: heuristic detectors over the finished manifest
//! - `config`, `report`, `cli`: YAML configuration and the command-line surface
//!
//! # Adding a New Language
//!
//! See `src/parser/languages/` for examples. Implement `LanguageParser` and
//! register it in `languages/mod.rs`.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod insights;
pub mod language;
pub mod manifest;
pub mod model;
pub mod parser;
pub mod report;

pub use config::AnalysisConfig;
pub use engine::{AnalysisRequest, ContentReader, Engine, FileLister};
pub use error::{AnalysisSkipReason, EngineError, ParseError};
pub use graph::{build_dependency_graph, resolve_workspace, DependencyGraph, Edge, WorkspaceInfo};
pub use insights::{Insight, InsightCategory, InsightsConfig, InsightsEngine, Severity};
pub use language::{detect as detect_language, Language};
pub use manifest::{merge_modules, AnalysisManifest, AnalysisStats, ProjectMeta};
pub use model::{DocComment, Export, Import, ModuleInfo, Symbol, SymbolKind, Visibility};
pub use parser::{LanguageParser, ParseOutput, ParserRegistry};
