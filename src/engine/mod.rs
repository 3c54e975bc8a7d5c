//! The analysis orchestrator.
//!
//! One run walks the sorted file list sequentially: stat, detect language,
//! read, hash, parse. Each file ends as a module or a skip reason. The
//! finished module list then feeds workspace resolution, the dependency
//! graph, stats and insights.

pub mod discover;
pub mod reader;

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisSkipReason, EngineError, ParseError};
use crate::graph::{build_dependency_graph, resolve_workspace, workspace::read_go_module, WorkspaceInfo};
use crate::insights::InsightsEngine;
use crate::language::{self, Language};
use crate::manifest::{
    carry_summary_cache, merge_modules, AnalysisManifest, AnalysisStats, ProjectMeta, SCHEMA_VERSION,
};
use crate::model::ModuleInfo;
use crate::parser::ParserRegistry;

pub use discover::{FileLister, GlobFileLister, PathFilter};
pub use reader::{ContentReader, FsContentReader};

/// blake3 hex digest of raw file bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Input of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisRequest<'a> {
    pub root: PathBuf,
    /// Manifest of an earlier run. With `changed` this makes the run
    /// incremental; without it, unchanged files are reused by hash.
    pub previous: Option<&'a AnalysisManifest>,
    /// Repo-relative paths to re-analyze.
    pub changed: Option<Vec<String>>,
}

impl<'a> AnalysisRequest<'a> {
    /// A full scan of `root`.
    pub fn full(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            previous: None,
            changed: None,
        }
    }

    /// Re-analyze `changed` on top of `previous`.
    pub fn incremental(root: impl Into<PathBuf>, previous: &'a AnalysisManifest, changed: Vec<String>) -> Self {
        Self {
            root: root.into(),
            previous: Some(previous),
            changed: Some(changed),
        }
    }

    pub fn with_previous(mut self, previous: &'a AnalysisManifest) -> Self {
        self.previous = Some(previous);
        self
    }
}

/// A module produced for one file.
struct Processed {
    module: ModuleInfo,
    reused: bool,
}

/// Orchestrates a full or incremental analysis.
pub struct Engine<'r> {
    config: AnalysisConfig,
    registry: &'r ParserRegistry,
    lister: Box<dyn FileLister>,
    reader: Box<dyn ContentReader>,
}

impl<'r> Engine<'r> {
    /// Engine over the local file system.
    pub fn new(config: AnalysisConfig, registry: &'r ParserRegistry) -> Self {
        Self {
            config,
            registry,
            lister: Box::new(GlobFileLister),
            reader: Box::new(FsContentReader),
        }
    }

    pub fn with_lister(mut self, lister: Box<dyn FileLister>) -> Self {
        self.lister = lister;
        self
    }

    pub fn with_reader(mut self, reader: Box<dyn ContentReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the analysis. Only failing to enumerate files is fatal.
    pub async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<AnalysisManifest, EngineError> {
        let started = Instant::now();
        let root = request.root.as_path();
        let incremental = match (request.previous, &request.changed) {
            (Some(previous), Some(changed)) => Some((previous, self.target_set(root, changed)?)),
            _ => None,
        };

        let files: Vec<String> = match &incremental {
            Some((_, targets)) => targets.iter().cloned().collect(),
            None => self
                .lister
                .list(root, &self.config.include, &self.config.exclude)
                .await
                .map_err(|e| EngineError::Discovery {
                    root: root.display().to_string(),
                    message: e.to_string(),
                })?
                .into_iter()
                .filter(|f| self.config.allows_extension(f))
                .collect(),
        };
        info!(root = %root.display(), files = files.len(), incremental = incremental.is_some(), "starting analysis");

        // Hash reuse only applies to full scans.
        let reusable: HashMap<&str, &ModuleInfo> = match (&incremental, request.previous) {
            (None, Some(previous)) => previous
                .modules
                .iter()
                .map(|m| (m.file_path.as_str(), m))
                .collect(),
            _ => HashMap::new(),
        };

        let mut fresh = Vec::new();
        let mut skipped: Vec<(String, AnalysisSkipReason)> = Vec::new();
        let mut reused = 0;

        for path in &files {
            let size = match self.reader.size(root, path).await {
                Ok(size) => size,
                Err(e) if incremental.is_some() && e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path, "changed file no longer exists");
                    continue;
                }
                Err(e) => {
                    let reason = AnalysisSkipReason::from(e);
                    warn!(path = %path, reason = %reason, "skipping file");
                    skipped.push((path.clone(), reason));
                    continue;
                }
            };

            match self.process_file(root, path, size, reusable.get(path.as_str()).copied()).await {
                Ok(processed) => {
                    if processed.reused {
                        reused += 1;
                    }
                    fresh.push(processed.module);
                }
                Err(reason) => {
                    warn!(path = %path, reason = %reason, "skipping file");
                    skipped.push((path.clone(), reason));
                }
            }
        }

        let modules = match &incremental {
            Some((previous, targets)) => merge_modules(&previous.modules, fresh, targets),
            None => fresh,
        };

        let workspace = if self.config.detect_monorepo {
            resolve_workspace(root)
        } else {
            WorkspaceInfo {
                go_module: read_go_module(root),
                ..Default::default()
            }
        };
        let dependency_graph = build_dependency_graph(&modules, Some(&workspace), &self.config.aliases);

        let languages: Vec<Language> = modules
            .iter()
            .map(|m| m.language)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let project_workspace = (workspace.is_monorepo() || workspace.go_module.is_some()).then_some(workspace);
        let project_meta = ProjectMeta::read(root, languages, project_workspace);

        let summary_cache = request
            .previous
            .map(|p| carry_summary_cache(&p.summary_cache, &modules))
            .unwrap_or_default();

        let mut stats = AnalysisStats::compute(&modules, &skipped);
        stats.reused_modules = reused;

        let mut manifest = AnalysisManifest {
            version: SCHEMA_VERSION.to_string(),
            modules,
            dependency_graph,
            project_meta,
            stats,
            summary_cache,
            insights: Vec::new(),
        };
        manifest.insights = InsightsEngine::new(self.config.insights.clone()).run(&manifest);
        manifest.stats.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            modules = manifest.modules.len(),
            skipped = manifest.stats.skipped_files,
            reused = manifest.stats.reused_modules,
            edges = manifest.dependency_graph.edges.len(),
            insights = manifest.insights.len(),
            duration_ms = manifest.stats.duration_ms,
            "analysis complete"
        );

        Ok(manifest)
    }

    /// Analyze one file into a module.
    async fn process_file(
        &self,
        root: &Path,
        path: &str,
        size: u64,
        previous: Option<&ModuleInfo>,
    ) -> Result<Processed, AnalysisSkipReason> {
        if size > self.config.max_file_size {
            return Err(AnalysisSkipReason::FileTooLarge {
                size,
                limit: self.config.max_file_size,
            });
        }

        let language = language::detect(path).ok_or(AnalysisSkipReason::UnsupportedLanguage)?;
        let parser = self
            .registry
            .get(language)
            .ok_or(AnalysisSkipReason::UnsupportedLanguage)?;

        let bytes = self.reader.read(root, path).await?;
        let hash = content_hash(&bytes);

        if let Some(previous) = previous.filter(|m| m.content_hash == hash) {
            debug!(path = %path, "content unchanged, reusing module");
            return Ok(Processed {
                module: previous.clone(),
                reused: true,
            });
        }

        let content = String::from_utf8(bytes).map_err(|_| ParseError::Encoding)?;
        let output = parser.parse(&content, path)?;
        debug!(path = %path, language = %language, symbols = output.symbols.len(), "parsed");

        Ok(Processed {
            module: ModuleInfo {
                file_path: path.to_string(),
                language,
                symbols: output.symbols,
                imports: output.imports,
                exports: output.exports,
                module_doc: output.module_doc,
                file_size: size,
                line_count: content.lines().count(),
                content_hash: hash,
                analyzed_at: Utc::now(),
                ai_summary: None,
            },
            reused: false,
        })
    }

    /// Normalize changed paths to repo-relative form and drop filtered ones.
    fn target_set(&self, root: &Path, changed: &[String]) -> Result<BTreeSet<String>, EngineError> {
        let filter = PathFilter::new(&self.config.include, &self.config.exclude).map_err(|e| {
            EngineError::Discovery {
                root: root.display().to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(changed
            .iter()
            .map(|p| {
                let path = Path::new(p);
                let rel = if path.is_absolute() {
                    discover::relative(root, path)
                } else {
                    p.replace('\\', "/")
                };
                rel.trim_start_matches("./").to_string()
            })
            .filter(|p| !p.is_empty() && filter.matches(p) && self.config.allows_extension(p))
            .collect())
    }
}
