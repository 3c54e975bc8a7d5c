//! Error types for parsing and analysis.

use thiserror::Error;

/// Why an extractor could not produce a usable module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The grammar could not be loaded into a tree-sitter parser.
    #[error("failed to load grammar: {0}")]
    Grammar(String),

    /// Tree-sitter returned no tree at all.
    #[error("parser produced no syntax tree")]
    NoTree,

    /// The tree exists but is mostly errors.
    #[error("unparseable syntax near line {line}")]
    Syntax { line: usize },

    #[error("file is not valid UTF-8")]
    Encoding,
}

/// Why a single file was left out of the manifest.
///
/// All variants are recoverable: the engine logs them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisSkipReason {
    #[error("file too large ({size} bytes, limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("unsupported language")]
    UnsupportedLanguage,

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("read failed: {0}")]
    Io(String),
}

impl AnalysisSkipReason {
    /// Short machine-readable tag used in stats.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisSkipReason::FileTooLarge { .. } => "file-too-large",
            AnalysisSkipReason::UnsupportedLanguage => "unsupported-language",
            AnalysisSkipReason::Parse(_) => "parse-error",
            AnalysisSkipReason::Io(_) => "io-error",
        }
    }
}

impl From<std::io::Error> for AnalysisSkipReason {
    fn from(err: std::io::Error) -> Self {
        AnalysisSkipReason::Io(err.to_string())
    }
}

/// Fatal engine failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to enumerate files under {root}: {message}")]
    Discovery { root: String, message: String },

    #[error("manifest error: {0}")]
    Manifest(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Manifest(err.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Manifest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_messages() {
        let reason = AnalysisSkipReason::FileTooLarge { size: 2048, limit: 1024 };
        assert_eq!(reason.to_string(), "file too large (2048 bytes, limit 1024)");
        assert_eq!(reason.code(), "file-too-large");

        let reason: AnalysisSkipReason = ParseError::Syntax { line: 3 }.into();
        assert_eq!(reason.to_string(), "parse failed: unparseable syntax near line 3");
        assert_eq!(reason.code(), "parse-error");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let reason: AnalysisSkipReason = io.into();
        assert_eq!(reason, AnalysisSkipReason::Io("gone".to_string()));
    }
}
