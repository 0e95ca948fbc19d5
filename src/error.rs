//! Error types for the commentgate engine.

/// Top-level error enum for the analysis engine.
///
/// Only `Config` and `InternalInvariant` ever cross the engine boundary
/// from `Engine::analyze_all`; parse failures and malformed comments are
/// converted into findings so a run always produces a report.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("parse error in {path} at {line}:{column}: {message}")]
    Parse {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("unterminated block comment starting at {line}:{column}")]
    MalformedComment { line: usize, column: usize },

    #[error("invalid style guide: {0}")]
    Config(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Build a parse error for a file without a precise position.
    pub fn parse(path: &str, message: impl Into<String>) -> Self {
        EngineError::Parse {
            path: path.to_string(),
            line: 1,
            column: 1,
            message: message.into(),
        }
    }

    /// Whether this error should abort the whole run rather than one file.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            EngineError::Config(_) | EngineError::InternalInvariant(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
