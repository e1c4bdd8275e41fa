use thiserror::Error;


#[derive(Error, Debug)]
pub enum DialectError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Incomplete answers, missing: {}", .missing.join(", "))]
    IncompleteAnswers { missing: Vec<String> },

    #[error("Schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Invalid top-k request: k={k} with {classes} known classes")]
    InvalidTopK { k: usize, classes: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DialectError {
    pub fn schema_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Self::SchemaMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn model_unavailable(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::ModelUnavailable(format!("{}: {}", path.display(), reason))
    }

    /// Load-time failures stop startup; everything else is local to one request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModelUnavailable(_) | Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, DialectError>;
