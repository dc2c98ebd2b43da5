use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The input as a whole cannot be interpreted as transaction records.
    /// Fatal for that input, unlike per-record malformation which degrades
    /// to defaults and a warning.
    #[error("Unsupported input format: {detail}")]
    UnsupportedFormat { detail: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Scoring failure for '{entity}': {detail}")]
    Scoring { entity: String, detail: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
