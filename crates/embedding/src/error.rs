//! Error types emitted while batching and running inference.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Batch settings violate a structural invariant.
    #[error("invalid batch settings: {0}")]
    InvalidSettings(String),

    /// The engine returned a tensor that does not match the request.
    #[error("engine output shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    /// Backend failure reported by an inference engine.
    #[error("inference engine failed: {0}")]
    Engine(String),

    /// A required engine artifact is absent.
    #[error("engine artifact not found at {0}")]
    MissingArtifact(String),

    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde_json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
