use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("unsupported configuration format '{0}'")]
    UnsupportedFormat(String),

    #[error(
        "inference engine not attached; call `set_engine` or `attach_engine_from` before computing embeddings"
    )]
    EngineNotAttached,

    #[error("inference engine already attached; the engine can only be set once")]
    EngineAlreadyAttached,

    #[error("{what} not found at {}", path.display())]
    MissingArtifact { what: &'static str, path: PathBuf },

    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("vocabulary checksum mismatch: metadata records {expected}, file hashes to {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("unsupported saved model version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid saved model metadata: {0}")]
    InvalidMetadata(String),

    #[error(
        "cannot copy engine from {} into {}: the source lies inside the destination",
        artifact.display(),
        target.display()
    )]
    OverlappingEngineCopy { artifact: PathBuf, target: PathBuf },

    #[error("resource error: {0}")]
    Resource(String),

    #[error(transparent)]
    Tokenizer(#[from] tokenizer::Error),

    #[error(transparent)]
    Embedding(#[from] embedding::EmbeddingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde_json error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
