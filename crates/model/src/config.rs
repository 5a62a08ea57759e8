use std::{fs, path::Path};

use embedding::{batch::BOUNDARY_MARKERS, BatchSettings};
use serde::{Deserialize, Serialize};
use tokenizer::{Config as TokenizerConfig, SpecialTokensCfg};

use crate::error::{ModelError, Result};

pub const DEFAULT_MAX_SENTENCE_LENGTH: usize = 256;
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_DIM: usize = 768;
pub const DEFAULT_ANNOTATOR_TYPE: &str = "word_embeddings";

/// User-facing settings of a [`crate::BertEmbeddings`] container.
///
/// Every field has a default, so an empty TOML or JSON document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Pieces per sentence including the two boundary markers.
    #[serde(default = "default_max_sentence_length")]
    pub max_sentence_length: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Width of the vectors produced by the engine.
    #[serde(default = "default_dim")]
    pub dim: usize,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    #[serde(default)]
    pub special_tokens: SpecialTokensCfg,
    /// Type tag written on every output annotation.
    #[serde(default = "default_annotator_type")]
    pub annotator_type: String,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            max_sentence_length: default_max_sentence_length(),
            batch_size: default_batch_size(),
            dim: default_dim(),
            lowercase: default_lowercase(),
            special_tokens: SpecialTokensCfg::default(),
            annotator_type: default_annotator_type(),
        }
    }
}

impl EmbeddingsConfig {
    /// Reads a `.toml` or `.json` file and validates it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: EmbeddingsConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("toml") | None => toml::from_str(&contents)?,
            Some(other) => return Err(ModelError::UnsupportedFormat(other.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_sentence_length(mut self, max_sentence_length: usize) -> Self {
        self.max_sentence_length = max_sentence_length;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn with_special_tokens(mut self, special_tokens: SpecialTokensCfg) -> Self {
        self.special_tokens = special_tokens;
        self
    }

    pub fn with_annotator_type(mut self, annotator_type: impl Into<String>) -> Self {
        self.annotator_type = annotator_type.into();
        self
    }

    /// Reports every problem at once rather than stopping at the first.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.batch_size == 0 {
            errors.push("batch_size must be greater than 0".to_string());
        }

        if self.dim == 0 {
            errors.push("dim must be greater than 0".to_string());
        }

        if self.max_sentence_length <= BOUNDARY_MARKERS {
            errors.push(format!(
                "max_sentence_length must be at least {}, got {}",
                BOUNDARY_MARKERS + 1,
                self.max_sentence_length
            ));
        }

        if self.annotator_type.trim().is_empty() {
            errors.push("annotator_type must not be empty".to_string());
        }

        if let Err(err) = tokenizer::validate_config(&self.tokenizer_config()) {
            errors.push(err.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ModelError::InvalidConfig(errors))
        }
    }

    pub fn tokenizer_config(&self) -> TokenizerConfig {
        TokenizerConfig {
            lowercase: self.lowercase,
            special_tokens: self.special_tokens.clone(),
        }
    }

    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            max_sentence_length: self.max_sentence_length,
            batch_size: self.batch_size,
            dim: self.dim,
        }
    }
}

fn default_max_sentence_length() -> usize {
    DEFAULT_MAX_SENTENCE_LENGTH
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_dim() -> usize {
    DEFAULT_DIM
}

fn default_lowercase() -> bool {
    true
}

fn default_annotator_type() -> String {
    DEFAULT_ANNOTATOR_TYPE.to_owned()
}
