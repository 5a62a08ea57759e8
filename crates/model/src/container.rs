use std::{
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use embedding::{EngineLoader, InferenceEngine, Orchestrator, WordpieceEmbeddingsSentence};
use tokenizer::{
    Sentence, TokenizedSentence, Vocabulary, WordpieceTokenizedSentence, WordpieceTokenizer,
};

use crate::config::EmbeddingsConfig;
use crate::error::{ModelError, Result};

/// Holds everything needed to turn sentences into word embeddings.
///
/// The vocabulary and configuration are fixed at construction. The
/// inference engine is attached exactly once, either directly with
/// [`BertEmbeddings::set_engine`] or from an artifact directory with
/// [`BertEmbeddings::attach_engine_from`]. Until then every embedding
/// request fails with [`ModelError::EngineNotAttached`].
pub struct BertEmbeddings {
    config: EmbeddingsConfig,
    vocab: Arc<Vocabulary>,
    engine: OnceLock<Arc<dyn InferenceEngine>>,
    engine_artifact: OnceLock<PathBuf>,
}

impl std::fmt::Debug for BertEmbeddings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbeddings")
            .field("config", &self.config)
            .field("vocab_size", &self.vocab.len())
            .field("engine", &self.engine.get().map(|engine| engine.describe()))
            .field("engine_artifact", &self.engine_artifact.get())
            .finish()
    }
}

impl BertEmbeddings {
    pub fn new(config: EmbeddingsConfig, vocab: Vocabulary) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            vocab: Arc::new(vocab),
            engine: OnceLock::new(),
            engine_artifact: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &EmbeddingsConfig {
        &self.config
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn has_engine(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Directory the engine was loaded from, if it came from disk.
    pub fn engine_artifact(&self) -> Option<&Path> {
        self.engine_artifact.get().map(PathBuf::as_path)
    }

    pub fn set_engine(&self, engine: Arc<dyn InferenceEngine>) -> Result<()> {
        let description = engine.describe();
        self.engine
            .set(engine)
            .map_err(|_| ModelError::EngineAlreadyAttached)?;
        log::info!("attached inference engine {description}");
        Ok(())
    }

    /// Loads an engine with `loader` and attaches it, remembering the source
    /// directory so [`BertEmbeddings::save`] can copy it.
    pub fn attach_engine_from(&self, loader: &dyn EngineLoader, artifact_dir: &Path) -> Result<()> {
        if self.has_engine() {
            return Err(ModelError::EngineAlreadyAttached);
        }
        let engine = loader.load(artifact_dir, self.config.dim)?;
        self.set_engine(engine)?;
        // the engine slot was empty above, so this slot is too
        let _ = self.engine_artifact.set(artifact_dir.to_path_buf());
        Ok(())
    }

    /// Builds the tokenizer and orchestrator pair used for inference.
    ///
    /// Fails when the vocabulary lacks a required marker or when no engine
    /// has been attached.
    pub fn inference_model(&self) -> Result<InferenceModel> {
        let tokenizer = WordpieceTokenizer::new(&self.config.tokenizer_config(), self.vocab.clone())?;
        let engine = self
            .engine
            .get()
            .cloned()
            .ok_or(ModelError::EngineNotAttached)?;
        let orchestrator =
            Orchestrator::new(engine, self.config.batch_settings(), tokenizer.special_ids())?;
        Ok(InferenceModel {
            tokenizer,
            orchestrator,
        })
    }

    pub fn embed_sentences(&self, sentences: &[Sentence]) -> Result<Vec<WordpieceEmbeddingsSentence>> {
        self.inference_model()?.embed_sentences(sentences)
    }
}

/// Tokenizer and orchestrator sharing one vocabulary.
pub struct InferenceModel {
    tokenizer: WordpieceTokenizer,
    orchestrator: Orchestrator,
}

impl InferenceModel {
    pub fn tokenizer(&self) -> &WordpieceTokenizer {
        &self.tokenizer
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn tokenize(&self, sentences: &[Sentence]) -> Vec<WordpieceTokenizedSentence> {
        sentences
            .iter()
            .map(|sentence| self.tokenizer.tokenize(sentence))
            .collect()
    }

    /// Wordpiece-encodes tokens that were produced upstream.
    pub fn tokenize_tokens(&self, sentences: &[TokenizedSentence]) -> Vec<WordpieceTokenizedSentence> {
        sentences
            .iter()
            .map(|sentence| {
                self.tokenizer
                    .tokenize_tokens(sentence.sentence_index, &sentence.tokens)
            })
            .collect()
    }

    pub fn calculate_embeddings(
        &self,
        sentences: &[WordpieceTokenizedSentence],
    ) -> Result<Vec<WordpieceEmbeddingsSentence>> {
        Ok(self.orchestrator.calculate_embeddings(sentences)?)
    }

    pub fn embed_sentences(&self, sentences: &[Sentence]) -> Result<Vec<WordpieceEmbeddingsSentence>> {
        self.calculate_embeddings(&self.tokenize(sentences))
    }
}
