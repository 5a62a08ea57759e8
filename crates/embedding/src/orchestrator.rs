//! Turns wordpiece sentences into per-piece embedding vectors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokenizer::{SpecialIds, TokenPiece, WordpieceTokenizedSentence};

use crate::batch::{encode_with_markers, BatchSettings, EncodedSentence, PaddedBatch};
use crate::engine::InferenceEngine;
use crate::error::{EmbeddingError, Result};

/// A content piece and the vector the engine produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPieceEmbeddings {
    pub piece: TokenPiece,
    pub embeddings: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WordpieceEmbeddingsSentence {
    pub sentence_index: usize,
    pub pieces: Vec<TokenPieceEmbeddings>,
}

impl WordpieceEmbeddingsSentence {
    /// One entry per token: the vector of its first piece. Vectors of
    /// continuation pieces are discarded.
    pub fn word_embeddings(&self) -> impl Iterator<Item = &TokenPieceEmbeddings> {
        self.pieces.iter().filter(|entry| entry.piece.is_word_start)
    }
}

/// Batches sentences, calls the engine and realigns its output.
pub struct Orchestrator {
    engine: Arc<dyn InferenceEngine>,
    settings: BatchSettings,
    special: SpecialIds,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn InferenceEngine>,
        settings: BatchSettings,
        special: SpecialIds,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            engine,
            settings,
            special,
        })
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// One output per input sentence, in input order.
    ///
    /// Sentences longer than `max_sentence_length` lose their trailing pieces
    /// with a warning; the rest of the batch is unaffected.
    pub fn calculate_embeddings(
        &self,
        sentences: &[WordpieceTokenizedSentence],
    ) -> Result<Vec<WordpieceEmbeddingsSentence>> {
        let encoded: Vec<EncodedSentence> = sentences
            .iter()
            .map(|sentence| {
                encode_with_markers(sentence, self.special, self.settings.max_sentence_length)
            })
            .collect();

        for sentence in encoded.iter().filter(|s| s.is_truncated()) {
            log::warn!(
                "sentence {} truncated to {} pieces, {} pieces dropped",
                sentence.sentence_index,
                self.settings.max_sentence_length,
                sentence.dropped
            );
        }

        let mut results = Vec::with_capacity(encoded.len());
        for chunk in encoded.chunks(self.settings.batch_size) {
            results.extend(self.run_batch(chunk)?);
        }
        Ok(results)
    }

    fn run_batch(&self, chunk: &[EncodedSentence]) -> Result<Vec<WordpieceEmbeddingsSentence>> {
        let batch = PaddedBatch::from_encoded(chunk, self.special.pad);
        let dim = self.settings.dim;
        log::debug!(
            "running {} on batch of {} sentences, padded length {}",
            self.engine.describe(),
            batch.len(),
            batch.seq_len()
        );

        let output = self.engine.infer(&batch, dim)?;
        let expected = (batch.len(), batch.seq_len(), dim);
        if output.shape() != expected {
            return Err(EmbeddingError::ShapeMismatch {
                expected,
                actual: output.shape(),
            });
        }

        let sentences = chunk
            .iter()
            .enumerate()
            .map(|(row, sentence)| WordpieceEmbeddingsSentence {
                sentence_index: sentence.sentence_index,
                // position 0 holds the start marker
                pieces: sentence
                    .pieces
                    .iter()
                    .enumerate()
                    .map(|(idx, piece)| TokenPieceEmbeddings {
                        piece: piece.clone(),
                        embeddings: output.vector(row, idx + 1).to_vec(),
                    })
                    .collect(),
            })
            .collect();
        Ok(sentences)
    }
}
