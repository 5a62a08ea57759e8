//! Boundary markers, truncation and padding for engine batches.
//!
//! A batch is a rectangular `(batch, seq_len)` id matrix plus a mask of the
//! same shape where `1` marks a real position and `0` a padding position.

use serde::{Deserialize, Serialize};
use tokenizer::{SpecialIds, TokenPiece, WordpieceTokenizedSentence};

use crate::error::{EmbeddingError, Result};

/// Number of boundary markers wrapped around each sentence.
pub const BOUNDARY_MARKERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Upper bound on pieces per sentence, boundary markers included.
    pub max_sentence_length: usize,
    /// Sentences per engine call.
    pub batch_size: usize,
    /// Width of every returned vector.
    pub dim: usize,
}

impl BatchSettings {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EmbeddingError::InvalidSettings(
                "batch_size must be greater than zero".into(),
            ));
        }
        if self.dim == 0 {
            return Err(EmbeddingError::InvalidSettings(
                "dim must be greater than zero".into(),
            ));
        }
        if self.max_sentence_length <= BOUNDARY_MARKERS {
            return Err(EmbeddingError::InvalidSettings(format!(
                "max_sentence_length must exceed {BOUNDARY_MARKERS} to leave room for content, got {}",
                self.max_sentence_length
            )));
        }
        Ok(())
    }

    pub fn max_content_pieces(&self) -> usize {
        self.max_sentence_length.saturating_sub(BOUNDARY_MARKERS)
    }
}

/// A sentence wrapped in boundary markers and cut to the length limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSentence {
    pub sentence_index: usize,
    /// `[cls, content.., sep]`.
    pub ids: Vec<u32>,
    /// Content pieces that survived truncation, aligned with `ids[1..]`.
    pub pieces: Vec<TokenPiece>,
    /// Content pieces cut off by truncation.
    pub dropped: usize,
}

impl EncodedSentence {
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }
}

pub fn encode_with_markers(
    sentence: &WordpieceTokenizedSentence,
    special: SpecialIds,
    max_sentence_length: usize,
) -> EncodedSentence {
    let limit = max_sentence_length.saturating_sub(BOUNDARY_MARKERS);
    let kept = sentence.pieces.len().min(limit);
    let pieces = sentence.pieces[..kept].to_vec();

    let mut ids = Vec::with_capacity(kept + BOUNDARY_MARKERS);
    ids.push(special.cls);
    ids.extend(pieces.iter().map(|piece| piece.piece_id));
    ids.push(special.sep);

    EncodedSentence {
        sentence_index: sentence.sentence_index,
        ids,
        pieces,
        dropped: sentence.pieces.len() - kept,
    }
}

/// Rectangular id matrix and its padding mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedBatch {
    input_ids: Vec<Vec<u32>>,
    attention_mask: Vec<Vec<u32>>,
    lengths: Vec<usize>,
    seq_len: usize,
}

impl PaddedBatch {
    /// Pads every sequence to the longest one with `pad_id`.
    pub fn new(sequences: &[&[u32]], pad_id: u32) -> Self {
        let seq_len = sequences.iter().map(|seq| seq.len()).max().unwrap_or(0);
        let mut input_ids = Vec::with_capacity(sequences.len());
        let mut attention_mask = Vec::with_capacity(sequences.len());
        let mut lengths = Vec::with_capacity(sequences.len());

        for seq in sequences {
            let mut ids = Vec::with_capacity(seq_len);
            ids.extend_from_slice(seq);
            ids.resize(seq_len, pad_id);

            let mut mask = vec![1u32; seq.len()];
            mask.resize(seq_len, 0);

            input_ids.push(ids);
            attention_mask.push(mask);
            lengths.push(seq.len());
        }

        Self {
            input_ids,
            attention_mask,
            lengths,
            seq_len,
        }
    }

    pub fn from_encoded(sentences: &[EncodedSentence], pad_id: u32) -> Self {
        let sequences: Vec<&[u32]> = sentences.iter().map(|s| s.ids.as_slice()).collect();
        Self::new(&sequences, pad_id)
    }

    /// Number of sequences.
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.seq_len)
    }

    pub fn input_ids(&self) -> &[Vec<u32>] {
        &self.input_ids
    }

    pub fn attention_mask(&self) -> &[Vec<u32>] {
        &self.attention_mask
    }

    /// Unpadded length of each sequence.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Row-major ids, `len() * seq_len()` elements.
    pub fn flat_ids(&self) -> Vec<u32> {
        self.input_ids.concat()
    }

    pub fn flat_mask(&self) -> Vec<u32> {
        self.attention_mask.concat()
    }
}
