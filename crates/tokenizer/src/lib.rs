//! Vocabulary-driven tokenization for BERT-style encoders.
//!
//! Text flows through two stages: a [`BasicTokenizer`] that splits sentences
//! into words (whitespace, punctuation, CJK ideographs, optional lowercasing
//! with accent stripping) and a [`WordpieceEncoder`] that segments every word
//! into the longest matching vocabulary pieces, marking continuation pieces
//! with `##`. Words that cannot be segmented become a single unknown piece.
//!
//! # Vocabulary
//!
//! A [`Vocabulary`] is closed-world and normally loaded from a `vocab.txt`
//! file where the zero-based line number is the id. The reserved markers
//! named in [`SpecialTokensCfg`] must be present before a
//! [`WordpieceTokenizer`] can be built.
//!
//! # Thread Safety
//!
//! Built tokenizers hold the vocabulary behind an `Arc` and are `Send + Sync`,
//! so one instance can serve concurrent callers.

pub mod artifacts;
pub mod config;
pub mod errors;

mod basic;
mod types;
mod validate;
mod vocab;
mod wordpiece;

use std::path::Path;
use std::sync::Arc;

pub use basic::BasicTokenizer;
pub use config::{Config, SpecialTokensCfg};
pub use errors::{Error, Result};
pub use types::{
    Sentence, SpecialIds, Token, TokenPiece, TokenizedSentence, WordpieceTokenizedSentence,
};
pub use validate::{validate_config, validate_vocab};
pub use vocab::Vocabulary;
pub use wordpiece::WordpieceEncoder;

/// Basic tokenizer and wordpiece encoder sharing one vocabulary.
#[derive(Debug, Clone)]
pub struct WordpieceTokenizer {
    basic: BasicTokenizer,
    encoder: WordpieceEncoder,
    special_ids: SpecialIds,
}

impl WordpieceTokenizer {
    pub fn new(cfg: &Config, vocab: Arc<Vocabulary>) -> Result<Self> {
        validate::validate_config(cfg)?;
        let special_ids = validate::validate_vocab(&vocab, cfg)?;
        let encoder = WordpieceEncoder::new(vocab, &cfg.special_tokens)?;

        let tokenizer = Self {
            basic: BasicTokenizer::new(cfg.lowercase),
            encoder,
            special_ids,
        };
        ensure_send_sync(&tokenizer);
        Ok(tokenizer)
    }

    pub fn special_ids(&self) -> SpecialIds {
        self.special_ids
    }

    pub fn vocab(&self) -> &Vocabulary {
        self.encoder.vocab()
    }

    pub fn basic(&self) -> &BasicTokenizer {
        &self.basic
    }

    pub fn encoder(&self) -> &WordpieceEncoder {
        &self.encoder
    }

    /// Runs both stages over raw sentence text.
    pub fn tokenize(&self, sentence: &Sentence) -> WordpieceTokenizedSentence {
        let tokens = TokenizedSentence {
            sentence_index: sentence.index,
            tokens: self.basic.tokenize(sentence),
        };
        self.encoder.encode_sentence(&tokens)
    }

    /// Runs both stages over tokens produced upstream, re-splitting each with
    /// the basic tokenizer first.
    pub fn tokenize_tokens(&self, sentence_index: usize, tokens: &[Token]) -> WordpieceTokenizedSentence {
        let tokens = TokenizedSentence {
            sentence_index,
            tokens: tokens
                .iter()
                .flat_map(|token| self.basic.tokenize_token(token))
                .collect(),
        };
        self.encoder.encode_sentence(&tokens)
    }
}

/// Builds a tokenizer from a `vocab.txt` on disk.
pub fn build_from_artifacts(cfg: &Config, vocab_path: &Path) -> Result<WordpieceTokenizer> {
    validate::validate_config(cfg)?;
    let vocab = artifacts::load_vocab(vocab_path)?;
    WordpieceTokenizer::new(cfg, Arc::new(vocab))
}

fn ensure_send_sync<T: Send + Sync>(_: &T) {}
