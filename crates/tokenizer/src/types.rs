use serde::{Deserialize, Serialize};

/// A sentence produced by upstream sentence splitting.
///
/// `begin` is the byte offset of `text` inside the source document, so token
/// offsets derived from it point back into that document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    pub begin: usize,
    pub index: usize,
}

impl Sentence {
    pub fn new(text: impl Into<String>, begin: usize, index: usize) -> Self {
        Self {
            text: text.into(),
            begin,
            index,
        }
    }

    /// Exclusive end offset of the sentence in the source document.
    pub fn end(&self) -> usize {
        self.begin + self.text.len()
    }
}

/// A contiguous span of the source document.
///
/// `text` holds the normalized form; `begin..end` is the half-open byte range
/// of the original characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub begin: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenizedSentence {
    pub sentence_index: usize,
    pub tokens: Vec<Token>,
}

/// One vocabulary piece of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPiece {
    pub wordpiece: String,
    pub token: String,
    pub piece_id: u32,
    pub is_word_start: bool,
    pub begin: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WordpieceTokenizedSentence {
    pub sentence_index: usize,
    pub pieces: Vec<TokenPiece>,
}

impl WordpieceTokenizedSentence {
    pub fn ids(&self) -> Vec<u32> {
        self.pieces.iter().map(|piece| piece.piece_id).collect()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

/// Resolved ids of the reserved vocabulary entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialIds {
    pub cls: u32,
    pub sep: u32,
    pub unk: u32,
    pub pad: u32,
}
