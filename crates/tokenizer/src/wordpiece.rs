//! Greedy longest-match-first sub-word segmentation.

use crate::config::SpecialTokensCfg;
use crate::errors::{Error, Result};
use crate::types::{Token, TokenPiece, TokenizedSentence, WordpieceTokenizedSentence};
use crate::vocab::Vocabulary;
use std::sync::Arc;

/// Segments word tokens into vocabulary pieces.
///
/// At every position the longest prefix of the remaining text that exists in
/// the vocabulary wins; pieces after the first are looked up with the
/// continuation prefix. If some position has no match at all the whole token
/// collapses to a single unknown piece. Every piece carries the byte span of
/// the token it came from.
#[derive(Debug, Clone)]
pub struct WordpieceEncoder {
    vocab: Arc<Vocabulary>,
    unk_token: String,
    unk_id: u32,
    continuation_prefix: String,
}

impl WordpieceEncoder {
    pub fn new(vocab: Arc<Vocabulary>, special: &SpecialTokensCfg) -> Result<Self> {
        let unk_id = vocab.id(&special.unk).ok_or_else(|| Error::MissingSpecialToken {
            token: special.unk.clone(),
        })?;

        Ok(Self {
            vocab,
            unk_token: special.unk.clone(),
            unk_id,
            continuation_prefix: special.continuation_prefix.clone(),
        })
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn encode(&self, token: &Token) -> Vec<TokenPiece> {
        let text = token.text.as_str();
        let mut pieces = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let mut end = text.len();
            let mut matched = None;

            while end > start {
                let candidate = if start == 0 {
                    text[..end].to_owned()
                } else {
                    format!("{}{}", self.continuation_prefix, &text[start..end])
                };

                if let Some(id) = self.vocab.id(&candidate) {
                    matched = Some((candidate, id));
                    break;
                }

                end = text[start..end]
                    .char_indices()
                    .next_back()
                    .map(|(idx, _)| start + idx)
                    .unwrap_or(start);
            }

            let Some((wordpiece, piece_id)) = matched else {
                return vec![self.unknown_piece(token)];
            };

            pieces.push(TokenPiece {
                wordpiece,
                token: token.text.clone(),
                piece_id,
                is_word_start: start == 0,
                begin: token.begin,
                end: token.end,
            });
            start = end;
        }

        pieces
    }

    pub fn encode_sentence(&self, sentence: &TokenizedSentence) -> WordpieceTokenizedSentence {
        let pieces = sentence
            .tokens
            .iter()
            .flat_map(|token| self.encode(token))
            .collect();

        WordpieceTokenizedSentence {
            sentence_index: sentence.sentence_index,
            pieces,
        }
    }

    fn unknown_piece(&self, token: &Token) -> TokenPiece {
        TokenPiece {
            wordpiece: self.unk_token.clone(),
            token: token.text.clone(),
            piece_id: self.unk_id,
            is_word_start: true,
            begin: token.begin,
            end: token.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(tokens: &[&str]) -> WordpieceEncoder {
        let vocab = Arc::new(Vocabulary::from_tokens(tokens.iter().copied()));
        WordpieceEncoder::new(vocab, &SpecialTokensCfg::default()).unwrap()
    }

    fn token(text: &str) -> Token {
        Token {
            text: text.to_owned(),
            begin: 0,
            end: text.len(),
        }
    }

    fn pieces(encoder: &WordpieceEncoder, text: &str) -> Vec<String> {
        encoder
            .encode(&token(text))
            .into_iter()
            .map(|p| p.wordpiece)
            .collect()
    }

    #[test]
    fn whole_word_entry_yields_single_piece() {
        let enc = encoder(&["[UNK]", "hello"]);
        let out = enc.encode(&token("hello"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].wordpiece, "hello");
        assert_eq!(out[0].piece_id, 1);
        assert!(out[0].is_word_start);
    }

    #[test]
    fn longest_prefix_wins_over_segmentation() {
        let enc = encoder(&["[UNK]", "un", "##able", "unable"]);
        assert_eq!(pieces(&enc, "unable"), vec!["unable"]);
    }

    #[test]
    fn segments_with_continuation_prefix() {
        let enc = encoder(&["[UNK]", "un", "##aff", "##able", "##a"]);
        let out = enc.encode(&token("unaffable"));
        let words: Vec<_> = out.iter().map(|p| p.wordpiece.as_str()).collect();
        assert_eq!(words, vec!["un", "##aff", "##able"]);
        let starts: Vec<_> = out.iter().map(|p| p.is_word_start).collect();
        assert_eq!(starts, vec![true, false, false]);
    }

    #[test]
    fn unmatched_position_collapses_to_unknown() {
        let enc = encoder(&["[UNK]", "un"]);
        let out = enc.encode(&token("unxyz"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].wordpiece, "[UNK]");
        assert_eq!(out[0].piece_id, 0);
        assert_eq!(out[0].token, "unxyz");
    }

    #[test]
    fn no_prefix_match_is_unknown() {
        let enc = encoder(&["[UNK]", "hello"]);
        assert_eq!(pieces(&enc, "xyz"), vec!["[UNK]"]);
    }

    #[test]
    fn empty_token_has_no_pieces() {
        let enc = encoder(&["[UNK]"]);
        assert!(enc.encode(&token("")).is_empty());
    }

    #[test]
    fn multibyte_characters_are_split_on_boundaries() {
        let enc = encoder(&["[UNK]", "é", "##t", "##é"]);
        assert_eq!(pieces(&enc, "été"), vec!["é", "##t", "##é"]);
    }

    #[test]
    fn long_tokens_use_the_same_loop() {
        let enc = encoder(&["[UNK]", "a", "##a"]);
        let long = "a".repeat(300);
        let out = enc.encode(&token(&long));
        assert_eq!(out.len(), 300);
        assert!(out[1..].iter().all(|p| p.wordpiece == "##a"));
    }

    #[test]
    fn missing_unknown_token_is_rejected() {
        let vocab = Arc::new(Vocabulary::from_tokens(["hello"]));
        let err = WordpieceEncoder::new(vocab, &SpecialTokensCfg::default()).unwrap_err();
        assert!(matches!(err, Error::MissingSpecialToken { .. }));
    }
}
