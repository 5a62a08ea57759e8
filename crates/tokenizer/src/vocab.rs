//! Closed-world sub-word vocabulary.

use crate::config::SpecialTokensCfg;
use crate::errors::{Error, Result};
use crate::types::SpecialIds;
use std::collections::HashMap;

/// Mapping between sub-word strings and their ids.
///
/// Ids are positions in the source list. When a string occurs more than once
/// the last occurrence wins the lookup, but every entry keeps its position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vocabulary {
    token_to_id: HashMap<String, u32>,
    id_to_token: Vec<String>,
}

impl Vocabulary {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id_to_token: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let token_to_id = id_to_token
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as u32))
            .collect();

        Self {
            token_to_id,
            id_to_token,
        }
    }

    /// Parses `vocab.txt` contents: one entry per line.
    pub fn from_vocab_text(text: &str) -> Self {
        Self::from_tokens(text.lines())
    }

    pub fn to_vocab_text(&self) -> String {
        let mut out = String::new();
        for token in &self.id_to_token {
            out.push_str(token);
            out.push('\n');
        }
        out
    }

    pub fn id(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Number of lines, including shadowed duplicates.
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.id_to_token.iter().map(String::as_str)
    }

    /// Looks up the reserved markers. Missing `cls`/`sep`/`unk` is an error;
    /// a missing pad entry falls back to id 0.
    pub fn special_ids(&self, cfg: &SpecialTokensCfg) -> Result<SpecialIds> {
        let lookup = |token: &str| {
            self.id(token).ok_or_else(|| Error::MissingSpecialToken {
                token: token.to_owned(),
            })
        };

        let pad = cfg
            .pad
            .as_deref()
            .and_then(|token| self.id(token))
            .unwrap_or(0);

        Ok(SpecialIds {
            cls: lookup(&cfg.cls)?,
            sep: lookup(&cfg.sep)?,
            unk: lookup(&cfg.unk)?,
            pad,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_line_positions() {
        let vocab = Vocabulary::from_vocab_text("[PAD]\n[UNK]\nhello\n##ing\n");
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.id("[PAD]"), Some(0));
        assert_eq!(vocab.id("##ing"), Some(3));
        assert_eq!(vocab.token(2), Some("hello"));
        assert_eq!(vocab.id("missing"), None);
    }

    #[test]
    fn windows_line_endings_are_stripped() {
        let vocab = Vocabulary::from_vocab_text("a\r\nb\r\n");
        assert_eq!(vocab.id("b"), Some(1));
    }

    #[test]
    fn later_duplicate_wins_lookup() {
        let vocab = Vocabulary::from_tokens(["x", "y", "x"]);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id("x"), Some(2));
        assert_eq!(vocab.token(0), Some("x"));
    }

    #[test]
    fn special_ids_require_markers() {
        let cfg = SpecialTokensCfg::default();
        let vocab = Vocabulary::from_tokens(["[CLS]", "[SEP]", "hello"]);
        let err = vocab.special_ids(&cfg).unwrap_err();
        assert!(matches!(err, Error::MissingSpecialToken { ref token } if token == "[UNK]"));
    }

    #[test]
    fn pad_defaults_to_zero_when_absent() {
        let cfg = SpecialTokensCfg::default();
        let vocab = Vocabulary::from_tokens(["[CLS]", "[SEP]", "hello", "world", "[UNK]"]);
        let ids = vocab.special_ids(&cfg).unwrap();
        assert_eq!(
            ids,
            SpecialIds {
                cls: 0,
                sep: 1,
                unk: 4,
                pad: 0
            }
        );
    }

    #[test]
    fn text_roundtrip_preserves_order() {
        let vocab = Vocabulary::from_tokens(["[CLS]", "", "##a"]);
        let reparsed = Vocabulary::from_vocab_text(&vocab.to_vocab_text());
        assert_eq!(vocab, reparsed);
    }
}
