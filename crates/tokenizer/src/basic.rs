//! Whitespace and punctuation splitting ahead of wordpiece segmentation.

use crate::types::{Sentence, Token};
use unicode_normalization::char::is_combining_mark;
use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

/// Splits sentence text into word tokens.
///
/// Whitespace separates tokens; punctuation and CJK ideographs always become
/// single-character tokens. Control characters are dropped without breaking
/// the surrounding word. Offsets always refer to the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicTokenizer {
    lowercase: bool,
}

struct Pending {
    begin: usize,
    end: usize,
    raw: String,
}

impl BasicTokenizer {
    pub fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }

    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    pub fn tokenize(&self, sentence: &Sentence) -> Vec<Token> {
        let base = sentence.begin;
        let mut tokens = Vec::new();
        let mut pending: Option<Pending> = None;

        for (offset, ch) in sentence.text.char_indices() {
            let begin = base + offset;
            let end = begin + ch.len_utf8();

            if is_dropped(ch) {
                continue;
            }

            if ch.is_whitespace() {
                self.flush(&mut pending, &mut tokens);
            } else if is_punctuation(ch) || is_cjk_ideograph(ch) {
                self.flush(&mut pending, &mut tokens);
                self.push(&mut tokens, begin, end, ch.to_string());
            } else {
                match pending.as_mut() {
                    Some(word) => {
                        word.raw.push(ch);
                        word.end = end;
                    }
                    None => {
                        pending = Some(Pending {
                            begin,
                            end,
                            raw: ch.to_string(),
                        })
                    }
                }
            }
        }

        self.flush(&mut pending, &mut tokens);
        tokens
    }

    /// Re-splits a token produced by an upstream tokenizer.
    pub fn tokenize_token(&self, token: &Token) -> Vec<Token> {
        self.tokenize(&Sentence::new(token.text.clone(), token.begin, 0))
    }

    pub fn normalize(&self, raw: &str) -> String {
        if self.lowercase {
            raw.to_lowercase()
                .nfd()
                .filter(|c| !is_combining_mark(*c))
                .collect()
        } else {
            raw.to_owned()
        }
    }

    fn flush(&self, pending: &mut Option<Pending>, tokens: &mut Vec<Token>) {
        if let Some(word) = pending.take() {
            self.push(tokens, word.begin, word.end, word.raw);
        }
    }

    fn push(&self, tokens: &mut Vec<Token>, begin: usize, end: usize, raw: String) {
        let text = self.normalize(&raw);
        // a lone combining mark normalizes away
        if text.is_empty() {
            return;
        }
        tokens.push(Token { text, begin, end });
    }
}

fn is_dropped(ch: char) -> bool {
    if ch == '\u{0}' || ch == '\u{fffd}' {
        return true;
    }
    if ch.is_whitespace() {
        return false;
    }
    ch.is_control() || matches!(ch, '\u{200b}'..='\u{200f}' | '\u{feff}')
}

/// ASCII symbols such as `$` and `^` count as punctuation too, so they are
/// split off like commas.
pub(crate) fn is_punctuation(ch: char) -> bool {
    ch.is_ascii_punctuation() || ch.is_punctuation()
}

pub(crate) fn is_cjk_ideograph(ch: char) -> bool {
    matches!(
        ch,
        '\u{4e00}'..='\u{9fff}'
            | '\u{3400}'..='\u{4dbf}'
            | '\u{20000}'..='\u{2a6df}'
            | '\u{2a700}'..='\u{2b73f}'
            | '\u{2b740}'..='\u{2b81f}'
            | '\u{2b820}'..='\u{2ceaf}'
            | '\u{f900}'..='\u{faff}'
            | '\u{2f800}'..='\u{2fa1f}'
    )
}
