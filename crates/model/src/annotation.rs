//! Flat annotation records exchanged with the surrounding pipeline.
//!
//! Offsets are half-open byte ranges into the source document, the same
//! convention used by [`tokenizer::Token`].

use std::collections::BTreeMap;

use embedding::WordpieceEmbeddingsSentence;
use serde::{Deserialize, Serialize};
use tokenizer::{Sentence, Token, TokenizedSentence};

use crate::container::BertEmbeddings;
use crate::error::Result;

pub const DOCUMENT: &str = "document";
pub const TOKEN: &str = "token";
pub const WORD_EMBEDDINGS: &str = "word_embeddings";

pub const SENTENCE_KEY: &str = "sentence";
pub const TOKEN_KEY: &str = "token";
pub const PIECE_ID_KEY: &str = "pieceId";
pub const IS_WORD_START_KEY: &str = "isWordStart";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub annotator_type: String,
    pub begin: usize,
    pub end: usize,
    pub result: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeddings: Vec<f32>,
}

impl Annotation {
    pub fn document(sentence: &Sentence) -> Self {
        Self {
            annotator_type: DOCUMENT.to_owned(),
            begin: sentence.begin,
            end: sentence.end(),
            result: sentence.text.clone(),
            metadata: BTreeMap::from([(SENTENCE_KEY.to_owned(), sentence.index.to_string())]),
            embeddings: Vec::new(),
        }
    }

    pub fn token(token: &Token, sentence_index: usize) -> Self {
        Self {
            annotator_type: TOKEN.to_owned(),
            begin: token.begin,
            end: token.end,
            result: token.text.clone(),
            metadata: BTreeMap::from([(SENTENCE_KEY.to_owned(), sentence_index.to_string())]),
            embeddings: Vec::new(),
        }
    }

    fn sentence_index(&self) -> Option<usize> {
        self.metadata.get(SENTENCE_KEY)?.parse().ok()
    }
}

/// Groups `token` annotations under the `document` annotation whose span
/// contains them.
///
/// A document without a `sentence` metadata entry takes its position among
/// the documents as index. Tokens outside every document are skipped.
pub fn group_tokens(annotations: &[Annotation]) -> Vec<TokenizedSentence> {
    let documents: Vec<&Annotation> = annotations
        .iter()
        .filter(|annotation| annotation.annotator_type == DOCUMENT)
        .collect();

    let mut sentences: Vec<TokenizedSentence> = documents
        .iter()
        .enumerate()
        .map(|(position, document)| TokenizedSentence {
            sentence_index: document.sentence_index().unwrap_or(position),
            tokens: Vec::new(),
        })
        .collect();

    for token in annotations
        .iter()
        .filter(|annotation| annotation.annotator_type == TOKEN)
    {
        let owner = documents
            .iter()
            .position(|document| document.begin <= token.begin && token.end <= document.end);
        match owner {
            Some(slot) => sentences[slot].tokens.push(Token {
                text: token.result.clone(),
                begin: token.begin,
                end: token.end,
            }),
            None => log::debug!(
                "token '{}' at {}..{} lies outside every document, skipped",
                token.result,
                token.begin,
                token.end
            ),
        }
    }

    sentences
}

/// One annotation per word-start piece, in sentence then token order.
pub fn word_embedding_annotations(
    sentences: &[WordpieceEmbeddingsSentence],
    annotator_type: &str,
) -> Vec<Annotation> {
    sentences
        .iter()
        .flat_map(|sentence| {
            sentence.word_embeddings().map(move |entry| Annotation {
                annotator_type: annotator_type.to_owned(),
                begin: entry.piece.begin,
                end: entry.piece.end,
                result: entry.piece.token.clone(),
                metadata: BTreeMap::from([
                    (SENTENCE_KEY.to_owned(), sentence.sentence_index.to_string()),
                    (TOKEN_KEY.to_owned(), entry.piece.token.clone()),
                    (PIECE_ID_KEY.to_owned(), entry.piece.piece_id.to_string()),
                    (
                        IS_WORD_START_KEY.to_owned(),
                        entry.piece.is_word_start.to_string(),
                    ),
                ]),
                embeddings: entry.embeddings.clone(),
            })
        })
        .collect()
}

impl BertEmbeddings {
    /// Consumes `document` and `token` annotations and emits one embedding
    /// annotation per token.
    pub fn annotate(&self, annotations: &[Annotation]) -> Result<Vec<Annotation>> {
        let model = self.inference_model()?;
        let tokenized = group_tokens(annotations);
        let pieces = model.tokenize_tokens(&tokenized);
        let embedded = model.calculate_embeddings(&pieces)?;
        Ok(word_embedding_annotations(
            &embedded,
            &self.config().annotator_type,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence_annotations() -> Vec<Annotation> {
        let first = Sentence::new("hello world", 0, 0);
        let second = Sentence::new("bye", 12, 1);
        vec![
            Annotation::document(&first),
            Annotation::document(&second),
            Annotation::token(
                &Token {
                    text: "hello".into(),
                    begin: 0,
                    end: 5,
                },
                0,
            ),
            Annotation::token(
                &Token {
                    text: "bye".into(),
                    begin: 12,
                    end: 15,
                },
                1,
            ),
            Annotation::token(
                &Token {
                    text: "world".into(),
                    begin: 6,
                    end: 11,
                },
                0,
            ),
        ]
    }

    #[test]
    fn tokens_are_grouped_by_containing_document() {
        let grouped = group_tokens(&sentence_annotations());
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].sentence_index, 0);
        let words: Vec<&str> = grouped[0].tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(words, ["hello", "world"]);
        assert_eq!(grouped[1].sentence_index, 1);
        assert_eq!(grouped[1].tokens[0].begin, 12);
    }

    #[test]
    fn stray_tokens_are_skipped() {
        let mut annotations = sentence_annotations();
        annotations.push(Annotation::token(
            &Token {
                text: "orphan".into(),
                begin: 40,
                end: 46,
            },
            9,
        ));
        let grouped = group_tokens(&annotations);
        let total: usize = grouped.iter().map(|s| s.tokens.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn document_without_index_uses_position() {
        let mut document = Annotation::document(&Sentence::new("solo", 0, 7));
        document.metadata.clear();
        let grouped = group_tokens(&[document]);
        assert_eq!(grouped[0].sentence_index, 0);
    }
}
