//! BERT word embeddings.
//!
//! The workspace splits the pipeline into three crates, re-exported here:
//! [`tokenizer`] turns sentences into vocabulary pieces, [`embedding`] batches
//! pieces through an inference engine, and [`model`] ties both to a
//! persistable container.

pub use embedding;
pub use model;
pub use tokenizer;

pub mod overrides;

pub use model::{Annotation, BertEmbeddings, EmbeddingsConfig, ModelError};
pub use tokenizer::Sentence;

/// One sentence per non-blank line; offsets are bytes into `text`.
pub fn sentences_from_lines(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if !content.trim().is_empty() {
            sentences.push(Sentence::new(content, offset, sentences.len()));
        }
        offset += line.len();
    }
    sentences
}
