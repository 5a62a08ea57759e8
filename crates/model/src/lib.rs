//! Model container for BERT word embeddings.
//!
//! [`BertEmbeddings`] binds a vocabulary and an [`EmbeddingsConfig`] to an
//! inference engine, persists itself to a directory and turns `document` and
//! `token` annotations into `word_embeddings` annotations.

pub mod annotation;
pub mod config;
mod container;
pub mod error;
pub mod persist;
pub mod resources;

pub use annotation::{group_tokens, word_embedding_annotations, Annotation};
pub use config::EmbeddingsConfig;
pub use container::{BertEmbeddings, InferenceModel};
pub use error::{ModelError, Result};
pub use persist::SavedMetadata;
#[cfg(feature = "hub")]
pub use resources::HubFetcher;
pub use resources::{LocalCacheFetcher, ResourceFetcher, ResourceRequest};

#[allow(dead_code)]
fn ensure_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BertEmbeddings>();
    assert_send_sync::<InferenceModel>();
}
