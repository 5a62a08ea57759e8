//! Embedding crate
//!
//! Wraps sentences in boundary markers, pads them into fixed-size batches,
//! hands each batch to an [`InferenceEngine`] and maps the returned vectors
//! back onto the wordpiece structure. The engine is opaque: anything that can
//! turn a padded id matrix and mask into per-position vectors qualifies.
//! [`CandleBertEngine`] is the bundled implementation.

pub mod batch;
pub mod candle_bert;
pub mod device;
pub mod engine;
pub mod error;
pub mod orchestrator;

pub use batch::{encode_with_markers, BatchSettings, EncodedSentence, PaddedBatch};
pub use candle_bert::{CandleBertEngine, CandleBertLoader};
pub use device::select_device;
pub use engine::{BatchOutput, EngineLoader, InferenceEngine};
pub use error::{EmbeddingError, Result};
pub use orchestrator::{Orchestrator, TokenPieceEmbeddings, WordpieceEmbeddingsSentence};
