#![allow(dead_code)]

use std::{fs, path::Path, sync::Arc};

use embedding::{BatchOutput, EmbeddingError, EngineLoader, InferenceEngine, PaddedBatch};
use model::{BertEmbeddings, EmbeddingsConfig};
use serde::{Deserialize, Serialize};
use tokenizer::Vocabulary;

pub const ENGINE_FILE: &str = "engine.json";
pub const DIM: usize = 4;

/// Writes `[id + offset, position, 0, 0]` into every vector.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OffsetEngine {
    pub offset: f32,
}

impl InferenceEngine for OffsetEngine {
    fn infer(&self, batch: &PaddedBatch, dim: usize) -> embedding::Result<BatchOutput> {
        let (rows, seq_len) = batch.shape();
        let mut data = vec![0.0; rows * seq_len * dim];
        for (row, ids) in batch.input_ids().iter().enumerate() {
            for (pos, &id) in ids.iter().enumerate() {
                let base = (row * seq_len + pos) * dim;
                data[base] = id as f32 + self.offset;
                data[base + 1] = pos as f32;
            }
        }
        BatchOutput::new(data, rows, seq_len, dim)
    }

    fn describe(&self) -> String {
        format!("offset engine ({})", self.offset)
    }
}

/// Reads an [`OffsetEngine`] from `engine.json` in the artifact directory.
pub struct OffsetLoader;

impl EngineLoader for OffsetLoader {
    fn load(&self, artifact_dir: &Path, _dim: usize) -> embedding::Result<Arc<dyn InferenceEngine>> {
        let path = artifact_dir.join(ENGINE_FILE);
        if !path.is_file() {
            return Err(EmbeddingError::MissingArtifact(path.display().to_string()));
        }
        let engine: OffsetEngine = serde_json::from_str(&fs::read_to_string(path)?)?;
        Ok(Arc::new(engine))
    }
}

pub fn write_engine(dir: &Path, offset: f32) {
    fs::create_dir_all(dir).expect("engine dir");
    fs::write(
        dir.join(ENGINE_FILE),
        serde_json::to_string(&OffsetEngine { offset }).expect("engine json"),
    )
    .expect("engine file");
}

/// `[CLS]=0 [SEP]=1 [UNK]=2 [PAD]=3 hello=4 world=5 play=6 ##ing=7`
pub fn vocab() -> Vocabulary {
    Vocabulary::from_tokens([
        "[CLS]", "[SEP]", "[UNK]", "[PAD]", "hello", "world", "play", "##ing",
    ])
}

pub fn config() -> EmbeddingsConfig {
    EmbeddingsConfig::default().with_dim(DIM).with_batch_size(2)
}

pub fn container() -> BertEmbeddings {
    BertEmbeddings::new(config(), vocab()).expect("container")
}

/// Writes an importable folder: `vocab.txt` next to the engine file.
pub fn write_export(dir: &Path, offset: f32) {
    write_engine(dir, offset);
    fs::write(dir.join("vocab.txt"), vocab().to_vocab_text()).expect("vocab file");
}
