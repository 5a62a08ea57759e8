//! Inference engine backed by candle's BERT implementation.
//!
//! The artifact directory follows the Hugging Face export layout: a
//! `config.json` describing the encoder and a `model.safetensors` holding
//! its weights. All tensor work is delegated to `candle-transformers`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use serde::Deserialize;

use crate::batch::PaddedBatch;
use crate::engine::{BatchOutput, EngineLoader, InferenceEngine};
use crate::error::{EmbeddingError, Result};

pub const CONFIG_FILENAME: &str = "config.json";
pub const WEIGHTS_FILENAME: &str = "model.safetensors";

#[derive(Deserialize)]
struct EncoderShape {
    hidden_size: usize,
}

pub struct CandleBertEngine {
    model: BertModel,
    device: Device,
    hidden_size: usize,
}

impl CandleBertEngine {
    pub fn load(artifact_dir: &Path, device: Device) -> Result<Self> {
        let config_path = artifact_dir.join(CONFIG_FILENAME);
        let weights_path = artifact_dir.join(WEIGHTS_FILENAME);
        for path in [&config_path, &weights_path] {
            if !path.is_file() {
                return Err(EmbeddingError::MissingArtifact(path.display().to_string()));
            }
        }

        let raw = fs::read_to_string(&config_path)?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let EncoderShape { hidden_size } = serde_json::from_str(&raw)?;

        // SAFETY: the weights file is only read and must not be modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DTYPE, &device)? };
        let model = BertModel::load(vb, &config)?;

        log::info!(
            "loaded BERT encoder from {} (hidden_size={hidden_size})",
            artifact_dir.display()
        );

        Ok(Self {
            model,
            device,
            hidden_size,
        })
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }
}

impl InferenceEngine for CandleBertEngine {
    fn infer(&self, batch: &PaddedBatch, dim: usize) -> Result<BatchOutput> {
        if dim != self.hidden_size {
            return Err(EmbeddingError::Engine(format!(
                "requested dim {dim} but encoder hidden_size is {}",
                self.hidden_size
            )));
        }

        let (rows, seq_len) = batch.shape();
        if rows == 0 || seq_len == 0 {
            return BatchOutput::new(Vec::new(), rows, seq_len, dim);
        }

        let input_ids = Tensor::from_vec(batch.flat_ids(), (rows, seq_len), &self.device)?;
        let attention_mask = Tensor::from_vec(batch.flat_mask(), (rows, seq_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let data = hidden.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?;

        BatchOutput::new(data, rows, seq_len, dim)
    }

    fn describe(&self) -> String {
        format!("candle BERT encoder ({:?})", self.device)
    }
}

/// Loads [`CandleBertEngine`]s on a fixed device.
#[derive(Debug, Clone)]
pub struct CandleBertLoader {
    device: Device,
}

impl CandleBertLoader {
    pub fn new(device: Device) -> Self {
        Self { device }
    }
}

impl EngineLoader for CandleBertLoader {
    fn load(&self, artifact_dir: &Path, dim: usize) -> Result<Arc<dyn InferenceEngine>> {
        let engine = CandleBertEngine::load(artifact_dir, self.device.clone())?;
        if engine.hidden_size() != dim {
            return Err(EmbeddingError::InvalidSettings(format!(
                "configured dim {dim} does not match encoder hidden_size {}",
                engine.hidden_size()
            )));
        }
        Ok(Arc::new(engine))
    }
}
