//! The capability boundary to an external inference runtime.

use std::path::Path;
use std::sync::Arc;

use crate::batch::PaddedBatch;
use crate::error::{EmbeddingError, Result};

/// Per-position vectors returned for one batch, stored row-major as
/// `(batch, seq_len, dim)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    data: Vec<f32>,
    batch: usize,
    seq_len: usize,
    dim: usize,
}

impl BatchOutput {
    pub fn new(data: Vec<f32>, batch: usize, seq_len: usize, dim: usize) -> Result<Self> {
        let expected = batch * seq_len * dim;
        if data.len() != expected {
            return Err(EmbeddingError::Engine(format!(
                "output buffer holds {} values but shape ({batch}, {seq_len}, {dim}) needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            batch,
            seq_len,
            dim,
        })
    }

    /// Builds an output from nested `[batch][position][dim]` vectors.
    pub fn from_nested(rows: Vec<Vec<Vec<f32>>>) -> Result<Self> {
        let batch = rows.len();
        let seq_len = rows.first().map(Vec::len).unwrap_or(0);
        let dim = rows
            .first()
            .and_then(|row| row.first())
            .map(Vec::len)
            .unwrap_or(0);

        let mut data = Vec::with_capacity(batch * seq_len * dim);
        for row in rows {
            if row.len() != seq_len {
                return Err(EmbeddingError::Engine(
                    "ragged engine output: rows differ in length".into(),
                ));
            }
            for vector in row {
                if vector.len() != dim {
                    return Err(EmbeddingError::Engine(
                        "ragged engine output: vectors differ in width".into(),
                    ));
                }
                data.extend(vector);
            }
        }
        Self::new(data, batch, seq_len, dim)
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.batch, self.seq_len, self.dim)
    }

    /// Vector at `(row, position)`. Panics when out of range.
    pub fn vector(&self, row: usize, position: usize) -> &[f32] {
        assert!(row < self.batch && position < self.seq_len, "index out of range");
        let start = (row * self.seq_len + position) * self.dim;
        &self.data[start..start + self.dim]
    }
}

/// Runs a pretrained encoder over padded id batches.
///
/// Implementations must be safe to share for concurrent read-only calls; the
/// orchestrator never mutates an engine after it is attached.
pub trait InferenceEngine: Send + Sync {
    /// Returns a `(batch.len(), batch.seq_len(), dim)` output.
    fn infer(&self, batch: &PaddedBatch, dim: usize) -> Result<BatchOutput>;

    /// Short human-readable name used in logs.
    fn describe(&self) -> String {
        "inference engine".to_owned()
    }
}

/// Reconstructs an engine from its serialized artifact directory.
pub trait EngineLoader: Send + Sync {
    fn load(&self, artifact_dir: &Path, dim: usize) -> Result<Arc<dyn InferenceEngine>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_indexes_row_major() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let output = BatchOutput::new(data, 2, 3, 2).unwrap();
        assert_eq!(output.vector(0, 0), &[0.0, 1.0]);
        assert_eq!(output.vector(1, 2), &[10.0, 11.0]);
    }

    #[test]
    fn wrong_buffer_size_is_rejected() {
        assert!(BatchOutput::new(vec![0.0; 5], 1, 3, 2).is_err());
    }

    #[test]
    fn nested_rows_flatten() {
        let output = BatchOutput::from_nested(vec![vec![vec![1.0, 2.0], vec![3.0, 4.0]]]).unwrap();
        assert_eq!(output.shape(), (1, 2, 2));
        assert_eq!(output.vector(0, 1), &[3.0, 4.0]);

        let ragged = BatchOutput::from_nested(vec![vec![vec![1.0], vec![2.0, 3.0]]]);
        assert!(ragged.is_err());
    }
}
