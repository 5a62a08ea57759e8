//! Saved-model directory layout.
//!
//! ```text
//! <dir>/metadata.json   format version, config, vocabulary checksum
//! <dir>/vocab.txt       one token per line, id = line index
//! <dir>/engine/         copy of the engine artifact directory, if any
//! ```

use std::{
    fs,
    path::{Component, Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use embedding::EngineLoader;
use serde::{Deserialize, Serialize};
use tokenizer::artifacts::{load_vocab, read_json, save_vocab, sha256_of_files, write_json, VOCAB_FILENAME};

use crate::config::EmbeddingsConfig;
use crate::container::BertEmbeddings;
use crate::error::{ModelError, Result};

pub const METADATA_FILENAME: &str = "metadata.json";
pub const ENGINE_DIRNAME: &str = "engine";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMetadata {
    pub version: u32,
    pub created_unix_timestamp: u64,
    pub config: EmbeddingsConfig,
    pub vocab_size: usize,
    pub vocab_sha256: String,
    /// Engine subdirectory relative to the saved directory.
    #[serde(default)]
    pub engine: Option<String>,
}

impl BertEmbeddings {
    /// Writes the container to `dir`, creating it if needed.
    ///
    /// An engine attached with [`BertEmbeddings::set_engine`] has no artifact
    /// to copy; the saved model then needs an engine attached after loading.
    pub fn save(&self, dir: &Path) -> Result<SavedMetadata> {
        if dir.exists() && !dir.is_dir() {
            return Err(ModelError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        let engine_target = dir.join(ENGINE_DIRNAME);
        if let Some(source) = self.engine_artifact() {
            if !same_location(source, &engine_target) && is_within(source, &engine_target) {
                return Err(ModelError::OverlappingEngineCopy {
                    artifact: source.to_path_buf(),
                    target: engine_target,
                });
            }
        }
        fs::create_dir_all(dir)?;

        let vocab_path = dir.join(VOCAB_FILENAME);
        save_vocab(self.vocab(), &vocab_path)?;
        let vocab_sha256 = sha256_of_files(&[vocab_path.as_path()])?;

        let engine = match self.engine_artifact() {
            Some(source) => {
                if !same_location(source, &engine_target) {
                    copy_engine(source, &engine_target)?;
                }
                Some(ENGINE_DIRNAME.to_owned())
            }
            None => {
                if self.has_engine() {
                    log::warn!(
                        "engine has no artifact directory; {} will need `set_engine` after loading",
                        dir.display()
                    );
                }
                None
            }
        };

        let metadata = SavedMetadata {
            version: FORMAT_VERSION,
            created_unix_timestamp: unix_timestamp(),
            config: self.config().clone(),
            vocab_size: self.vocab().len(),
            vocab_sha256,
            engine,
        };
        write_json(&dir.join(METADATA_FILENAME), &metadata)?;
        log::info!(
            "saved model ({} vocabulary entries) to {}",
            metadata.vocab_size,
            dir.display()
        );
        Ok(metadata)
    }

    /// Restores a container written by [`BertEmbeddings::save`].
    pub fn load(dir: &Path, loader: &dyn EngineLoader) -> Result<Self> {
        ensure_dir(dir, "saved model directory")?;
        let metadata_path = dir.join(METADATA_FILENAME);
        ensure_artifact(&metadata_path, "model metadata")?;
        let metadata: SavedMetadata = read_json(&metadata_path)?;
        if metadata.version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion {
                found: metadata.version,
                expected: FORMAT_VERSION,
            });
        }

        let vocab_path = dir.join(VOCAB_FILENAME);
        ensure_artifact(&vocab_path, "vocabulary file")?;
        let actual = sha256_of_files(&[vocab_path.as_path()])?;
        if actual != metadata.vocab_sha256 {
            return Err(ModelError::ChecksumMismatch {
                expected: metadata.vocab_sha256,
                actual,
            });
        }

        let model = Self::new(metadata.config, load_vocab(&vocab_path)?)?;
        if let Some(engine_dir) = metadata.engine {
            if !is_plain_name(&engine_dir) {
                return Err(ModelError::InvalidMetadata(format!(
                    "engine directory '{engine_dir}' must be a single name inside the saved directory"
                )));
            }
            let engine_path = dir.join(engine_dir);
            ensure_dir(&engine_path, "engine directory")?;
            model.attach_engine_from(loader, &engine_path)?;
        }
        log::info!("loaded model from {}", dir.display());
        Ok(model)
    }

    /// Imports an exported BERT folder: `vocab.txt` next to the engine files.
    pub fn load_saved_model(
        folder: &Path,
        config: EmbeddingsConfig,
        loader: &dyn EngineLoader,
    ) -> Result<Self> {
        ensure_dir(folder, "saved model folder")?;
        let vocab_path = folder.join(VOCAB_FILENAME);
        ensure_artifact(&vocab_path, "vocabulary file")?;

        let model = Self::new(config, load_vocab(&vocab_path)?)?;
        model.attach_engine_from(loader, folder)?;
        log::info!(
            "imported model from {} ({} vocabulary entries)",
            folder.display(),
            model.vocab().len()
        );
        Ok(model)
    }
}

fn ensure_dir(path: &Path, what: &'static str) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else if path.exists() {
        Err(ModelError::NotADirectory {
            path: path.to_path_buf(),
        })
    } else {
        Err(ModelError::MissingArtifact {
            what,
            path: path.to_path_buf(),
        })
    }
}

fn ensure_artifact(path: &Path, what: &'static str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ModelError::MissingArtifact {
            what,
            path: path.to_path_buf(),
        })
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// True when `inner` is `outer` or lies below it. Paths that do not exist
/// yet cannot contain anything.
fn is_within(inner: &Path, outer: &Path) -> bool {
    match (fs::canonicalize(inner), fs::canonicalize(outer)) {
        (Ok(inner), Ok(outer)) => inner.starts_with(outer),
        _ => false,
    }
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

/// Replaces `target` with a copy of `source`.
///
/// `target` may sit inside `source` (saving into the import folder); the
/// copy never descends into it.
fn copy_engine(source: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::create_dir_all(target)?;
    let skip = fs::canonicalize(target)?;
    copy_dir_recursive(source, target, &skip)
}

fn copy_dir_recursive(source: &Path, target: &Path, skip: &Path) -> Result<()> {
    fs::create_dir_all(target)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        if fs::canonicalize(entry.path())? == skip {
            continue;
        }
        let destination: PathBuf = target.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &destination, skip)?;
        } else {
            fs::copy(entry.path(), destination)?;
        }
    }
    Ok(())
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
