//! Locating pretrained model folders by name.

use std::path::{Path, PathBuf};

use embedding::EngineLoader;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingsConfig;
use crate::container::BertEmbeddings;
use crate::error::{ModelError, Result};

pub const DEFAULT_MODEL_NAME: &str = "bert_uncased";
pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_REMOTE_LOC: &str = "public/models";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub name: String,
    pub lang: String,
    pub remote_loc: String,
}

impl Default for ResourceRequest {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL_NAME.to_owned(),
            lang: DEFAULT_LANG.to_owned(),
            remote_loc: DEFAULT_REMOTE_LOC.to_owned(),
        }
    }
}

impl ResourceRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_remote_loc(mut self, remote_loc: impl Into<String>) -> Self {
        self.remote_loc = remote_loc.into();
        self
    }

    /// Folder name of the resource inside its location, e.g. `bert_uncased_en`.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.name, self.lang)
    }
}

/// Resolves a request to a local folder holding `vocab.txt` and the engine
/// files.
pub trait ResourceFetcher: Send + Sync {
    fn fetch(&self, request: &ResourceRequest) -> Result<PathBuf>;
}

/// Looks resources up under `<root>/<remote_loc>/<name>_<lang>`.
#[derive(Debug, Clone)]
pub struct LocalCacheFetcher {
    root: PathBuf,
}

impl LocalCacheFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, request: &ResourceRequest) -> PathBuf {
        self.root
            .join(&request.remote_loc)
            .join(request.cache_key())
    }
}

impl ResourceFetcher for LocalCacheFetcher {
    fn fetch(&self, request: &ResourceRequest) -> Result<PathBuf> {
        let path = self.path_for(request);
        if path.is_dir() {
            log::debug!("resolved {} to {}", request.cache_key(), path.display());
            Ok(path)
        } else {
            Err(ModelError::Resource(format!(
                "resource '{}' not found in cache at {}",
                request.cache_key(),
                path.display()
            )))
        }
    }
}

/// Downloads `request.name` as a Hugging Face model repository.
#[cfg(feature = "hub")]
pub struct HubFetcher {
    api: hf_hub::api::sync::Api,
    files: Vec<String>,
}

#[cfg(feature = "hub")]
impl HubFetcher {
    pub fn new() -> Result<Self> {
        let api = hf_hub::api::sync::Api::new()
            .map_err(|err| ModelError::Resource(format!("failed to initialise hub client: {err}")))?;
        Ok(Self {
            api,
            files: vec![
                tokenizer::artifacts::VOCAB_FILENAME.to_owned(),
                embedding::candle_bert::CONFIG_FILENAME.to_owned(),
                embedding::candle_bert::WEIGHTS_FILENAME.to_owned(),
            ],
        })
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }
}

#[cfg(feature = "hub")]
impl ResourceFetcher for HubFetcher {
    fn fetch(&self, request: &ResourceRequest) -> Result<PathBuf> {
        let repo = self.api.model(request.name.clone());
        let mut folder = None;
        for file in &self.files {
            log::info!("fetching {file} from {}", request.name);
            let path = repo.get(file).map_err(|err| {
                ModelError::Resource(format!("failed to fetch {file} from {}: {err}", request.name))
            })?;
            folder = path.parent().map(Path::to_path_buf);
        }
        folder.ok_or_else(|| {
            ModelError::Resource(format!("no files requested for {}", request.name))
        })
    }
}

impl BertEmbeddings {
    /// Fetches a named pretrained folder and imports it.
    pub fn pretrained(
        fetcher: &dyn ResourceFetcher,
        request: &ResourceRequest,
        config: EmbeddingsConfig,
        loader: &dyn EngineLoader,
    ) -> Result<Self> {
        let folder = fetcher.fetch(request)?;
        log::info!("loading pretrained {} from {}", request.cache_key(), folder.display());
        Self::load_saved_model(&folder, config, loader)
    }
}
