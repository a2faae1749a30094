
use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::chunking::SplitConfig;

pub const DEFAULT_TOP_K: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub qdrant: Option<QdrantConfig>,
    #[serde(default)]
    pub chunking: SplitConfig,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub chat_model: String,
    pub embed_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QdrantConfig {
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_collection() -> String {
    "docs_chat".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embed_model: "nomic-embed-text".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            qdrant: None,
            chunking: SplitConfig::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid collection name: {0} (cannot be empty)")]
    InvalidCollection(String),
    #[error("Invalid retrieval k: {0} (must be at least 1)")]
    InvalidTopK(usize),
    #[error("Invalid chunk size: {0} (must be at least 1)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid value for {0}: {1}")]
    InvalidEnvValue(&'static str, String),
}

impl Config {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset. `QDRANT_URL` being absent means the
    /// persistent backend is unconfigured and the ephemeral store is used.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = env::var("OLLAMA_BASE_URL") {
            config.ollama.base_url = value;
        }
        if let Ok(value) = env::var("CHAT_MODEL") {
            config.ollama.chat_model = value;
        }
        if let Ok(value) = env::var("EMBED_MODEL") {
            config.ollama.embed_model = value;
        }
        if let Ok(url) = env::var("QDRANT_URL") {
            let collection =
                env::var("QDRANT_COLLECTION").unwrap_or_else(|_| default_collection());
            config.qdrant = Some(QdrantConfig { url, collection });
        }
        if let Ok(value) = env::var("RETRIEVAL_TOP_K") {
            config.top_k = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnvValue("RETRIEVAL_TOP_K", value))?;
        }
        if let Ok(value) = env::var("CHUNK_SIZE") {
            config.chunking.chunk_size = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnvValue("CHUNK_SIZE", value))?;
        }
        if let Ok(value) = env::var("CHUNK_OVERLAP") {
            config.chunking.chunk_overlap = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnvValue("CHUNK_OVERLAP", value))?;
        }

        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ollama.validate()?;

        if let Some(qdrant) = &self.qdrant {
            Url::parse(&qdrant.url).map_err(|_| ConfigError::InvalidUrl(qdrant.url.clone()))?;
            if qdrant.collection.trim().is_empty() {
                return Err(ConfigError::InvalidCollection(qdrant.collection.clone()));
            }
        }

        if self.top_k == 0 {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }

        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(self.chunking.chunk_size));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                self.chunking.chunk_overlap,
                self.chunking.chunk_size,
            ));
        }

        Ok(())
    }
}

impl OllamaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))?;

        if self.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.chat_model.clone()));
        }
        if self.embed_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embed_model.clone()));
        }

        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))
    }
}
