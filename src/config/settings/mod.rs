
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::embeddings::chunking::ChunkingConfig;

/// Environment variable holding the API key for the hosted model endpoints.
/// The key is never read from the settings file.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const SETTINGS_FILE_NAME: &str = "askdocs.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub documents: DocumentsConfig,
    pub chunking: ChunkingConfig,
    pub api: ApiConfig,
    pub index: IndexConfig,
    pub server: ServerConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            documents: DocumentsConfig::default(),
            chunking: ChunkingConfig::default(),
            api: ApiConfig::default(),
            index: IndexConfig::default(),
            server: ServerConfig::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory holding the source documents, relative to the base directory.
    pub dir: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: "docs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f32,
    pub batch_size: u32,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            batch_size: 16,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding the vector index, relative to the base directory.
    pub dir: String,
    /// URL of a prebuilt index archive, fetched when no local index exists.
    pub archive_url: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: "index".to_string(),
            archive_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing API key: set the {API_KEY_ENV} environment variable")]
    MissingApiKey,
    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid port: {0} (must be nonzero)")]
    InvalidPort(u16),
    #[error("Invalid max chunk size: {0} (must be nonzero)")]
    InvalidMaxChunkSize(usize),
    #[error("Overlap size ({0}) must be smaller than max chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid documents directory (cannot be empty)")]
    InvalidDocumentsDir,
    #[error("Invalid index directory (cannot be empty)")]
    InvalidIndexDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Config {
    /// Load settings from `askdocs.toml` under the given base directory,
    /// falling back to defaults when the file does not exist. The API key is
    /// taken from the environment.
    #[inline]
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let settings_path = base_dir.as_ref().join(SETTINGS_FILE_NAME);

        let mut config = if settings_path.exists() {
            let content = fs::read_to_string(&settings_path).with_context(|| {
                format!("Failed to read settings file: {}", settings_path.display())
            })?;
            toml::from_str(&content).with_context(|| {
                format!("Failed to parse settings file: {}", settings_path.display())
            })?
        } else {
            Config::default()
        };

        config.base_dir = base_dir.as_ref().to_path_buf();
        config.api.api_key = env::var(API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.documents.dir.trim().is_empty() {
            return Err(ConfigError::InvalidDocumentsDir);
        }

        if self.index.dir.trim().is_empty() {
            return Err(ConfigError::InvalidIndexDir);
        }

        self.api.validate()?;
        self.validate_chunking()?;

        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort(self.server.port));
        }

        Ok(())
    }

    fn validate_chunking(&self) -> Result<(), ConfigError> {
        let chunking = &self.chunking;

        if chunking.max_chunk_size == 0 {
            return Err(ConfigError::InvalidMaxChunkSize(chunking.max_chunk_size));
        }

        if chunking.overlap_size >= chunking.max_chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                chunking.overlap_size,
                chunking.max_chunk_size,
            ));
        }

        Ok(())
    }

    /// Directory containing the source documents.
    #[inline]
    pub fn documents_dir(&self) -> PathBuf {
        self.base_dir.join(&self.documents.dir)
    }

    /// Directory containing the vector index.
    #[inline]
    pub fn index_dir(&self) -> PathBuf {
        self.base_dir.join(&self.index.dir)
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.chat_model.clone()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        Ok(())
    }

    /// The API key, or a fatal configuration error when it is absent.
    #[inline]
    pub fn require_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}

impl ServerConfig {
    /// Socket address string the web server binds to.
    #[inline]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
