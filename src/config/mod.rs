// Configuration management module
// Handles the TOML settings file and environment-supplied secrets

pub mod settings;

pub use settings::{
    API_KEY_ENV, ApiConfig, Config, ConfigError, DocumentsConfig, IndexConfig, ServerConfig,
};
