//! YAML configuration for a Habita search stack.
//!
//! One file configures every collaborator of the ranking engine. Each
//! section is optional and falls back to its defaults.
//!
//! ```yaml
//! version: "1.0"
//! name: "bh-production"
//!
//! ranking:
//!   semantic_weight: 0.75
//!   filter_weight: 0.25
//!   hard_floor_similarity: 0.06
//!   bedroom_policy: at_least
//!   stage_timeout: 2000
//!
//! embedder:
//!   mode: api
//!   api_provider: open_ai
//!   api_url: "https://api.openai.com/v1/embeddings"
//!   model_name: "text-embedding-3-small"
//!   timeout: 10000
//!
//! extractor:
//!   mode: open_ai
//!   model: "gpt-4o-mini"
//!
//! catalog:
//!   seed_path: "data/listings.json"
//! ```
//!
//! API keys belong in the environment, not the file:
//! `HABITA_EMBEDDER_API_KEY` and `OPENAI_API_KEY` are applied on top by
//! [`HabitaConfig::apply_env_overrides`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use extract::{ExtractorConfig, ExtractorMode};
use ranking::RankingConfig;
use semantic::config::{ApiProvider, EmbedderConfig, EmbedderMode};

/// Environment variable holding the embedding provider key.
pub const EMBEDDER_API_KEY_ENV: &str = "HABITA_EMBEDDER_API_KEY";
/// Environment variable holding the OpenAI key used by the extractor.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration of a search stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HabitaConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub embedder: EmbedderConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(default)]
    pub catalog: CatalogYamlConfig,
}

/// Where the in-memory catalog gets its initial listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogYamlConfig {
    /// JSON array of listings loaded at start-up. Relative paths resolve
    /// against the working directory.
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

impl Default for HabitaConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            ranking: RankingConfig::default(),
            embedder: EmbedderConfig::default(),
            extractor: ExtractorConfig::default(),
            catalog: CatalogYamlConfig::default(),
        }
    }
}

impl HabitaConfig {
    /// Load and validate a YAML file. Does not consult the environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: HabitaConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a file and fill API keys from the process environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Fill API keys from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Fill API keys from `lookup`.
    ///
    /// `HABITA_EMBEDDER_API_KEY` sets the embedder key. `OPENAI_API_KEY`
    /// sets the extractor key, and the embedder key too when the embedder
    /// talks to OpenAI and has no key of its own.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_blank(EMBEDDER_API_KEY_ENV) {
            self.embedder.api_key = Some(key);
        }
        if let Some(key) = non_blank(OPENAI_API_KEY_ENV) {
            if self.embedder.api_key.is_none()
                && self.embedder.mode == EmbedderMode::Api
                && self.embedder.api_provider == ApiProvider::OpenAi
            {
                self.embedder.api_key = Some(key.clone());
            }
            self.extractor.api_key = Some(key);
        }

        if self.extractor.mode == ExtractorMode::OpenAi && self.extractor.api_key.is_none() {
            tracing::warn!(env = OPENAI_API_KEY_ENV, "openai extractor enabled but no api key found");
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        self.ranking
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("ranking: {e}")))?;
        self.embedder
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("embedder: {e}")))?;
        self.extractor
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("extractor: {e}")))?;

        if let Some(path) = &self.catalog.seed_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigLoadError::Validation(
                    "catalog: seed_path must not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

fn default_version() -> String {
    "1.0".to_string()
}
