use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use semantic::retry::RetryConfig;

use crate::openai::OpenAiFilterExtractor;
use crate::{ExtractError, FilterExtractor, NoopExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorMode {
    /// Never extracts anything.
    #[default]
    Noop,
    /// OpenAI chat completions with function calling.
    OpenAi,
}

/// Runtime configuration for the filter extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    pub mode: ExtractorMode,
    /// API root; `/v1/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Per-attempt HTTP timeout in milliseconds.
    #[serde(with = "semantic::serde_millis")]
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mode: ExtractorMode::Noop,
            base_url: "https://api.openai.com".into(),
            model: "gpt-4o-mini".into(),
            api_key: None,
            timeout: Duration::from_secs(20),
            retry: RetryConfig::default().with_max_retries(2),
        }
    }
}

impl ExtractorConfig {
    /// Defaults with the OpenAI extractor selected.
    pub fn openai() -> Self {
        Self {
            mode: ExtractorMode::OpenAi,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.mode == ExtractorMode::OpenAi {
            if self.model.trim().is_empty() {
                return Err(ExtractError::InvalidConfig("model must not be empty".into()));
            }
            if self.timeout.is_zero() {
                return Err(ExtractError::InvalidConfig(
                    "timeout must be greater than zero".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Build the extractor described by `cfg`.
pub fn build_extractor(cfg: &ExtractorConfig) -> Result<Arc<dyn FilterExtractor>, ExtractError> {
    cfg.validate()?;
    let extractor: Arc<dyn FilterExtractor> = match cfg.mode {
        ExtractorMode::Noop => Arc::new(NoopExtractor),
        ExtractorMode::OpenAi => {
            if cfg.api_key.is_none() {
                tracing::warn!("openai extractor configured without an api key");
            }
            Arc::new(OpenAiFilterExtractor::new(cfg)?)
        }
    };
    tracing::info!(extractor = extractor.name(), model = %cfg.model, "filter extractor ready");
    Ok(extractor)
}
