use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::api::HttpEmbedder;
use crate::retry::RetryConfig;
use crate::stub::{StubEmbedder, DEFAULT_STUB_DIMENSION};
use crate::{EmbedError, Embedder};

/// Which embedder implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderMode {
    /// Deterministic offline vectors; no network.
    #[default]
    Stub,
    /// Remote embedding endpoint over HTTP.
    Api,
}

/// Request/response dialect of the remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiProvider {
    /// `{"input", "model"}` in, `{"data": [{"embedding"}]}` out.
    #[default]
    OpenAi,
    /// `{"inputs"}` in, a bare array out.
    HuggingFace,
    /// `{"text"}` in, `{"embeddings"}` or a bare array out.
    Custom,
}

/// Runtime configuration for the query/listing embedder.
///
/// ```
/// use semantic::{build_embedder, EmbedderConfig, EmbedderMode};
///
/// let cfg = EmbedderConfig {
///     mode: EmbedderMode::Stub,
///     dimension: Some(64),
///     ..Default::default()
/// };
/// let embedder = build_embedder(&cfg).unwrap();
/// assert_eq!(embedder.dimension(), Some(64));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbedderConfig {
    pub mode: EmbedderMode,
    /// Model identifier sent to the provider.
    pub model_name: String,
    /// Output dimension. Required by the stub (defaults to 384); when set in
    /// api mode, responses of any other length are rejected.
    pub dimension: Option<usize>,
    /// Endpoint for api mode.
    pub api_url: Option<String>,
    /// Sent as a bearer token. Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_provider: ApiProvider,
    /// Per-attempt HTTP timeout in milliseconds.
    #[serde(with = "crate::serde_millis")]
    pub timeout: Duration,
    /// Re-normalize provider vectors to unit length.
    pub normalize: bool,
    pub retry: RetryConfig,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            mode: EmbedderMode::Stub,
            model_name: "text-embedding-3-small".into(),
            dimension: None,
            api_url: None,
            api_key: None,
            api_provider: ApiProvider::OpenAi,
            timeout: Duration::from_secs(30),
            normalize: true,
            retry: RetryConfig::default(),
        }
    }
}

impl EmbedderConfig {
    pub fn validate(&self) -> Result<(), EmbedError> {
        if self.dimension == Some(0) {
            return Err(EmbedError::InvalidConfig(
                "dimension must be greater than zero".into(),
            ));
        }
        if self.mode == EmbedderMode::Api {
            match self.api_url.as_deref() {
                Some(url) if !url.trim().is_empty() => {}
                _ => {
                    return Err(EmbedError::InvalidConfig(
                        "api_url is required for api mode".into(),
                    ))
                }
            }
            if self.timeout.is_zero() {
                return Err(EmbedError::InvalidConfig(
                    "timeout must be greater than zero".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Build the embedder described by `cfg`.
pub fn build_embedder(cfg: &EmbedderConfig) -> Result<Arc<dyn Embedder>, EmbedError> {
    cfg.validate()?;
    let embedder: Arc<dyn Embedder> = match cfg.mode {
        EmbedderMode::Stub => Arc::new(StubEmbedder::new(
            cfg.dimension.unwrap_or(DEFAULT_STUB_DIMENSION),
        )?),
        EmbedderMode::Api => Arc::new(HttpEmbedder::new(cfg)?),
    };
    tracing::info!(
        embedder = embedder.name(),
        model = %cfg.model_name,
        dimension = ?embedder.dimension(),
        "embedder ready"
    );
    Ok(embedder)
}
