use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{ApiProvider, EmbedderConfig};
use crate::normalize::normalize;
use crate::retry::{execute_with_retry_async, RetryConfig};
use crate::{EmbedError, Embedder};

/// Embedder backed by a remote HTTP endpoint (OpenAI, Hugging Face or a
/// custom service speaking a small JSON dialect).
pub struct HttpEmbedder {
    client: reqwest::Client,
    url: String,
    provider: ApiProvider,
    model_name: String,
    api_key: Option<String>,
    dimension: Option<usize>,
    normalize: bool,
    retry: RetryConfig,
}

impl HttpEmbedder {
    pub fn new(cfg: &EmbedderConfig) -> Result<Self, EmbedError> {
        let url = cfg
            .api_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| EmbedError::InvalidConfig("api_url is required for api mode".into()))?;
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .connect_timeout(cfg.timeout.min(Duration::from_secs(10)))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| EmbedError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            provider: cfg.api_provider,
            model_name: cfg.model_name.clone(),
            api_key: cfg.api_key.clone(),
            dimension: cfg.dimension,
            normalize: cfg.normalize,
            retry: cfg.retry,
        })
    }

    async fn send(&self, payload: &Value) -> Result<Value, EmbedError> {
        let mut request = self.client.post(&self.url).json(payload);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }

    fn finish(&self, response: Value) -> Result<Vec<f32>, EmbedError> {
        let mut vector = parse_embedding(response)?;
        if vector.is_empty() {
            return Err(EmbedError::InvalidResponse("empty embedding".into()));
        }
        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(EmbedError::InvalidResponse(format!(
                    "expected {expected} dimensions, got {}",
                    vector.len()
                )));
            }
        }
        if self.normalize {
            normalize(&mut vector);
        }
        Ok(vector)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::EmptyInput);
        }
        let payload = build_payload(self.provider, text, &self.model_name);

        let attempts = execute_with_retry_async(&self.retry, EmbedError::is_retryable, |attempt| {
            let payload = &payload;
            async move {
                if attempt > 0 {
                    tracing::warn!(attempt, url = %self.url, "retrying embedding request");
                }
                self.send(payload).await
            }
        });

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EmbedError::Cancelled),
            outcome = attempts => outcome,
        };
        tracing::debug!(
            attempts = outcome.attempts,
            elapsed_ms = outcome.total_duration.as_millis() as u64,
            "embedding request finished"
        );

        self.finish(outcome.into_result()?)
    }

    fn name(&self) -> &str {
        "http"
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

fn build_payload(provider: ApiProvider, text: &str, model: &str) -> Value {
    match provider {
        ApiProvider::OpenAi => json!({ "input": text, "model": model }),
        ApiProvider::HuggingFace => json!({ "inputs": text }),
        ApiProvider::Custom => json!({ "text": text }),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Data { data: Vec<DataItem> },
    Wrapped { embeddings: Batch },
    Bare(Batch),
}

#[derive(Deserialize)]
struct DataItem {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Batch {
    One(Vec<f32>),
    Many(Vec<Vec<f32>>),
}

impl Batch {
    fn first(self) -> Option<Vec<f32>> {
        match self {
            Batch::One(v) => Some(v),
            Batch::Many(vs) => vs.into_iter().next(),
        }
    }
}

/// Pull the first embedding out of any of the supported response shapes.
fn parse_embedding(value: Value) -> Result<Vec<f32>, EmbedError> {
    let parsed: EmbeddingResponse = serde_json::from_value(value)
        .map_err(|_| EmbedError::InvalidResponse("unsupported response shape".into()))?;
    let first = match parsed {
        EmbeddingResponse::Data { data } => data.into_iter().next().map(|d| d.embedding),
        EmbeddingResponse::Wrapped { embeddings } => embeddings.first(),
        EmbeddingResponse::Bare(batch) => batch.first(),
    };
    first.ok_or_else(|| EmbedError::InvalidResponse("response contained no embeddings".into()))
}
