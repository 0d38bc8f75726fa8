use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use semantic::retry::{execute_with_retry_async, RetryConfig};

use crate::config::ExtractorConfig;
use crate::filters::{MAX_LIMIT, MIN_LIMIT};
use crate::{ExtractError, ExtractedFilters, FilterExtractor};

const TOOL_NAME: &str = "extract_filters";

const SYSTEM_PROMPT: &str = "You extract filters for a housing listing search. \
From the user's message, extract max_price (a number in the local currency), \
min_bedrooms (an integer), neighborhood (the neighborhood name only, without \
city or state) and limit (how many results the user wants). \
If a value is not stated explicitly, return null. Never guess.";

/// Filter extractor backed by OpenAI chat completions with function calling.
///
/// The model is offered a single `extract_filters` tool and run at
/// temperature 0. When it declines to call the tool, no filters are
/// returned.
pub struct OpenAiFilterExtractor {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl OpenAiFilterExtractor {
    pub fn new(cfg: &ExtractorConfig) -> Result<Self, ExtractError> {
        let base = cfg.base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(ExtractError::InvalidConfig("base_url must not be empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .connect_timeout(cfg.timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| ExtractError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{base}/v1/chat/completions"),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            retry: cfg.retry,
        })
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": text }
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": TOOL_NAME,
                    "description": "Extract housing search filters from the user's message.",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "max_price": {
                                "description": "Maximum price. E.g. 300000 for 300,000.00.",
                                "type": "number",
                                "minimum": 0
                            },
                            "min_bedrooms": {
                                "description": "Minimum number of bedrooms.",
                                "type": "integer",
                                "minimum": 0
                            },
                            "neighborhood": {
                                "description": "Neighborhood name only, without city or state.",
                                "type": "string",
                                "minLength": 2
                            },
                            "limit": {
                                "description": "Number of results wanted (top N).",
                                "type": "integer",
                                "minimum": MIN_LIMIT,
                                "maximum": MAX_LIMIT
                            }
                        },
                        "required": [],
                        "additionalProperties": false
                    }
                }
            }],
            "tool_choice": "auto"
        })
    }

    async fn send(&self, body: &Value) -> Result<ChatResponse, ExtractError> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<ChatResponse>().await?)
    }
}

#[async_trait]
impl FilterExtractor for OpenAiFilterExtractor {
    async fn extract(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractedFilters, ExtractError> {
        if text.trim().is_empty() {
            return Ok(ExtractedFilters::default());
        }
        let body = self.request_body(text);

        let attempts = execute_with_retry_async(&self.retry, ExtractError::is_retryable, |attempt| {
            let body = &body;
            async move {
                if attempt > 0 {
                    tracing::warn!(attempt, "retrying filter extraction");
                }
                self.send(body).await
            }
        });

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExtractError::Cancelled),
            outcome = attempts => outcome,
        };

        let filters = filters_from_response(outcome.into_result()?)?;
        tracing::debug!(?filters, "filters extracted");
        Ok(filters)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

fn filters_from_response(response: ChatResponse) -> Result<ExtractedFilters, ExtractError> {
    let calls = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.tool_calls)
        .unwrap_or_default();

    let Some(call) = calls
        .iter()
        .find(|c| c.function.name == TOOL_NAME)
        .or_else(|| calls.first())
    else {
        return Ok(ExtractedFilters::default());
    };

    let raw = call.function.arguments.trim();
    if raw.is_empty() {
        return Ok(ExtractedFilters::default());
    }
    let args: Value = serde_json::from_str(raw)
        .map_err(|e| ExtractError::InvalidResponse(format!("tool arguments are not JSON: {e}")))?;
    Ok(ExtractedFilters::from_arguments(&args))
}
