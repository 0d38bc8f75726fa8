use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use catalog::CatalogError;
use extract::ExtractError;
use habita::StackError;
use ranking::RankError;
use semantic::EmbedError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Search error: {0}")]
    Rank(#[from] RankError),

    #[error("Embedding error: {0}")]
    Embed(#[from] EmbedError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Rank(err) => match err {
                RankError::Validation(_) => StatusCode::BAD_REQUEST,
                RankError::EmbeddingUnavailable(_) | RankError::StorageUnavailable(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                RankError::Cancelled { .. } | RankError::Timeout { .. } => {
                    StatusCode::GATEWAY_TIMEOUT
                }
            },
            ServerError::Embed(err) => match err {
                EmbedError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
                EmbedError::EmptyInput => StatusCode::BAD_REQUEST,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            },
            ServerError::Catalog(err) => match err {
                CatalogError::Duplicate(_) => StatusCode::CONFLICT,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            },
            ServerError::Extract(err) => match err {
                ExtractError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            },
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Rank(err) => match err {
                RankError::Validation(_) => "VALIDATION_ERROR",
                RankError::EmbeddingUnavailable(_) => "EMBEDDING_UNAVAILABLE",
                RankError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
                RankError::Cancelled { .. } => "SEARCH_CANCELLED",
                RankError::Timeout { .. } => "SEARCH_TIMEOUT",
            },
            ServerError::Embed(EmbedError::Cancelled) => "REQUEST_CANCELLED",
            ServerError::Embed(_) => "EMBEDDING_UNAVAILABLE",
            ServerError::Catalog(CatalogError::Duplicate(_)) => "DUPLICATE_LISTING",
            ServerError::Catalog(_) => "STORAGE_UNAVAILABLE",
            ServerError::Extract(ExtractError::Cancelled) => "REQUEST_CANCELLED",
            ServerError::Extract(_) => "EXTRACTION_UNAVAILABLE",
            ServerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StackError> for ServerError {
    fn from(err: StackError) -> Self {
        match err {
            StackError::Catalog(e) => ServerError::Catalog(e),
            StackError::Embedder(e) => ServerError::Embed(e),
            StackError::Extractor(e) => ServerError::Extract(e),
            StackError::Ranking(e) => ServerError::Rank(e),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self, "request failed");
        }

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
