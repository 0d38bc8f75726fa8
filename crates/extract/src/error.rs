use thiserror::Error;

/// Errors surfaced by a [`FilterExtractor`](crate::FilterExtractor).
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid extractor config: {0}")]
    InvalidConfig(String),
    #[error("extraction request failed: {0}")]
    Transport(String),
    #[error("extraction provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid extraction response: {0}")]
    InvalidResponse(String),
    #[error("extraction cancelled")]
    Cancelled,
}

impl ExtractError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractError::Transport(_) => true,
            ExtractError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExtractError::InvalidResponse(err.to_string())
        } else {
            ExtractError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_retry() {
        assert!(ExtractError::Transport("reset".into()).is_retryable());
        assert!(ExtractError::Http {
            status: 500,
            body: String::new()
        }
        .is_retryable());
        assert!(!ExtractError::Http {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!ExtractError::Cancelled.is_retryable());
    }
}
