use thiserror::Error;

/// Errors surfaced by an [`Embedder`](crate::Embedder).
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Configuration is inconsistent (e.g. api mode without an endpoint).
    #[error("invalid embedder config: {0}")]
    InvalidConfig(String),
    /// Nothing to embed.
    #[error("cannot embed blank text")]
    EmptyInput,
    /// The request never produced an HTTP response (connect, DNS, timeout).
    #[error("embedding request failed: {0}")]
    Transport(String),
    /// The provider answered with a non-success status.
    #[error("embedding provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The provider answered, but not with a usable vector.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    /// The caller gave up while the request was in flight.
    #[error("embedding cancelled")]
    Cancelled,
}

impl EmbedError {
    /// Transient failures worth another attempt: transport errors, 429 and
    /// 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            EmbedError::Transport(_) => true,
            EmbedError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for EmbedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EmbedError::InvalidResponse(err.to_string())
        } else {
            EmbedError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(EmbedError::Transport("connection reset".into()).is_retryable());
        assert!(EmbedError::Http {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(EmbedError::Http {
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(!EmbedError::Http {
            status: 401,
            body: String::new()
        }
        .is_retryable());
        assert!(!EmbedError::InvalidResponse("shape".into()).is_retryable());
        assert!(!EmbedError::Cancelled.is_retryable());
    }

    #[test]
    fn http_error_mentions_status_and_body() {
        let err = EmbedError::Http {
            status: 502,
            body: "bad gateway".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("bad gateway"));
    }
}
