use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::EmbedError;

/// Turns free text into a fixed-dimension, unit-normalized vector.
///
/// Implementations own their own resilience (retries, timeouts). They must
/// observe `cancel` and return [`EmbedError::Cancelled`] promptly once it
/// fires.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<f32>, EmbedError>;

    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Output dimension, when known up front.
    fn dimension(&self) -> Option<usize> {
        None
    }
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    async fn embed(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<f32>, EmbedError> {
        (**self).embed(text, cancel).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }
}
