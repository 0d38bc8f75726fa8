use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{ExtractError, ExtractedFilters};

/// Pulls structured search constraints out of free text.
///
/// Implementations must leave a field `None` rather than guess, and must
/// return [`ExtractError::Cancelled`] once `cancel` fires.
#[async_trait]
pub trait FilterExtractor: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractedFilters, ExtractError>;

    fn name(&self) -> &str;
}

/// Extractor that never finds any constraint, so every request runs as a
/// pure semantic search.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtractor;

#[async_trait]
impl FilterExtractor for NoopExtractor {
    async fn extract(
        &self,
        _text: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractedFilters, ExtractError> {
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }
        Ok(ExtractedFilters::default())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
