use async_trait::async_trait;
use fxhash::hash64;
use tokio_util::sync::CancellationToken;

use crate::normalize::normalize;
use crate::{EmbedError, Embedder};

/// Dimension used when the configuration does not pick one.
pub const DEFAULT_STUB_DIMENSION: usize = 384;

/// Deterministic, offline embedder.
///
/// Each lowercase alphanumeric token is hashed into one signed bucket of the
/// output vector, so texts that share words end up close to each other.
/// Text without any token falls back to a sinusoid seeded by the hash of the
/// whole input. The result is always unit-normalized.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_STUB_DIMENSION,
        }
    }
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Result<Self, EmbedError> {
        if dimension == 0 {
            return Err(EmbedError::InvalidConfig(
                "stub dimension must be greater than zero".into(),
            ));
        }
        Ok(Self { dimension })
    }

    /// Synchronous core, exposed for tooling that seeds catalogs offline.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        let lowered = text.to_lowercase();
        let mut tokens = 0usize;
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let h = hash64(token.as_bytes());
            let idx = (h % self.dimension as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
            tokens += 1;
        }

        if tokens == 0 {
            let h = hash64(text.as_bytes());
            for (idx, value) in v.iter_mut().enumerate() {
                *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
            }
        }

        normalize(&mut v);
        v
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<f32>, EmbedError> {
        if cancel.is_cancelled() {
            return Err(EmbedError::Cancelled);
        }
        if text.trim().is_empty() {
            return Err(EmbedError::EmptyInput);
        }
        Ok(self.embed_sync(text))
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}
