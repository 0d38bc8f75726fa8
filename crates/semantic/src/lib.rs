//! Habita vector math and embedders
//!
//! Two things live here. First, the small amount of linear algebra the
//! ranking engine needs: [`normalize`] and [`cosine_similarity`], plus the
//! [`dot`] fast path for vectors that are already known to be unit length.
//! Second, the [`Embedder`] trait that turns a user query (or a listing's
//! description) into such a vector.
//!
//! Embedders:
//!
//! - **Stub** ([`StubEmbedder`]) - deterministic, offline, hash-based. Texts
//!   sharing words land near each other, which makes it usable for demos and
//!   tests without any model.
//! - **Api** ([`HttpEmbedder`]) - calls OpenAI, Hugging Face or a custom
//!   endpoint, with bearer auth, timeouts and [`retry`] with backoff.
//!
//! Every embedder returns unit-normalized vectors and honors a
//! [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! ## Quick example
//!
//! ```
//! use semantic::{cosine_similarity, Embedder, StubEmbedder};
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let embedder = StubEmbedder::default();
//! let cancel = CancellationToken::new();
//! let a = embedder.embed("two bedroom flat in Centro", &cancel).await.unwrap();
//! let b = embedder.embed("flat in centro, two bedrooms", &cancel).await.unwrap();
//! assert!(cosine_similarity(&a, &b) > 0.5);
//! # });
//! ```

pub mod config;
pub mod error;
pub mod retry;
pub mod serde_millis;

mod api;
mod embedder;
mod normalize;
mod similarity;
mod stub;

pub use crate::api::HttpEmbedder;
pub use crate::config::{build_embedder, ApiProvider, EmbedderConfig, EmbedderMode};
pub use crate::embedder::Embedder;
pub use crate::error::EmbedError;
pub use crate::normalize::{l2_norm, normalize};
pub use crate::similarity::{cosine, cosine_similarity, dot, SimilarityStrategy};
pub use crate::stub::{StubEmbedder, DEFAULT_STUB_DIMENSION};
