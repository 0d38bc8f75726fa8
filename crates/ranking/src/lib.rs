//! # Habita Ranking
//!
//! Hybrid ranking of housing listings for a free-text query plus optional
//! structured constraints (price ceiling, minimum bedrooms, neighborhood).
//!
//! [`RankingEngine`] picks one of two modes per request:
//!
//! - **Pure semantic**: no constraint present. Every embedded listing in scope
//!   is scored by similarity, and only the top fifth of the pool (never below
//!   the hard floor) survives. Survivors are hydrated by id afterwards.
//! - **Structured**: at least one constraint present. A filtered, oversampled
//!   sample is scored by `semantic_weight * similarity + filter_weight * filter`
//!   where the filter score is the mean of the active constraint terms.
//!
//! Results are ordered by score, then similarity, then listing id, so equal
//! inputs always produce the same list.
//!
//! ```
//! use std::sync::Arc;
//! use catalog::{InMemoryCatalog, ListingDraft};
//! use ranking::{RankingConfig, RankingEngine, SearchRequest};
//! use semantic::StubEmbedder;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let embedder = StubEmbedder::default();
//! let draft = ListingDraft {
//!     tenant_id: Default::default(),
//!     title: "Apartamento 2 quartos".into(),
//!     description: "Perto do metro no Centro".into(),
//!     neighborhood: "Centro".into(),
//!     city: "Belo Horizonte".into(),
//!     region: "MG".into(),
//!     bedrooms: 2,
//!     bathrooms: 1,
//!     price: 320_000.0,
//!     area: 64.0,
//! };
//! let embedding = embedder.embed_sync(&draft.embedding_text());
//! let catalog = InMemoryCatalog::new();
//! catalog.insert(draft.into_listing(embedding)).unwrap();
//!
//! let engine = RankingEngine::new(
//!     RankingConfig::default(),
//!     Arc::new(embedder),
//!     Arc::new(catalog),
//! )
//! .unwrap();
//! let ranked = engine
//!     .search(&SearchRequest::new("apartamento no centro").with_neighborhood("centro"))
//!     .await
//!     .unwrap();
//! assert_eq!(ranked.len(), 1);
//! # });
//! ```

mod config;
mod engine;
mod filter;
mod metrics;
mod scoring;
mod select;
mod types;

pub use crate::config::{BedroomPolicy, RankingConfig};
pub use crate::engine::RankingEngine;
pub use crate::filter::filter_score;
pub use crate::metrics::{set_ranking_metrics, RankingMetrics};
pub use crate::scoring::{score_sample, score_vectors, ScoredCandidate};
pub use crate::select::dynamic_cutoff;
pub use crate::types::{
    RankError, RankedListings, ScoredResult, SearchMode, SearchRequest, Stage,
};
