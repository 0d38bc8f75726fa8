//! Workspace umbrella crate for Habita listing search.
//!
//! Re-exports the catalog, embedding, extraction and ranking crates, and
//! wires them into a [`SearchStack`] from one YAML [`HabitaConfig`].

pub mod config;

pub use catalog::{
    neighborhood_eq, BedroomPredicate, CandidateSource, CatalogError, InMemoryCatalog, Listing,
    ListingDraft, ListingId, SampleFilter, Scope, TenantId,
};
pub use extract::{
    build_extractor, ExtractError, ExtractedFilters, ExtractorConfig, ExtractorMode,
    FilterExtractor, NoopExtractor, OpenAiFilterExtractor,
};
pub use ranking::{
    set_ranking_metrics, BedroomPolicy, RankError, RankedListings, RankingConfig, RankingEngine,
    RankingMetrics, ScoredResult, SearchMode, SearchRequest, Stage,
};
pub use semantic::{
    build_embedder, cosine_similarity, EmbedError, Embedder, EmbedderConfig, EmbedderMode,
    StubEmbedder,
};

pub use crate::config::{CatalogYamlConfig, ConfigLoadError, HabitaConfig};

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Failures while assembling or feeding a [`SearchStack`].
#[derive(Debug, Error)]
pub enum StackError {
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("embedder: {0}")]
    Embedder(#[from] EmbedError),
    #[error("extractor: {0}")]
    Extractor(#[from] ExtractError),
    #[error("ranking: {0}")]
    Ranking(#[from] RankError),
}

/// Every collaborator a search front end needs, built once and shared.
#[derive(Clone)]
pub struct SearchStack {
    pub catalog: Arc<InMemoryCatalog>,
    pub embedder: Arc<dyn Embedder>,
    pub extractor: Arc<dyn FilterExtractor>,
    pub engine: Arc<RankingEngine>,
}

impl SearchStack {
    /// Build the stack, seeding the catalog from `catalog.seed_path` when set.
    pub fn from_config(cfg: &HabitaConfig) -> Result<Self, StackError> {
        let catalog = match &cfg.catalog.seed_path {
            Some(path) => InMemoryCatalog::from_json_file(path)?,
            None => InMemoryCatalog::new(),
        };
        Self::with_catalog(cfg, Arc::new(catalog))
    }

    /// Build the stack around an existing catalog.
    pub fn with_catalog(
        cfg: &HabitaConfig,
        catalog: Arc<InMemoryCatalog>,
    ) -> Result<Self, StackError> {
        let embedder = build_embedder(&cfg.embedder)?;
        let extractor = build_extractor(&cfg.extractor)?;
        let engine = RankingEngine::new(cfg.ranking.clone(), embedder.clone(), catalog.clone())?;

        tracing::info!(
            listings = catalog.len(),
            embedder = embedder.name(),
            extractor = extractor.name(),
            "search stack ready"
        );

        Ok(Self {
            catalog,
            embedder,
            extractor,
            engine: Arc::new(engine),
        })
    }

    /// Embed a new listing's text, assign it an id and timestamp, and store it.
    pub async fn add_listing(
        &self,
        draft: ListingDraft,
        cancel: &CancellationToken,
    ) -> Result<ListingId, StackError> {
        let embedding = self.embedder.embed(&draft.embedding_text(), cancel).await?;
        let listing = draft.into_listing(embedding);
        let id = listing.id;
        self.catalog.insert(listing)?;
        tracing::debug!(listing_id = %id, "listing stored");
        Ok(id)
    }

    /// Run a search through the shared engine.
    pub async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<RankedListings, RankError> {
        self.engine.search_with_cancel(request, cancel).await
    }
}
