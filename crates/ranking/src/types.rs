use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use catalog::{CatalogError, Listing, Scope};
use semantic::EmbedError;

/// One search as submitted by a caller.
///
/// `limit` is taken verbatim; the engine normalizes it (zero or negative
/// becomes the configured default, large values are capped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub min_bedrooms: Option<u32>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub scope: Scope,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_price: None,
            min_bedrooms: None,
            neighborhood: None,
            limit: 0,
            scope: Scope::All,
        }
    }

    pub fn with_max_price(mut self, max_price: f64) -> Self {
        self.max_price = Some(max_price);
        self
    }

    pub fn with_min_bedrooms(mut self, min_bedrooms: u32) -> Self {
        self.min_bedrooms = Some(min_bedrooms);
        self
    }

    pub fn with_neighborhood(mut self, neighborhood: impl Into<String>) -> Self {
        self.neighborhood = Some(neighborhood.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Neighborhood constraint, with blank strings treated as absent.
    pub fn neighborhood_filter(&self) -> Option<&str> {
        self.neighborhood
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Structured when any filter is present, pure-semantic otherwise.
    pub fn mode(&self) -> SearchMode {
        if self.max_price.is_some()
            || self.min_bedrooms.is_some()
            || self.neighborhood_filter().is_some()
        {
            SearchMode::Structured
        } else {
            SearchMode::PureSemantic
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Whole scope scored by similarity, trimmed with a dynamic cutoff.
    PureSemantic,
    /// Filtered sample scored by a weighted blend of similarity and filters.
    Structured,
}

impl SearchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::PureSemantic => "pure_semantic",
            SearchMode::Structured => "structured",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked listing together with the numbers that placed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub listing: Listing,
    /// Similarity between the query and the listing embedding.
    pub similarity: f32,
    /// Ranking score. Equals `similarity` in pure-semantic mode.
    pub score: f32,
}

/// Outcome of one search, best result first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedListings {
    pub mode: SearchMode,
    /// Limit after normalization.
    pub limit: usize,
    /// Candidates scored before the floor and cutoff were applied.
    pub pool_size: usize,
    pub hits: Vec<ScoredResult>,
}

impl RankedListings {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredResult> {
        self.hits.iter()
    }

    pub fn into_hits(self) -> Vec<ScoredResult> {
        self.hits
    }
}

impl<'a> IntoIterator for &'a RankedListings {
    type Item = &'a ScoredResult;
    type IntoIter = std::slice::Iter<'a, ScoredResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Suspension points of a search, reported on cancellation and timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Embed,
    Fetch,
    /// Parallel scoring of the candidate pool.
    Score,
    Hydrate,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Embed => "embed",
            Stage::Fetch => "fetch",
            Stage::Score => "score",
            Stage::Hydrate => "hydrate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RankError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(#[source] EmbedError),
    #[error("candidate storage unavailable: {0}")]
    StorageUnavailable(#[source] CatalogError),
    #[error("search cancelled during {stage}")]
    Cancelled { stage: Stage },
    #[error("search timed out during {stage}")]
    Timeout { stage: Stage },
}

impl From<EmbedError> for RankError {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::Cancelled => RankError::Cancelled {
                stage: Stage::Embed,
            },
            other => RankError::EmbeddingUnavailable(other),
        }
    }
}

impl From<CatalogError> for RankError {
    fn from(err: CatalogError) -> Self {
        RankError::StorageUnavailable(err)
    }
}
