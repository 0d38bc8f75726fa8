use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use catalog::{CandidateSource, Listing, ListingId, SampleFilter};
use semantic::{EmbedError, Embedder, SimilarityStrategy};

use crate::config::RankingConfig;
use crate::metrics::metrics_recorder;
use crate::scoring::{score_sample, score_vectors};
use crate::select::{dedupe_first, dedupe_ranked, dynamic_cutoff, rank_order};
use crate::types::{RankError, RankedListings, ScoredResult, SearchMode, SearchRequest, Stage};

/// Hybrid listing ranker.
///
/// Holds no per-request state, so one engine can be shared across tasks
/// behind an `Arc`.
pub struct RankingEngine {
    cfg: RankingConfig,
    embedder: Arc<dyn Embedder>,
    source: Arc<dyn CandidateSource>,
}

impl RankingEngine {
    /// Create an engine, rejecting inconsistent configuration up front.
    pub fn new(
        cfg: RankingConfig,
        embedder: Arc<dyn Embedder>,
        source: Arc<dyn CandidateSource>,
    ) -> Result<Self, RankError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            embedder,
            source,
        })
    }

    pub fn config(&self) -> &RankingConfig {
        &self.cfg
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn source(&self) -> &Arc<dyn CandidateSource> {
        &self.source
    }

    /// Rank listings for `request` without an external cancellation signal.
    pub async fn search(&self, request: &SearchRequest) -> Result<RankedListings, RankError> {
        self.search_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Rank listings for `request`.
    ///
    /// Every suspension point (embedding the query, fetching candidates,
    /// scoring, hydrating pure-semantic survivors) observes `cancel` and the
    /// configured stage timeout. A cancelled or timed out search fails as a
    /// whole; it never returns a partial list.
    pub async fn search_with_cancel(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<RankedListings, RankError> {
        let start = Instant::now();

        if request.query.trim().is_empty() {
            return Err(RankError::Validation("query must not be blank".into()));
        }
        if request.max_price.is_some_and(f64::is_nan) {
            return Err(RankError::Validation("max_price must be a number".into()));
        }

        let limit = self.cfg.normalize_limit(request.limit);
        let mode = request.mode();

        let query_vector = self
            .guard(Stage::Embed, cancel, self.embedder.embed(&request.query, cancel))
            .await?;
        if query_vector.is_empty() {
            return Err(RankError::EmbeddingUnavailable(EmbedError::InvalidResponse(
                "embedder returned an empty query vector".into(),
            )));
        }

        let (pool_size, hits) = match mode {
            SearchMode::PureSemantic => {
                self.pure_semantic(request, &query_vector, limit, cancel)
                    .await?
            }
            SearchMode::Structured => {
                self.structured(request, &query_vector, limit, cancel)
                    .await?
            }
        };

        let latency = start.elapsed();
        tracing::info!(
            mode = %mode,
            limit,
            pool_size,
            hits = hits.len(),
            latency_ms = latency.as_millis() as u64,
            "listing search completed"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_search(&request.scope, mode, latency, pool_size, hits.len());
        }

        Ok(RankedListings {
            mode,
            limit,
            pool_size,
            hits,
        })
    }

    async fn pure_semantic(
        &self,
        request: &SearchRequest,
        query_vector: &[f32],
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<(usize, Vec<ScoredResult>), RankError> {
        let vectors = self
            .guard(Stage::Fetch, cancel, self.source.bulk_vectors(&request.scope))
            .await?;
        let pool_size = vectors.len();
        if vectors.is_empty() {
            return Ok((0, Vec::new()));
        }

        let strategy = SimilarityStrategy::for_normalized_inputs(self.cfg.assume_normalized);
        let chunk_size = self.cfg.scoring_chunk_size;
        let query = query_vector.to_vec();
        let scored = self
            .score_blocking(cancel, move || {
                score_vectors(&query, &vectors, strategy, chunk_size)
            })
            .await?;

        let similarities: Vec<f32> = scored.iter().map(|c| c.similarity).collect();
        let cutoff = dynamic_cutoff(
            &similarities,
            self.cfg.top_fraction,
            self.cfg.hard_floor_similarity,
        );

        let mut survivors: Vec<_> = scored
            .into_iter()
            .filter(|c| c.similarity >= cutoff)
            .collect();
        survivors.sort_by(rank_order);
        dedupe_ranked(&mut survivors);
        survivors.truncate(limit);
        tracing::debug!(pool_size, cutoff, survivors = survivors.len(), "semantic cutoff applied");

        if survivors.is_empty() {
            return Ok((pool_size, Vec::new()));
        }

        let ids: Vec<ListingId> = survivors.iter().map(|c| c.id).collect();
        let hydrated = self
            .guard(Stage::Hydrate, cancel, self.source.by_ids(&request.scope, &ids))
            .await?;
        let mut by_id: HashMap<ListingId, Listing> =
            hydrated.into_iter().map(|l| (l.id, l)).collect();

        let hits = survivors
            .into_iter()
            .filter_map(|c| {
                by_id.remove(&c.id).map(|listing| ScoredResult {
                    listing,
                    similarity: c.similarity,
                    score: c.similarity,
                })
            })
            .collect::<Vec<_>>();
        if hits.len() < ids.len() {
            tracing::debug!(
                requested = ids.len(),
                hydrated = hits.len(),
                "listings vanished between scoring and hydration"
            );
        }
        Ok((pool_size, hits))
    }

    async fn structured(
        &self,
        request: &SearchRequest,
        query_vector: &[f32],
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<(usize, Vec<ScoredResult>), RankError> {
        let filter = SampleFilter {
            max_price: request.max_price,
            bedrooms: request
                .min_bedrooms
                .map(|n| self.cfg.bedroom_policy.predicate(n)),
            neighborhood: request.neighborhood_filter().map(str::to_owned),
        };
        let sample_size = self.cfg.sample_size(limit);

        let sample = self
            .guard(
                Stage::Fetch,
                cancel,
                self.source
                    .filtered_sample(&request.scope, &filter, sample_size),
            )
            .await?;
        let sample = dedupe_first(sample);
        let pool_size = sample.len();
        if sample.is_empty() {
            return Ok((0, Vec::new()));
        }

        let query = query_vector.to_vec();
        let owned_request = request.clone();
        let cfg = self.cfg.clone();
        let (sample, scored) = self
            .score_blocking(cancel, move || {
                let scored = score_sample(&query, &sample, &owned_request, &cfg);
                (sample, scored)
            })
            .await?;

        let mut kept: Vec<_> = scored
            .into_iter()
            .filter(|c| {
                c.similarity >= self.cfg.hard_floor_similarity && c.score > self.cfg.min_final_score
            })
            .collect();
        kept.sort_by(rank_order);
        kept.truncate(limit);

        let mut slots: Vec<Option<Listing>> = sample.into_iter().map(Some).collect();
        let hits = kept
            .into_iter()
            .filter_map(|c| {
                slots
                    .get_mut(c.index)
                    .and_then(Option::take)
                    .map(|listing| ScoredResult {
                        listing,
                        similarity: c.similarity,
                        score: c.score,
                    })
            })
            .collect();
        Ok((pool_size, hits))
    }

    /// Run CPU-bound scoring on the blocking pool. Observes `cancel` and the
    /// stage timeout like the other stages.
    async fn score_blocking<T, F>(&self, cancel: &CancellationToken, f: F) -> Result<T, RankError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(RankError::Cancelled {
                stage: Stage::Score,
            });
        }
        let task = tokio::task::spawn_blocking(f);
        let joined = async move {
            match task.await {
                Ok(value) => Ok::<T, RankError>(value),
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(_) => Err(RankError::Cancelled {
                    stage: Stage::Score,
                }),
            }
        };
        self.guard(Stage::Score, cancel, joined).await
    }

    /// Run one suspension point under the cancellation token and the
    /// optional stage timeout.
    async fn guard<T, E, F>(
        &self,
        stage: Stage,
        cancel: &CancellationToken,
        fut: F,
    ) -> Result<T, RankError>
    where
        F: Future<Output = Result<T, E>>,
        RankError: From<E>,
    {
        if cancel.is_cancelled() {
            return Err(RankError::Cancelled { stage });
        }

        let bounded = async {
            match self.cfg.stage_timeout {
                Some(limit) => match tokio::time::timeout(limit, fut).await {
                    Ok(res) => res.map_err(RankError::from),
                    Err(_) => {
                        tracing::warn!(stage = %stage, timeout_ms = limit.as_millis() as u64, "search stage timed out");
                        Err(RankError::Timeout { stage })
                    }
                },
                None => fut.await.map_err(RankError::from),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RankError::Cancelled { stage }),
            res = bounded => res,
        }
    }
}
