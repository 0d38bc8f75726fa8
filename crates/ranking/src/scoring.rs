//! Parallel candidate scoring.
//!
//! Candidates are split into fixed-size chunks, scored on the rayon pool and
//! merged back in input order. Callers sort the merged output with the total
//! ranking order, so results never depend on the number of worker threads.

use rayon::prelude::*;

use catalog::{Listing, ListingId};
use semantic::SimilarityStrategy;

use crate::config::RankingConfig;
use crate::filter::filter_score;
use crate::types::SearchRequest;

/// A candidate's numbers before hydration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub id: ListingId,
    /// Position in the candidate list handed to the scorer.
    pub index: usize,
    pub similarity: f32,
    pub score: f32,
}

/// Similarity of every `(id, vector)` pair against `query`. `score` equals
/// `similarity`.
pub fn score_vectors(
    query: &[f32],
    candidates: &[(ListingId, Vec<f32>)],
    strategy: SimilarityStrategy,
    chunk_size: usize,
) -> Vec<ScoredCandidate> {
    let chunk_size = chunk_size.max(1);
    candidates
        .par_chunks(chunk_size)
        .enumerate()
        .flat_map_iter(|(chunk_idx, chunk)| {
            chunk.iter().enumerate().map(move |(offset, (id, vector))| {
                let similarity = strategy.similarity(query, vector);
                ScoredCandidate {
                    id: *id,
                    index: chunk_idx * chunk_size + offset,
                    similarity,
                    score: similarity,
                }
            })
        })
        .collect()
}

/// Blend similarity and filter score for a structured sample.
pub fn score_sample(
    query: &[f32],
    sample: &[Listing],
    request: &SearchRequest,
    cfg: &RankingConfig,
) -> Vec<ScoredCandidate> {
    let strategy = SimilarityStrategy::for_normalized_inputs(cfg.assume_normalized);
    let reference_max = sample.iter().map(|l| l.bedrooms).max().unwrap_or(0);
    let chunk_size = cfg.scoring_chunk_size.max(1);

    sample
        .par_chunks(chunk_size)
        .enumerate()
        .flat_map_iter(|(chunk_idx, chunk)| {
            chunk.iter().enumerate().map(move |(offset, listing)| {
                let similarity = strategy.similarity(query, &listing.embedding);
                let filter = filter_score(listing, request, reference_max, cfg.bedroom_policy);
                ScoredCandidate {
                    id: listing.id,
                    index: chunk_idx * chunk_size + offset,
                    similarity,
                    score: cfg.semantic_weight * similarity + cfg.filter_weight * filter,
                }
            })
        })
        .collect()
}
