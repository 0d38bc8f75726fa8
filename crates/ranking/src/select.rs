use std::cmp::Ordering;
use std::collections::HashSet;

use catalog::{Listing, ListingId};

use crate::scoring::ScoredCandidate;

/// Similarity a pure-semantic candidate must reach to survive.
///
/// The cutoff is the value at rank `floor(n * top_fraction)` of the
/// descending similarity list, raised to `hard_floor` when lower. With the
/// default fraction of 0.2 this keeps roughly the top fifth of the pool.
pub fn dynamic_cutoff(similarities: &[f32], top_fraction: f32, hard_floor: f32) -> f32 {
    if similarities.is_empty() {
        return hard_floor;
    }
    let mut sorted = similarities.to_vec();
    sorted.sort_unstable_by(|a, b| b.total_cmp(a));
    let n = sorted.len();
    let idx = ((n as f64 * f64::from(top_fraction)).floor() as usize).min(n - 1);
    sorted[idx].max(hard_floor)
}

/// Total ranking order: score desc, similarity desc, id asc.
pub(crate) fn rank_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.similarity.total_cmp(&a.similarity))
        .then_with(|| a.id.cmp(&b.id))
}

/// Drop repeated ids from a ranked list, keeping the best-ranked occurrence.
pub(crate) fn dedupe_ranked(ranked: &mut Vec<ScoredCandidate>) {
    let mut seen = HashSet::with_capacity(ranked.len());
    ranked.retain(|c| seen.insert(c.id));
}

/// Drop repeated listings from a sample, keeping the first occurrence.
pub(crate) fn dedupe_first(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen: HashSet<ListingId> = HashSet::with_capacity(listings.len());
    listings
        .into_iter()
        .filter(|l| seen.insert(l.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn cand(id: Uuid, similarity: f32, score: f32) -> ScoredCandidate {
        ScoredCandidate {
            id,
            index: 0,
            similarity,
            score,
        }
    }

    #[test]
    fn cutoff_picks_p80_of_pool() {
        let sims: Vec<f32> = (0..10).map(|i| i as f32 / 10.0).collect();
        // desc: 0.9, 0.8, 0.7 ... idx = floor(10 * 0.2) = 2
        assert!((dynamic_cutoff(&sims, 0.2, 0.06) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn cutoff_respects_hard_floor() {
        assert_eq!(dynamic_cutoff(&[0.01, 0.02, 0.03], 0.2, 0.06), 0.06);
        assert_eq!(dynamic_cutoff(&[], 0.2, 0.06), 0.06);
    }

    #[test]
    fn small_pool_keeps_best() {
        // n = 3, idx = 0, so only the maximum survives
        assert!((dynamic_cutoff(&[0.5, 0.9, 0.05], 0.2, 0.06) - 0.9).abs() < 1e-6);
        assert_eq!(dynamic_cutoff(&[0.4], 0.2, 0.06), 0.4);
    }

    #[test]
    fn order_breaks_ties_by_similarity_then_id() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        let mut v = vec![
            cand(high, 0.5, 0.8),
            cand(low, 0.5, 0.8),
            cand(high, 0.9, 0.8),
            cand(low, 0.1, 0.9),
        ];
        v.sort_by(rank_order);
        assert_eq!(v[0].score, 0.9);
        assert_eq!(v[1].similarity, 0.9);
        assert_eq!(v[2].id, low);
        assert_eq!(v[3].id, high);
    }

    #[test]
    fn dedupe_keeps_best_ranked() {
        let a = Uuid::from_u128(7);
        let b = Uuid::from_u128(8);
        let mut v = vec![cand(a, 0.9, 0.9), cand(b, 0.8, 0.8), cand(a, 0.2, 0.2)];
        dedupe_ranked(&mut v);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].score, 0.9);
    }
}
