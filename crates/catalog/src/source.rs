use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{CatalogError, Listing, ListingId, Scope};

/// How the bedroom constraint is enforced when sampling candidates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "bedrooms", rename_all = "snake_case")]
pub enum BedroomPredicate {
    /// Only listings with exactly this many bedrooms.
    Exact(u32),
    /// Listings with at least this many bedrooms.
    AtLeast(u32),
}

impl BedroomPredicate {
    pub fn matches(&self, bedrooms: u32) -> bool {
        match *self {
            BedroomPredicate::Exact(n) => bedrooms == n,
            BedroomPredicate::AtLeast(n) => bedrooms >= n,
        }
    }
}

/// Structured predicates applied when sampling candidates in structured mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SampleFilter {
    /// Inclusive price ceiling.
    pub max_price: Option<f64>,
    pub bedrooms: Option<BedroomPredicate>,
    /// Case-insensitive neighborhood equality.
    pub neighborhood: Option<String>,
}

impl SampleFilter {
    pub fn is_empty(&self) -> bool {
        self.max_price.is_none() && self.bedrooms.is_none() && self.neighborhood.is_none()
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(max) = self.max_price {
            if listing.price > max {
                return false;
            }
        }
        if let Some(pred) = self.bedrooms {
            if !pred.matches(listing.bedrooms) {
                return false;
            }
        }
        if let Some(ref wanted) = self.neighborhood {
            if !neighborhood_eq(&listing.neighborhood, wanted) {
                return false;
            }
        }
        true
    }
}

/// Case-insensitive comparison used for neighborhood predicates and scoring.
pub fn neighborhood_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Read side of listing storage consumed by the ranking engine.
///
/// Implementations are expected to be scoped already; `scope` narrows the
/// visible listings but is not an authorization check. Retries, throttling
/// and caching belong to implementations, never to the engine.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Every `(id, embedding)` pair visible in `scope`, used for
    /// pure-semantic search. Listings without an embedding may be omitted.
    async fn bulk_vectors(&self, scope: &Scope) -> Result<Vec<(ListingId, Vec<f32>)>, CatalogError>;

    /// At most `sample_size` full listings matching `filter`, most recent
    /// first.
    async fn filtered_sample(
        &self,
        scope: &Scope,
        filter: &SampleFilter,
        sample_size: usize,
    ) -> Result<Vec<Listing>, CatalogError>;

    /// Full listings for `ids`, in the order the ids were supplied. Unknown
    /// ids are skipped.
    async fn by_ids(&self, scope: &Scope, ids: &[ListingId]) -> Result<Vec<Listing>, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn listing(price: f64, bedrooms: u32, neighborhood: &str) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            title: "t".into(),
            description: "d".into(),
            neighborhood: neighborhood.into(),
            city: "c".into(),
            region: "MG".into(),
            bedrooms,
            bathrooms: 1,
            price,
            area: 50.0,
            created_at: Utc::now(),
            embedding: Vec::new(),
        }
    }

    #[test]
    fn bedroom_predicates() {
        assert!(BedroomPredicate::Exact(2).matches(2));
        assert!(!BedroomPredicate::Exact(2).matches(3));
        assert!(BedroomPredicate::AtLeast(2).matches(3));
        assert!(!BedroomPredicate::AtLeast(2).matches(1));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = SampleFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&listing(1e9, 0, "anywhere")));
    }

    #[test]
    fn price_ceiling_is_inclusive() {
        let filter = SampleFilter {
            max_price: Some(300000.0),
            ..Default::default()
        };
        assert!(filter.matches(&listing(300000.0, 2, "Centro")));
        assert!(!filter.matches(&listing(300000.01, 2, "Centro")));
    }

    #[test]
    fn neighborhood_matches_ignoring_case_and_padding() {
        let filter = SampleFilter {
            neighborhood: Some("Centro".into()),
            ..Default::default()
        };
        assert!(filter.matches(&listing(1.0, 1, "centro")));
        assert!(filter.matches(&listing(1.0, 1, " CENTRO ")));
        assert!(!filter.matches(&listing(1.0, 1, "Centro Sul")));
    }

    #[test]
    fn all_predicates_must_hold() {
        let filter = SampleFilter {
            max_price: Some(500000.0),
            bedrooms: Some(BedroomPredicate::AtLeast(3)),
            neighborhood: Some("Savassi".into()),
        };
        assert!(filter.matches(&listing(400000.0, 3, "savassi")));
        assert!(!filter.matches(&listing(400000.0, 2, "savassi")));
        assert!(!filter.matches(&listing(600000.0, 4, "savassi")));
        assert!(!filter.matches(&listing(400000.0, 4, "Lourdes")));
    }
}
