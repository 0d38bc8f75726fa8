//! Structured filter scoring.
//!
//! Each constraint present on the request contributes one term in `[0, 1]`.
//! The filter score is the unweighted mean of the active terms, or 0 when
//! the request carries no scoreable constraint.

use catalog::{neighborhood_eq, Listing};

use crate::config::BedroomPolicy;
use crate::types::SearchRequest;

/// Minimum spread used when normalizing extra bedrooms.
const MIN_BEDROOM_SPREAD: u32 = 2;

/// Score how well `listing` satisfies the structured constraints of `request`.
///
/// `reference_max_bedrooms` is the largest bedroom count in the current
/// candidate sample. It is only consulted under [`BedroomPolicy::AtLeast`].
pub fn filter_score(
    listing: &Listing,
    request: &SearchRequest,
    reference_max_bedrooms: u32,
    policy: BedroomPolicy,
) -> f32 {
    let mut total = 0.0f32;
    let mut active = 0u32;

    if let Some(max_price) = request.max_price {
        total += price_term(listing.price, max_price);
        active += 1;
    }

    if let Some(wanted) = request.neighborhood_filter() {
        if neighborhood_eq(&listing.neighborhood, wanted) {
            total += 1.0;
        }
        active += 1;
    }

    if let Some(min) = request.min_bedrooms {
        if policy.scores_bedrooms() {
            total += bedroom_term(listing.bedrooms, min, reference_max_bedrooms);
            active += 1;
        }
    }

    if active == 0 {
        0.0
    } else {
        (total / active as f32).clamp(0.0, 1.0)
    }
}

/// Relative headroom under the ceiling. At or above the ceiling scores 0.
fn price_term(price: f64, max_price: f64) -> f32 {
    if max_price.is_nan() || max_price <= 0.0 || !price.is_finite() || price >= max_price {
        return 0.0;
    }
    let term = ((max_price - price) / max_price).clamp(0.0, 1.0) as f32;
    if term.is_nan() {
        0.0
    } else {
        term
    }
}

fn bedroom_term(bedrooms: u32, min: u32, reference_max: u32) -> f32 {
    let extra = bedrooms.saturating_sub(min) as f32;
    let spread = reference_max.saturating_sub(min).max(MIN_BEDROOM_SPREAD) as f32;
    (extra / spread).clamp(0.0, 1.0)
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
            title: "Apartamento".into(),
            description: String::new(),
            neighborhood: neighborhood.into(),
            city: "Belo Horizonte".into(),
            region: "MG".into(),
            bedrooms,
            bathrooms: 1,
            price,
            area: 70.0,
            created_at: Utc::now(),
            embedding: Vec::new(),
        }
    }

    #[test]
    fn no_constraints_is_neutral() {
        let l = listing(100.0, 2, "Centro");
        let req = SearchRequest::new("q");
        assert_eq!(filter_score(&l, &req, 4, BedroomPolicy::AtLeast), 0.0);
    }

    #[test]
    fn price_headroom() {
        let req = SearchRequest::new("q").with_max_price(400_000.0);
        let cheap = listing(100_000.0, 2, "Centro");
        let at_cap = listing(400_000.0, 2, "Centro");
        let above = listing(500_000.0, 2, "Centro");
        assert!((filter_score(&cheap, &req, 2, BedroomPolicy::AtLeast) - 0.75).abs() < 1e-6);
        assert_eq!(filter_score(&at_cap, &req, 2, BedroomPolicy::AtLeast), 0.0);
        assert_eq!(filter_score(&above, &req, 2, BedroomPolicy::AtLeast), 0.0);
    }

    #[test]
    fn non_positive_ceiling_scores_zero() {
        let l = listing(10.0, 1, "Centro");
        for max in [0.0, -5.0, f64::NAN] {
            let req = SearchRequest::new("q").with_max_price(max);
            assert_eq!(filter_score(&l, &req, 1, BedroomPolicy::AtLeast), 0.0);
        }
    }

    #[test]
    fn neighborhood_is_case_insensitive() {
        let l = listing(1.0, 1, "Centro");
        let req = SearchRequest::new("q").with_neighborhood("centro");
        assert_eq!(filter_score(&l, &req, 1, BedroomPolicy::AtLeast), 1.0);

        let req = SearchRequest::new("q").with_neighborhood("  CENTRO ");
        assert_eq!(filter_score(&l, &req, 1, BedroomPolicy::AtLeast), 1.0);

        let req = SearchRequest::new("q").with_neighborhood("Savassi");
        assert_eq!(filter_score(&l, &req, 1, BedroomPolicy::AtLeast), 0.0);
    }

    #[test]
    fn bedroom_term_uses_reference_spread() {
        let req = SearchRequest::new("q").with_min_bedrooms(2);
        // spread = max(2, 6 - 2) = 4
        let two = listing(1.0, 2, "x");
        let four = listing(1.0, 4, "x");
        let six = listing(1.0, 6, "x");
        assert_eq!(filter_score(&two, &req, 6, BedroomPolicy::AtLeast), 0.0);
        assert!((filter_score(&four, &req, 6, BedroomPolicy::AtLeast) - 0.5).abs() < 1e-6);
        assert_eq!(filter_score(&six, &req, 6, BedroomPolicy::AtLeast), 1.0);

        // narrow sample: spread floors at 2
        let three = listing(1.0, 3, "x");
        assert!((filter_score(&three, &req, 3, BedroomPolicy::AtLeast) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn exact_policy_drops_bedroom_term() {
        let req = SearchRequest::new("q").with_min_bedrooms(2);
        let l = listing(1.0, 2, "x");
        assert_eq!(filter_score(&l, &req, 2, BedroomPolicy::Exact), 0.0);

        let req = req.with_neighborhood("x");
        assert_eq!(filter_score(&l, &req, 2, BedroomPolicy::Exact), 1.0);
    }

    #[test]
    fn averages_active_terms() {
        let req = SearchRequest::new("q")
            .with_max_price(200.0)
            .with_neighborhood("Centro")
            .with_min_bedrooms(1);
        // price 0.5, neighborhood 1.0, bedrooms (3-1)/max(2, 3-1) = 1.0
        let l = listing(100.0, 3, "centro");
        let score = filter_score(&l, &req, 3, BedroomPolicy::AtLeast);
        assert!((score - 2.5 / 3.0).abs() < 1e-6);
    }
}
