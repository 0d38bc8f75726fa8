use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::{CandidateSource, CatalogError, Listing, ListingId, SampleFilter, Scope};

/// An in-memory catalog using a `RwLock` around a `HashMap`.
///
/// Reads take a snapshot under the read lock, so every request works on a
/// consistent view even while listings are being inserted.
#[derive(Default)]
pub struct InMemoryCatalog {
    listings: RwLock<HashMap<ListingId, Listing>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from existing listings. Later duplicates replace
    /// earlier ones.
    pub fn from_listings<I: IntoIterator<Item = Listing>>(listings: I) -> Self {
        let map = listings.into_iter().map(|l| (l.id, l)).collect();
        Self {
            listings: RwLock::new(map),
        }
    }

    /// Load a JSON array of listings from disk.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|source| CatalogError::Seed {
            path: path.to_path_buf(),
            source,
        })?;
        let listings: Vec<Listing> = serde_json::from_slice(&raw)?;
        tracing::info!(path = %path.display(), count = listings.len(), "seeded catalog");
        Ok(Self::from_listings(listings))
    }

    /// Insert a new listing; ids must be unique.
    pub fn insert(&self, listing: Listing) -> Result<(), CatalogError> {
        let mut guard = self
            .listings
            .write()
            .map_err(|_| CatalogError::LockPoisoned)?;
        if guard.contains_key(&listing.id) {
            return Err(CatalogError::Duplicate(listing.id));
        }
        guard.insert(listing.id, listing);
        Ok(())
    }

    pub fn get(&self, id: &ListingId) -> Result<Option<Listing>, CatalogError> {
        let guard = self
            .listings
            .read()
            .map_err(|_| CatalogError::LockPoisoned)?;
        Ok(guard.get(id).cloned())
    }

    /// Number of stored listings, read through the lock even if a writer
    /// panicked while holding it.
    pub fn len(&self) -> usize {
        self.listings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `limit` listings visible in `scope` that pass `keep`, most
    /// recent first. Ties on the timestamp fall back to the id so the order
    /// is reproducible. Only the returned listings are cloned.
    fn recent_matching<F>(
        &self,
        scope: &Scope,
        keep: F,
        limit: usize,
    ) -> Result<Vec<Listing>, CatalogError>
    where
        F: Fn(&Listing) -> bool,
    {
        let guard = self
            .listings
            .read()
            .map_err(|_| CatalogError::LockPoisoned)?;
        let mut visible: Vec<&Listing> = guard
            .values()
            .filter(|l| scope.admits(&l.tenant_id) && keep(l))
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(visible.into_iter().take(limit).cloned().collect())
    }
}

#[async_trait]
impl CandidateSource for InMemoryCatalog {
    async fn bulk_vectors(&self, scope: &Scope) -> Result<Vec<(ListingId, Vec<f32>)>, CatalogError> {
        let guard = self
            .listings
            .read()
            .map_err(|_| CatalogError::LockPoisoned)?;
        Ok(guard
            .values()
            .filter(|l| l.has_embedding() && scope.admits(&l.tenant_id))
            .map(|l| (l.id, l.embedding.clone()))
            .collect())
    }

    async fn filtered_sample(
        &self,
        scope: &Scope,
        filter: &SampleFilter,
        sample_size: usize,
    ) -> Result<Vec<Listing>, CatalogError> {
        self.recent_matching(scope, |l| filter.matches(l), sample_size)
    }

    async fn by_ids(&self, scope: &Scope, ids: &[ListingId]) -> Result<Vec<Listing>, CatalogError> {
        let guard = self
            .listings
            .read()
            .map_err(|_| CatalogError::LockPoisoned)?;
        Ok(ids
            .iter()
            .filter_map(|id| guard.get(id))
            .filter(|l| scope.admits(&l.tenant_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BedroomPredicate;
    use chrono::{Duration, TimeZone, Utc};
    use std::io::Write;
    use uuid::Uuid;

    fn listing(n: u128, tenant: u128, age_days: i64, bedrooms: u32, price: f64) -> Listing {
        let base = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        Listing {
            id: Uuid::from_u128(n),
            tenant_id: Uuid::from_u128(tenant),
            title: format!("listing {n}"),
            description: "desc".into(),
            neighborhood: "Centro".into(),
            city: "Ouro Preto".into(),
            region: "MG".into(),
            bedrooms,
            bathrooms: 1,
            price,
            area: 60.0,
            created_at: base - Duration::days(age_days),
            embedding: vec![1.0, 0.0],
        }
    }

    #[tokio::test]
    async fn filtered_sample_is_most_recent_first_and_bounded() {
        let catalog = InMemoryCatalog::from_listings(vec![
            listing(1, 1, 10, 2, 100.0),
            listing(2, 1, 1, 2, 100.0),
            listing(3, 1, 5, 2, 100.0),
        ]);
        let sample = catalog
            .filtered_sample(&Scope::All, &SampleFilter::default(), 2)
            .await
            .unwrap();
        let ids: Vec<_> = sample.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(2), Uuid::from_u128(3)]);
    }

    #[tokio::test]
    async fn filtered_sample_applies_predicates() {
        let catalog = InMemoryCatalog::from_listings(vec![
            listing(1, 1, 1, 2, 100.0),
            listing(2, 1, 2, 3, 100.0),
            listing(3, 1, 3, 3, 900.0),
        ]);
        let exact = SampleFilter {
            max_price: Some(500.0),
            bedrooms: Some(BedroomPredicate::Exact(2)),
            neighborhood: None,
        };
        let sample = catalog.filtered_sample(&Scope::All, &exact, 10).await.unwrap();
        assert_eq!(sample.len(), 1);
        assert_eq!(sample[0].id, Uuid::from_u128(1));

        let at_least = SampleFilter {
            bedrooms: Some(BedroomPredicate::AtLeast(2)),
            ..exact
        };
        let sample = catalog
            .filtered_sample(&Scope::All, &at_least, 10)
            .await
            .unwrap();
        assert_eq!(sample.len(), 2);
    }

    #[tokio::test]
    async fn scope_restricts_every_read() {
        let catalog = InMemoryCatalog::from_listings(vec![
            listing(1, 1, 1, 2, 100.0),
            listing(2, 2, 1, 2, 100.0),
        ]);
        let scope = Scope::Tenant(Uuid::from_u128(1));
        assert_eq!(catalog.bulk_vectors(&scope).await.unwrap().len(), 1);
        let sample = catalog
            .filtered_sample(&scope, &SampleFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(sample.len(), 1);
        let fetched = catalog
            .by_ids(&scope, &[Uuid::from_u128(1), Uuid::from_u128(2)])
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, Uuid::from_u128(1));
    }

    #[tokio::test]
    async fn bulk_vectors_skip_listings_without_embeddings() {
        let mut bare = listing(2, 1, 1, 2, 100.0);
        bare.embedding.clear();
        let catalog = InMemoryCatalog::from_listings(vec![listing(1, 1, 1, 2, 100.0), bare]);
        let vectors = catalog.bulk_vectors(&Scope::All).await.unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].0, Uuid::from_u128(1));
    }

    #[tokio::test]
    async fn bulk_vectors_cover_every_embedded_listing_in_scope() {
        let mut other_tenant = listing(3, 2, 1, 2, 100.0);
        other_tenant.embedding = vec![0.0, 1.0];
        let mut second = listing(2, 1, 5, 2, 100.0);
        second.embedding = vec![0.6, 0.8];
        let catalog =
            InMemoryCatalog::from_listings(vec![listing(1, 1, 1, 2, 100.0), second, other_tenant]);

        let mut vectors = catalog
            .bulk_vectors(&Scope::Tenant(Uuid::from_u128(1)))
            .await
            .unwrap();
        vectors.sort_by_key(|(id, _)| *id);
        assert_eq!(
            vectors,
            vec![
                (Uuid::from_u128(1), vec![1.0, 0.0]),
                (Uuid::from_u128(2), vec![0.6, 0.8]),
            ]
        );
    }

    #[test]
    fn len_reads_through_a_poisoned_lock() {
        let catalog = std::sync::Arc::new(InMemoryCatalog::from_listings(vec![
            listing(1, 1, 1, 2, 100.0),
            listing(2, 1, 2, 2, 100.0),
        ]));
        let writer = catalog.clone();
        let _ = std::thread::spawn(move || {
            let _guard = writer.listings.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(catalog.listings.is_poisoned());
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.is_empty());
        assert!(matches!(
            catalog.get(&Uuid::from_u128(1)),
            Err(CatalogError::LockPoisoned)
        ));
    }

    #[tokio::test]
    async fn by_ids_preserves_caller_order_and_skips_unknown() {
        let catalog = InMemoryCatalog::from_listings(vec![
            listing(1, 1, 1, 2, 100.0),
            listing(2, 1, 2, 2, 100.0),
            listing(3, 1, 3, 2, 100.0),
        ]);
        let ids = [
            Uuid::from_u128(3),
            Uuid::from_u128(99),
            Uuid::from_u128(1),
            Uuid::from_u128(2),
        ];
        let fetched = catalog.by_ids(&Scope::All, &ids).await.unwrap();
        let got: Vec<_> = fetched.iter().map(|l| l.id).collect();
        assert_eq!(
            got,
            vec![Uuid::from_u128(3), Uuid::from_u128(1), Uuid::from_u128(2)]
        );
    }

    #[test]
    fn insert_rejects_duplicates() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(listing(1, 1, 1, 2, 100.0)).unwrap();
        let err = catalog.insert(listing(1, 1, 1, 2, 100.0)).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(id) if id == Uuid::from_u128(1)));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(&Uuid::from_u128(1)).unwrap().is_some());
    }

    #[test]
    fn seeds_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let listings = vec![listing(1, 1, 1, 2, 100.0), listing(2, 1, 2, 3, 200.0)];
        write!(file, "{}", serde_json::to_string(&listings).unwrap()).unwrap();

        let catalog = InMemoryCatalog::from_json_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn missing_seed_file_reports_path() {
        let err = InMemoryCatalog::from_json_file("/definitely/not/here.json")
            .err()
            .expect("missing file must fail");
        assert!(matches!(err, CatalogError::Seed { .. }));
    }
}
