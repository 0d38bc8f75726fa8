//! # Habita Catalog
//!
//! Listing model and the read side of listing storage used by the ranking
//! engine.
//!
//! The engine never talks to a database directly. It goes through the
//! [`CandidateSource`] trait, which exposes the three reads a search needs:
//!
//! - [`CandidateSource::bulk_vectors`] for pure semantic search over every
//!   listing in scope.
//! - [`CandidateSource::filtered_sample`] for structured search, returning a
//!   bounded, recency-ordered sample that satisfies the extracted filters.
//! - [`CandidateSource::by_ids`] to hydrate the winners of a semantic pass.
//!
//! [`InMemoryCatalog`] is the bundled implementation. It is good enough for
//! tests, demos and small single-node deployments seeded from a JSON file.
//!
//! ```
//! use catalog::{InMemoryCatalog, ListingDraft};
//! use uuid::Uuid;
//!
//! let catalog = InMemoryCatalog::new();
//! let draft = ListingDraft {
//!     tenant_id: Uuid::nil(),
//!     title: "Loft".into(),
//!     description: "Near the square".into(),
//!     neighborhood: "Centro".into(),
//!     city: "Ouro Preto".into(),
//!     region: "MG".into(),
//!     bedrooms: 1,
//!     bathrooms: 1,
//!     price: 250000.0,
//!     area: 40.0,
//! };
//! catalog.insert(draft.into_listing(vec![1.0, 0.0])).unwrap();
//! assert_eq!(catalog.len(), 1);
//! ```

mod error;
mod listing;
mod memory;
mod source;

pub use error::CatalogError;
pub use listing::{Listing, ListingDraft, ListingId, Scope, TenantId};
pub use memory::InMemoryCatalog;
pub use source::{neighborhood_eq, BedroomPredicate, CandidateSource, SampleFilter};
