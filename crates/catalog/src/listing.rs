use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque listing identifier.
pub type ListingId = Uuid;
/// Tenant (agency) that owns a listing.
pub type TenantId = Uuid;

/// A housing listing as stored by the catalog.
///
/// Listings are created outside the ranking engine and are never mutated by
/// it. `embedding` is expected to be L2-normalized; an empty embedding means
/// the listing has no semantic signal and scores zero similarity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: ListingId,
    pub tenant_id: TenantId,
    pub title: String,
    pub description: String,
    pub neighborhood: String,
    pub city: String,
    /// Two-letter region (state) code.
    #[serde(default = "default_region")]
    pub region: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub price: f64,
    /// Floor area in square meters.
    pub area: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

fn default_region() -> String {
    "MG".to_string()
}

impl Listing {
    /// Text fed to the embedder when the listing is created.
    pub fn embedding_text(&self) -> String {
        describe(
            &self.title,
            &self.description,
            &self.neighborhood,
            &self.city,
            &self.region,
            self.bedrooms,
            self.bathrooms,
            self.area,
            self.price,
        )
    }

    /// Whether the listing carries a usable embedding.
    pub fn has_embedding(&self) -> bool {
        !self.embedding.is_empty()
    }
}

/// Listing attributes supplied by a caller before an id, timestamp and
/// embedding have been assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingDraft {
    pub tenant_id: TenantId,
    pub title: String,
    pub description: String,
    pub neighborhood: String,
    pub city: String,
    #[serde(default = "default_region")]
    pub region: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub price: f64,
    pub area: f64,
}

impl ListingDraft {
    pub fn embedding_text(&self) -> String {
        describe(
            &self.title,
            &self.description,
            &self.neighborhood,
            &self.city,
            &self.region,
            self.bedrooms,
            self.bathrooms,
            self.area,
            self.price,
        )
    }

    /// Finish the draft with a fresh id and the current timestamp.
    pub fn into_listing(self, embedding: Vec<f32>) -> Listing {
        self.into_listing_with(Uuid::new_v4(), Utc::now(), embedding)
    }

    pub fn into_listing_with(
        self,
        id: ListingId,
        created_at: DateTime<Utc>,
        embedding: Vec<f32>,
    ) -> Listing {
        Listing {
            id,
            tenant_id: self.tenant_id,
            title: self.title,
            description: self.description,
            neighborhood: self.neighborhood,
            city: self.city,
            region: self.region,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            price: self.price,
            area: self.area,
            created_at,
            embedding,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn describe(
    title: &str,
    description: &str,
    neighborhood: &str,
    city: &str,
    region: &str,
    bedrooms: u32,
    bathrooms: u32,
    area: f64,
    price: f64,
) -> String {
    format!(
        "{title}. {description}. Neighborhood {neighborhood}, {city}-{region}. \
         {bedrooms} bedrooms, {bathrooms} bathrooms, {area} m2. Price {price}."
    )
}

/// Which tenant's listings a request may see.
///
/// Access control itself lives upstream; the scope only narrows what a
/// candidate source returns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", content = "tenant_id", rename_all = "snake_case")]
pub enum Scope {
    #[default]
    All,
    Tenant(TenantId),
}

impl Scope {
    pub fn admits(&self, tenant_id: &TenantId) -> bool {
        match self {
            Scope::All => true,
            Scope::Tenant(t) => t == tenant_id,
        }
    }
}

impl From<Option<TenantId>> for Scope {
    fn from(value: Option<TenantId>) -> Self {
        value.map(Scope::Tenant).unwrap_or_default()
    }
}
