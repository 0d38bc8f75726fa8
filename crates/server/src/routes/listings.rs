use crate::error::{ServerError, ServerResult};
use crate::routes::{request_cancellation, round6};
use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use catalog::{ListingDraft, ListingId, Scope, TenantId};
use ranking::{ScoredResult, SearchRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Structured search request
#[derive(Debug, Deserialize)]
pub struct SearchBody {
    /// Free-text description of what the user wants
    pub query: String,

    #[serde(default)]
    pub max_price: Option<f64>,

    #[serde(default)]
    pub min_bedrooms: Option<u32>,

    #[serde(default)]
    pub neighborhood: Option<String>,

    /// Maximum results; non-positive values fall back to the engine default
    #[serde(default = "default_search_limit")]
    pub limit: i64,

    /// Restrict the search to one tenant's listings
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
}

fn default_search_limit() -> i64 {
    20
}

impl From<SearchBody> for SearchRequest {
    fn from(body: SearchBody) -> Self {
        SearchRequest {
            query: body.query,
            max_price: body.max_price,
            min_bedrooms: body.min_bedrooms,
            neighborhood: body.neighborhood,
            limit: body.limit,
            scope: Scope::from(body.tenant_id),
        }
    }
}

/// One ranked listing as returned by the API
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ListingSummary {
    pub id: ListingId,
    pub title: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub price: f64,
    pub area: f64,
    pub similarity: f64,
    pub score: f64,
}

impl From<&ScoredResult> for ListingSummary {
    fn from(hit: &ScoredResult) -> Self {
        let l = &hit.listing;
        Self {
            id: l.id,
            title: l.title.clone(),
            neighborhood: l.neighborhood.clone(),
            city: l.city.clone(),
            region: l.region.clone(),
            bedrooms: l.bedrooms,
            bathrooms: l.bathrooms,
            price: l.price,
            area: l.area,
            similarity: round6(hit.similarity),
            score: round6(hit.score),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedListing {
    pub id: ListingId,
}

/// Rank listings for a query plus optional structured filters.
///
/// Responds with the ranked listings, best first. Similarity and score are
/// rounded to six decimal places.
pub async fn search_listings(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<SearchBody>,
) -> ServerResult<impl IntoResponse> {
    if body.query.trim().is_empty() {
        return Err(ServerError::BadRequest("field 'query' is required".into()));
    }

    let (cancel, _guard) = request_cancellation();
    let request = SearchRequest::from(body);
    let ranked = state.stack.search(&request, &cancel).await?;

    let summaries: Vec<ListingSummary> = ranked.iter().map(ListingSummary::from).collect();
    Ok(Json(summaries))
}

/// Create a listing. Its text is embedded before it is stored.
pub async fn create_listing(
    State(state): State<Arc<ServerState>>,
    Json(draft): Json<ListingDraft>,
) -> ServerResult<impl IntoResponse> {
    validate_draft(&draft)?;

    let (cancel, _guard) = request_cancellation();
    let id = state.stack.add_listing(draft, &cancel).await?;
    tracing::info!(listing_id = %id, "listing created");

    Ok((StatusCode::CREATED, Json(CreatedListing { id })))
}

fn validate_draft(draft: &ListingDraft) -> ServerResult<()> {
    if draft.title.trim().is_empty() {
        return Err(ServerError::BadRequest("field 'title' is required".into()));
    }
    if draft.neighborhood.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "field 'neighborhood' is required".into(),
        ));
    }
    if !draft.price.is_finite() || draft.price < 0.0 {
        return Err(ServerError::BadRequest(
            "field 'price' must be a non-negative number".into(),
        ));
    }
    if !draft.area.is_finite() || draft.area < 0.0 {
        return Err(ServerError::BadRequest(
            "field 'area' must be a non-negative number".into(),
        ));
    }
    Ok(())
}
