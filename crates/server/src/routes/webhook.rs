use crate::error::{ServerError, ServerResult};
use crate::routes::request_cancellation;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use catalog::{Scope, TenantId};
use extract::{ExtractError, ExtractedFilters};
use ranking::{ScoredResult, SearchRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const NO_MATCHES_REPLY: &str =
    "I couldn't find listings matching that profile. Want to adjust the price, neighborhood or bedrooms?";

const REPLY_HEADER: &str = "✨ *Most relevant listings:*";

/// Incoming chat message
#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub message: String,

    #[serde(default)]
    pub tenant_id: Option<TenantId>,
}

/// Text reply sent back to the chat
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookReply {
    pub text: String,
}

/// Search listings from a free-text chat message.
///
/// Filters are extracted from the message and combined with the message
/// itself as the semantic query. When the extractor fails the search runs
/// without filters.
pub async fn whatsapp_search(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<WebhookMessage>,
) -> ServerResult<impl IntoResponse> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ServerError::BadRequest("message must not be blank".into()));
    }

    let (cancel, _guard) = request_cancellation();

    let filters = match state.stack.extractor.extract(message, &cancel).await {
        Ok(filters) => filters,
        Err(ExtractError::Cancelled) => return Err(ExtractError::Cancelled.into()),
        Err(err) => {
            tracing::warn!(error = %err, "filter extraction failed; searching without filters");
            ExtractedFilters::default()
        }
    };
    tracing::debug!(?filters, "filters extracted");

    let request = build_request(
        message,
        &filters,
        state.config.webhook_default_limit,
        Scope::from(payload.tenant_id),
    );
    let ranked = state.stack.search(&request, &cancel).await?;

    let text = if ranked.is_empty() {
        NO_MATCHES_REPLY.to_string()
    } else {
        format_reply(ranked.iter())
    };
    Ok(Json(WebhookReply { text }))
}

fn build_request(
    message: &str,
    filters: &ExtractedFilters,
    default_limit: u32,
    scope: Scope,
) -> SearchRequest {
    SearchRequest {
        query: message.to_string(),
        max_price: filters.max_price,
        min_bedrooms: filters.min_bedrooms,
        neighborhood: filters.neighborhood.clone(),
        limit: i64::from(filters.limit.unwrap_or(default_limit)),
        scope,
    }
}

pub(crate) fn format_reply<'a>(hits: impl Iterator<Item = &'a ScoredResult>) -> String {
    let mut blocks = vec![REPLY_HEADER.to_string()];
    for hit in hits {
        let l = &hit.listing;
        blocks.push(format!(
            "• *{}* - {}, {}-{}\n  Bedrooms: {} | Bathrooms: {} | Area: {} m²\n  Price: R$ {}\n  Relevance: {:.1}%",
            l.title,
            l.neighborhood,
            l.city,
            l.region,
            l.bedrooms,
            l.bathrooms,
            group_thousands(l.area),
            group_thousands(l.price),
            hit.score * 100.0,
        ));
    }
    blocks.join("\n\n")
}

/// `1234567.8` -> `1,234,568`
fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if negative {
        out.insert(0, '-');
    }
    out
}
