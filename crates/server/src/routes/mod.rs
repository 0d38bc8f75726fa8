//! API route handlers
//!
//! - `health`: liveness, readiness and Prometheus metrics
//! - `listings`: structured search and listing creation
//! - `webhook`: free-text chat search replying with formatted text

pub mod health;
pub mod listings;
pub mod webhook;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tokio_util::sync::{CancellationToken, DropGuard};

/// API version and base info
///
/// ```json
/// {
///   "name": "Habita Server",
///   "version": "0.1.0",
///   "api_version": "v1",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Habita Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/listings",
            "/api/v1/listings/search",
            "/api/v1/webhooks/whatsapp/search",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// Token for one request. Dropping the guard (handler finished, client went
/// away, or the timeout layer gave up) cancels whatever is still in flight.
pub(crate) fn request_cancellation() -> (CancellationToken, DropGuard) {
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

/// Round to six decimal places for API output.
pub(crate) fn round6(value: f32) -> f64 {
    (f64::from(value) * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round6_truncates_noise() {
        assert_eq!(round6(0.123_456_78), 0.123457);
        assert_eq!(round6(1.0), 1.0);
        assert_eq!(round6(0.0), 0.0);
    }

    #[test]
    fn dropping_guard_cancels_token() {
        let (token, guard) = request_cancellation();
        assert!(!token.is_cancelled());
        drop(guard);
        assert!(token.is_cancelled());
    }
}
