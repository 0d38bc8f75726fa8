//! Habita Server - HTTP REST API for listing search
//!
//! Exposes the Habita search stack over HTTP:
//!
//! - **Structured search**: free text plus optional price, bedroom and
//!   neighborhood filters, ranked by the hybrid engine
//! - **Listing creation**: listings are embedded on the way in
//! - **Chat webhook**: filters are extracted from a free-text message and the
//!   reply is a ready-to-send text block
//! - **Health & Metrics**: liveness/readiness probes and Prometheus metrics
//!
//! Every request carries a cancellation token; a request that times out or
//! whose client disconnects cancels its in-flight search.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//! - `POST /api/v1/listings` - Create a listing
//! - `POST /api/v1/listings/search` - Structured search
//! - `POST /api/v1/webhooks/whatsapp/search` - Chat search

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
