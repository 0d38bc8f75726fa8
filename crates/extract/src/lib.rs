//! # Habita Extract
//!
//! Turns a free-text housing request ("2 bedrooms in Centro up to 300k,
//! show me 10") into [`ExtractedFilters`] the ranking engine understands.
//!
//! The [`FilterExtractor`] trait is the seam. Two implementations ship:
//!
//! - [`OpenAiFilterExtractor`] offers the model a single `extract_filters`
//!   function and reads back its arguments. Arguments of the wrong type or
//!   out of range are dropped instead of failing the request.
//! - [`NoopExtractor`] extracts nothing, which turns every request into a
//!   pure semantic search.
//!
//! Whatever the source, extracted neighborhoods are title-cased, limits are
//! clamped to `[1, 100]` and non-positive prices are discarded.

pub mod config;

mod error;
mod extractor;
mod filters;
mod openai;

pub use crate::config::{build_extractor, ExtractorConfig, ExtractorMode};
pub use crate::error::ExtractError;
pub use crate::extractor::{FilterExtractor, NoopExtractor};
pub use crate::filters::{normalize_neighborhood, ExtractedFilters, MAX_LIMIT, MIN_LIMIT};
pub use crate::openai::OpenAiFilterExtractor;
