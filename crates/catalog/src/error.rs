use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ListingId;

/// Errors surfaced by a [`CandidateSource`](crate::CandidateSource) or the
/// in-memory catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backing store could not be reached or answered with a failure.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// A lock guarding catalog state was poisoned by a panicking writer.
    #[error("catalog lock poisoned")]
    LockPoisoned,
    /// Attempted to insert a listing whose id already exists.
    #[error("listing {0} already exists")]
    Duplicate(ListingId),
    /// Reading a seed file failed.
    #[error("failed to read seed file {path}: {source}")]
    Seed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Seed or stored payload was not valid listing JSON.
    #[error("failed to decode listings: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        CatalogError::Unavailable(msg.into())
    }
}
