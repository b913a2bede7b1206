//! Content addressing for problem models.
//!
//! One canonical JSON form and one hash function. Registries and generators
//! built from models with equal digests behave identically, which lets
//! callers check that two components were built from the same model.

pub mod canon;
pub mod hash;

use canon::CanonError;

/// Error type for model canonicalization.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error(transparent)]
    Canon(#[from] CanonError),
    /// Conversion of a model component to a JSON value failed.
    #[error("model serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
