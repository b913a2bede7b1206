//! Typed successor-generator errors.
//!
//! Only construction can fail. Evaluation on a state of the wrong shape is a
//! contract violation and panics on the out-of-range variable access.

use planstate_kernel::model::factoring::LeafFactorId;

/// Failure while building a leaf-local generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    /// A leaf generator was requested for a model without a factoring.
    #[error("model has no center/leaf factoring")]
    MissingFactoring,
    /// The leaf tag is not part of the model's factoring.
    #[error("unknown leaf factor {leaf:?}")]
    UnknownLeafFactor { leaf: LeafFactorId },
}
