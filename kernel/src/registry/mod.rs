//! Registry module: canonical state identifiers over packed, deduplicated
//! storage.
//!
//! # Module Dependency Direction
//!
//! `state_id` ← `pool` ← `state_registry` ← `per_state`
//!                     ↖ `factored`
//!
//! A [`pool::StatePool`] is one packer + arena + dedup index. The plain
//! [`state_registry::StateRegistry`] owns one pool; the
//! [`factored::FactoredRegistry`] owns one for the center and one per leaf.

pub mod factored;
pub mod per_state;
pub mod pool;
pub mod state;
pub mod state_id;
pub mod state_registry;

use std::fmt;

use crate::model::factoring::LeafFactorId;
use crate::model::operator::OperatorId;
use crate::packing::arena::{ArenaError, DEFAULT_BLOCK_BYTES};
use crate::packing::packer::PackerError;
use crate::registry::state_id::StateId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Storage that ran out while registering a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Arena block allocation.
    Arena,
    /// Dedup index growth.
    DedupIndex,
    /// The 32-bit state identifier space.
    IdSpace,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Arena => "state arena",
            Self::DedupIndex => "dedup index",
            Self::IdSpace => "state id space",
        })
    }
}

/// Error type for registry construction and growth.
///
/// Construction errors are configuration problems. `ResourceExhausted` is
/// fatal for the search attempt: the registry is left consistent but the
/// caller is expected to abort.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The model's domains cannot be packed.
    #[error("invalid packing layout: {0}")]
    Layout(#[from] PackerError),
    /// A [`RegistryConfig`] field is out of range.
    #[error("invalid registry config: {detail}")]
    InvalidConfig { detail: &'static str },
    /// Allocation failed while growing `resource`.
    #[error("{resource} exhausted (requested {requested})")]
    ResourceExhausted { resource: Resource, requested: usize },
    /// A factored registry was requested for a model without a factoring.
    #[error("model has no center/leaf factoring")]
    MissingFactoring,
    /// A leaf tag outside the model's factoring.
    #[error("unknown leaf factor {leaf:?}")]
    UnknownLeafFactor { leaf: LeafFactorId },
    /// An effect guard reads a variable of another factor than the one the
    /// effect writes.
    #[error("operator {operator} has an effect guard spanning factors")]
    CrossFactorGuard { operator: OperatorId },
    /// Derived variables are not supported by the factored registry.
    #[error("factored registry does not evaluate axioms")]
    AxiomsUnsupported,
    /// A decoupled state asked for a duplicate counter above the configured
    /// bound.
    #[error("duplicate counter {counter} on center {center} exceeds {max}")]
    DuplicateCounterExceeded { center: StateId, counter: u32, max: u32 },
}

impl RegistryError {
    /// Whether this is an out-of-memory condition rather than a setup error.
    #[must_use]
    pub const fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Self::ResourceExhausted { .. })
    }
}

impl From<ArenaError> for RegistryError {
    fn from(err: ArenaError) -> Self {
        match err {
            ArenaError::OutOfMemory { requested_bytes } => Self::ResourceExhausted {
                resource: Resource::Arena,
                requested: requested_bytes,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Default bound on decoupled-state duplicate counters (16 bits per state).
pub const DEFAULT_MAX_DUPLICATE_COUNTER: u32 = u16::MAX as u32;

/// Storage tuning shared by every pool of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Target size of one arena block in bytes.
    pub arena_block_bytes: usize,
    /// Dedup index slots reserved up front.
    pub initial_index_capacity: usize,
    /// Largest duplicate counter a decoupled state may carry.
    pub max_duplicate_counter: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            arena_block_bytes: DEFAULT_BLOCK_BYTES,
            initial_index_capacity: 0,
            max_duplicate_counter: DEFAULT_MAX_DUPLICATE_COUNTER,
        }
    }
}

impl RegistryConfig {
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidConfig`] if `arena_block_bytes` is 0
    /// or the duplicate counter domain does not fit a packed word.
    pub const fn validate(&self) -> Result<(), RegistryError> {
        if self.arena_block_bytes == 0 {
            return Err(RegistryError::InvalidConfig {
                detail: "arena_block_bytes must be non-zero",
            });
        }
        if self.max_duplicate_counter == u32::MAX {
            return Err(RegistryError::InvalidConfig {
                detail: "max_duplicate_counter must be below u32::MAX",
            });
        }
        Ok(())
    }
}
