//! Planstate Search: applicable-operator enumeration for state-space search.
//!
//! Depends only on `planstate_kernel`. Search loops, heuristics, and pruning
//! live with the callers; this crate answers "which operators apply here".
//!
//! # Crate dependency graph
//!
//! ```text
//! planstate_kernel  ←  planstate_search
//! (model, registry)    (successor generator)
//! ```
//!
//! # Key types
//!
//! - [`successor::generator::SuccessorGenerator`] -- Fork/Switch/Leaf applicability index
//! - [`successor::leaf::LeafOperatorScope`] -- operator selection for leaf-local generators
//! - [`successor::GeneratorConfig`] -- build-time variable selection policy

#![forbid(unsafe_code)]

pub mod error;
pub mod successor;
