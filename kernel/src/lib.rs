//! Planstate Kernel: state storage for classical-planning search.
//!
//! # API Surface
//!
//! - [`model::problem::ProblemModel`] -- the immutable variable/operator model
//! - [`packing::packer::IntPacker`] -- bit layout of packed states
//! - [`registry::state_registry::StateRegistry`] -- canonical, deduplicated state ids
//! - [`registry::factored::FactoredRegistry`] -- per-factor registries for center/leaf search
//! - [`registry::per_state::PerStateStore`] -- side tables keyed by state id
//! - [`mutex::MutexTable`] -- static pairwise fact exclusion
//!
//! # Module Dependency Direction
//!
//! `digest`, `packing` ← `model` + `mutex` ← `registry`
//!
//! One-way only. `packing` and `digest` depend on nothing internal. `model`
//! and `mutex` form one layer (the model owns its mutex table). `registry`
//! depends on `model` and `packing`.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod digest;
pub mod model;
pub mod mutex;
pub mod packing;
pub mod registry;
