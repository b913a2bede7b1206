//! Facts, variables, and read access to value assignments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(variable, value)` pair.
///
/// Derives `Ord` so fact lists can be sorted into a canonical order
/// (variable first, then value).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fact {
    /// Variable index into the model's variable list.
    pub var: usize,
    /// Value in `0..domain_size` of `var`.
    pub value: u32,
}

impl Fact {
    #[must_use]
    pub const fn new(var: usize, value: u32) -> Self {
        Self { var, value }
    }
}

impl fmt::Debug for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}={}", self.var, self.value)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}={}", self.var, self.value)
    }
}

/// A finite-domain state variable.
///
/// Immutable after the model is built. `name` is informational only and never
/// used for routing or identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Display name (diagnostics only).
    pub name: String,
    /// Number of values; valid values are `0..domain_size`.
    pub domain_size: usize,
    /// Axiom layer for derived variables. `None` for ordinary state variables.
    pub axiom_layer: Option<u32>,
}

impl Variable {
    /// An ordinary (non-derived) variable.
    #[must_use]
    pub fn new(name: impl Into<String>, domain_size: usize) -> Self {
        Self {
            name: name.into(),
            domain_size,
            axiom_layer: None,
        }
    }

    /// A derived variable computed by the axiom evaluator at `layer`.
    #[must_use]
    pub fn derived(name: impl Into<String>, domain_size: usize, layer: u32) -> Self {
        Self {
            name: name.into(),
            domain_size,
            axiom_layer: Some(layer),
        }
    }

    /// Whether this variable is derived by axioms.
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        self.axiom_layer.is_some()
    }
}

/// Read access to a full value assignment.
///
/// Implemented by plain value slices and by registered state views, so
/// consumers (goal tests, the successor generator) never need to know
/// whether a state is packed or unpacked.
pub trait StateValues {
    /// Value of `var`. Panics if `var` is out of range.
    fn value_of(&self, var: usize) -> u32;

    /// Whether the assignment contains `fact`.
    fn satisfies(&self, fact: Fact) -> bool {
        self.value_of(fact.var) == fact.value
    }

    /// Whether the assignment contains every fact in `facts`.
    fn satisfies_all(&self, facts: &[Fact]) -> bool {
        facts.iter().all(|&f| self.satisfies(f))
    }
}

impl StateValues for [u32] {
    fn value_of(&self, var: usize) -> u32 {
        self[var]
    }
}

impl StateValues for Vec<u32> {
    fn value_of(&self, var: usize) -> u32 {
        self[var]
    }
}

impl<T: StateValues + ?Sized> StateValues for &T {
    fn value_of(&self, var: usize) -> u32 {
        (**self).value_of(var)
    }
}
