//! Operators: preconditions, ordered (possibly guarded) effects, and cost.
//!
//! Guards are plain fact lists rather than callables, so an operator is
//! inert data: cloneable, comparable, and serializable.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::fact::{Fact, StateValues};

/// Index of an operator in [`ProblemModel::operators`](crate::model::problem::ProblemModel::operators).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperatorId(u32);

impl OperatorId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position in the model's operator list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// A single effect: set `fact.var` to `fact.value` if every guard fact holds
/// in the predecessor state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Effect {
    pub fact: Fact,
    /// Empty for unconditional effects.
    pub guard: Vec<Fact>,
}

impl Effect {
    #[must_use]
    pub const fn unconditional(fact: Fact) -> Self {
        Self {
            fact,
            guard: Vec::new(),
        }
    }

    #[must_use]
    pub fn conditional(fact: Fact, guard: Vec<Fact>) -> Self {
        Self { fact, guard }
    }

    #[must_use]
    pub fn is_conditional(&self) -> bool {
        !self.guard.is_empty()
    }

    /// Whether this effect fires when applied to `pre`.
    ///
    /// `pre` must be the predecessor snapshot, never a partially updated
    /// successor.
    #[must_use]
    pub fn fires_in<S: StateValues + ?Sized>(&self, pre: &S) -> bool {
        pre.satisfies_all(&self.guard)
    }
}

/// A grounded planning operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operator {
    /// Human-readable name (diagnostics only).
    pub name: String,
    /// Facts that must hold for the operator to be applicable.
    pub preconditions: Vec<Fact>,
    /// Effects in declaration order.
    pub effects: Vec<Effect>,
    /// Non-negative cost.
    pub cost: i64,
}

impl Operator {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        preconditions: Vec<Fact>,
        effects: Vec<Effect>,
        cost: i64,
    ) -> Self {
        Self {
            name: name.into(),
            preconditions,
            effects,
            cost,
        }
    }

    /// Whether every precondition holds in `state`.
    #[must_use]
    pub fn is_applicable<S: StateValues + ?Sized>(&self, state: &S) -> bool {
        state.satisfies_all(&self.preconditions)
    }

    /// Whether any effect carries a guard.
    #[must_use]
    pub fn has_conditional_effects(&self) -> bool {
        self.effects.iter().any(Effect::is_conditional)
    }

    /// Apply all effects to an unpacked copy of `pre`.
    ///
    /// Every guard is evaluated against `pre`, so one effect never observes
    /// another effect of the same operator. Later effects on the same variable
    /// overwrite earlier ones.
    #[must_use]
    pub fn apply_to_values(&self, pre: &[u32]) -> Vec<u32> {
        let mut next = pre.to_vec();
        for effect in &self.effects {
            if effect.fires_in(pre) {
                next[effect.fact.var] = effect.fact.value;
            }
        }
        next
    }
}
