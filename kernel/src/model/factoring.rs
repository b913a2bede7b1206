//! Center/leaf factoring for decoupled search.
//!
//! Variables are partitioned into one center factor and zero or more leaf
//! factors. Each factor gets its own packer, arena, and identifier space in
//! [`FactoredRegistry`](crate::registry::factored::FactoredRegistry); states
//! inside a factor are addressed with factor-local variable indices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::fact::Fact;
use crate::model::problem::ModelError;

/// Tag of a leaf factor. Scopes a leaf identifier space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeafFactorId(u32);

impl LeafFactorId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LeafFactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leaf#{}", self.0)
    }
}

/// Which factor a variable belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactorId {
    Center,
    Leaf(LeafFactorId),
}

/// A validated partition of all variables into center and leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factoring {
    center: Vec<usize>,
    leaves: Vec<Vec<usize>>,
    /// Per variable: owning factor and local index.
    owner: Vec<(FactorSlot, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FactorSlot {
    Center,
    Leaf(u32),
}

impl Factoring {
    /// Build a factoring over `num_vars` variables.
    ///
    /// Variable order inside each factor is preserved and defines the
    /// factor-local indices.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidFactoring`] unless `center` and `leaves`
    /// together mention every variable in `0..num_vars` exactly once, and
    /// every leaf is non-empty.
    pub fn new(num_vars: usize, center: Vec<usize>, leaves: Vec<Vec<usize>>) -> Result<Self, ModelError> {
        let mut owner: Vec<Option<(FactorSlot, usize)>> = vec![None; num_vars];

        let mut claim = |var: usize, slot: FactorSlot, local: usize| -> Result<(), ModelError> {
            let Some(entry) = owner.get_mut(var) else {
                return Err(ModelError::InvalidFactoring {
                    detail: format!("variable {var} out of range (num_vars = {num_vars})"),
                });
            };
            if entry.is_some() {
                return Err(ModelError::InvalidFactoring {
                    detail: format!("variable {var} assigned to more than one factor"),
                });
            }
            *entry = Some((slot, local));
            Ok(())
        };

        for (local, &var) in center.iter().enumerate() {
            claim(var, FactorSlot::Center, local)?;
        }
        for (leaf_index, leaf) in leaves.iter().enumerate() {
            if leaf.is_empty() {
                return Err(ModelError::InvalidFactoring {
                    detail: format!("leaf {leaf_index} is empty"),
                });
            }
            let tag = u32::try_from(leaf_index).map_err(|_| ModelError::InvalidFactoring {
                detail: "too many leaf factors".into(),
            })?;
            for (local, &var) in leaf.iter().enumerate() {
                claim(var, FactorSlot::Leaf(tag), local)?;
            }
        }

        let owner = owner
            .into_iter()
            .enumerate()
            .map(|(var, entry)| {
                entry.ok_or_else(|| ModelError::InvalidFactoring {
                    detail: format!("variable {var} belongs to no factor"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            center,
            leaves,
            owner,
        })
    }

    /// Center variables in local order.
    #[must_use]
    pub fn center(&self) -> &[usize] {
        &self.center
    }

    /// Leaf factors in tag order.
    #[must_use]
    pub fn leaves(&self) -> &[Vec<usize>] {
        &self.leaves
    }

    /// Variables of `leaf` in local order. Panics if `leaf` is unknown.
    #[must_use]
    pub fn leaf(&self, leaf: LeafFactorId) -> &[usize] {
        &self.leaves[leaf.index()]
    }

    #[must_use]
    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// All leaf tags in index order.
    pub fn leaf_ids(&self) -> impl Iterator<Item = LeafFactorId> + '_ {
        (0..self.leaves.len()).map(|i| LeafFactorId::new(i as u32))
    }

    /// Factor owning `var`.
    #[must_use]
    pub fn factor_of(&self, var: usize) -> FactorId {
        match self.owner[var].0 {
            FactorSlot::Center => FactorId::Center,
            FactorSlot::Leaf(tag) => FactorId::Leaf(LeafFactorId::new(tag)),
        }
    }

    /// Index of `var` inside its own factor.
    #[must_use]
    pub fn local_index(&self, var: usize) -> usize {
        self.owner[var].1
    }

    /// Rewrite `fact` into factor-local numbering if it belongs to `factor`.
    #[must_use]
    pub fn localize(&self, fact: Fact, factor: FactorId) -> Option<Fact> {
        (self.factor_of(fact.var) == factor).then(|| Fact::new(self.local_index(fact.var), fact.value))
    }
}
