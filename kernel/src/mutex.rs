//! Static pairwise fact exclusion.
//!
//! Built once from the model's mutex groups and read-only afterwards.
//! Dead-end detection lives with external collaborators; this table only
//! answers `are_mutex` queries in O(1).
//!
//! # Layout
//!
//! Facts are numbered densely: `fact_id(v, x) = first_fact[v] + x`. The table
//! is a symmetric `num_facts x num_facts` bit matrix stored row-major in
//! 64-bit words.

use serde::{Deserialize, Serialize};

use crate::model::fact::{Fact, StateValues};
use crate::model::problem::ModelError;

/// A set of facts declared pairwise mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutexGroup {
    pub facts: Vec<Fact>,
    /// At most one fact holds (`false`) or exactly one holds (`true`).
    pub exactly_one: bool,
}

impl MutexGroup {
    #[must_use]
    pub fn new(facts: Vec<Fact>) -> Self {
        Self {
            facts,
            exactly_one: false,
        }
    }

    #[must_use]
    pub fn exactly_one(facts: Vec<Fact>) -> Self {
        Self {
            facts,
            exactly_one: true,
        }
    }

    /// Whether `fact` is a member of this group.
    #[must_use]
    pub fn contains(&self, fact: Fact) -> bool {
        self.facts.contains(&fact)
    }
}

/// Precomputed symmetric mutex lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutexTable {
    first_fact: Vec<usize>,
    num_facts: usize,
    bits: Vec<u64>,
    groups: Vec<MutexGroup>,
}

impl MutexTable {
    /// A table with no mutexes.
    #[must_use]
    pub fn empty(domain_sizes: &[usize]) -> Self {
        let (first_fact, num_facts) = fact_offsets(domain_sizes);
        Self {
            first_fact,
            num_facts,
            bits: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Build the table from all mutex groups.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownVariable`] or
    /// [`ModelError::ValueOutOfDomain`] if a group mentions a fact outside the
    /// model, and [`ModelError::MutexTableTooLarge`] if the bit matrix cannot
    /// be allocated.
    pub fn new(domain_sizes: &[usize], groups: Vec<MutexGroup>) -> Result<Self, ModelError> {
        let (first_fact, num_facts) = fact_offsets(domain_sizes);
        for group in &groups {
            for &fact in &group.facts {
                check_fact(domain_sizes, fact, "mutex group")?;
            }
        }

        let bits = if groups.iter().any(|g| g.facts.len() > 1) {
            allocate_bits(num_facts)?
        } else {
            Vec::new()
        };
        let mut table = Self {
            first_fact,
            num_facts,
            bits,
            groups: Vec::new(),
        };
        for group in &groups {
            for (i, &a) in group.facts.iter().enumerate() {
                for &b in &group.facts[i + 1..] {
                    table.set_mutex(a, b);
                }
            }
        }
        table.groups = groups;

        tracing::debug!(
            num_facts = table.num_facts,
            num_groups = table.groups.len(),
            "built mutex table"
        );
        Ok(table)
    }

    /// Dense id of a fact. Panics if the variable is out of range.
    #[must_use]
    pub fn fact_id(&self, fact: Fact) -> usize {
        self.first_fact[fact.var] + fact.value as usize
    }

    /// Total number of facts across all variables.
    #[must_use]
    pub const fn num_facts(&self) -> usize {
        self.num_facts
    }

    /// The groups the table was built from.
    #[must_use]
    pub fn groups(&self) -> &[MutexGroup] {
        &self.groups
    }

    /// Whether `a` and `b` may never hold together. Always `false` for `a == b`.
    #[must_use]
    pub fn are_mutex(&self, a: Fact, b: Fact) -> bool {
        if a == b || self.bits.is_empty() {
            return false;
        }
        let bit = self.fact_id(a) * self.num_facts + self.fact_id(b);
        self.bits[bit / 64] & (1 << (bit % 64)) != 0
    }

    /// Whether a full assignment contains two mutex facts.
    ///
    /// Such a state can never be reached from a consistent initial state, so
    /// external dead-end detection can discard it immediately.
    #[must_use]
    pub fn violates_mutex<S: StateValues + ?Sized>(&self, state: &S) -> bool {
        if self.bits.is_empty() {
            return false;
        }
        let num_vars = self.first_fact.len();
        for a_var in 0..num_vars {
            let a = Fact::new(a_var, state.value_of(a_var));
            for b_var in a_var + 1..num_vars {
                if self.are_mutex(a, Fact::new(b_var, state.value_of(b_var))) {
                    return true;
                }
            }
        }
        false
    }

    fn set_mutex(&mut self, a: Fact, b: Fact) {
        if a == b {
            return;
        }
        let (ia, ib) = (self.fact_id(a), self.fact_id(b));
        for bit in [ia * self.num_facts + ib, ib * self.num_facts + ia] {
            self.bits[bit / 64] |= 1 << (bit % 64);
        }
    }
}

fn fact_offsets(domain_sizes: &[usize]) -> (Vec<usize>, usize) {
    let mut first_fact = Vec::with_capacity(domain_sizes.len());
    let mut total = 0;
    for &size in domain_sizes {
        first_fact.push(total);
        total += size;
    }
    (first_fact, total)
}

pub(crate) fn check_fact(
    domain_sizes: &[usize],
    fact: Fact,
    context: &'static str,
) -> Result<(), ModelError> {
    let Some(&domain_size) = domain_sizes.get(fact.var) else {
        return Err(ModelError::UnknownVariable {
            var: fact.var,
            context,
        });
    };
    if fact.value as usize >= domain_size {
        return Err(ModelError::ValueOutOfDomain {
            fact,
            domain_size,
            context,
        });
    }
    Ok(())
}

/// Zeroed `num_facts x num_facts` bit matrix, failing instead of aborting
/// when it cannot be allocated.
fn allocate_bits(num_facts: usize) -> Result<Vec<u64>, ModelError> {
    let too_large = ModelError::MutexTableTooLarge { num_facts };
    let words = num_facts
        .checked_mul(num_facts)
        .ok_or_else(|| too_large.clone())?
        .div_ceil(64);
    let mut bits = Vec::new();
    bits.try_reserve_exact(words).map_err(|_| too_large)?;
    bits.resize(words, 0);
    Ok(bits)
}
