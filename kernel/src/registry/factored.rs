//! `FactoredRegistry`: independent state pools for the center and each leaf
//! of a decoupled (center/leaf) factoring.
//!
//! Every factor has its own packer, arena, dedup index, and id space. Center
//! ids are plain [`StateId`]s; leaf ids carry their factor tag as
//! [`LeafStateId`] so ids from different leaves cannot be confused. States are
//! stored with factor-local variable numbering.
//!
//! Joint global states are never stored. [`FactoredRegistry::joint_values`]
//! rebuilds one on demand from a center id and one leaf id per leaf, which
//! the external decoupled search tracks.
//!
//! A decoupled search may reach the same center state with different leaf
//! reachability and needs to keep those apart. [`FactoredRegistry::decoupled_state`]
//! issues ids for `(center, duplicate counter)` pairs from a separate pool
//! whose last local variable is the counter, and tracks how many duplicates
//! each center state has.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::model::fact::Fact;
use crate::model::factoring::{FactorId, Factoring, LeafFactorId};
use crate::model::operator::{Operator, OperatorId};
use crate::model::problem::ProblemModel;
use crate::packing::Word;
use crate::registry::pool::StatePool;
use crate::registry::state::State;
use crate::registry::state_id::StateId;
use crate::registry::{RegistryConfig, RegistryError};

/// A state id scoped to one leaf factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeafStateId {
    pub factor: LeafFactorId,
    pub id: StateId,
}

impl LeafStateId {
    #[must_use]
    pub const fn new(factor: LeafFactorId, id: StateId) -> Self {
        Self { factor, id }
    }
}

/// Registry over a center/leaf factoring.
#[derive(Debug)]
pub struct FactoredRegistry {
    model: Arc<ProblemModel>,
    factoring: Factoring,
    center: StatePool,
    leaves: Vec<StatePool>,
    initial_center: Option<StateId>,
    initial_leaves: Vec<Option<StateId>>,
    decoupled: StatePool,
    duplicate_counts: FxHashMap<StateId, u32>,
    max_duplicate_counter: u32,
    pre: Vec<Word>,
    assignments: Vec<Fact>,
    scratch: Vec<u32>,
}

impl FactoredRegistry {
    /// One pool per factor of the model's factoring.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingFactoring`] if the model has no
    /// factoring, [`RegistryError::AxiomsUnsupported`] if it has derived
    /// variables, [`RegistryError::CrossFactorGuard`] if an effect guard reads
    /// a variable outside the factor its effect writes, the validation errors
    /// of [`RegistryConfig::validate`], and the pool construction errors of
    /// [`StatePool::new`].
    pub fn new(model: Arc<ProblemModel>, config: RegistryConfig) -> Result<Self, RegistryError> {
        config.validate()?;
        let factoring = model
            .factoring()
            .ok_or(RegistryError::MissingFactoring)?
            .clone();
        if model.has_axioms() {
            return Err(RegistryError::AxiomsUnsupported);
        }
        for (op, operator) in model.operator_ids().zip(model.operators()) {
            for effect in &operator.effects {
                let target = factoring.factor_of(effect.fact.var);
                if effect.guard.iter().any(|g| factoring.factor_of(g.var) != target) {
                    return Err(RegistryError::CrossFactorGuard { operator: op });
                }
            }
        }

        let domains = |vars: &[usize]| -> Vec<usize> {
            vars.iter().map(|&v| model.domain_sizes()[v]).collect()
        };
        let center = StatePool::new(&domains(factoring.center()), &config)?;
        let leaves = factoring
            .leaves()
            .iter()
            .map(|leaf| StatePool::new(&domains(leaf), &config))
            .collect::<Result<Vec<_>, _>>()?;
        let mut decoupled_domains = domains(factoring.center());
        decoupled_domains.push(config.max_duplicate_counter as usize + 1);
        let decoupled = StatePool::new(&decoupled_domains, &config)?;

        tracing::debug!(
            center_vars = factoring.center().len(),
            num_leaves = leaves.len(),
            "created factored registry"
        );
        let num_leaves = leaves.len();
        Ok(Self {
            model,
            factoring,
            center,
            leaves,
            initial_center: None,
            initial_leaves: vec![None; num_leaves],
            decoupled,
            duplicate_counts: FxHashMap::default(),
            max_duplicate_counter: config.max_duplicate_counter,
            pre: Vec::new(),
            assignments: Vec::new(),
            scratch: Vec::new(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &Arc<ProblemModel> {
        &self.model
    }

    #[must_use]
    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    fn leaf_index(&self, leaf: LeafFactorId) -> Result<usize, RegistryError> {
        let index = leaf.index();
        if index < self.leaves.len() {
            Ok(index)
        } else {
            Err(RegistryError::UnknownLeafFactor { leaf })
        }
    }

    // -----------------------------------------------------------------------
    // Center
    // -----------------------------------------------------------------------

    /// Center part of the model's initial state. Cached after the first call.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn initial_center(&mut self) -> Result<StateId, RegistryError> {
        if let Some(id) = self.initial_center {
            return Ok(id);
        }
        let values = project(self.model.initial_values(), self.factoring.center());
        let id = self.center.insert_values(&values)?;
        self.initial_center = Some(id);
        Ok(id)
    }

    /// Register a center assignment given in center-local order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn center_state(&mut self, local_values: &[u32]) -> Result<StateId, RegistryError> {
        self.center.insert_values(local_values)
    }

    /// Apply the center effects of `op` to center state `id`.
    ///
    /// Effects on leaf variables are ignored here; the caller applies them
    /// through [`leaf_successor`](Self::leaf_successor). Center preconditions
    /// must hold (debug-checked).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn center_successor(&mut self, id: StateId, op: OperatorId) -> Result<StateId, RegistryError> {
        debug_assert!(self.center.contains(id), "{id:?} not issued by the center pool");
        let model = Arc::clone(&self.model);
        let operator = model.operator(op);
        self.pre.clear();
        self.pre.extend_from_slice(self.center.packed(id));
        self.collect_assignments(operator, FactorId::Center, id);
        self.center.insert_modified(&self.pre, &self.assignments)
    }

    #[must_use]
    pub fn lookup_center(&self, id: StateId) -> State<'_> {
        self.center.lookup(id)
    }

    #[must_use]
    pub const fn center_size(&self) -> usize {
        self.center.len()
    }

    // -----------------------------------------------------------------------
    // Leaves
    // -----------------------------------------------------------------------

    /// Initial state of `leaf`. Cached after the first call.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownLeafFactor`] for a foreign tag and
    /// [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn initial_leaf(&mut self, leaf: LeafFactorId) -> Result<LeafStateId, RegistryError> {
        let index = self.leaf_index(leaf)?;
        if let Some(id) = self.initial_leaves[index] {
            return Ok(LeafStateId::new(leaf, id));
        }
        let values = project(self.model.initial_values(), self.factoring.leaf(leaf));
        let id = self.leaves[index].insert_values(&values)?;
        self.initial_leaves[index] = Some(id);
        Ok(LeafStateId::new(leaf, id))
    }

    /// Register a leaf assignment given in leaf-local order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownLeafFactor`] for a foreign tag and
    /// [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn leaf_state(
        &mut self,
        leaf: LeafFactorId,
        local_values: &[u32],
    ) -> Result<LeafStateId, RegistryError> {
        let index = self.leaf_index(leaf)?;
        let id = self.leaves[index].insert_values(local_values)?;
        Ok(LeafStateId::new(leaf, id))
    }

    /// Apply the effects of `op` on `state`'s leaf to `state`.
    ///
    /// Preconditions of `op` on this leaf must hold (debug-checked).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownLeafFactor`] for a foreign tag and
    /// [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn leaf_successor(
        &mut self,
        state: LeafStateId,
        op: OperatorId,
    ) -> Result<LeafStateId, RegistryError> {
        let index = self.leaf_index(state.factor)?;
        debug_assert!(
            self.leaves[index].contains(state.id),
            "{state:?} not issued by its leaf pool"
        );
        let model = Arc::clone(&self.model);
        let operator = model.operator(op);
        self.pre.clear();
        self.pre.extend_from_slice(self.leaves[index].packed(state.id));
        self.collect_assignments(operator, FactorId::Leaf(state.factor), state.id);
        let id = self.leaves[index].insert_modified(&self.pre, &self.assignments)?;
        Ok(LeafStateId::new(state.factor, id))
    }

    /// Leaf-local view of `state`. Panics on an unknown leaf tag.
    #[must_use]
    pub fn lookup_leaf(&self, state: LeafStateId) -> State<'_> {
        self.leaves[state.factor.index()].lookup(state.id)
    }

    /// Number of distinct states of `leaf`. Panics on an unknown leaf tag.
    #[must_use]
    pub fn leaf_size(&self, leaf: LeafFactorId) -> usize {
        self.leaves[leaf.index()].len()
    }

    // -----------------------------------------------------------------------
    // Decoupled states
    // -----------------------------------------------------------------------

    /// Id of center state `center` tagged with duplicate `counter`.
    ///
    /// Equal `(center, counter)` pairs always yield the same id. Ids come
    /// from their own space, independent of center and leaf ids.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateCounterExceeded`] if `counter` is
    /// above the configured bound and [`RegistryError::ResourceExhausted`] if
    /// storage cannot grow.
    pub fn decoupled_state(&mut self, center: StateId, counter: u32) -> Result<StateId, RegistryError> {
        debug_assert!(self.center.contains(center), "{center:?} not issued by the center pool");
        if counter > self.max_duplicate_counter {
            return Err(RegistryError::DuplicateCounterExceeded {
                center,
                counter,
                max: self.max_duplicate_counter,
            });
        }
        self.center.lookup(center).values_into(&mut self.scratch);
        self.scratch.push(counter);
        let id = self.decoupled.insert_values(&self.scratch)?;
        let count = self.duplicate_counts.entry(center).or_insert(0);
        *count = (*count).max(counter + 1);
        Ok(id)
    }

    /// Register a fresh duplicate of `center`, using the next unused counter.
    ///
    /// # Errors
    ///
    /// Same as [`decoupled_state`](Self::decoupled_state).
    pub fn next_decoupled_state(&mut self, center: StateId) -> Result<StateId, RegistryError> {
        let counter = self.duplicate_count(center);
        self.decoupled_state(center, counter)
    }

    /// Number of duplicate counters issued so far for `center`: one past the
    /// largest counter seen, 0 if none.
    #[must_use]
    pub fn duplicate_count(&self, center: StateId) -> u32 {
        self.duplicate_counts.get(&center).copied().unwrap_or(0)
    }

    /// Center-local values of a decoupled state, without the counter.
    #[must_use]
    pub fn decoupled_center_values(&self, id: StateId) -> Vec<u32> {
        let mut values = self.decoupled.lookup(id).values();
        values.pop();
        values
    }

    /// Duplicate counter of a decoupled state.
    #[must_use]
    pub fn decoupled_counter(&self, id: StateId) -> u32 {
        let view = self.decoupled.lookup(id);
        view.get(view.num_vars() - 1)
    }

    #[must_use]
    pub const fn decoupled_size(&self) -> usize {
        self.decoupled.len()
    }

    // -----------------------------------------------------------------------
    // Joint view
    // -----------------------------------------------------------------------

    /// Global assignment of `center` combined with one state per leaf.
    ///
    /// `leaves` must name every leaf exactly once, in any order.
    #[must_use]
    pub fn joint_values(&self, center: StateId, leaves: &[LeafStateId]) -> Vec<u32> {
        debug_assert_eq!(leaves.len(), self.leaves.len(), "one state per leaf expected");
        let factoring = &self.factoring;
        let mut values = vec![0; self.model.num_variables()];

        let center_view = self.lookup_center(center);
        for (local, &var) in factoring.center().iter().enumerate() {
            values[var] = center_view.get(local);
        }
        for &leaf_state in leaves {
            let view = self.lookup_leaf(leaf_state);
            for (local, &var) in factoring.leaf(leaf_state.factor).iter().enumerate() {
                values[var] = view.get(local);
            }
        }
        values
    }

    /// Emit per-factor sizes at `info` level.
    pub fn log_statistics(&self) {
        let leaf_states: usize = self.leaves.iter().map(StatePool::len).sum();
        let arena_bytes: usize = [&self.center, &self.decoupled]
            .into_iter()
            .chain(&self.leaves)
            .map(|pool| pool.arena().allocated_bytes())
            .sum();
        tracing::info!(
            center_states = self.center.len(),
            leaf_states,
            num_leaves = self.leaves.len(),
            decoupled_states = self.decoupled.len(),
            arena_bytes,
            "factored registry statistics"
        );
        for (index, pool) in self.leaves.iter().enumerate() {
            tracing::debug!(leaf = index, states = pool.len(), "leaf pool");
        }
    }

    /// Fill `self.assignments` with the firing effects of `operator` on
    /// `factor`, in factor-local numbering. Guards read `self.pre`.
    fn collect_assignments(&mut self, operator: &Operator, factor: FactorId, id: StateId) {
        let factoring = &self.factoring;
        let packer = match factor {
            FactorId::Center => self.center.packer(),
            FactorId::Leaf(leaf) => self.leaves[leaf.index()].packer(),
        };
        let pre = State::new(id, packer, &self.pre);
        let local = |fact: Fact| factoring.localize(fact, factor);

        debug_assert!(
            operator
                .preconditions
                .iter()
                .filter_map(|&f| local(f))
                .all(|f| pre.get(f.var) == f.value),
            "{} is not applicable in {factor:?} state {id:?}",
            operator.name
        );

        self.assignments.clear();
        for effect in &operator.effects {
            let Some(target) = local(effect.fact) else {
                continue;
            };
            let fires = effect
                .guard
                .iter()
                .filter_map(|&g| local(g))
                .all(|g| pre.get(g.var) == g.value);
            if fires {
                self.assignments.push(target);
            }
        }
    }
}

fn project(values: &[u32], vars: &[usize]) -> Vec<u32> {
    vars.iter().map(|&v| values[v]).collect()
}
