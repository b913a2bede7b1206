//! `StateRegistry`: the central authority binding packed content to
//! canonical [`StateId`]s.
//!
//! One registry per search attempt. States are only ever added; ids and
//! [`State`] views stay valid for the registry's lifetime. All mutation goes
//! through `&mut self`, so there is exactly one writer at a time.
//!
//! # Successor semantics
//!
//! `successor(id, op)` copies the predecessor record, evaluates every effect
//! guard against that unmodified copy, applies the firing effects in
//! declaration order (later writes to one variable win), runs the axiom
//! evaluator if one is installed, and registers the result.

use std::sync::Arc;

use crate::model::fact::Fact;
use crate::model::operator::OperatorId;
use crate::model::problem::ProblemModel;
use crate::packing::packer::IntPacker;
use crate::packing::Word;
use crate::registry::pool::StatePool;
use crate::registry::state::State;
use crate::registry::state_id::StateId;
use crate::registry::{RegistryConfig, RegistryError};

/// Derives the values of axiom-controlled variables.
///
/// Called with a full assignment after effects are applied and before the
/// state is registered. Implementations overwrite derived variables only.
/// Evaluators are `Send` so a registry can move to a worker thread.
pub trait AxiomEvaluator: Send {
    fn evaluate(&self, values: &mut [u32]);
}

impl<F: Fn(&mut [u32]) + Send> AxiomEvaluator for F {
    fn evaluate(&self, values: &mut [u32]) {
        self(values);
    }
}

/// Liveness marker shared with per-state stores.
///
/// The registry holds the only strong reference; stores hold `Weak`s, so a
/// store observes teardown as a failed upgrade.
#[derive(Debug)]
pub(crate) struct RegistryToken;

/// Deduplicating registry of full states.
pub struct StateRegistry {
    model: Arc<ProblemModel>,
    pool: StatePool,
    axioms: Option<Box<dyn AxiomEvaluator>>,
    initial: Option<StateId>,
    token: Arc<RegistryToken>,
    /// Copy of the predecessor record during `successor`.
    pre: Vec<Word>,
    /// Firing effects of the operator being applied.
    assignments: Vec<Fact>,
    /// Unpacked values for the axiom path.
    values: Vec<u32>,
}

impl StateRegistry {
    /// Registry with default storage settings and no axiom evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Layout`] if the model's domains cannot be
    /// packed.
    pub fn new(model: Arc<ProblemModel>) -> Result<Self, RegistryError> {
        Self::with_config(model, RegistryConfig::default())
    }

    /// # Errors
    ///
    /// Returns [`RegistryError`] for an unpackable model or invalid config.
    pub fn with_config(
        model: Arc<ProblemModel>,
        config: RegistryConfig,
    ) -> Result<Self, RegistryError> {
        let pool = StatePool::new(model.domain_sizes(), &config)?;
        tracing::debug!(
            num_vars = model.num_variables(),
            num_operators = model.num_operators(),
            bytes_per_state = pool.packer().num_words() * std::mem::size_of::<Word>(),
            "created state registry"
        );
        Ok(Self {
            pre: Vec::with_capacity(pool.packer().num_words()),
            values: Vec::with_capacity(model.num_variables()),
            model,
            pool,
            axioms: None,
            initial: None,
            token: Arc::new(RegistryToken),
            assignments: Vec::new(),
        })
    }

    /// Registry that runs `axioms` on every state before registering it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for an unpackable model or invalid config.
    pub fn with_axioms(
        model: Arc<ProblemModel>,
        config: RegistryConfig,
        axioms: Box<dyn AxiomEvaluator>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::with_config(model, config)?;
        registry.axioms = Some(axioms);
        Ok(registry)
    }

    #[must_use]
    pub fn model(&self) -> &Arc<ProblemModel> {
        &self.model
    }

    #[must_use]
    pub const fn packer(&self) -> &IntPacker {
        self.pool.packer()
    }

    /// Id of the model's initial state (after axiom evaluation).
    ///
    /// Registered on the first call and cached afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn initial_state(&mut self) -> Result<StateId, RegistryError> {
        if let Some(id) = self.initial {
            return Ok(id);
        }
        self.values.clear();
        self.values.extend_from_slice(self.model.initial_values());
        let id = self.register_scratch_values()?;
        self.initial = Some(id);
        Ok(id)
    }

    /// Register an arbitrary full assignment (axioms are applied first).
    ///
    /// `values` must hold one in-domain value per model variable; this is
    /// only checked in debug builds.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn register_values(&mut self, values: &[u32]) -> Result<StateId, RegistryError> {
        debug_assert_eq!(values.len(), self.model.num_variables());
        debug_assert!(
            values
                .iter()
                .zip(self.model.domain_sizes())
                .all(|(&v, &d)| (v as usize) < d),
            "value outside its domain"
        );
        self.values.clear();
        self.values.extend_from_slice(values);
        self.register_scratch_values()
    }

    /// Id of the state reached by applying `op` to `id`.
    ///
    /// `op` must be applicable to `id`; this is only checked in debug builds.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn successor(&mut self, id: StateId, op: OperatorId) -> Result<StateId, RegistryError> {
        debug_assert!(self.pool.contains(id), "{id:?} not issued by this registry");
        let operator = self.model.operator(op);

        self.pre.clear();
        self.pre.extend_from_slice(self.pool.packed(id));
        let pre = State::new(id, self.pool.packer(), &self.pre);
        debug_assert!(
            operator.is_applicable(&pre),
            "{op} ({}) is not applicable in {id:?}",
            operator.name
        );

        self.assignments.clear();
        self.assignments.extend(
            operator
                .effects
                .iter()
                .filter(|effect| effect.fires_in(&pre))
                .map(|effect| effect.fact),
        );

        if self.axioms.is_none() {
            return self.pool.insert_modified(&self.pre, &self.assignments);
        }
        self.pool.packer().unpack_into(&self.pre, &mut self.values);
        for fact in &self.assignments {
            self.values[fact.var] = fact.value;
        }
        self.register_scratch_values()
    }

    /// Borrowed view of `id`.
    #[must_use]
    pub fn lookup(&self, id: StateId) -> State<'_> {
        self.pool.lookup(id)
    }

    /// Number of distinct registered states.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Whether `id` was issued by this registry.
    #[must_use]
    pub const fn contains(&self, id: StateId) -> bool {
        self.pool.contains(id)
    }

    /// Number of live per-state stores subscribed to this registry.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        Arc::weak_count(&self.token)
    }

    pub(crate) const fn token(&self) -> &Arc<RegistryToken> {
        &self.token
    }

    /// Emit registry size and memory use at `info` level.
    pub fn log_statistics(&self) {
        let arena = self.pool.arena();
        tracing::info!(
            states = self.size(),
            bytes_per_state = self.pool.packer().num_words() * std::mem::size_of::<Word>(),
            arena_blocks = arena.block_count(),
            arena_bytes = arena.allocated_bytes(),
            index_capacity = self.pool.index_capacity(),
            subscribers = self.subscriber_count(),
            "state registry statistics"
        );
    }

    /// Run axioms over `self.values` and register the result.
    fn register_scratch_values(&mut self) -> Result<StateId, RegistryError> {
        if let Some(axioms) = &self.axioms {
            axioms.evaluate(&mut self.values);
        }
        self.pool.insert_values(&self.values)
    }
}

impl std::fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRegistry")
            .field("size", &self.size())
            .field("num_words", &self.pool.packer().num_words())
            .field("has_axioms", &self.axioms.is_some())
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}
