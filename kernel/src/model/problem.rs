//! `ProblemModel`: the immutable variable/operator model shared by every
//! component.
//!
//! Built and validated once, then handed to registries and generators behind
//! an `Arc`. Nothing in this crate reaches for a global problem description.

use crate::digest::canon::canonical_json_bytes;
use crate::digest::hash::{canonical_hash, ContentHash, DOMAIN_PROBLEM_MODEL};
use crate::digest::DigestError;
use crate::model::factoring::{FactorId, Factoring, LeafFactorId};
use crate::model::fact::{Fact, StateValues, Variable};
use crate::model::operator::{Operator, OperatorId};
use crate::mutex::{check_fact, MutexGroup, MutexTable};

/// Error type for model construction and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A fact refers to a variable index outside the model.
    #[error("{context}: unknown variable {var}")]
    UnknownVariable { var: usize, context: &'static str },
    /// A fact's value is outside its variable's domain.
    #[error("{context}: fact {fact} outside domain of size {domain_size}")]
    ValueOutOfDomain {
        fact: Fact,
        domain_size: usize,
        context: &'static str,
    },
    /// The initial assignment does not have one value per variable.
    #[error("initial state has {actual} values, model has {expected} variables")]
    InitialStateArity { expected: usize, actual: usize },
    /// An operator declares a negative cost.
    #[error("operator {name:?} has negative cost {cost}")]
    NegativeCost { name: String, cost: i64 },
    /// More operators than an `OperatorId` can address.
    #[error("too many operators: {count}")]
    TooManyOperators { count: usize },
    /// Center/leaf partition is not a partition of the variables.
    #[error("invalid factoring: {detail}")]
    InvalidFactoring { detail: String },
    /// The pairwise mutex matrix over all facts cannot be allocated.
    #[error("mutex table over {num_facts} facts is too large to allocate")]
    MutexTableTooLarge { num_facts: usize },
}

/// The variable/operator model of a planning task.
#[derive(Debug, Clone)]
pub struct ProblemModel {
    variables: Vec<Variable>,
    domain_sizes: Vec<usize>,
    operators: Vec<Operator>,
    initial_values: Vec<u32>,
    goal: Vec<Fact>,
    mutexes: MutexTable,
    factoring: Option<Factoring>,
}

impl ProblemModel {
    /// Build and validate a model without mutexes or factoring.
    ///
    /// `initial_values` are the values before axiom evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if any fact (precondition, effect, guard, goal)
    /// is out of range, an operator has negative cost, or the initial
    /// assignment has the wrong arity or out-of-domain values.
    pub fn new(
        variables: Vec<Variable>,
        operators: Vec<Operator>,
        initial_values: Vec<u32>,
        goal: Vec<Fact>,
    ) -> Result<Self, ModelError> {
        let domain_sizes: Vec<usize> = variables.iter().map(|v| v.domain_size).collect();

        if initial_values.len() != variables.len() {
            return Err(ModelError::InitialStateArity {
                expected: variables.len(),
                actual: initial_values.len(),
            });
        }
        for (var, &value) in initial_values.iter().enumerate() {
            check_fact(&domain_sizes, Fact::new(var, value), "initial state")?;
        }
        for &fact in &goal {
            check_fact(&domain_sizes, fact, "goal")?;
        }

        if u32::try_from(operators.len()).is_err() {
            return Err(ModelError::TooManyOperators {
                count: operators.len(),
            });
        }
        for op in &operators {
            if op.cost < 0 {
                return Err(ModelError::NegativeCost {
                    name: op.name.clone(),
                    cost: op.cost,
                });
            }
            for &fact in &op.preconditions {
                check_fact(&domain_sizes, fact, "precondition")?;
            }
            for effect in &op.effects {
                check_fact(&domain_sizes, effect.fact, "effect")?;
                for &fact in &effect.guard {
                    check_fact(&domain_sizes, fact, "effect guard")?;
                }
            }
        }

        let mutexes = MutexTable::empty(&domain_sizes);
        Ok(Self {
            variables,
            domain_sizes,
            operators,
            initial_values,
            goal,
            mutexes,
            factoring: None,
        })
    }

    /// Attach mutex groups, replacing any previous table.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if a group mentions a fact outside the model.
    pub fn with_mutex_groups(mut self, groups: Vec<MutexGroup>) -> Result<Self, ModelError> {
        self.mutexes = MutexTable::new(&self.domain_sizes, groups)?;
        Ok(self)
    }

    /// Attach a center/leaf factoring.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidFactoring`] if the factoring does not
    /// partition this model's variables.
    pub fn with_factoring(
        mut self,
        center: Vec<usize>,
        leaves: Vec<Vec<usize>>,
    ) -> Result<Self, ModelError> {
        self.factoring = Some(Factoring::new(self.variables.len(), center, leaves)?);
        Ok(self)
    }

    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Domain size per variable, in variable order.
    #[must_use]
    pub fn domain_sizes(&self) -> &[usize] {
        &self.domain_sizes
    }

    #[must_use]
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    #[must_use]
    pub fn num_operators(&self) -> usize {
        self.operators.len()
    }

    /// Operator by id. Panics if `id` is not from this model.
    #[must_use]
    pub fn operator(&self, id: OperatorId) -> &Operator {
        &self.operators[id.index()]
    }

    /// Every operator id in index order.
    pub fn operator_ids(&self) -> impl Iterator<Item = OperatorId> + '_ {
        (0..self.operators.len()).map(|i| OperatorId::new(i as u32))
    }

    /// Initial values before axiom evaluation.
    #[must_use]
    pub fn initial_values(&self) -> &[u32] {
        &self.initial_values
    }

    #[must_use]
    pub fn goal(&self) -> &[Fact] {
        &self.goal
    }

    #[must_use]
    pub fn mutexes(&self) -> &MutexTable {
        &self.mutexes
    }

    #[must_use]
    pub fn factoring(&self) -> Option<&Factoring> {
        self.factoring.as_ref()
    }

    /// Goal facts on `leaf`, in leaf-local numbering.
    ///
    /// Empty when the model has no factoring.
    #[must_use]
    pub fn goals_for_leaf(&self, leaf: LeafFactorId) -> Vec<Fact> {
        let Some(factoring) = &self.factoring else {
            return Vec::new();
        };
        self.goal
            .iter()
            .filter_map(|&f| factoring.localize(f, FactorId::Leaf(leaf)))
            .collect()
    }

    #[must_use]
    pub fn is_goal<S: StateValues + ?Sized>(&self, state: &S) -> bool {
        state.satisfies_all(&self.goal)
    }

    #[must_use]
    pub fn is_applicable<S: StateValues + ?Sized>(&self, op: OperatorId, state: &S) -> bool {
        self.operator(op).is_applicable(state)
    }

    /// True when every operator costs exactly 1.
    #[must_use]
    pub fn is_unit_cost(&self) -> bool {
        self.operators.iter().all(|op| op.cost == 1)
    }

    #[must_use]
    pub fn has_conditional_effects(&self) -> bool {
        self.operators.iter().any(Operator::has_conditional_effects)
    }

    /// Whether any variable is derived by axioms.
    #[must_use]
    pub fn has_axioms(&self) -> bool {
        self.variables.iter().any(Variable::is_derived)
    }

    #[must_use]
    pub fn min_operator_cost(&self) -> Option<i64> {
        self.operators.iter().map(|op| op.cost).min()
    }

    #[must_use]
    pub fn max_operator_cost(&self) -> Option<i64> {
        self.operators.iter().map(|op| op.cost).max()
    }

    /// Sum of operator costs along `plan`.
    #[must_use]
    pub fn plan_cost(&self, plan: &[OperatorId]) -> i64 {
        plan.iter()
            .map(|&id| self.operator(id).cost)
            .fold(0, i64::saturating_add)
    }

    /// Canonical JSON bytes of the model (sorted keys, compact, integers only).
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] if canonicalization fails.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, DigestError> {
        let mutex_groups: Vec<serde_json::Value> = self
            .mutexes
            .groups()
            .iter()
            .map(|g| {
                serde_json::json!({
                    "exactly_one": g.exactly_one,
                    "facts": facts_to_json(&g.facts),
                })
            })
            .collect();
        let factoring = self.factoring.as_ref().map(|f| {
            serde_json::json!({
                "center": f.center(),
                "leaves": f.leaves(),
            })
        });
        let value = serde_json::json!({
            "factoring": factoring,
            "goal": facts_to_json(&self.goal),
            "initial_values": self.initial_values,
            "mutex_groups": mutex_groups,
            "operators": serde_json::to_value(&self.operators)?,
            "variables": serde_json::to_value(&self.variables)?,
        });
        Ok(canonical_json_bytes(&value)?)
    }

    /// Content hash of [`canonical_bytes`](Self::canonical_bytes).
    ///
    /// Two models with equal content share a digest regardless of how they
    /// were assembled.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] if canonicalization fails.
    pub fn digest(&self) -> Result<ContentHash, DigestError> {
        Ok(canonical_hash(DOMAIN_PROBLEM_MODEL, &self.canonical_bytes()?))
    }
}

fn facts_to_json(facts: &[Fact]) -> serde_json::Value {
    serde_json::Value::Array(
        facts
            .iter()
            .map(|f| serde_json::json!([f.var, f.value]))
            .collect(),
    )
}
