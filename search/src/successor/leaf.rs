//! Leaf-local successor generators for decoupled search.
//!
//! A leaf generator is evaluated on leaf-local states (as stored by
//! `FactoredRegistry`): it only tests preconditions on the leaf's variables,
//! rewritten to leaf-local indices. Preconditions on the center or other
//! leaves are the caller's business.

use planstate_kernel::model::factoring::{FactorId, LeafFactorId};
use planstate_kernel::model::problem::ProblemModel;

use crate::error::GeneratorError;
use crate::successor::builder::OperatorEntry;
use crate::successor::generator::SuccessorGenerator;
use crate::successor::GeneratorConfig;

/// Which operators a leaf generator indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeafOperatorScope {
    /// Operators with at least one effect on the leaf.
    #[default]
    AffectingLeaf,
    /// Operators whose preconditions and effects all lie on the leaf, with
    /// at least one effect.
    LeafOnly,
}

impl SuccessorGenerator {
    /// Generator for the operators of `leaf` selected by `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::MissingFactoring`] if the model has no
    /// factoring and [`GeneratorError::UnknownLeafFactor`] if `leaf` is not
    /// one of its leaves.
    pub fn for_leaf(
        model: &ProblemModel,
        leaf: LeafFactorId,
        scope: LeafOperatorScope,
        config: GeneratorConfig,
    ) -> Result<Self, GeneratorError> {
        let factoring = model.factoring().ok_or(GeneratorError::MissingFactoring)?;
        if leaf.index() >= factoring.num_leaves() {
            return Err(GeneratorError::UnknownLeafFactor { leaf });
        }
        let factor = FactorId::Leaf(leaf);
        let on_leaf = |var: usize| factoring.factor_of(var) == factor;

        let entries = model
            .operator_ids()
            .zip(model.operators())
            .filter(|(_, op)| {
                let mut effect_vars = op.effects.iter().map(|e| e.fact.var);
                match scope {
                    LeafOperatorScope::AffectingLeaf => effect_vars.any(on_leaf),
                    LeafOperatorScope::LeafOnly => {
                        !op.effects.is_empty()
                            && effect_vars.all(on_leaf)
                            && op.preconditions.iter().all(|f| on_leaf(f.var))
                    }
                }
            })
            .map(|(id, op)| {
                OperatorEntry::new(
                    id,
                    op.preconditions
                        .iter()
                        .filter_map(|&f| factoring.localize(f, factor)),
                    op.effects
                        .iter()
                        .filter(|e| on_leaf(e.fact.var))
                        .map(|e| factoring.local_index(e.fact.var)),
                )
            });

        let generator = Self::from_entries(entries, factoring.leaf(leaf).len(), config);
        tracing::debug!(
            leaf = leaf.index(),
            ?scope,
            operators = generator.num_operators(),
            "built leaf successor generator"
        );
        Ok(generator)
    }
}
