//! Successor generation: enumerate exactly the operators applicable to a
//! state without scanning the whole operator set.
//!
//! The generator is built once from the model (or from one leaf factor of
//! it) and is read-only afterwards.

mod builder;
pub mod generator;
pub mod leaf;
pub mod node;

/// How the builder picks the variable a switch node tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableSelection {
    /// The variable constraining the most operators of the subset; ties go
    /// to the lowest index. Keeps the structure shallow.
    #[default]
    MostConstraining,
    /// The lowest-indexed variable still constrained in the subset.
    LowestIndex,
}

/// Build-time options for a [`generator::SuccessorGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeneratorConfig {
    pub variable_selection: VariableSelection,
}
