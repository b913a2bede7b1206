//! Model module: variables, facts, operators, factoring, and the problem model.
//!
//! Everything here is immutable once a [`problem::ProblemModel`] is built.
//! Depends only on `mutex` (owned by the model) and `digest`.

pub mod fact;
pub mod factoring;
pub mod operator;
pub mod problem;
