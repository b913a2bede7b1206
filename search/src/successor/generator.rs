//! `SuccessorGenerator`: applicable-operator enumeration over a prebuilt
//! Fork/Switch/Leaf structure.
//!
//! Evaluation walks the node arena with an explicit stack. A switch visits
//! its default child and the one child matching the state's value; the two
//! are disjoint by construction, and every operator sits in exactly one
//! leaf, so no operator is reported twice.

use smallvec::SmallVec;

use planstate_kernel::model::fact::StateValues;
use planstate_kernel::model::operator::OperatorId;
use planstate_kernel::model::problem::ProblemModel;

use crate::successor::builder::{build, OperatorEntry};
use crate::successor::node::{Node, NodeId};
use crate::successor::GeneratorConfig;

const ROOT: NodeId = NodeId::new(0);

/// Shape of a built generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeneratorStatistics {
    pub num_nodes: usize,
    pub num_forks: usize,
    pub num_switches: usize,
    pub num_leaves: usize,
    /// Longest root-to-leaf path, in edges.
    pub max_depth: usize,
    /// Operators stored in leaves.
    pub num_operators: usize,
    /// Operators left out because their preconditions contradict each other.
    pub num_unsatisfiable: usize,
}

/// Read-only applicability index. `Send + Sync`; share it across workers.
#[derive(Debug, Clone)]
pub struct SuccessorGenerator {
    nodes: Vec<Node>,
    num_vars: usize,
    statistics: GeneratorStatistics,
}

impl SuccessorGenerator {
    /// Generator over every operator of `model` with default settings.
    #[must_use]
    pub fn new(model: &ProblemModel) -> Self {
        Self::with_config(model, GeneratorConfig::default())
    }

    #[must_use]
    pub fn with_config(model: &ProblemModel, config: GeneratorConfig) -> Self {
        let entries = model.operator_ids().zip(model.operators()).map(|(id, op)| {
            OperatorEntry::new(
                id,
                op.preconditions.iter().copied(),
                op.effects.iter().map(|e| e.fact.var),
            )
        });
        Self::from_entries(entries, model.num_variables(), config)
    }

    /// Build from pre-filtered entries; `None` marks an unsatisfiable
    /// operator that is counted but not indexed.
    pub(crate) fn from_entries(
        entries: impl IntoIterator<Item = Option<OperatorEntry>>,
        num_vars: usize,
        config: GeneratorConfig,
    ) -> Self {
        let mut num_unsatisfiable = 0;
        let entries: Vec<OperatorEntry> = entries
            .into_iter()
            .filter_map(|e| {
                if e.is_none() {
                    num_unsatisfiable += 1;
                }
                e
            })
            .collect();
        debug_assert!(entries
            .iter()
            .all(|e| e.preconditions.iter().all(|f| f.var < num_vars)));

        let nodes = build(&entries, config.variable_selection);
        let mut statistics = shape(&nodes);
        statistics.num_unsatisfiable = num_unsatisfiable;

        tracing::debug!(
            nodes = statistics.num_nodes,
            forks = statistics.num_forks,
            switches = statistics.num_switches,
            leaves = statistics.num_leaves,
            max_depth = statistics.max_depth,
            operators = statistics.num_operators,
            unsatisfiable = statistics.num_unsatisfiable,
            "built successor generator"
        );
        Self {
            nodes,
            num_vars,
            statistics,
        }
    }

    /// Operators applicable in `state`, without duplicates, in no
    /// particular order.
    #[must_use]
    pub fn generate<S: StateValues + ?Sized>(&self, state: &S) -> Vec<OperatorId> {
        let mut out = Vec::new();
        self.generate_into(state, &mut out);
        out
    }

    /// Like [`generate`](Self::generate), but writes into `out` after
    /// clearing it.
    pub fn generate_into<S: StateValues + ?Sized>(&self, state: &S, out: &mut Vec<OperatorId>) {
        out.clear();
        let mut stack: SmallVec<[NodeId; 32]> = SmallVec::new();
        stack.push(ROOT);
        while let Some(id) = stack.pop() {
            match &self.nodes[id.index()] {
                Node::Fork { children } => stack.extend(children.iter().copied()),
                Node::Switch {
                    var,
                    table,
                    default,
                } => {
                    if let Some(child) = table.child(state.value_of(*var)) {
                        stack.push(child);
                    }
                    if let Some(child) = default {
                        stack.push(*child);
                    }
                }
                Node::Leaf { operators } => out.extend_from_slice(operators),
            }
        }
    }

    /// Number of indexed operators.
    #[must_use]
    pub const fn num_operators(&self) -> usize {
        self.statistics.num_operators
    }

    /// Variables of the state space this generator reads.
    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    #[must_use]
    pub const fn statistics(&self) -> GeneratorStatistics {
        self.statistics
    }

    /// The node arena; the root is the first node.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

fn shape(nodes: &[Node]) -> GeneratorStatistics {
    let mut stats = GeneratorStatistics {
        num_nodes: nodes.len(),
        ..GeneratorStatistics::default()
    };
    let mut stack = vec![(ROOT, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        stats.max_depth = stats.max_depth.max(depth);
        match &nodes[id.index()] {
            Node::Fork { children } => {
                stats.num_forks += 1;
                stack.extend(children.iter().map(|&c| (c, depth + 1)));
            }
            Node::Switch { table, default, .. } => {
                stats.num_switches += 1;
                stack.extend(table.children().chain(*default).map(|c| (c, depth + 1)));
            }
            Node::Leaf { operators } => {
                stats.num_leaves += 1;
                stats.num_operators += operators.len();
            }
        }
    }
    stats
}
