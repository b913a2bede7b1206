//! Offline construction of the decision structure.
//!
//! Recursive partitioning of the operator set, run with an explicit work
//! list so deep variable chains cannot overflow the call stack:
//!
//! 1. No untested preconditions left and the operators split into groups
//!    with disjoint effect variables: emit a `Fork` over the groups.
//! 2. Some untested precondition left: pick a variable, emit a `Switch` with
//!    one child per required value plus a default child for operators that
//!    do not constrain the variable.
//! 3. Otherwise emit a `Leaf` with the operators.
//!
//! Every operator ends up in exactly one leaf, which is what makes the
//! generated set duplicate-free.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use planstate_kernel::model::fact::Fact;
use planstate_kernel::model::operator::OperatorId;

use crate::successor::node::{Node, NodeId, SwitchTable};
use crate::successor::VariableSelection;

/// An operator reduced to what the builder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OperatorEntry {
    pub op: OperatorId,
    /// Sorted by variable, one fact per variable.
    pub preconditions: SmallVec<[Fact; 4]>,
    pub effect_vars: SmallVec<[usize; 4]>,
}

impl OperatorEntry {
    /// `None` if two preconditions require different values of one
    /// variable: such an operator is never applicable.
    pub fn new(
        op: OperatorId,
        preconditions: impl IntoIterator<Item = Fact>,
        effect_vars: impl IntoIterator<Item = usize>,
    ) -> Option<Self> {
        let mut preconditions: SmallVec<[Fact; 4]> = preconditions.into_iter().collect();
        preconditions.sort_unstable();
        preconditions.dedup();
        if preconditions.windows(2).any(|w| w[0].var == w[1].var) {
            return None;
        }
        let mut effect_vars: SmallVec<[usize; 4]> = effect_vars.into_iter().collect();
        effect_vars.sort_unstable();
        effect_vars.dedup();
        Some(Self {
            op,
            preconditions,
            effect_vars,
        })
    }
}

/// An operator inside one partition, with the preconditions not yet tested
/// on the path from the root.
struct Pending {
    entry: usize,
    remaining: SmallVec<[Fact; 4]>,
}

struct Task {
    slot: NodeId,
    pending: Vec<Pending>,
}

struct Builder<'a> {
    entries: &'a [OperatorEntry],
    selection: VariableSelection,
    nodes: Vec<Node>,
    tasks: Vec<Task>,
}

/// Build the node arena for `entries`. The root is node 0.
pub(crate) fn build(entries: &[OperatorEntry], selection: VariableSelection) -> Vec<Node> {
    let mut builder = Builder {
        entries,
        selection,
        nodes: Vec::new(),
        tasks: Vec::new(),
    };
    let all = entries
        .iter()
        .enumerate()
        .map(|(entry, e)| Pending {
            entry,
            remaining: e.preconditions.clone(),
        })
        .collect();
    builder.spawn(all);
    while let Some(Task { slot, pending }) = builder.tasks.pop() {
        let node = builder.plan(pending);
        builder.nodes[slot.index()] = node;
    }
    builder.nodes
}

impl Builder<'_> {
    /// Reserve a node for `pending` and queue it.
    #[allow(clippy::cast_possible_truncation)]
    fn spawn(&mut self, pending: Vec<Pending>) -> NodeId {
        let slot = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Node::Leaf {
            operators: Box::default(),
        });
        self.tasks.push(Task { slot, pending });
        slot
    }

    fn plan(&mut self, pending: Vec<Pending>) -> Node {
        if pending.iter().all(|p| p.remaining.is_empty()) {
            let groups = self.independent_groups(pending);
            if groups.len() == 1 {
                let group = groups.into_iter().next().unwrap_or_default();
                return Node::Leaf {
                    operators: group.iter().map(|p| self.entries[p.entry].op).collect(),
                };
            }
            let children = groups.into_iter().map(|g| self.spawn(g)).collect();
            return Node::Fork { children };
        }

        let var = self.select_variable(&pending);
        let mut by_value: BTreeMap<u32, Vec<Pending>> = BTreeMap::new();
        let mut default = Vec::new();
        for mut p in pending {
            if let Some(pos) = p.remaining.iter().position(|f| f.var == var) {
                let fact = p.remaining.remove(pos);
                by_value.entry(fact.value).or_default().push(p);
            } else {
                default.push(p);
            }
        }

        let entries = by_value
            .into_iter()
            .map(|(value, group)| (value, self.spawn(group)))
            .collect();
        let default = (!default.is_empty()).then(|| self.spawn(default));
        Node::Switch {
            var,
            table: SwitchTable::from_sorted(entries),
            default,
        }
    }

    /// Variable to switch on. Only called when some precondition remains.
    fn select_variable(&self, pending: &[Pending]) -> usize {
        let remaining = pending.iter().flat_map(|p| p.remaining.iter().map(|f| f.var));
        match self.selection {
            VariableSelection::LowestIndex => remaining.min().unwrap_or_default(),
            VariableSelection::MostConstraining => {
                let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
                for var in remaining {
                    *counts.entry(var).or_default() += 1;
                }
                // Ascending iteration + strict `>` keeps the lowest index on ties.
                let mut best = (0, 0);
                for (var, count) in counts {
                    if count > best.1 {
                        best = (var, count);
                    }
                }
                best.0
            }
        }
    }

    /// Split `pending` into connected components of operators linked by a
    /// shared effect variable, ordered by first member.
    fn independent_groups(&self, pending: Vec<Pending>) -> Vec<Vec<Pending>> {
        if pending.len() < 2 {
            return vec![pending];
        }
        let mut parent: Vec<usize> = (0..pending.len()).collect();
        let mut owner: BTreeMap<usize, usize> = BTreeMap::new();
        for (i, p) in pending.iter().enumerate() {
            for &var in &self.entries[p.entry].effect_vars {
                match owner.get(&var) {
                    Some(&j) => union(&mut parent, i, j),
                    None => {
                        owner.insert(var, i);
                    }
                }
            }
        }

        let mut group_of_root: BTreeMap<usize, usize> = BTreeMap::new();
        let mut groups: Vec<Vec<Pending>> = Vec::new();
        for (i, p) in pending.into_iter().enumerate() {
            let root = find(&mut parent, i);
            let next = groups.len();
            let g = *group_of_root.entry(root).or_insert(next);
            if g == groups.len() {
                groups.push(Vec::new());
            }
            groups[g].push(p);
        }
        groups
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}
