//! Decision-structure nodes, stored in an index-addressed arena.
//!
//! Children are referenced by [`NodeId`] rather than owned, so the whole
//! structure is one flat `Vec<Node>` that can be shared read-only across
//! threads.

use std::fmt;

use planstate_kernel::model::operator::OperatorId;

/// Index of a node in the generator's node arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n#{}", self.0)
    }
}

/// Value → child mapping of a switch node.
///
/// Only values required by at least one operator get an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchTable {
    /// Exactly one observed value.
    Single { value: u32, child: NodeId },
    /// Indexed by value; used when observed values fill at least half of
    /// `0..=max_value`.
    Dense { children: Box<[Option<NodeId>]> },
    /// Sorted by value; binary searched.
    Sparse { entries: Box<[(u32, NodeId)]> },
}

impl SwitchTable {
    /// Pick a representation for `entries` (sorted by value, non-empty).
    #[must_use]
    pub fn from_sorted(entries: Vec<(u32, NodeId)>) -> Self {
        debug_assert!(!entries.is_empty());
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        if let [(value, child)] = entries[..] {
            return Self::Single { value, child };
        }
        let span = entries.last().map_or(0, |&(max, _)| max as usize + 1);
        if span <= 2 * entries.len() {
            let mut children = vec![None; span];
            for (value, child) in entries {
                children[value as usize] = Some(child);
            }
            Self::Dense {
                children: children.into_boxed_slice(),
            }
        } else {
            Self::Sparse {
                entries: entries.into_boxed_slice(),
            }
        }
    }

    /// Child for `value`, if any operator requires it.
    #[inline]
    #[must_use]
    pub fn child(&self, value: u32) -> Option<NodeId> {
        match self {
            Self::Single { value: v, child } => (*v == value).then_some(*child),
            Self::Dense { children } => children.get(value as usize).copied().flatten(),
            Self::Sparse { entries } => entries
                .binary_search_by_key(&value, |&(v, _)| v)
                .ok()
                .map(|i| entries[i].1),
        }
    }

    /// All children in value order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        let (single, dense, sparse) = match self {
            Self::Single { child, .. } => (Some(*child), None, None),
            Self::Dense { children } => (None, Some(children.iter().flatten().copied()), None),
            Self::Sparse { entries } => (None, None, Some(entries.iter().map(|&(_, c)| c))),
        };
        single
            .into_iter()
            .chain(dense.into_iter().flatten())
            .chain(sparse.into_iter().flatten())
    }
}

/// One node of the decision structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Independent operator groups; every child is visited.
    Fork { children: Box<[NodeId]> },
    /// Test `var`: visit the child for the state's value and the default.
    ///
    /// `default` holds operators with no precondition on `var`. It is
    /// disjoint from every value child.
    Switch {
        var: usize,
        table: SwitchTable,
        default: Option<NodeId>,
    },
    /// Operators whose preconditions are all tested on the path here.
    Leaf { operators: Box<[OperatorId]> },
}
