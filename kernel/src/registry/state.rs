//! `State`: borrowed read-only view of a registered state.

use std::fmt;

use crate::model::fact::{Fact, StateValues};
use crate::packing::packer::IntPacker;
use crate::packing::Word;
use crate::registry::state_id::StateId;

/// A registered state as seen through its registry.
///
/// Reads values straight out of the packed record; nothing is copied until
/// [`values`](Self::values) or [`facts`](Self::facts) is called. The view
/// borrows the registry, so it cannot outlive it.
#[derive(Clone, Copy)]
pub struct State<'a> {
    id: StateId,
    packer: &'a IntPacker,
    words: &'a [Word],
}

impl<'a> State<'a> {
    pub(crate) fn new(id: StateId, packer: &'a IntPacker, words: &'a [Word]) -> Self {
        Self { id, packer, words }
    }

    #[must_use]
    pub const fn id(&self) -> StateId {
        self.id
    }

    /// Value of `var`. Panics if `var` is out of range.
    #[must_use]
    pub fn get(&self, var: usize) -> u32 {
        self.packer.get(self.words, var)
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.packer.num_vars()
    }

    /// The full unpacked assignment.
    #[must_use]
    pub fn values(&self) -> Vec<u32> {
        self.packer.unpack(self.words)
    }

    /// Unpack into `values`, reusing its allocation.
    pub fn values_into(&self, values: &mut Vec<u32>) {
        self.packer.unpack_into(self.words, values);
    }

    /// One fact per variable, in variable order.
    #[must_use]
    pub fn facts(&self) -> Vec<Fact> {
        (0..self.num_vars())
            .map(|var| Fact::new(var, self.get(var)))
            .collect()
    }

    /// The packed record.
    #[must_use]
    pub const fn packed(&self) -> &'a [Word] {
        self.words
    }
}

impl StateValues for State<'_> {
    fn value_of(&self, var: usize) -> u32 {
        self.get(var)
    }
}

impl fmt::Debug for State<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("values", &self.values())
            .finish()
    }
}
