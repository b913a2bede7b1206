//! Opaque state identifiers.

use std::fmt;

/// Handle to a state registered in one registry (or one factor pool).
///
/// Only meaningful relative to the registry that issued it. Ids are dense
/// arena indices, which lets per-state stores use them as vector offsets;
/// their order carries no meaning beyond that.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(u32);

impl StateId {
    /// Sentinel for "no state" (unset parent pointers and the like). Never
    /// issued by a registry.
    pub const NONE: Self = Self(u32::MAX);

    /// Id for arena slot `index`, or `None` once the id space is used up.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .filter(|&raw| raw != u32::MAX)
            .map(Self)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("s#none")
        } else {
            write!(f, "s#{}", self.0)
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
