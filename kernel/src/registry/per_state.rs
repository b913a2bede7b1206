//! `PerStateStore<T>`: side table keyed by [`StateId`].
//!
//! Logically total over every id the registry has issued: unwritten ids read
//! back the declared default. Storage is materialized lazily up to the
//! highest id written and never shrinks.
//!
//! A store subscribes to one registry on creation. When that registry is
//! dropped the store becomes invalid: further access is a contract violation
//! (checked in debug builds), and [`PerStateStore::release_if_orphaned`]
//! frees the storage.

use std::ops::{Index, IndexMut};
use std::sync::{Arc, Weak};

use crate::registry::state_id::StateId;
use crate::registry::state_registry::{RegistryToken, StateRegistry};

/// Per-state auxiliary data (g-values, parents, flags) for one registry.
#[derive(Debug, Clone)]
pub struct PerStateStore<T> {
    registry: Weak<RegistryToken>,
    default: T,
    entries: Vec<T>,
}

impl<T: Clone> PerStateStore<T> {
    /// Subscribe a new store to `registry`.
    #[must_use]
    pub fn new(registry: &StateRegistry, default: T) -> Self {
        Self {
            registry: Arc::downgrade(registry.token()),
            default,
            entries: Vec::new(),
        }
    }

    /// Value for `id`, or the default if it was never written.
    #[must_use]
    pub fn get(&self, id: StateId) -> &T {
        debug_assert!(self.is_valid(), "per-state store used after registry teardown");
        self.entries.get(id.index()).unwrap_or(&self.default)
    }

    /// Mutable slot for `id`, growing storage with the default as needed.
    pub fn get_mut(&mut self, id: StateId) -> &mut T {
        debug_assert!(self.is_valid(), "per-state store used after registry teardown");
        debug_assert!(!id.is_none(), "StateId::NONE has no slot");
        let index = id.index();
        if index >= self.entries.len() {
            self.entries.resize(index + 1, self.default.clone());
        }
        &mut self.entries[index]
    }

    /// The declared default value.
    #[must_use]
    pub const fn default_value(&self) -> &T {
        &self.default
    }

    /// Number of materialized slots (not the number of registered states).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the subscribed registry is still alive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.registry.strong_count() > 0
    }

    /// Whether this store is subscribed to `registry`.
    #[must_use]
    pub fn is_subscribed_to(&self, registry: &StateRegistry) -> bool {
        std::ptr::eq(self.registry.as_ptr(), Arc::as_ptr(registry.token()))
    }

    /// Free all storage if the registry has been torn down.
    ///
    /// Returns `true` if storage was released.
    pub fn release_if_orphaned(&mut self) -> bool {
        if self.is_valid() {
            return false;
        }
        self.entries = Vec::new();
        true
    }
}

impl<T: Clone> Index<StateId> for PerStateStore<T> {
    type Output = T;

    fn index(&self, id: StateId) -> &T {
        self.get(id)
    }
}

impl<T: Clone> IndexMut<StateId> for PerStateStore<T> {
    fn index_mut(&mut self, id: StateId) -> &mut T {
        self.get_mut(id)
    }
}
