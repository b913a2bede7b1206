//! `StatePool`: packer + arena + content-keyed dedup index.
//!
//! # Dedup
//!
//! The index stores [`StateId`]s, but hashes and compares the packed records
//! they point to, never the id value. Insertion is optimistic: the candidate
//! is written into a fresh arena slot first, then probed. If an equal record
//! already exists the fresh slot is popped again and the existing id is
//! returned; otherwise the fresh slot's index becomes the canonical id.
//!
//! Popping keeps ids dense, so the arena holds exactly one record per id.

use std::hash::Hasher;

use hashbrown::HashTable;
use rustc_hash::FxHasher;

use crate::model::fact::Fact;
use crate::packing::arena::SegmentedArena;
use crate::packing::packer::IntPacker;
use crate::packing::Word;
use crate::registry::state::State;
use crate::registry::state_id::StateId;
use crate::registry::{RegistryConfig, RegistryError, Resource};

/// Deduplicated packed storage for one variable set.
#[derive(Debug)]
pub struct StatePool {
    packer: IntPacker,
    arena: SegmentedArena,
    index: HashTable<StateId>,
}

fn hash_record(words: &[Word]) -> u64 {
    let mut hasher = FxHasher::default();
    for &word in words {
        hasher.write_u32(word);
    }
    hasher.finish()
}

impl StatePool {
    /// An empty pool for variables with `domain_sizes`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Layout`] if the domains cannot be packed,
    /// [`RegistryError::InvalidConfig`] for a bad `config`, and
    /// [`RegistryError::ResourceExhausted`] if the initial index capacity
    /// cannot be reserved.
    pub fn new(domain_sizes: &[usize], config: &RegistryConfig) -> Result<Self, RegistryError> {
        config.validate()?;
        let packer = IntPacker::new(domain_sizes)?;
        let arena = SegmentedArena::new(packer.num_words(), config.arena_block_bytes);

        let mut index = HashTable::new();
        if config.initial_index_capacity > 0 {
            // Empty table: the rehash callback is never invoked.
            index
                .try_reserve(config.initial_index_capacity, |_: &StateId| 0)
                .map_err(|_| RegistryError::ResourceExhausted {
                    resource: Resource::DedupIndex,
                    requested: config.initial_index_capacity,
                })?;
        }

        tracing::debug!(
            num_vars = packer.num_vars(),
            num_words = packer.num_words(),
            bits_used = packer.bits_used(),
            records_per_block = arena.records_per_block(),
            "created state pool"
        );
        Ok(Self {
            packer,
            arena,
            index,
        })
    }

    #[must_use]
    pub const fn packer(&self) -> &IntPacker {
        &self.packer
    }

    #[must_use]
    pub const fn arena(&self) -> &SegmentedArena {
        &self.arena
    }

    /// Number of distinct states.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Whether `id` was issued by this pool.
    #[must_use]
    pub const fn contains(&self, id: StateId) -> bool {
        !id.is_none() && id.index() < self.arena.len()
    }

    /// Packed record of `id`.
    #[must_use]
    pub fn packed(&self, id: StateId) -> &[Word] {
        debug_assert!(self.contains(id), "{id:?} not issued by this pool");
        self.arena.get(id.index())
    }

    /// Borrowed view of `id`.
    #[must_use]
    pub fn lookup(&self, id: StateId) -> State<'_> {
        State::new(id, &self.packer, self.packed(id))
    }

    /// Dedup index slots currently allocated.
    #[must_use]
    pub fn index_capacity(&self) -> usize {
        self.index.capacity()
    }

    /// Register a full unpacked assignment.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn insert_values(&mut self, values: &[u32]) -> Result<StateId, RegistryError> {
        debug_assert_eq!(values.len(), self.packer.num_vars());
        self.insert_or_pop(|packer, slot| packer.pack(values, slot))
    }

    /// Register `pre` with `assignments` applied in order (later facts win).
    ///
    /// Facts use this pool's variable numbering.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ResourceExhausted`] if storage cannot grow.
    pub fn insert_modified(
        &mut self,
        pre: &[Word],
        assignments: &[Fact],
    ) -> Result<StateId, RegistryError> {
        self.insert_or_pop(|packer, slot| {
            slot.copy_from_slice(pre);
            for fact in assignments {
                packer.set(slot, fact.var, fact.value);
            }
        })
    }

    /// Optimistic insert: write the candidate into a fresh slot via `fill`,
    /// then either keep it as a new canonical id or pop it in favor of an
    /// existing equal record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ResourceExhausted`] if the arena, the index,
    /// or the id space cannot grow. The pool is unchanged in that case.
    pub fn insert_or_pop<F>(&mut self, fill: F) -> Result<StateId, RegistryError>
    where
        F: FnOnce(&IntPacker, &mut [Word]),
    {
        let slot_index = self.arena.len();
        let candidate = StateId::from_index(slot_index).ok_or(RegistryError::ResourceExhausted {
            resource: Resource::IdSpace,
            requested: slot_index,
        })?;

        let packer = &self.packer;
        self.arena.push_with(|slot| fill(packer, slot))?;

        let arena = &self.arena;
        let record = arena.get(slot_index);
        let hash = hash_record(record);
        if let Some(&existing) = self
            .index
            .find(hash, |&other| arena.get(other.index()) == record)
        {
            self.arena.pop();
            return Ok(existing);
        }

        let rehash = |id: &StateId| hash_record(arena.get(id.index()));
        if self.index.len() == self.index.capacity() {
            if self.index.try_reserve(1, rehash).is_err() {
                let requested = self.index.len() + 1;
                self.arena.pop();
                return Err(RegistryError::ResourceExhausted {
                    resource: Resource::DedupIndex,
                    requested,
                });
            }
            tracing::trace!(capacity = self.index.capacity(), "grew dedup index");
        }
        self.index.insert_unique(hash, candidate, rehash);
        Ok(candidate)
    }
}
