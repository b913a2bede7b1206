//! `SegmentedArena`: append-only storage for fixed-length packed records.
//!
//! Records live in fixed-capacity blocks. A block is allocated once and never
//! reallocated, so a record's storage never moves once written and the number
//! of allocations is `O(records / records_per_block)`.
//!
//! Indices are dense and monotonically increasing. The only removal is
//! [`SegmentedArena::pop`], which drops the most recent record so the
//! registry can discard a losing optimistic insert.

use crate::packing::Word;

/// Block size used when the caller does not pick one.
pub const DEFAULT_BLOCK_BYTES: usize = 8192;

/// Allocation failure while growing the arena.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("arena out of memory: failed to allocate {requested_bytes} bytes")]
    OutOfMemory { requested_bytes: usize },
}

/// Block-allocated store of `record_len`-word records.
#[derive(Debug)]
pub struct SegmentedArena {
    record_len: usize,
    records_per_block: usize,
    blocks: Vec<Box<[Word]>>,
    len: usize,
}

impl SegmentedArena {
    /// An empty arena. No block is allocated until the first push.
    ///
    /// A block holds `block_bytes / record size` records, and always at least
    /// one.
    #[must_use]
    pub fn new(record_len: usize, block_bytes: usize) -> Self {
        let record_bytes = record_len * std::mem::size_of::<Word>();
        let records_per_block = if record_bytes == 0 {
            usize::MAX
        } else {
            (block_bytes / record_bytes).max(1)
        };
        Self {
            record_len,
            records_per_block,
            blocks: Vec::new(),
            len: 0,
        }
    }

    /// Append a copy of `record`.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if a new block cannot be allocated.
    pub fn push(&mut self, record: &[Word]) -> Result<usize, ArenaError> {
        debug_assert_eq!(record.len(), self.record_len);
        self.push_with(|slot| slot.copy_from_slice(record))
    }

    /// Append a record by filling a fresh zeroed slot in place.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if a new block cannot be allocated.
    /// `fill` is not called in that case.
    pub fn push_with<F>(&mut self, fill: F) -> Result<usize, ArenaError>
    where
        F: FnOnce(&mut [Word]),
    {
        let index = self.len;
        if self.record_len == 0 {
            fill(&mut []);
            self.len += 1;
            return Ok(index);
        }

        let (block, offset) = self.locate(index);
        if block == self.blocks.len() {
            self.allocate_block()?;
        }
        let slot = &mut self.blocks[block][offset..offset + self.record_len];
        // A popped record may have left stale words behind.
        slot.fill(0);
        fill(slot);
        self.len += 1;
        Ok(index)
    }

    /// Record at `index`. Panics if `index >= len()`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> &[Word] {
        debug_assert!(index < self.len, "arena index {index} out of range (len {})", self.len);
        if self.record_len == 0 {
            return &[];
        }
        let (block, offset) = self.locate(index);
        &self.blocks[block][offset..offset + self.record_len]
    }

    /// Drop the most recently pushed record. Returns `false` if empty.
    ///
    /// Block storage is kept; the next push reuses the slot.
    pub fn pop(&mut self) -> bool {
        if self.len == 0 {
            return false;
        }
        self.len -= 1;
        true
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Words per record.
    #[must_use]
    pub const fn record_len(&self) -> usize {
        self.record_len
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub const fn records_per_block(&self) -> usize {
        self.records_per_block
    }

    /// Bytes held by allocated blocks.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.blocks.len() * self.block_words() * std::mem::size_of::<Word>()
    }

    /// `(block, word offset inside block)` of record `index`.
    #[inline]
    fn locate(&self, index: usize) -> (usize, usize) {
        (
            index / self.records_per_block,
            (index % self.records_per_block) * self.record_len,
        )
    }

    fn block_words(&self) -> usize {
        if self.record_len == 0 {
            0
        } else {
            self.records_per_block * self.record_len
        }
    }

    fn allocate_block(&mut self) -> Result<(), ArenaError> {
        let words = self.block_words();
        let requested_bytes = words * std::mem::size_of::<Word>();
        let oom = |_| ArenaError::OutOfMemory { requested_bytes };

        let mut storage: Vec<Word> = Vec::new();
        storage.try_reserve_exact(words).map_err(oom)?;
        storage.resize(words, 0);
        self.blocks.try_reserve(1).map_err(oom)?;
        self.blocks.push(storage.into_boxed_slice());

        tracing::trace!(
            blocks = self.blocks.len(),
            block_bytes = requested_bytes,
            "allocated arena block"
        );
        Ok(())
    }
}
