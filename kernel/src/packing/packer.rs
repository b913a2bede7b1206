//! `IntPacker`: fixed bit layout mapping variable values into words.
//!
//! # Layout
//!
//! Each variable gets `width = ceil(log2(domain_size))` bits (0 for a
//! single-value domain). Variables are placed greedily in index order: a
//! variable goes into the current word if its width fits the remaining bits,
//! otherwise a new word is opened. A variable never straddles two words, so
//! `get`/`set` are one mask and one shift.
//!
//! The layout is deterministic but not minimal in word count. Code that reads
//! packed words directly relies on this exact placement.

use crate::packing::{Word, WORD_BITS};

/// Configuration error raised while computing a layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackerError {
    /// A variable has no values.
    #[error("variable {var} has an empty domain")]
    EmptyDomain { var: usize },
    /// A variable needs more bits than one word holds.
    #[error("variable {var} needs {width} bits, a word holds {WORD_BITS}")]
    WidthExceedsWord { var: usize, width: u32 },
}

/// Location and masks of one variable inside a packed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VarSlot {
    word: usize,
    shift: u32,
    width: u32,
    /// Bits of this variable, in place.
    read_mask: Word,
    /// Complement of `read_mask`.
    clear_mask: Word,
}

impl VarSlot {
    fn new(word: usize, shift: u32, width: u32) -> Self {
        // Zero-width slots read as 0 through an empty mask; pin their shift
        // to 0 so it never reaches WORD_BITS.
        let shift = if width == 0 { 0 } else { shift };
        let read_mask = if width == 0 {
            0
        } else {
            (Word::MAX >> (WORD_BITS - width)) << shift
        };
        Self {
            word,
            shift,
            width,
            read_mask,
            clear_mask: !read_mask,
        }
    }
}

/// Bit packer for one fixed list of domain sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntPacker {
    slots: Vec<VarSlot>,
    num_words: usize,
}

/// Number of bits needed to store values `0..domain_size`.
#[must_use]
pub fn bit_width(domain_size: usize) -> u32 {
    match domain_size {
        0 | 1 => 0,
        n => usize::BITS - (n - 1).leading_zeros(),
    }
}

impl IntPacker {
    /// Compute the layout for `domain_sizes`.
    ///
    /// # Errors
    ///
    /// Returns [`PackerError::EmptyDomain`] for a zero domain size and
    /// [`PackerError::WidthExceedsWord`] when a domain needs more than
    /// [`WORD_BITS`] bits.
    pub fn new(domain_sizes: &[usize]) -> Result<Self, PackerError> {
        let mut slots = Vec::with_capacity(domain_sizes.len());
        let mut num_words = 0usize;
        let mut free_bits = 0u32;

        for (var, &domain_size) in domain_sizes.iter().enumerate() {
            if domain_size == 0 {
                return Err(PackerError::EmptyDomain { var });
            }
            let width = bit_width(domain_size);
            if width > WORD_BITS {
                return Err(PackerError::WidthExceedsWord { var, width });
            }
            if num_words == 0 || width > free_bits {
                num_words += 1;
                free_bits = WORD_BITS;
            }
            let shift = WORD_BITS - free_bits;
            slots.push(VarSlot::new(num_words - 1, shift, width));
            free_bits -= width;
        }

        Ok(Self { slots, num_words })
    }

    /// Words per packed record.
    #[must_use]
    pub const fn num_words(&self) -> usize {
        self.num_words
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.slots.len()
    }

    /// Bits actually occupied by variables (excludes word padding).
    #[must_use]
    pub fn bits_used(&self) -> u64 {
        self.slots.iter().map(|s| u64::from(s.width)).sum()
    }

    /// `(word, shift, width)` of `var`.
    #[must_use]
    pub fn placement(&self, var: usize) -> (usize, u32, u32) {
        let slot = &self.slots[var];
        (slot.word, slot.shift, slot.width)
    }

    /// Read the value of `var` from a packed record.
    #[inline]
    #[must_use]
    pub fn get(&self, words: &[Word], var: usize) -> u32 {
        let slot = &self.slots[var];
        (words[slot.word] & slot.read_mask) >> slot.shift
    }

    /// Overwrite the value of `var` in a packed record.
    ///
    /// `value` must lie in the variable's domain; this is only checked in
    /// debug builds.
    #[inline]
    pub fn set(&self, words: &mut [Word], var: usize, value: u32) {
        let slot = &self.slots[var];
        debug_assert!(
            slot.width == WORD_BITS || value >> slot.width == 0,
            "value {value} does not fit the {}-bit slot of variable {var}",
            slot.width
        );
        let word = &mut words[slot.word];
        *word = (*word & slot.clear_mask) | ((value << slot.shift) & slot.read_mask);
    }

    /// Pack a full assignment into `words` (length [`num_words`](Self::num_words)).
    pub fn pack(&self, values: &[u32], words: &mut [Word]) {
        debug_assert_eq!(values.len(), self.slots.len());
        words.fill(0);
        for (var, &value) in values.iter().enumerate() {
            self.set(words, var, value);
        }
    }

    /// Unpack a record into a fresh value vector.
    #[must_use]
    pub fn unpack(&self, words: &[Word]) -> Vec<u32> {
        let mut values = Vec::with_capacity(self.slots.len());
        self.unpack_into(words, &mut values);
        values
    }

    /// Unpack a record into `values`, reusing its allocation.
    pub fn unpack_into(&self, words: &[Word], values: &mut Vec<u32>) {
        values.clear();
        values.extend((0..self.slots.len()).map(|var| self.get(words, var)));
    }
}
