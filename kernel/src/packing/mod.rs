//! Packing module: bit layout of states and block storage of packed records.
//!
//! Depends on nothing else in the crate.

pub mod arena;
pub mod packer;

/// One storage word of a packed state.
pub type Word = u32;

/// Bits per [`Word`].
pub const WORD_BITS: u32 = Word::BITS;
