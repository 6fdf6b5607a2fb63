//! Shared constants for tessel-tiles.

// Grid resolution limits (cells per block axis)
pub(crate) const MIN_GRID_COUNT: u32 = 1;
pub(crate) const MAX_GRID_COUNT: u32 = 64;
pub(crate) const DEFAULT_GRID_COUNT: u32 = 16;

// Bitset configuration (u64-based)
pub(crate) const BITS_PER_WORD: usize = 64;
pub(crate) const WORD_INDEX_SHIFT: usize = 6; // log2(64)
pub(crate) const WORD_INDEX_MASK: usize = 63; // (1<<6) - 1
