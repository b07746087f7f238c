//! Per-offset bit sets
//!
//! Both bookkeeping sets of a validation pass use one bit per byte of the
//! chunk: one for validated instruction starts, one for observed
//! control-transfer destinations. Each set is allocated for a single
//! validation and bits only ever go from clear to set within a pass.

/// Offsets covered by one backing word, and thus one jump-check group.
pub const OFFSETS_PER_WORD: usize = u32::BITS as usize;

/// Fixed-capacity bit set addressed by byte offset.
#[derive(Debug, Clone)]
pub struct OffsetBitmap {
    words: Vec<u32>,
    len: usize,
}

impl OffsetBitmap {
    /// Allocate an all-clear bitmap covering `len` byte offsets.
    pub fn new(len: usize) -> Self {
        OffsetBitmap {
            words: vec![0; len.div_ceil(OFFSETS_PER_WORD)],
            len,
        }
    }

    /// Number of offsets covered.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set the bit for `offset`. Offsets past the covered range are a
    /// caller bug; this panics rather than growing.
    pub fn set(&mut self, offset: usize) {
        debug_assert!(offset < self.len, "offset {offset} out of {}", self.len);
        self.words[offset / OFFSETS_PER_WORD] |= 1 << (offset % OFFSETS_PER_WORD);
    }

    pub fn is_set(&self, offset: usize) -> bool {
        debug_assert!(offset < self.len, "offset {offset} out of {}", self.len);
        self.words[offset / OFFSETS_PER_WORD] & (1 << (offset % OFFSETS_PER_WORD)) != 0
    }

    /// The backing words: [`OFFSETS_PER_WORD`] offsets per word, lowest
    /// offset in the lowest bit. Bits past `len` in the final word are
    /// never set.
    pub fn words(&self) -> &[u32] {
        &self.words
    }
}
