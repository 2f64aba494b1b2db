//! # Bitmask Words
//!
//! Fixed-width word arithmetic plus the growable word-array mask that backs
//! both entity records and filter signatures.
//!
//! At 64 pools per `u64`, a one-word mask covers most worlds; the array grows
//! one zero word at a time as more pools are bound, and every mask in a world
//! is kept at the same width by the allocator (growth ordering: records
//! first, then filter masks).

/// Number of bits in one mask word.
pub const WORD_BITS: usize = 64;

/// Sets or clears a single bit of a word.
///
/// # Arguments
///
/// * `word` - The word to modify
/// * `index` - Bit position within the word (0..64)
/// * `on` - Desired bit value
#[inline]
#[must_use]
pub(crate) fn set_word_bit(word: u64, index: usize, on: bool) -> u64 {
    // Out-of-range indices cannot be produced through the public surface;
    // this is a debug-time assertion, not a caller-visible error.
    debug_assert!(index < WORD_BITS, "bit index {index} outside word");
    let mask = 1u64 << index;
    if on {
        word | mask
    } else {
        word & !mask
    }
}

/// Reads a single bit of a word.
#[inline]
#[must_use]
pub(crate) fn word_bit(word: u64, index: usize) -> bool {
    debug_assert!(index < WORD_BITS, "bit index {index} outside word");
    (word >> index) & 1 == 1
}

/// A growable bitmask over pool ids.
///
/// Bit `p` addresses pool `p`: word `p / 64`, bit `p % 64`. Used both as the
/// per-entity membership record and as a filter's include/exclude signature.
/// All masks owned by one world share the same word count at all times
/// outside of an in-flight growth pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolMask {
    words: Vec<u64>,
}

impl PoolMask {
    /// Creates an all-zero mask with the given word count.
    #[must_use]
    pub fn new(word_count: usize) -> Self {
        Self {
            words: vec![0; word_count],
        }
    }

    /// Returns the current word count.
    #[inline]
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Returns word `index`.
    #[inline]
    #[must_use]
    pub fn word(&self, index: usize) -> u64 {
        self.words[index]
    }

    /// Writes bit `bit`, returning `true` if the stored value changed.
    ///
    /// Idempotent: writing the already-present value is a no-op.
    pub fn set(&mut self, bit: usize, on: bool) -> bool {
        let word = bit / WORD_BITS;
        let index = bit % WORD_BITS;
        // A bit outside the current width means a pool was bound without the
        // coordinated growth pass - a growth-ordering bug, not user error.
        debug_assert!(
            word < self.words.len(),
            "bit {bit} outside mask of {} words",
            self.words.len()
        );
        if word_bit(self.words[word], index) == on {
            return false;
        }
        self.words[word] = set_word_bit(self.words[word], index, on);
        true
    }

    /// Reads bit `bit`.
    #[inline]
    #[must_use]
    pub fn get(&self, bit: usize) -> bool {
        let word = bit / WORD_BITS;
        let index = bit % WORD_BITS;
        debug_assert!(word < self.words.len(), "bit {bit} outside mask");
        word_bit(self.words[word], index)
    }

    /// Appends one zero word.
    #[inline]
    pub fn grow(&mut self) {
        self.words.push(0);
    }

    /// Grows by one word if `pools_amount` pools no longer fit.
    ///
    /// Returns `true` if the mask grew.
    pub fn update_pool_capacity(&mut self, pools_amount: usize) -> bool {
        if pools_amount <= self.words.len() * WORD_BITS {
            return false;
        }
        self.grow();
        true
    }

    /// `true` iff every word is zero.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Zeroes every word without changing the width.
    pub fn clear(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
    }
}
