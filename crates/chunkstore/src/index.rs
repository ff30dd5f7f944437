//! Two-level index arithmetic shared by both array forms.
//!
//! A global element index `i` lives in chunk `i / N` at offset `i % N`.
//! Boolean arrays further split the offset into a `u32` word and a bit mask.
//! `N` is always a power of two, so the divisions compile down to shifts.

/// Number of logical boolean elements packed into one storage word.
pub const BITS_PER_WORD: usize = u32::BITS as usize;

/// Compile-time validation of a block size.
///
/// Referencing [`ChunkSize::ASSERT_VALID`] from a constructor turns an
/// invalid `N` into a build error at the point of instantiation.
pub(crate) struct ChunkSize<const N: usize>;

impl<const N: usize> ChunkSize<N> {
    pub(crate) const ASSERT_VALID: () = assert!(
        N.is_power_of_two() && N >= BITS_PER_WORD,
        "chunk size must be a power of two and at least 32"
    );
}

/// Split a global element index into `(chunk, offset)`.
#[inline(always)]
pub const fn split<const N: usize>(index: usize) -> (usize, usize) {
    (index / N, index % N)
}

/// Locate a bit inside a boolean chunk: `(word, mask)` for a chunk offset.
#[inline(always)]
pub const fn bit_location(offset: usize) -> (usize, u32) {
    (offset / BITS_PER_WORD, 1u32 << (offset % BITS_PER_WORD))
}

/// Number of `u32` words backing one boolean chunk of `N` elements.
#[inline(always)]
pub const fn words_per_chunk<const N: usize>() -> usize {
    N / BITS_PER_WORD
}

/// Round an element count up to the next multiple of [`BITS_PER_WORD`].
#[inline]
pub const fn round_up_to_word(lines: usize) -> usize {
    lines.div_ceil(BITS_PER_WORD) * BITS_PER_WORD
}
