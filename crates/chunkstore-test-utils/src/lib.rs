//! Test fixtures and helpers for chunkstore development.
//!
//! Provides deterministic value/bit patterns (seeded ChaCha8), builders that
//! size and fill arrays from a pattern, an in-memory save/load round trip,
//! and a one-line `tracing` subscriber for tests that want log output.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use chunkstore::{BlockStore, ChunkArray, ChunkArrayBool, StoreError};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Install a test-friendly `tracing` subscriber.
///
/// Safe to call from every test: only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

/// Deterministic RNG for reproducible fixtures.
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `len` pseudo-random `u32` values derived from `seed`.
pub fn u32_pattern(len: usize, seed: u64) -> Vec<u32> {
    let mut rng = rng(seed);
    (0..len).map(|_| rng.next_u32()).collect()
}

/// `len` pseudo-random booleans derived from `seed`.
pub fn bit_pattern(len: usize, seed: u64) -> Vec<bool> {
    let mut rng = rng(seed);
    (0..len).map(|_| rng.next_u32() & 1 == 1).collect()
}

/// Number of `N`-element blocks needed to hold `len` elements.
pub fn chunks_for<const N: usize>(len: usize) -> usize {
    len.div_ceil(N)
}

/// A `ChunkArray` just large enough for `values`, holding them at `0..len`.
pub fn filled_array<const N: usize>(values: &[u32]) -> ChunkArray<u32, N> {
    let mut array = ChunkArray::new();
    array.set_nb_chunks(chunks_for::<N>(values.len()));
    for (i, v) in values.iter().enumerate() {
        array[i] = *v;
    }
    array
}

/// A `ChunkArrayBool` just large enough for `bits`, holding them at `0..len`.
pub fn filled_bits<const N: usize>(bits: &[bool]) -> ChunkArrayBool<N> {
    let mut array = ChunkArrayBool::new();
    array.set_nb_chunks(chunks_for::<N>(bits.len()));
    for (i, b) in bits.iter().enumerate() {
        array.set_val(i, *b);
    }
    array
}

/// Save `src` (first `nb_lines` elements) into memory, load it into `dst`,
/// and return the encoded bytes.
pub fn roundtrip(
    src: &dyn BlockStore,
    nb_lines: usize,
    dst: &mut dyn BlockStore,
) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    src.save(&mut buf, nb_lines)?;
    dst.load(&mut buf.as_slice())?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_are_deterministic() {
        assert_eq!(u32_pattern(16, 7), u32_pattern(16, 7));
        assert_ne!(u32_pattern(16, 7), u32_pattern(16, 8));
        assert_eq!(bit_pattern(64, 3), bit_pattern(64, 3));
    }

    #[test]
    fn filled_array_is_minimal() {
        let values = u32_pattern(33, 1);
        let array = filled_array::<32>(&values);
        assert_eq!(array.nb_chunks(), 2);
        assert_eq!(array[32], values[32]);
    }

    #[test]
    fn filled_bits_matches_pattern() {
        let bits = bit_pattern(100, 2);
        let array = filled_bits::<64>(&bits);
        assert_eq!(array.nb_chunks(), 2);
        assert!(bits.iter().enumerate().all(|(i, b)| array.get(i) == *b));
    }
}
