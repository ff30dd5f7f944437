//! Bit-packed boolean chunked arrays.
//!
//! [`ChunkArrayBool`] stores one logical boolean per bit. A block of `N`
//! elements is `N / 32` `u32` words, so a marker table over a million
//! elements costs 128KB instead of 1MB or 4MB.

use std::any::Any;
use std::io::{Read, Write};
use std::ops::Index;

use crate::codec::{self, ChunkHeader};
use crate::config::{StoreConfig, DEFAULT_CHUNK_SIZE};
use crate::error::StoreError;
use crate::index::{bit_location, round_up_to_word, split, words_per_chunk, ChunkSize};
use crate::store::{BlockStore, ChunkPointers};

/// A growable array of booleans packed 32 per `u32` word, in blocks of `N`.
///
/// Logical capacity matches [`ChunkArray`](crate::ChunkArray) with the same
/// `N`: the same global index addresses the same block in both forms.
pub struct ChunkArrayBool<const N: usize = { DEFAULT_CHUNK_SIZE }> {
    chunks: Vec<Box<[u32]>>,
}

impl<const N: usize> ChunkArrayBool<N> {
    /// Logical elements per block.
    pub const CHUNK_SIZE: usize = N;

    /// Create an empty array with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default())
    }

    /// Create an empty array, reserving block table slots per `config`.
    pub fn with_config(config: &StoreConfig) -> Self {
        let () = ChunkSize::<N>::ASSERT_VALID;
        Self {
            chunks: Vec::with_capacity(config.reserve_chunks),
        }
    }

    /// Allocate one all-false block and append it.
    pub fn add_chunk(&mut self) {
        self.chunks
            .push(vec![0u32; words_per_chunk::<N>()].into_boxed_slice());
    }

    /// Grow or shrink to exactly `nb_chunks` blocks.
    pub fn set_nb_chunks(&mut self, nb_chunks: usize) {
        let before = self.chunks.len();
        if nb_chunks >= before {
            self.chunks.reserve(nb_chunks - before);
            for _ in before..nb_chunks {
                self.add_chunk();
            }
        } else {
            self.chunks.truncate(nb_chunks);
        }
        if before != nb_chunks {
            tracing::debug!(
                element = "bool",
                chunk_size = N,
                from = before,
                to = nb_chunks,
                "resized chunk array"
            );
        }
    }

    /// Number of allocated blocks.
    #[inline]
    pub fn nb_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Number of addressable booleans (`nb_chunks() * N`).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.chunks.len() * N
    }

    /// Number of `u32` storage words (`capacity() / 32`).
    #[inline]
    pub fn word_capacity(&self) -> usize {
        self.chunks.len() * words_per_chunk::<N>()
    }

    /// Drop every block.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Read the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.capacity()` (always in debug builds; in
    /// release builds through the underlying slice access).
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        let (chunk, word, mask) = self.locate(index);
        self.chunks[chunk][word] & mask != 0
    }

    /// Set the bit at `index`.
    #[inline]
    pub fn set_true(&mut self, index: usize) {
        let (chunk, word, mask) = self.locate(index);
        self.chunks[chunk][word] |= mask;
    }

    /// Clear the bit at `index`, leaving its neighbours untouched.
    #[inline]
    pub fn set_false(&mut self, index: usize) {
        let (chunk, word, mask) = self.locate(index);
        self.chunks[chunk][word] &= !mask;
    }

    /// Write `value` at `index`.
    #[inline]
    pub fn set_val(&mut self, index: usize, value: bool) {
        if value {
            self.set_true(index);
        } else {
            self.set_false(index);
        }
    }

    /// Zero the whole 32-bit word holding `index`.
    ///
    /// # Data loss
    ///
    /// This clears `index` **and the 31 other elements sharing its word**
    /// (indices `index & !31 ..= index | 31`). It is only correct inside a
    /// pass that sets every element of the array (or at least of each touched
    /// word) to `false`, such as resetting a marker. Using it anywhere a
    /// neighbouring bit must survive silently corrupts the array. Use
    /// [`set_false`](Self::set_false) otherwise.
    #[inline]
    pub fn set_false_dirty(&mut self, index: usize) {
        let (chunk, word, _) = self.locate(index);
        self.chunks[chunk][word] = 0;
    }

    /// Reset the bit at `index` to `false`.
    #[inline]
    pub fn init_elt(&mut self, index: usize) {
        self.set_false(index);
    }

    /// Copy the bit at `src` into `dst`.
    #[inline]
    pub fn copy_elt(&mut self, dst: usize, src: usize) {
        self.set_val(dst, self.get(src));
    }

    /// Exchange the bits at `a` and `b`.
    #[inline]
    pub fn swap_elt(&mut self, a: usize, b: usize) {
        let bit_a = self.get(a);
        self.set_val(a, self.get(b));
        self.set_val(b, bit_a);
    }

    /// Number of set bits across every allocated block.
    pub fn count_ones(&self) -> usize {
        self.chunks
            .iter()
            .flat_map(|c| c.iter())
            .map(|w| w.count_ones() as usize)
            .sum()
    }

    /// The `N / 32` storage words of block `chunk`.
    ///
    /// # Panics
    ///
    /// Panics if `chunk >= self.nb_chunks()`.
    pub fn chunk_words(&self, chunk: usize) -> &[u32] {
        &self.chunks[chunk]
    }

    #[inline(always)]
    fn locate(&self, index: usize) -> (usize, usize, u32) {
        debug_assert!(
            index < self.capacity(),
            "index {index} out of range for bool chunk array of capacity {}",
            self.capacity()
        );
        let (chunk, offset) = split::<N>(index);
        let (word, mask) = bit_location(offset);
        (chunk, word, mask)
    }
}

impl<const N: usize> Default for ChunkArrayBool<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for ChunkArrayBool<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkArrayBool")
            .field("chunk_size", &N)
            .field("nb_chunks", &self.chunks.len())
            .field("ones", &self.count_ones())
            .finish()
    }
}

impl<const N: usize> Index<usize> for ChunkArrayBool<N> {
    type Output = bool;

    #[inline]
    fn index(&self, index: usize) -> &bool {
        if self.get(index) {
            &true
        } else {
            &false
        }
    }
}

impl<const N: usize> BlockStore for ChunkArrayBool<N> {
    fn add_chunk(&mut self) {
        Self::add_chunk(self);
    }

    fn set_nb_chunks(&mut self, nb_chunks: usize) {
        Self::set_nb_chunks(self, nb_chunks);
    }

    fn nb_chunks(&self) -> usize {
        Self::nb_chunks(self)
    }

    fn capacity(&self) -> usize {
        Self::capacity(self)
    }

    fn chunk_size(&self) -> usize {
        N
    }

    fn chunk_bytes(&self) -> usize {
        N / 8
    }

    fn element_type_name(&self) -> &'static str {
        "bool"
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn chunks_pointers(&self) -> ChunkPointers<'_> {
        ChunkPointers {
            chunks: self
                .chunks
                .iter()
                .map(|c| bytemuck::cast_slice::<u32, u8>(c))
                .collect(),
            block_bytes: N / 8,
        }
    }

    fn init_elt(&mut self, index: usize) {
        Self::init_elt(self, index);
    }

    fn copy_elt(&mut self, dst: usize, src: usize) {
        Self::copy_elt(self, dst, src);
    }

    fn swap_elt(&mut self, a: usize, b: usize) {
        Self::swap_elt(self, a, b);
    }

    fn clone_empty(&self) -> Box<dyn BlockStore> {
        Box::new(Self::new())
    }

    /// Bit-packed payloads are written in whole words: `nb_lines` is rounded
    /// up to a multiple of 32 before the header is written.
    fn save(&self, w: &mut dyn Write, nb_lines: usize) -> Result<(), StoreError> {
        let capacity = self.capacity();
        if nb_lines > capacity {
            return Err(StoreError::LineCountExceedsCapacity {
                lines: nb_lines,
                capacity,
            });
        }
        let rounded = round_up_to_word(nb_lines);
        let header = ChunkHeader::new(self.chunks.len(), rounded, N / 8)?;
        codec::encode_chunks(
            w,
            &header,
            N,
            self.chunks
                .iter()
                .map(|c| bytemuck::cast_slice::<u32, u8>(c)),
        )?;
        tracing::debug!(
            element = "bool",
            nb_chunks = header.nb_chunks,
            nb_lines = header.nb_lines,
            bytes = header.encoded_len(N),
            "saved chunk array"
        );
        Ok(())
    }

    fn load(&mut self, r: &mut dyn Read) -> Result<(), StoreError> {
        let header = codec::decode_header(r, N, N / 8, "bool")?;
        Self::set_nb_chunks(self, header.nb_chunks as usize);
        codec::decode_chunks(
            r,
            &header,
            N,
            self.chunks
                .iter_mut()
                .map(|c| bytemuck::cast_slice_mut::<u32, u8>(c)),
        )?;
        tracing::debug!(
            element = "bool",
            nb_chunks = header.nb_chunks,
            nb_lines = header.nb_lines,
            "loaded chunk array"
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::HEADER_BYTES;
    use crate::ChunkArray;

    type Bits = ChunkArrayBool<64>;

    fn bits(nb_chunks: usize) -> Bits {
        let mut b = Bits::new();
        b.set_nb_chunks(nb_chunks);
        b
    }

    #[test]
    fn new_chunk_is_all_false() {
        let b = bits(2);
        assert_eq!(b.capacity(), 128);
        assert_eq!(b.word_capacity(), 4);
        assert!((0..128).all(|i| !b.get(i)));
        assert_eq!(b.count_ones(), 0);
    }

    #[test]
    fn set_true_and_false_touch_one_bit() {
        let mut b = bits(1);
        b.set_true(3);
        b.set_true(4);
        b.set_true(63);
        assert!(b.get(3) && b.get(4) && b.get(63));
        assert_eq!(b.chunk_words(0), &[0b11000u32, 1u32 << 31][..]);
        b.set_false(3);
        assert!(!b.get(3));
        assert!(b.get(4));
    }

    #[test]
    fn set_val_delegates() {
        let mut b = bits(1);
        b.set_val(10, true);
        assert!(b[10]);
        b.set_val(10, false);
        assert!(!b[10]);
    }

    #[test]
    fn set_false_dirty_clears_whole_word() {
        let mut b = bits(2);
        for i in [64, 70, 95, 96] {
            b.set_true(i);
        }
        b.set_false_dirty(70);
        // 64 and 95 share 70's word and are wiped with it.
        assert!(!b.get(64));
        assert!(!b.get(70));
        assert!(!b.get(95));
        // 96 lives in the next word.
        assert!(b.get(96));
    }

    #[test]
    fn set_false_keeps_neighbours() {
        let mut b = bits(1);
        b.set_true(1);
        b.set_true(2);
        b.set_false(1);
        assert!(b.get(2));
    }

    #[test]
    fn copy_and_swap_elements() {
        let mut b = bits(2);
        b.set_true(5);
        b.copy_elt(100, 5);
        assert!(b.get(100));
        b.copy_elt(5, 6);
        assert!(!b.get(5));
        b.swap_elt(100, 7);
        assert!(!b.get(100));
        assert!(b.get(7));
        b.init_elt(7);
        assert!(!b.get(7));
    }

    #[test]
    fn shrink_discards_bits() {
        let mut b = bits(2);
        b.set_true(100);
        b.set_nb_chunks(1);
        assert_eq!(b.capacity(), 64);
        b.set_nb_chunks(2);
        assert!(!b.get(100));
    }

    #[test]
    #[should_panic]
    fn get_beyond_capacity_panics() {
        let b = bits(1);
        b.get(64);
    }

    #[test]
    fn chunks_pointers_are_word_bytes() {
        let mut b = bits(3);
        b.set_true(64);
        let ptrs = BlockStore::chunks_pointers(&b);
        assert_eq!(ptrs.len(), 3);
        assert_eq!(ptrs.block_bytes, 8);
        assert!(ptrs.chunks.iter().all(|c| c.len() == 8));
        assert_eq!(&ptrs.chunks[1][0..4], &1u32.to_ne_bytes());
    }

    #[test]
    fn save_rounds_lines_to_word() {
        let mut b = bits(2);
        b.set_true(65);
        let mut buf = Vec::new();
        b.save(&mut buf, 70).unwrap();
        // 70 rounds to 96: first chunk in full (8 bytes), 32 bits of the last.
        assert_eq!(&buf[4..8], &96u32.to_ne_bytes());
        assert_eq!(&buf[8..12], &8u32.to_ne_bytes());
        assert_eq!(buf.len(), HEADER_BYTES + 8 + 4);
    }

    #[test]
    fn save_load_roundtrip() {
        let mut b = bits(3);
        for i in [0, 31, 32, 63, 64, 130, 140] {
            b.set_true(i);
        }
        let mut buf = Vec::new();
        b.save(&mut buf, 141).unwrap();

        let mut c = Bits::new();
        c.load(&mut buf.as_slice()).unwrap();
        assert_eq!(c.nb_chunks(), 3);
        for i in 0..141 {
            assert_eq!(c.get(i), b.get(i), "bit {i}");
        }
    }

    #[test]
    fn save_rejects_lines_beyond_capacity() {
        let b = bits(1);
        let mut buf = Vec::new();
        assert!(matches!(
            b.save(&mut buf, 65),
            Err(StoreError::LineCountExceedsCapacity { .. })
        ));
    }

    #[test]
    fn load_rejects_typed_stream() {
        let mut a = ChunkArray::<u32, 64>::new();
        a.add_chunk();
        let mut buf = Vec::new();
        a.save(&mut buf, 64).unwrap();

        let mut b = Bits::new();
        assert!(matches!(
            b.load(&mut buf.as_slice()),
            Err(StoreError::ChunkSizeMismatch {
                expected: 8,
                found: 256
            })
        ));
        assert_eq!(b.nb_chunks(), 0);
    }

    #[test]
    fn empty_roundtrip() {
        let b = Bits::new();
        let mut buf = Vec::new();
        b.save(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), HEADER_BYTES);
        let mut c = bits(4);
        c.load(&mut buf.as_slice()).unwrap();
        assert_eq!(c.nb_chunks(), 0);
    }

    #[test]
    fn clone_empty_is_bool_store() {
        let b = bits(2);
        let c = BlockStore::clone_empty(&b);
        assert_eq!(c.nb_chunks(), 0);
        assert_eq!(c.element_type_name(), "bool");
        assert!(c.as_any().downcast_ref::<Bits>().is_some());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn capacity_matches_typed_form(n in 0usize..32) {
                let b = bits(n);
                prop_assert_eq!(b.capacity(), n * 64);
                prop_assert_eq!(b.word_capacity(), n * 2);
            }

            #[test]
            fn swap_twice_restores(
                pattern in proptest::collection::vec(any::<bool>(), 128),
                a in 0usize..128,
                c in 0usize..128,
            ) {
                let mut b = bits(2);
                for (i, v) in pattern.iter().enumerate() {
                    b.set_val(i, *v);
                }
                b.swap_elt(a, c);
                b.swap_elt(a, c);
                for (i, v) in pattern.iter().enumerate() {
                    prop_assert_eq!(b.get(i), *v);
                }
            }

            #[test]
            fn dirty_clear_wipes_exactly_one_word(index in 0usize..128) {
                let mut b = bits(2);
                for i in 0..128 {
                    b.set_true(i);
                }
                b.set_false_dirty(index);
                let word = index / 32;
                for i in 0..128 {
                    prop_assert_eq!(b.get(i), i / 32 != word);
                }
            }

            #[test]
            fn roundtrip_preserves_prefix(
                pattern in proptest::collection::vec(any::<bool>(), 0..256),
            ) {
                let k = pattern.len();
                let mut b = bits(k.div_ceil(64));
                for (i, v) in pattern.iter().enumerate() {
                    b.set_val(i, *v);
                }
                let mut buf = Vec::new();
                b.save(&mut buf, k).unwrap();

                let mut c = Bits::new();
                c.load(&mut buf.as_slice()).unwrap();
                for (i, v) in pattern.iter().enumerate() {
                    prop_assert_eq!(c.get(i), *v);
                }
            }
        }
    }
}
