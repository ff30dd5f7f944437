//! Typed chunked arrays.
//!
//! A [`ChunkArray`] stores its elements in fixed-size blocks of `N` values,
//! each block a separate boxed slice owned by the block table. Growing the
//! array appends blocks and never moves existing ones.

use std::any::Any;
use std::io::{Read, Write};
use std::ops::{Index, IndexMut};

use bytemuck::Pod;

use crate::codec::{self, ChunkHeader};
use crate::config::{StoreConfig, DEFAULT_CHUNK_SIZE};
use crate::error::StoreError;
use crate::index::{split, ChunkSize};
use crate::store::{BlockStore, ChunkPointers};

/// A growable array of `T` split into blocks of `N` elements.
///
/// `N` must be a power of two and at least 32; other values fail to compile
/// when the array is constructed.
///
/// Element access is O(1) through `array[i]`. Indices must lie below
/// [`capacity`](Self::capacity); see the [`BlockStore`] index contract.
pub struct ChunkArray<T, const N: usize = { DEFAULT_CHUNK_SIZE }> {
    chunks: Vec<Box<[T]>>,
}

impl<T: Default, const N: usize> ChunkArray<T, N> {
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

    /// Allocate one block of `N` default values and append it.
    pub fn add_chunk(&mut self) {
        let chunk: Box<[T]> = (0..N).map(|_| T::default()).collect();
        self.chunks.push(chunk);
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
                element = std::any::type_name::<T>(),
                chunk_size = N,
                from = before,
                to = nb_chunks,
                "resized chunk array"
            );
        }
    }

    /// Reset the element at `index` to `T::default()`.
    #[inline]
    pub fn init_elt(&mut self, index: usize) {
        self[index] = T::default();
    }
}

impl<T, const N: usize> ChunkArray<T, N> {
    /// Logical elements per block.
    pub const CHUNK_SIZE: usize = N;

    /// Number of allocated blocks.
    #[inline]
    pub fn nb_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Number of addressable elements (`nb_chunks() * N`).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.chunks.len() * N
    }

    /// Drop every block.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Shared reference to the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.capacity()` (always in debug builds; in
    /// release builds through the underlying slice access).
    #[inline]
    pub fn get(&self, index: usize) -> &T {
        self.debug_check(index);
        let (chunk, offset) = split::<N>(index);
        &self.chunks[chunk][offset]
    }

    /// Mutable reference to the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.capacity()`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        self.debug_check(index);
        let (chunk, offset) = split::<N>(index);
        &mut self.chunks[chunk][offset]
    }

    /// Overwrite the element at `index`.
    ///
    /// Same write API as [`ChunkArrayBool::set_val`](crate::ChunkArrayBool::set_val),
    /// for call sites generic over both forms.
    #[inline]
    pub fn set_val(&mut self, index: usize, value: T) {
        *self.get_mut(index) = value;
    }

    /// Exchange the elements at `a` and `b`.
    pub fn swap_elt(&mut self, a: usize, b: usize) {
        self.debug_check(a);
        self.debug_check(b);
        let (chunk_a, off_a) = split::<N>(a);
        let (chunk_b, off_b) = split::<N>(b);
        if chunk_a == chunk_b {
            self.chunks[chunk_a].swap(off_a, off_b);
            return;
        }
        let ((lo, lo_off), (hi, hi_off)) = if chunk_a < chunk_b {
            ((chunk_a, off_a), (chunk_b, off_b))
        } else {
            ((chunk_b, off_b), (chunk_a, off_a))
        };
        let (head, tail) = self.chunks.split_at_mut(hi);
        std::mem::swap(&mut head[lo][lo_off], &mut tail[0][hi_off]);
    }

    /// The `N` elements of block `chunk`.
    ///
    /// # Panics
    ///
    /// Panics if `chunk >= self.nb_chunks()`.
    pub fn chunk(&self, chunk: usize) -> &[T] {
        &self.chunks[chunk]
    }

    /// Mutable access to the `N` elements of block `chunk`.
    ///
    /// # Panics
    ///
    /// Panics if `chunk >= self.nb_chunks()`.
    pub fn chunk_mut(&mut self, chunk: usize) -> &mut [T] {
        &mut self.chunks[chunk]
    }

    #[inline(always)]
    fn debug_check(&self, index: usize) {
        debug_assert!(
            index < self.capacity(),
            "index {index} out of range for chunk array of capacity {}",
            self.capacity()
        );
    }
}

impl<T: Clone, const N: usize> ChunkArray<T, N> {
    /// Copy the element at `src` into `dst`.
    #[inline]
    pub fn copy_elt(&mut self, dst: usize, src: usize) {
        let value = self.get(src).clone();
        self.set_val(dst, value);
    }
}

impl<T: Default, const N: usize> Default for ChunkArray<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> std::fmt::Debug for ChunkArray<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkArray")
            .field("element", &std::any::type_name::<T>())
            .field("chunk_size", &N)
            .field("nb_chunks", &self.chunks.len())
            .finish()
    }
}

impl<T, const N: usize> Index<usize> for ChunkArray<T, N> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        self.get(index)
    }
}

impl<T, const N: usize> IndexMut<usize> for ChunkArray<T, N> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.get_mut(index)
    }
}

impl<T: Pod + Default, const N: usize> BlockStore for ChunkArray<T, N> {
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
        N * std::mem::size_of::<T>()
    }

    fn element_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn chunks_pointers(&self) -> ChunkPointers<'_> {
        ChunkPointers {
            chunks: self
                .chunks
                .iter()
                .map(|c| bytemuck::cast_slice::<T, u8>(c))
                .collect(),
            block_bytes: self.chunk_bytes(),
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

    fn save(&self, w: &mut dyn Write, nb_lines: usize) -> Result<(), StoreError> {
        let capacity = self.capacity();
        if nb_lines > capacity {
            return Err(StoreError::LineCountExceedsCapacity {
                lines: nb_lines,
                capacity,
            });
        }
        let header = ChunkHeader::new(self.chunks.len(), nb_lines, self.chunk_bytes())?;
        codec::encode_chunks(
            w,
            &header,
            N,
            self.chunks.iter().map(|c| bytemuck::cast_slice::<T, u8>(c)),
        )?;
        tracing::debug!(
            element = std::any::type_name::<T>(),
            nb_chunks = header.nb_chunks,
            nb_lines = header.nb_lines,
            bytes = header.encoded_len(N),
            "saved chunk array"
        );
        Ok(())
    }

    fn load(&mut self, r: &mut dyn Read) -> Result<(), StoreError> {
        let header = codec::decode_header(
            r,
            N,
            self.chunk_bytes(),
            std::any::type_name::<T>(),
        )?;
        Self::set_nb_chunks(self, header.nb_chunks as usize);
        codec::decode_chunks(
            r,
            &header,
            N,
            self.chunks
                .iter_mut()
                .map(|c| bytemuck::cast_slice_mut::<T, u8>(c)),
        )?;
        tracing::debug!(
            element = std::any::type_name::<T>(),
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
