//! Reusable mark sets over bit-packed arrays.
//!
//! Traversals mark elements as visited, then reset every mark before the
//! next pass. [`Marker`] remembers what it marked so the reset only touches
//! those words, and clears them with
//! [`ChunkArrayBool::set_false_dirty`]: every bit it ever sets is reset in
//! the same pass, so wiping whole words is exact.
//!
//! The record holds at most one entry per storage word. Past that, the
//! marker stops recording and the next reset wipes every word instead.

use crate::bool_array::ChunkArrayBool;
use crate::config::DEFAULT_CHUNK_SIZE;
use crate::index::BITS_PER_WORD;

/// A set of marked element indices backed by a [`ChunkArrayBool`].
#[derive(Debug)]
pub struct Marker<const N: usize = { DEFAULT_CHUNK_SIZE }> {
    bits: ChunkArrayBool<N>,
    marked: Vec<usize>,
    saturated: bool,
}

impl<const N: usize> Marker<N> {
    /// Create a marker covering `nb_chunks` blocks, with nothing marked.
    pub fn new(nb_chunks: usize) -> Self {
        let mut bits = ChunkArrayBool::new();
        bits.set_nb_chunks(nb_chunks);
        Self {
            bits,
            marked: Vec::new(),
            saturated: false,
        }
    }

    /// Mark `index`. Marking twice is a no-op.
    pub fn mark(&mut self, index: usize) {
        if self.bits.get(index) {
            return;
        }
        self.bits.set_true(index);
        if self.marked.len() < self.bits.word_capacity() {
            self.marked.push(index);
        } else {
            self.saturated = true;
        }
    }

    /// Unmark `index`, leaving every other mark in place.
    pub fn unmark(&mut self, index: usize) {
        self.bits.set_false(index);
    }

    /// Whether `index` is currently marked.
    pub fn is_marked(&self, index: usize) -> bool {
        self.bits.get(index)
    }

    /// Number of indices currently marked.
    pub fn marked_count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Unmark everything.
    ///
    /// Cost is proportional to the number of marks recorded since the last
    /// reset, and never more writes than there are storage words.
    pub fn reset(&mut self) {
        if self.saturated {
            self.marked.clear();
            for word in 0..self.bits.word_capacity() {
                self.bits.set_false_dirty(word * BITS_PER_WORD);
            }
            self.saturated = false;
        } else {
            for index in self.marked.drain(..) {
                self.bits.set_false_dirty(index);
            }
        }
        debug_assert_eq!(self.bits.count_ones(), 0);
    }

    /// Follow the block count of the table being marked.
    ///
    /// Marks inside dropped blocks are forgotten.
    pub fn resize_chunks(&mut self, nb_chunks: usize) {
        self.bits.set_nb_chunks(nb_chunks);
        let capacity = self.bits.capacity();
        self.marked.retain(|&i| i < capacity);
        let words = self.bits.word_capacity();
        if self.marked.len() > words {
            self.marked.truncate(words);
            self.saturated = true;
        }
    }

    /// The underlying bit array.
    pub fn as_bits(&self) -> &ChunkArrayBool<N> {
        &self.bits
    }
}
