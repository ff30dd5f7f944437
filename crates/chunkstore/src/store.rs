//! The type-erased block store interface.
//!
//! [`BlockStore`] is what the topology layer holds on to: one boxed store per
//! attribute, each hiding its element type and block size. Every concrete
//! array in this crate implements it.

use std::any::Any;
use std::io::{Read, Write};

use crate::error::StoreError;

/// Capability contract shared by every chunked array.
///
/// The trait is object safe; heterogeneous attribute tables hold
/// `Box<dyn BlockStore>` and downcast through [`as_any`](Self::as_any) when
/// they need the concrete array back.
///
/// # Index contract
///
/// Element operations take global indices that must lie inside an allocated
/// block (`index < self.capacity()`). The store does not validate this:
/// debug builds assert, release builds panic on the underlying slice access.
/// Tracking which of the allocated slots are live is the caller's job.
pub trait BlockStore: Any {
    /// Allocate and append one block with every element at its default.
    fn add_chunk(&mut self);

    /// Grow or shrink the block table to exactly `nb_chunks` blocks.
    ///
    /// Shrinking drops blocks `[nb_chunks, self.nb_chunks())` and their
    /// contents. No check against live elements is made.
    fn set_nb_chunks(&mut self, nb_chunks: usize);

    /// Number of allocated blocks.
    fn nb_chunks(&self) -> usize;

    /// Number of addressable logical elements: `nb_chunks() * chunk_size()`.
    fn capacity(&self) -> usize;

    /// Logical elements per block (the compile-time block size).
    fn chunk_size(&self) -> usize;

    /// Byte size of one block, as recorded in the serialization header.
    fn chunk_bytes(&self) -> usize;

    /// Name of the stored element type, for diagnostics.
    fn element_type_name(&self) -> &'static str;

    /// Drop every block.
    fn clear(&mut self);

    /// Borrow the raw bytes of every block, in table order.
    fn chunks_pointers(&self) -> ChunkPointers<'_>;

    /// Reset the element at `index` to its default (or `false`).
    fn init_elt(&mut self, index: usize);

    /// Copy the element at `src` into `dst`.
    fn copy_elt(&mut self, dst: usize, src: usize);

    /// Exchange the elements at `a` and `b`.
    fn swap_elt(&mut self, a: usize, b: usize);

    /// A new, empty store of the same concrete type and block size.
    ///
    /// Contents are not copied.
    fn clone_empty(&self) -> Box<dyn BlockStore>;

    /// Serialize the first `nb_lines` logical elements.
    ///
    /// All blocks but the last are written in full; the last block is
    /// truncated to end at `nb_lines`.
    fn save(&self, w: &mut dyn Write, nb_lines: usize) -> Result<(), StoreError>;

    /// Replace this store's block count and contents from a stream.
    ///
    /// The header's chunk byte size must match [`chunk_bytes`](Self::chunk_bytes);
    /// on mismatch the store is left unchanged. After any later failure the
    /// store has the header's block count and unspecified contents.
    fn load(&mut self, r: &mut dyn Read) -> Result<(), StoreError>;

    /// Upcast for downcasting to the concrete array.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete array.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Borrowed byte views of every block of a store.
///
/// The views live as long as the shared borrow of the store, so they can be
/// handed to bulk consumers (GPU upload, memory-mapped writers) but can never
/// be used to free or resize blocks.
#[derive(Clone, Debug)]
pub struct ChunkPointers<'a> {
    /// One view per block, each exactly `block_bytes` long.
    pub chunks: Vec<&'a [u8]>,
    /// Byte size of one block.
    pub block_bytes: usize,
}

impl<'a> ChunkPointers<'a> {
    /// Number of exported blocks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the store had no blocks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Raw base addresses of the blocks.
    pub fn addresses(&self) -> impl Iterator<Item = *const u8> + '_ {
        self.chunks.iter().map(|c| c.as_ptr())
    }
}
