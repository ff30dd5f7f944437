//! Chunked, growable typed arrays for per-element attribute tables.
//!
//! Attribute tables in a mesh library grow constantly while other code holds
//! on to element data. Instead of one contiguous buffer that relocates on
//! growth, every array here is a table of fixed-size blocks: adding capacity
//! appends a block and never moves the existing ones.
//!
//! # Architecture
//!
//! ```text
//! StoreTable<N> (named stores, lockstep block count)
//! └── Box<dyn BlockStore> per attribute
//!     ├── ChunkArray<T, N>     Vec<Box<[T]>>    N values per block
//!     └── ChunkArrayBool<N>    Vec<Box<[u32]>>  N bits per block (N/32 words)
//!
//! Marker<N> ── ChunkArrayBool<N> + list of marked indices
//! ```
//!
//! A global index `i` lives in block `i / N` at offset `i % N`. `N` is a
//! compile-time power of two, at least 32; [`DEFAULT_CHUNK_SIZE`] is 4096.
//!
//! # Index contract
//!
//! Element accessors do not validate indices against live data. An index
//! below `capacity()` is always valid; anything else is a caller bug. Debug
//! builds assert on it; release builds panic on the block slice access. The
//! topology layer that hands out indices is responsible for bounds.
//!
//! # Serialization
//!
//! [`BlockStore::save`] writes a three-word header
//! `[nb_chunks][nb_lines][chunk_bytes]` in host byte order, then the blocks,
//! truncating the last one at `nb_lines`. [`BlockStore::load`] refuses
//! streams whose `chunk_bytes` differs from its own. See [`codec`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod bool_array;
pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod marker;
pub mod store;
pub mod table;

// Public re-exports for the primary API surface.
pub use array::ChunkArray;
pub use bool_array::ChunkArrayBool;
pub use codec::ChunkHeader;
pub use config::{StoreConfig, DEFAULT_CHUNK_SIZE};
pub use error::StoreError;
pub use marker::Marker;
pub use store::{BlockStore, ChunkPointers};
pub use table::StoreTable;
