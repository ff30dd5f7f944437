//! Named collections of block stores sharing one line layout.
//!
//! A [`StoreTable`] is how the topology layer keeps one attribute table per
//! cell kind: every store in it has the same block size and the same block
//! count, so a line index addresses one element in each of them.

use std::io::{Read, Write};

use indexmap::IndexMap;

use crate::codec::{read_length_prefixed_str, read_u32_ne, write_length_prefixed_str, write_u32_ne};
use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::StoreError;
use crate::store::BlockStore;

/// Ordered map of named stores grown and shrunk in lockstep.
///
/// All stores share the block size `N`. Stores are kept in insertion order,
/// which is also the order they are serialized in.
pub struct StoreTable<const N: usize = { DEFAULT_CHUNK_SIZE }> {
    stores: IndexMap<String, Box<dyn BlockStore>>,
    nb_chunks: usize,
}

impl<const N: usize> StoreTable<N> {
    /// Create an empty table with no stores and no blocks.
    pub fn new() -> Self {
        Self {
            stores: IndexMap::new(),
            nb_chunks: 0,
        }
    }

    /// Add a default-constructed store of type `S` under `name`.
    ///
    /// The new store is grown to the table's current block count.
    pub fn add_store<S>(&mut self, name: impl Into<String>) -> Result<&mut S, StoreError>
    where
        S: BlockStore + Default,
    {
        let name = name.into();
        self.add_boxed(name.clone(), Box::new(S::default()))?;
        self.get_mut::<S>(&name)
    }

    /// Add an already-constructed store under `name`.
    ///
    /// The store is resized to the table's block count; any contents in
    /// blocks beyond that count are dropped.
    pub fn add_boxed(
        &mut self,
        name: impl Into<String>,
        mut store: Box<dyn BlockStore>,
    ) -> Result<&mut dyn BlockStore, StoreError> {
        let name = name.into();
        if self.stores.contains_key(&name) {
            return Err(StoreError::DuplicateStore { name });
        }
        if store.chunk_size() != N {
            return Err(StoreError::IncompatibleChunkSize {
                name,
                expected: N,
                found: store.chunk_size(),
            });
        }
        store.set_nb_chunks(self.nb_chunks);
        tracing::debug!(
            store = %name,
            element = store.element_type_name(),
            nb_chunks = self.nb_chunks,
            "added store"
        );
        let (index, _) = self.stores.insert_full(name, store);
        Ok(self.stores[index].as_mut())
    }

    /// Remove and return the store named `name`.
    ///
    /// Remaining stores keep their relative order.
    pub fn remove_store(&mut self, name: &str) -> Option<Box<dyn BlockStore>> {
        let removed = self.stores.shift_remove(name);
        if removed.is_some() {
            tracing::debug!(store = %name, "removed store");
        }
        removed
    }

    /// Borrow the store named `name` as its concrete type.
    pub fn get<S: BlockStore>(&self, name: &str) -> Result<&S, StoreError> {
        let store = self.get_dyn(name).ok_or_else(|| StoreError::UnknownStore {
            name: name.to_string(),
        })?;
        let found = store.element_type_name();
        store
            .as_any()
            .downcast_ref::<S>()
            .ok_or_else(|| StoreError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<S>(),
                found,
            })
    }

    /// Mutably borrow the store named `name` as its concrete type.
    pub fn get_mut<S: BlockStore>(&mut self, name: &str) -> Result<&mut S, StoreError> {
        let store = self
            .stores
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownStore {
                name: name.to_string(),
            })?;
        let found = store.element_type_name();
        store
            .as_any_mut()
            .downcast_mut::<S>()
            .ok_or_else(|| StoreError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<S>(),
                found,
            })
    }

    /// Borrow the store named `name` through the type-erased interface.
    pub fn get_dyn(&self, name: &str) -> Option<&dyn BlockStore> {
        self.stores.get(name).map(|s| s.as_ref())
    }

    /// Whether a store named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }

    /// Store names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.stores.keys().map(String::as_str)
    }

    /// Number of stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Whether the table holds no stores.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Append one block to every store.
    pub fn add_chunk(&mut self) {
        for store in self.stores.values_mut() {
            store.add_chunk();
        }
        self.nb_chunks += 1;
    }

    /// Resize every store to `nb_chunks` blocks.
    pub fn set_nb_chunks(&mut self, nb_chunks: usize) {
        for store in self.stores.values_mut() {
            store.set_nb_chunks(nb_chunks);
        }
        self.nb_chunks = nb_chunks;
    }

    /// Block count shared by every store.
    pub fn nb_chunks(&self) -> usize {
        self.nb_chunks
    }

    /// Number of addressable lines (`nb_chunks() * N`).
    pub fn capacity(&self) -> usize {
        self.nb_chunks * N
    }

    /// Drop every block of every store. The stores themselves remain.
    pub fn clear(&mut self) {
        for store in self.stores.values_mut() {
            store.clear();
        }
        self.nb_chunks = 0;
    }

    /// Reset line `index` to its default in every store.
    pub fn init_line(&mut self, index: usize) {
        for store in self.stores.values_mut() {
            store.init_elt(index);
        }
    }

    /// Copy line `src` into line `dst` in every store.
    pub fn copy_line(&mut self, dst: usize, src: usize) {
        for store in self.stores.values_mut() {
            store.copy_elt(dst, src);
        }
    }

    /// Exchange lines `a` and `b` in every store.
    pub fn swap_lines(&mut self, a: usize, b: usize) {
        for store in self.stores.values_mut() {
            store.swap_elt(a, b);
        }
    }

    /// An empty table with the same store names and concrete types.
    pub fn sibling(&self) -> Self {
        Self {
            stores: self
                .stores
                .iter()
                .map(|(name, store)| (name.clone(), store.clone_empty()))
                .collect(),
            nb_chunks: 0,
        }
    }

    /// Serialize the first `nb_lines` lines of every store.
    ///
    /// Layout: `u32` store count, then per store a length-prefixed name and
    /// the store's own chunk array record.
    pub fn save(&self, w: &mut dyn Write, nb_lines: usize) -> Result<(), StoreError> {
        let count = u32::try_from(self.stores.len()).map_err(|_| StoreError::HeaderOverflow {
            field: "store count",
            value: self.stores.len(),
        })?;
        write_u32_ne(w, count)?;
        for (name, store) in &self.stores {
            write_length_prefixed_str(w, name)?;
            store.save(w, nb_lines)?;
        }
        Ok(())
    }

    /// Load store contents written by [`save`](Self::save).
    ///
    /// Every recorded name must already exist in this table and appear at
    /// most once; the stream only carries data, the layout comes from the
    /// code that built the table. Stores absent from the stream are resized
    /// to the loaded block count.
    ///
    /// Records are applied as they are read. If one fails, every store is
    /// resized to the largest block count reached so far, so the table stays
    /// in lockstep; contents are then unspecified.
    pub fn load(&mut self, r: &mut dyn Read) -> Result<(), StoreError> {
        let mut reached = None;
        match self.load_records(r, &mut reached) {
            Ok(count) => {
                let nb_chunks = reached.unwrap_or(0);
                self.set_nb_chunks(nb_chunks);
                tracing::debug!(stores = count, nb_chunks, "loaded store table");
                Ok(())
            }
            Err(e) => {
                if let Some(nb_chunks) = reached {
                    self.set_nb_chunks(nb_chunks);
                }
                tracing::warn!(
                    error = %e,
                    nb_chunks = self.nb_chunks,
                    "store table load failed"
                );
                Err(e)
            }
        }
    }

    fn load_records(
        &mut self,
        r: &mut dyn Read,
        reached: &mut Option<usize>,
    ) -> Result<u32, StoreError> {
        let count = read_u32_ne(r)?;
        let mut loaded = vec![false; self.stores.len()];
        for _ in 0..count {
            let name = read_length_prefixed_str(r)?;
            let index = self
                .stores
                .get_index_of(&name)
                .ok_or_else(|| StoreError::UnknownStore { name: name.clone() })?;
            if std::mem::replace(&mut loaded[index], true) {
                return Err(StoreError::MalformedHeader {
                    detail: format!("store `{name}` recorded twice"),
                });
            }
            let store = &mut self.stores[index];
            let outcome = store.load(r);
            *reached = Some(reached.map_or(store.nb_chunks(), |n| n.max(store.nb_chunks())));
            outcome?;
        }
        Ok(count)
    }
}

impl<const N: usize> Default for StoreTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for StoreTable<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreTable")
            .field("chunk_size", &N)
            .field("nb_chunks", &self.nb_chunks)
            .field("stores", &self.stores.keys().collect::<Vec<_>>())
            .finish()
    }
}
