//! Integration tests for the type-erased `BlockStore` interface.
//!
//! Exercises both array forms only through `Box<dyn BlockStore>`, the way
//! the topology layer holds its attribute tables.

use chunkstore::{BlockStore, ChunkArray, ChunkArrayBool, Marker, StoreTable};
use chunkstore_test_utils::{bit_pattern, u32_pattern};

fn heterogeneous() -> Vec<Box<dyn BlockStore>> {
    vec![
        Box::new(ChunkArray::<f64, 32>::new()),
        Box::new(ChunkArray::<u32, 32>::new()),
        Box::new(ChunkArray::<[f32; 3], 32>::new()),
        Box::new(ChunkArrayBool::<32>::new()),
    ]
}

#[test]
fn chunk_counts_and_capacity_for_every_form() {
    for mut store in heterogeneous() {
        for n in [0, 1, 7, 3, 0, 12] {
            store.set_nb_chunks(n);
            assert_eq!(store.nb_chunks(), n, "{}", store.element_type_name());
            assert_eq!(store.capacity(), n * 32);
        }
        store.add_chunk();
        assert_eq!(store.nb_chunks(), 13);
        store.clear();
        assert_eq!(store.capacity(), 0);
    }
}

#[test]
fn chunk_bytes_per_form() {
    let bytes: Vec<usize> = heterogeneous().iter().map(|s| s.chunk_bytes()).collect();
    assert_eq!(bytes, vec![256, 128, 384, 4]);
}

#[test]
fn element_ops_through_trait_object() {
    let mut typed: Box<dyn BlockStore> = Box::new(ChunkArray::<u32, 32>::new());
    typed.set_nb_chunks(2);
    {
        let concrete = typed
            .as_any_mut()
            .downcast_mut::<ChunkArray<u32, 32>>()
            .unwrap();
        concrete[10] = 5;
        concrete[50] = 6;
    }
    typed.copy_elt(11, 10);
    typed.swap_elt(10, 50);
    typed.init_elt(50);

    let concrete = typed.as_any().downcast_ref::<ChunkArray<u32, 32>>().unwrap();
    assert_eq!(concrete[10], 6);
    assert_eq!(concrete[11], 5);
    assert_eq!(concrete[50], 0);
}

#[test]
fn swap_twice_is_identity_for_every_form() {
    let values = u32_pattern(64, 21);
    let bits = bit_pattern(64, 22);

    let mut typed = ChunkArray::<u32, 32>::new();
    let mut packed = ChunkArrayBool::<32>::new();
    typed.set_nb_chunks(2);
    packed.set_nb_chunks(2);
    for i in 0..64 {
        typed[i] = values[i];
        packed.set_val(i, bits[i]);
    }

    let stores: [&mut dyn BlockStore; 2] = [&mut typed, &mut packed];
    for store in stores {
        for (a, b) in [(0, 63), (5, 5), (31, 32)] {
            store.swap_elt(a, b);
            store.swap_elt(a, b);
        }
    }
    for i in 0..64 {
        assert_eq!(typed[i], values[i]);
        assert_eq!(packed.get(i), bits[i]);
    }
}

#[test]
fn fresh_chunks_read_as_default() {
    let mut packed: Box<dyn BlockStore> = Box::new(ChunkArrayBool::<64>::new());
    packed.add_chunk();
    let bits = packed.as_any().downcast_ref::<ChunkArrayBool<64>>().unwrap();
    assert!((0..64).all(|i| !bits.get(i)));

    let mut vectors = ChunkArray::<[f32; 3], 32>::new();
    vectors.add_chunk();
    assert!((0..32).all(|i| vectors[i] == [0.0; 3]));
}

#[test]
fn clone_empty_keeps_concrete_type() {
    for store in heterogeneous() {
        let twin = store.clone_empty();
        assert_eq!(twin.element_type_name(), store.element_type_name());
        assert_eq!(twin.chunk_size(), store.chunk_size());
        assert_eq!(twin.nb_chunks(), 0);
    }
}

#[test]
fn chunk_views_cover_every_block() {
    for mut store in heterogeneous() {
        store.set_nb_chunks(4);
        let views = store.chunks_pointers();
        assert_eq!(views.len(), 4);
        assert_eq!(views.block_bytes, store.chunk_bytes());
        assert!(views.chunks.iter().all(|c| c.len() == views.block_bytes));
        assert!(views.chunks.iter().all(|c| c.iter().all(|&b| b == 0)));
    }
}

#[test]
fn growth_does_not_move_exported_blocks() {
    let mut store: Box<dyn BlockStore> = Box::new(ChunkArray::<u32, 32>::new());
    store.set_nb_chunks(2);
    let before: Vec<*const u8> = store.chunks_pointers().addresses().collect();
    store.set_nb_chunks(3000);
    let after: Vec<*const u8> = store.chunks_pointers().addresses().take(2).collect();
    assert_eq!(before, after);
}

#[test]
fn table_and_marker_work_together() {
    let mut table = StoreTable::<32>::new();
    table.add_store::<ChunkArray<u32, 32>>("ids").unwrap();
    table.set_nb_chunks(3);

    let mut visited = Marker::<32>::new(table.nb_chunks());
    let ids = table.get_mut::<ChunkArray<u32, 32>>("ids").unwrap();
    for i in (0..96).step_by(3) {
        ids[i] = i as u32;
        visited.mark(i);
    }
    assert_eq!(visited.marked_count(), 32);
    visited.reset();
    assert_eq!(visited.marked_count(), 0);
    assert_eq!(table.get::<ChunkArray<u32, 32>>("ids").unwrap()[93], 93);
}
