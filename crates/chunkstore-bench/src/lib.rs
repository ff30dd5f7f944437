//! Benchmark profiles and utilities for chunkstore.
//!
//! Provides pre-built attribute tables shaped like a surface mesh:
//!
//! - [`reference_table`]: 10K lines, position/normal/flag attributes
//! - [`stress_table`]: ~1M lines with the same attributes
//! - [`scattered_indices`]: deterministic random access order via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use chunkstore::{ChunkArray, ChunkArrayBool, StoreError, StoreTable};
use chunkstore_test_utils::u32_pattern;

/// Block length used by every profile.
pub const BENCH_CHUNK: usize = 4096;

/// Lines in the [`reference_table`] profile.
pub const REFERENCE_LINES: usize = 10_000;

/// Lines in the [`stress_table`] profile.
pub const STRESS_LINES: usize = 1 << 20;

/// Per-vertex position attribute.
pub type Positions = ChunkArray<[f32; 3], BENCH_CHUNK>;

/// Per-vertex boundary flag attribute.
pub type Flags = ChunkArrayBool<BENCH_CHUNK>;

/// Build a table with `nb_lines` lines worth of blocks holding
/// `position`, `normal`, `valence` and `boundary` attributes.
///
/// Positions are filled with a ramp so loads have non-zero payload.
pub fn mesh_table(nb_lines: usize) -> Result<StoreTable<BENCH_CHUNK>, StoreError> {
    let mut table = StoreTable::new();
    table.add_store::<Positions>("position")?;
    table.add_store::<Positions>("normal")?;
    table.add_store::<ChunkArray<u32, BENCH_CHUNK>>("valence")?;
    table.add_store::<Flags>("boundary")?;
    table.set_nb_chunks(nb_lines.div_ceil(BENCH_CHUNK));

    let positions = table.get_mut::<Positions>("position")?;
    for i in 0..nb_lines {
        let x = i as f32;
        positions[i] = [x, x * 0.5, -x];
    }
    let flags = table.get_mut::<Flags>("boundary")?;
    for i in (0..nb_lines).step_by(7) {
        flags.set_true(i);
    }
    Ok(table)
}

/// Reference profile: [`REFERENCE_LINES`] lines.
pub fn reference_table() -> Result<StoreTable<BENCH_CHUNK>, StoreError> {
    mesh_table(REFERENCE_LINES)
}

/// Stress profile: [`STRESS_LINES`] lines.
pub fn stress_table() -> Result<StoreTable<BENCH_CHUNK>, StoreError> {
    mesh_table(STRESS_LINES)
}

/// `n` indices in `0..nb_lines`, drawn from a seeded stream.
pub fn scattered_indices(nb_lines: usize, n: usize, seed: u64) -> Vec<usize> {
    u32_pattern(n, seed)
        .into_iter()
        .map(|v| v as usize % nb_lines)
        .collect()
}
