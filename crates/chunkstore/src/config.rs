//! Store configuration parameters.

/// Block size used when a [`ChunkArray`](crate::ChunkArray) or
/// [`ChunkArrayBool`](crate::ChunkArrayBool) is named without one.
///
/// 4096 elements per block: 16KB for `u32` attributes, 512 bytes for a
/// bit-packed boolean block.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Runtime configuration for chunked stores.
///
/// The block size itself is a compile-time parameter of each array type;
/// this struct only carries the knobs that may vary per instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of block slots reserved in the block table at construction.
    ///
    /// Default: 1024. Growing past this many blocks reallocates the table of
    /// block handles (never the blocks themselves).
    pub reserve_chunks: usize,
}

impl StoreConfig {
    /// Default number of reserved block slots.
    pub const DEFAULT_RESERVE_CHUNKS: usize = 1024;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            reserve_chunks: Self::DEFAULT_RESERVE_CHUNKS,
        }
    }

    /// Override the number of reserved block slots.
    pub fn with_reserve_chunks(mut self, reserve_chunks: usize) -> Self {
        self.reserve_chunks = reserve_chunks;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reserves_1024_chunks() {
        assert_eq!(StoreConfig::default().reserve_chunks, 1024);
    }

    #[test]
    fn builder_overrides_reserve() {
        let config = StoreConfig::new().with_reserve_chunks(8);
        assert_eq!(config.reserve_chunks, 8);
    }

    #[test]
    fn default_chunk_size_is_valid() {
        assert!(DEFAULT_CHUNK_SIZE.is_power_of_two());
        assert!(DEFAULT_CHUNK_SIZE >= 32);
    }
}
