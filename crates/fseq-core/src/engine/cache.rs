use serde::Serialize;
use tracing::trace;

/// Hit/miss counters of the block cache. A miss is one block decompression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
struct CachedBlock {
    index: usize,
    data: Vec<u8>,
}

/// Single-slot cache holding the most recently decompressed block.
#[derive(Debug, Default)]
pub(crate) struct BlockCache {
    slot: Option<CachedBlock>,
    stats: CacheStats,
}

impl BlockCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Decompressed bytes of `index`, if it is the cached block.
    pub(crate) fn lookup(&mut self, index: usize) -> Option<&[u8]> {
        let cached = self.slot.as_ref().filter(|cached| cached.index == index)?;
        self.stats.hits += 1;
        trace!(block = index, "block cache hit");
        Some(&cached.data)
    }

    /// Replace the cached block, evicting whatever was there.
    pub(crate) fn store(&mut self, index: usize, data: Vec<u8>) -> &[u8] {
        self.stats.misses += 1;
        if let Some(evicted) = &self.slot {
            trace!(evicted = evicted.index, block = index, "block cache eviction");
        }
        &self.slot.insert(CachedBlock { index, data }).data
    }

    #[cfg(test)]
    pub(crate) fn cached_index(&self) -> Option<usize> {
        self.slot.as_ref().map(|cached| cached.index)
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.stats
    }
}
