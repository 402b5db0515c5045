//! LRU code cache.
//!
//! Keyed by the program hash; capped at [`CACHE_CAPACITY`] entries.
//! Recency uses a logical tick, not wall time, so eviction order is
//! deterministic and testable. Evicting an entry forgets the pointer only;
//! its bytes stay in the arena.

/// Maximum live cache entries.
pub const CACHE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub hash: u64,
    pub code: *const u8,
    pub size: usize,
    pub access_count: u64,
    pub last_access: u64,
}

pub struct CodeCache {
    entries: Vec<CacheEntry>,
    capacity: usize,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl CodeCache {
    pub fn new() -> Self {
        Self::with_capacity(CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up compiled code by hash, bumping recency on a hit.
    pub fn lookup(&mut self, hash: u64) -> Option<(*const u8, usize)> {
        self.tick += 1;
        match self.entries.iter_mut().find(|e| e.hash == hash) {
            Some(entry) => {
                entry.access_count += 1;
                entry.last_access = self.tick;
                self.hits += 1;
                Some((entry.code, entry.size))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert freshly compiled code, evicting the least recently used entry
    /// at capacity. Returns the evicted hash, if any.
    pub fn insert(&mut self, hash: u64, code: *const u8, size: usize) -> Option<u64> {
        self.tick += 1;
        let mut evicted = None;
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(i, _)| i)
            {
                evicted = Some(self.entries.remove(oldest).hash);
            }
        }
        self.entries.push(CacheEntry {
            hash,
            code,
            size,
            access_count: 1,
            last_access: self.tick,
        });
        evicted
    }

    pub fn contains(&self, hash: u64) -> bool {
        self.entries.iter().any(|e| e.hash == hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for CodeCache {
    fn default() -> Self {
        Self::new()
    }
}
