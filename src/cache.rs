//! Memoisation of projector output keyed by item identities.
//!
//! Projection is pure, so a layout for the same ordered set of items can be
//! reused across requests. The key is a stable FNV-1a hash of the caller's item
//! ids; callers that change an item's embedding must [`LayoutCache::invalidate`]
//! the affected key (or use new ids).
//!
//! ```
//! use semspace::cache::{layout_key, LayoutCache};
//! use semspace::projector::ForceProjector;
//!
//! let cache = LayoutCache::new();
//! let projector = ForceProjector::new();
//! let ids = ["a", "b", "c"];
//! let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
//!
//! let first = cache.get_or_project(&ids, &vectors, &projector);
//! let second = cache.get_or_project(&ids, &vectors, &projector);
//! assert_eq!(first, second);
//! assert_eq!(cache.hits(), 1);
//! assert!(cache.contains(layout_key(&ids)));
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info, warn};

use crate::projector::ForceProjector;
use crate::Position3D;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Order-sensitive FNV-1a hash over item ids, stable across processes.
pub fn layout_key<S: AsRef<str>>(ids: &[S]) -> u64 {
    let mut h = FNV_OFFSET;
    for id in ids {
        for &b in id.as_ref().as_bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        // unit separator, so ["ab"] and ["a", "b"] differ
        h ^= 0x1f;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Thread-safe layout cache.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entries: DashMap<u64, Arc<Vec<Position3D>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached layout for `ids`, projecting `vectors` on a miss.
    pub fn get_or_project<S: AsRef<str>>(
        &self,
        ids: &[S],
        vectors: &[Vec<f64>],
        projector: &ForceProjector,
    ) -> Arc<Vec<Position3D>> {
        if ids.len() != vectors.len() {
            warn!(
                "Layout cache keyed by {} ids for {} vectors",
                ids.len(),
                vectors.len()
            );
        }
        let key = layout_key(ids);

        if let Some(hit) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Layout cache hit for key {:016x}", key);
            return Arc::clone(hit.value());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Layout cache miss for key {:016x}", key);
        let positions = Arc::new(projector.project(vectors));

        // a concurrent miss may have filled the slot first; keep that one
        let entry = self.entries.entry(key).or_insert(positions);
        Arc::clone(entry.value())
    }

    pub fn get(&self, key: u64) -> Option<Arc<Vec<Position3D>>> {
        self.entries.get(&key).map(|e| Arc::clone(e.value()))
    }

    pub fn contains(&self, key: u64) -> bool {
        self.entries.contains_key(&key)
    }

    /// Drops one entry; returns whether it existed.
    pub fn invalidate(&self, key: u64) -> bool {
        self.entries.remove(&key).is_some()
    }

    pub fn clear(&self) {
        info!("Clearing layout cache ({} entries)", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}
