//! Sharded, content-addressed cache for outer no-fit-polygons. Only outer
//! NFPs are cached — inner NFPs are keyed by the requesting part's `id`
//! rather than its shape, so caching them would leak placement-specific
//! state into a structural cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::polygon::Polygon;

const SHARD_COUNT: usize = 16;

/// Rotation angles are bucketed to a fixed resolution so that floating-point
/// jitter from repeated `rotated()` calls doesn't fragment the cache key
/// space, mirroring the source's integer-degree rotation keys.
const ROTATION_BUCKET_DEGREES: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub id_a: i64,
    pub id_b: i64,
    pub rot_a_bucket: i64,
    pub rot_b_bucket: i64,
}

impl CacheKey {
    pub fn new(id_a: i64, id_b: i64, rot_a: f64, rot_b: f64) -> Self {
        CacheKey {
            id_a,
            id_b,
            rot_a_bucket: (rot_a / ROTATION_BUCKET_DEGREES).round() as i64,
            rot_b_bucket: (rot_b / ROTATION_BUCKET_DEGREES).round() as i64,
        }
    }

    fn shard_index(&self) -> usize {
        let mut h: u64 = 1469598103934665603;
        for part in [self.id_a, self.id_b, self.rot_a_bucket, self.rot_b_bucket] {
            h ^= part as u64;
            h = h.wrapping_mul(1099511628211);
        }
        (h as usize) % SHARD_COUNT
    }
}

pub struct NfpCache {
    shards: Vec<RwLock<HashMap<CacheKey, Vec<Polygon>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl NfpCache {
    pub fn new() -> Self {
        NfpCache {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Vec<Polygon>> {
        let shard = &self.shards[key.shard_index()];
        let guard = shard.read().expect("nfp cache shard poisoned");
        match guard.get(key) {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(v.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: CacheKey, value: Vec<Polygon>) {
        let shard = &self.shards[key.shard_index()];
        let mut guard = shard.write().expect("nfp cache shard poisoned");
        guard.insert(key, value);
    }

    /// Compute-and-cache helper: looks up `key`, and on a miss calls `f` and
    /// stores the result before returning it.
    pub fn get_or_compute(&self, key: CacheKey, f: impl FnOnce() -> Vec<Polygon>) -> Vec<Polygon> {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let computed = f();
        self.insert(key, computed.clone());
        computed
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.read().expect("nfp cache shard poisoned").len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NfpCache {
    fn default() -> Self {
        Self::new()
    }
}
