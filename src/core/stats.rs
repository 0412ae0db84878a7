use serde::{Serialize, Deserialize};

/// Protein tree statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeStats {
    // General info
    pub uptime_secs: u64,
    pub initial_tag_size: usize,
    pub tag_count: u64,

    // Node cache
    pub node_cache: NodeCacheStats,

    // Query metrics
    pub query_count: u64,
    pub fast_cache: CacheStats,
    pub slow_cache: CacheStats,
}

impl TreeStats {
    /// Hit rate over both result caches; every lookup goes through the fast
    /// pool first, so its hits plus misses count all lookups
    pub fn query_hit_rate(&self) -> f64 {
        let hits = self.fast_cache.hit_count + self.slow_cache.hit_count;
        let total = self.fast_cache.hit_count + self.fast_cache.miss_count;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCacheStats {
    pub nodes: usize,
    pub occupancy: usize,     // Cached occurrences
    pub capacity: usize,      // Occurrence budget
    pub hit_count: usize,
    pub miss_count: usize,
    pub evictions: usize,
}

impl NodeCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }

    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.occupancy as f64 / self.capacity as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}
