use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use parking_lot::Mutex;
use crate::alphabet::policy::MatchingPolicy;
use crate::core::stats::CacheStats;
use crate::core::types::PeptideMapping;

struct Pools {
    policy: Option<MatchingPolicy>,             // Policy of every cached entry
    fast: LruCache<String, Arc<PeptideMapping>>,
    slow: LruCache<String, Arc<PeptideMapping>>,
}

/// Peptide mapping cache split by observed query latency.
///
/// Queries answered under the threshold go to the fast pool, the others to
/// the slow pool, so a burst of cheap queries cannot push out the expensive
/// ones. Entries are only valid for one matching policy at a time.
pub struct QueryCache {
    pools: Mutex<Pools>,
    size_limit: AtomicUsize,
    threshold: Duration,
    fast_hits: AtomicUsize,
    fast_misses: AtomicUsize,
    slow_hits: AtomicUsize,
    slow_misses: AtomicUsize,
}

fn capacity(size_limit: usize) -> NonZeroUsize {
    NonZeroUsize::new(size_limit).unwrap_or(NonZeroUsize::MIN)
}

impl QueryCache {
    pub fn new(size_limit: usize, threshold: Duration) -> Self {
        QueryCache {
            pools: Mutex::new(Pools {
                policy: None,
                fast: LruCache::new(capacity(size_limit)),
                slow: LruCache::new(capacity(size_limit)),
            }),
            size_limit: AtomicUsize::new(size_limit),
            threshold,
            fast_hits: AtomicUsize::new(0),
            fast_misses: AtomicUsize::new(0),
            slow_hits: AtomicUsize::new(0),
            slow_misses: AtomicUsize::new(0),
        }
    }

    /// Drop every entry computed under another policy
    pub fn ensure_policy(&self, policy: MatchingPolicy) {
        let mut pools = self.pools.lock();
        if pools.policy != Some(policy) {
            pools.fast.clear();
            pools.slow.clear();
            pools.policy = Some(policy);
        }
    }

    /// Fast pool first, then slow pool
    pub fn get(&self, peptide: &str, policy: MatchingPolicy) -> Option<Arc<PeptideMapping>> {
        let mut pools = self.pools.lock();
        if pools.policy != Some(policy) {
            return None;
        }

        if let Some(mapping) = pools.fast.get(peptide) {
            self.fast_hits.fetch_add(1, Ordering::Relaxed);
            return Some(mapping.clone());
        }
        self.fast_misses.fetch_add(1, Ordering::Relaxed);

        if let Some(mapping) = pools.slow.get(peptide) {
            self.slow_hits.fetch_add(1, Ordering::Relaxed);
            return Some(mapping.clone());
        }
        self.slow_misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Like `get`, without touching recency or the hit/miss counters
    pub fn peek(&self, peptide: &str, policy: MatchingPolicy) -> Option<Arc<PeptideMapping>> {
        let pools = self.pools.lock();
        if pools.policy != Some(policy) {
            return None;
        }
        pools
            .fast
            .peek(peptide)
            .or_else(|| pools.slow.peek(peptide))
            .cloned()
    }

    /// Route a computed mapping by how long it took
    pub fn put(&self, peptide: &str, policy: MatchingPolicy, mapping: Arc<PeptideMapping>, elapsed: Duration) {
        let mut pools = self.pools.lock();
        if pools.policy != Some(policy) {
            pools.fast.clear();
            pools.slow.clear();
            pools.policy = Some(policy);
        }

        if elapsed <= self.threshold {
            pools.fast.put(peptide.to_string(), mapping);
        } else {
            pools.slow.put(peptide.to_string(), mapping);
        }
    }

    pub fn contains_fast(&self, peptide: &str) -> bool {
        self.pools.lock().fast.contains(peptide)
    }

    pub fn contains_slow(&self, peptide: &str) -> bool {
        self.pools.lock().slow.contains(peptide)
    }

    pub fn clear(&self) {
        let mut pools = self.pools.lock();
        pools.fast.clear();
        pools.slow.clear();
    }

    pub fn size_limit(&self) -> usize {
        self.size_limit.load(Ordering::Relaxed)
    }

    /// Shrinking drops the least recently used entries
    pub fn resize(&self, size_limit: usize) {
        self.size_limit.store(size_limit, Ordering::Relaxed);
        let mut pools = self.pools.lock();
        pools.fast.resize(capacity(size_limit));
        pools.slow.resize(capacity(size_limit));
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// (fast, slow); slow-pool misses are lookups that missed both pools
    pub fn stats(&self) -> (CacheStats, CacheStats) {
        let pools = self.pools.lock();
        let fast = CacheStats {
            hit_count: self.fast_hits.load(Ordering::Relaxed),
            miss_count: self.fast_misses.load(Ordering::Relaxed),
            size: pools.fast.len(),
            capacity: pools.fast.cap().get(),
        };
        let slow = CacheStats {
            hit_count: self.slow_hits.load(Ordering::Relaxed),
            miss_count: self.slow_misses.load(Ordering::Relaxed),
            size: pools.slow.len(),
            capacity: pools.slow.cap().get(),
        };
        (fast, slow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ProteinMapping;

    fn mapping(accession: &str) -> Arc<PeptideMapping> {
        let mut mapping = PeptideMapping::new();
        mapping.insert("PEP".to_string(), ProteinMapping::from([(accession.to_string(), vec![0])]));
        Arc::new(mapping)
    }

    #[test]
    fn routes_by_elapsed_time() {
        let cache = QueryCache::new(10, Duration::from_millis(20));
        cache.put("FAST", MatchingPolicy::String, mapping("P1"), Duration::from_millis(1));
        cache.put("SLOW", MatchingPolicy::String, mapping("P2"), Duration::from_millis(50));

        assert!(cache.contains_fast("FAST"));
        assert!(cache.contains_slow("SLOW"));
        assert!(!cache.contains_fast("SLOW"));
        assert_eq!(cache.get("SLOW", MatchingPolicy::String), Some(mapping("P2")));

        let (fast, slow) = cache.stats();
        assert_eq!(fast.miss_count, 1);
        assert_eq!(slow.hit_count, 1);
    }

    #[test]
    fn peek_leaves_counters_alone() {
        let cache = QueryCache::new(10, Duration::from_millis(20));
        cache.put("SLOW", MatchingPolicy::String, mapping("P2"), Duration::from_millis(50));

        assert_eq!(cache.peek("SLOW", MatchingPolicy::String), Some(mapping("P2")));
        assert!(cache.peek("NONE", MatchingPolicy::String).is_none());
        assert!(cache.peek("SLOW", MatchingPolicy::Combinations).is_none());

        let (fast, slow) = cache.stats();
        assert_eq!((fast.hit_count, fast.miss_count), (0, 0));
        assert_eq!((slow.hit_count, slow.miss_count), (0, 0));
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = QueryCache::new(2, Duration::from_millis(20));
        let quick = Duration::from_millis(1);
        cache.put("A", MatchingPolicy::String, mapping("P1"), quick);
        cache.put("B", MatchingPolicy::String, mapping("P1"), quick);
        assert!(cache.get("A", MatchingPolicy::String).is_some());
        cache.put("C", MatchingPolicy::String, mapping("P1"), quick);

        assert!(cache.contains_fast("A"));
        assert!(!cache.contains_fast("B"));
        assert!(cache.contains_fast("C"));
    }

    #[test]
    fn policy_change_invalidates_entries() {
        let cache = QueryCache::new(10, Duration::from_millis(20));
        cache.put("PEP", MatchingPolicy::String, mapping("P1"), Duration::ZERO);
        assert!(cache.get("PEP", MatchingPolicy::Combinations).is_none());

        cache.ensure_policy(MatchingPolicy::Combinations);
        assert!(cache.get("PEP", MatchingPolicy::String).is_none());
        assert!(!cache.contains_fast("PEP"));
    }

    #[test]
    fn resize_shrinks_both_pools() {
        let cache = QueryCache::new(3, Duration::from_millis(20));
        for peptide in ["A", "B", "C"] {
            cache.put(peptide, MatchingPolicy::String, mapping("P1"), Duration::ZERO);
        }
        cache.resize(1);
        assert_eq!(cache.stats().0.size, 1);
        assert!(cache.contains_fast("C"));
    }
}
