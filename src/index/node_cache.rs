use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::RwLock;
use tracing::debug;
use crate::core::error::Result;
use crate::core::stats::NodeCacheStats;
use crate::index::node::Node;

struct CacheState {
    nodes: HashMap<String, Arc<Node>>,
    admitted: VecDeque<String>,     // Oldest admission first
    size: usize,                    // Sum of cached node sizes
}

/// Occurrence-budgeted cache of tag nodes.
///
/// Nodes are evicted in admission order; after every admission the summed
/// node size is back under `capacity`.
pub struct NodeCache {
    state: RwLock<CacheState>,
    capacity: usize,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
    evictions: AtomicUsize,
}

impl NodeCache {
    pub fn new(capacity: usize) -> Self {
        NodeCache {
            state: RwLock::new(CacheState {
                nodes: HashMap::new(),
                admitted: VecDeque::new(),
                size: 0,
            }),
            capacity,
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
            evictions: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, tag: &str) -> Option<Arc<Node>> {
        let state = self.state.read();
        let node = state.nodes.get(tag).cloned();
        match node {
            Some(_) => self.hit_count.fetch_add(1, Ordering::Relaxed),
            None => self.miss_count.fetch_add(1, Ordering::Relaxed),
        };
        node
    }

    /// Return the cached node or page it in with `load`
    pub fn get_or_load<F>(&self, tag: &str, load: F) -> Result<Option<Arc<Node>>>
    where
        F: FnOnce() -> Result<Option<Node>>,
    {
        if let Some(node) = self.get(tag) {
            return Ok(Some(node));
        }

        match load()? {
            Some(node) => {
                debug!("Paged in node {} ({} occurrences)", tag, node.size());
                Ok(Some(self.admit(tag, Arc::new(node))))
            }
            None => Ok(None),
        }
    }

    /// Insert a node and evict the oldest admissions until the budget holds.
    /// If another thread admitted the tag first, its node is returned.
    pub fn admit(&self, tag: &str, node: Arc<Node>) -> Arc<Node> {
        let mut state = self.state.write();
        if let Some(existing) = state.nodes.get(tag) {
            return existing.clone();
        }

        state.size += node.size();
        state.nodes.insert(tag.to_string(), node.clone());
        state.admitted.push_back(tag.to_string());

        while state.size > self.capacity {
            let Some(oldest) = state.admitted.pop_front() else {
                break;
            };
            if let Some(evicted) = state.nodes.remove(&oldest) {
                state.size -= evicted.size();
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        node
    }

    pub fn clear(&self) {
        let mut state = self.state.write();
        state.nodes.clear();
        state.admitted.clear();
        state.size = 0;
    }

    pub fn len(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summed size of the cached nodes
    pub fn occupancy(&self) -> usize {
        self.state.read().size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> NodeCacheStats {
        let state = self.state.read();
        NodeCacheStats {
            nodes: state.nodes.len(),
            occupancy: state.size,
            capacity: self.capacity,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
