use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::RwLock;
use crate::alphabet::tags::TagSet;
use crate::core::error::Result;
use crate::index::node::Node;
use crate::storage::ComponentStore;

#[derive(Default)]
struct Metadata {
    version: Option<String>,
    initial_tag_size: Option<usize>,
    import_complete: bool,
    tags: Option<TagSet>,
}

/// Component store held in memory; nothing survives the process
#[derive(Default)]
pub struct MemoryStore {
    nodes: RwLock<HashMap<String, Node>>,
    lengths: RwLock<HashMap<String, usize>>,
    metadata: RwLock<Metadata>,
    corrupted: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }

    /// Flag the store as damaged, forcing a reindex on the next open
    pub fn mark_corrupted(&self) {
        self.corrupted.store(true, Ordering::SeqCst);
    }

    /// Drop a persisted node while leaving its tag in the tag set
    pub fn remove_node(&self, tag: &str) -> Option<Node> {
        self.nodes.write().remove(tag)
    }
}

impl ComponentStore for MemoryStore {
    fn node(&self, tag: &str) -> Result<Option<Node>> {
        Ok(self.nodes.read().get(tag).cloned())
    }

    fn save_node(&self, tag: &str, node: &Node) -> Result<()> {
        self.nodes.write().insert(tag.to_string(), node.clone());
        Ok(())
    }

    fn protein_length(&self, accession: &str) -> Result<Option<usize>> {
        Ok(self.lengths.read().get(accession).copied())
    }

    fn save_protein_length(&self, accession: &str, length: usize) -> Result<()> {
        self.lengths.write().insert(accession.to_string(), length);
        Ok(())
    }

    fn version(&self) -> Result<Option<String>> {
        Ok(self.metadata.read().version.clone())
    }

    fn set_version(&self, version: &str) -> Result<()> {
        self.metadata.write().version = Some(version.to_string());
        Ok(())
    }

    fn initial_tag_size(&self) -> Result<Option<usize>> {
        Ok(self.metadata.read().initial_tag_size)
    }

    fn save_initial_tag_size(&self, size: usize) -> Result<()> {
        self.metadata.write().initial_tag_size = Some(size);
        Ok(())
    }

    fn is_import_complete(&self) -> Result<bool> {
        Ok(self.metadata.read().import_complete)
    }

    fn set_import_complete(&self, complete: bool) -> Result<()> {
        self.metadata.write().import_complete = complete;
        Ok(())
    }

    fn is_corrupted(&self) -> bool {
        self.corrupted.load(Ordering::SeqCst)
    }

    fn tags(&self) -> Result<Option<TagSet>> {
        Ok(self.metadata.read().tags.clone())
    }

    fn save_tags(&self, tags: &TagSet) -> Result<()> {
        self.metadata.write().tags = Some(tags.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.nodes.write().clear();
        self.lengths.write().clear();
        *self.metadata.write() = Metadata::default();
        self.corrupted.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
