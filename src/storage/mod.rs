pub mod layout;
pub mod file_lock;
pub mod frame;
pub mod manifest;
pub mod file_store;
pub mod memory_store;

use crate::alphabet::tags::TagSet;
use crate::core::error::Result;
use crate::index::node::Node;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// Persistent side of a protein tree.
///
/// Stores are shared between import workers, so every method takes `&self`.
pub trait ComponentStore: Send + Sync {
    /// `Ok(None)` if no node was saved under the tag
    fn node(&self, tag: &str) -> Result<Option<Node>>;
    fn save_node(&self, tag: &str, node: &Node) -> Result<()>;

    fn protein_length(&self, accession: &str) -> Result<Option<usize>>;
    fn save_protein_length(&self, accession: &str, length: usize) -> Result<()>;

    fn version(&self) -> Result<Option<String>>;
    fn set_version(&self, version: &str) -> Result<()>;

    fn initial_tag_size(&self) -> Result<Option<usize>>;
    fn save_initial_tag_size(&self, size: usize) -> Result<()>;

    fn is_import_complete(&self) -> Result<bool>;
    fn set_import_complete(&self, complete: bool) -> Result<()>;

    /// True if metadata could not be read back intact
    fn is_corrupted(&self) -> bool;

    fn tags(&self) -> Result<Option<TagSet>>;
    fn save_tags(&self, tags: &TagSet) -> Result<()>;

    /// Drop every node and all metadata
    fn clear(&self) -> Result<()>;
    fn flush(&self) -> Result<()>;
}
