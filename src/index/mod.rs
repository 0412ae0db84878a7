pub mod node;
pub mod node_cache;

pub use node::{Node, NodeContent};
pub use node_cache::NodeCache;
