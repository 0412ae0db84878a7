use std::sync::Arc;
use crate::core::error::{Error, Result};
use crate::core::tree::ProteinTree;
use crate::core::types::ProteinMapping;
use crate::index::node::{Node, NodeContent};

struct Frame {
    root: Arc<Node>,    // Node of the tag the path starts with
    path: String,
}

/// Depth-first walk over every persisted node, yielding peptide paths in
/// strictly ascending order with their protein mapping.
///
/// Leaves yield their path and accessions; branches yield their termini
/// (when any) before their children. Not restartable: create a new iterator
/// to walk again.
pub struct PeptideIterator<'a> {
    tree: &'a ProteinTree,
    tags: Box<dyn Iterator<Item = String> + Send + 'a>,
    stack: Vec<Frame>,
    tag_size: usize,
    finished: bool,
}

impl<'a> PeptideIterator<'a> {
    pub fn new(tree: &'a ProteinTree) -> Self {
        PeptideIterator {
            tree,
            tags: Box::new(tree.tags().clone().into_tags()),
            stack: Vec::new(),
            tag_size: tree.initial_tag_size(),
            finished: false,
        }
    }

    fn advance(&mut self) -> Result<Option<(String, ProteinMapping)>> {
        loop {
            let Some(frame) = self.stack.pop() else {
                let Some(tag) = self.tags.next() else {
                    return Ok(None);
                };
                if let Some(root) = self.tree.node(&tag)? {
                    self.stack.push(Frame { root, path: tag });
                }
                continue;
            };

            let node = frame.root.sub_node(&frame.path[self.tag_size..]).ok_or_else(|| {
                Error::invalid_state(format!("Path {} vanished from its node", frame.path))
            })?;

            match node.content() {
                NodeContent::Leaf(accessions) => {
                    if !accessions.is_empty() {
                        return Ok(Some((frame.path, accessions.clone())));
                    }
                }
                NodeContent::Branch { subtree, termini } => {
                    for residue in subtree.keys().rev() {
                        let mut path = String::with_capacity(frame.path.len() + 1);
                        path.push_str(&frame.path);
                        path.push(*residue);
                        self.stack.push(Frame { root: frame.root.clone(), path });
                    }
                    if !termini.is_empty() {
                        return Ok(Some((frame.path, termini.clone())));
                    }
                }
            }
        }
    }
}

impl Iterator for PeptideIterator<'_> {
    type Item = Result<(String, ProteinMapping)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
