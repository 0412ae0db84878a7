use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::alphabet::policy::ResidueMatcher;
use crate::core::error::{Error, Result};
use crate::core::types::{merge_positions, merge_protein_mapping, PeptideMapping, Position, ProteinMapping};
use crate::sequence::provider::SequenceProvider;

/// Occurrences of one residue path, starting at a tag.
///
/// `depth` is the length of the path the node stands for; every occurrence
/// `(accession, position)` under the node satisfies
/// `sequence[position..position + depth] == path`. Sequences are ASCII.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    depth: usize,
    size: usize,
    content: NodeContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeContent {
    /// Flat accession -> positions map
    Leaf(ProteinMapping),
    /// Children keyed by the residue following the path, plus the
    /// occurrences whose protein ends right at the path
    Branch {
        subtree: BTreeMap<char, Node>,
        termini: ProteinMapping,
    },
}

/// Sequences fetched at most once per node operation
struct SequenceCache<'a> {
    provider: &'a dyn SequenceProvider,
    sequences: HashMap<String, Arc<str>>,
}

impl<'a> SequenceCache<'a> {
    fn new(provider: &'a dyn SequenceProvider) -> Self {
        SequenceCache {
            provider,
            sequences: HashMap::new(),
        }
    }

    fn get(&mut self, accession: &str) -> Result<Arc<str>> {
        if let Some(sequence) = self.sequences.get(accession) {
            return Ok(sequence.clone());
        }
        let sequence = self.provider.sequence(accession)?;
        self.sequences.insert(accession.to_string(), sequence.clone());
        Ok(sequence)
    }
}

impl Node {
    pub fn new(depth: usize) -> Self {
        Node {
            depth,
            size: 0,
            content: NodeContent::Leaf(ProteinMapping::new()),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Occurrences reachable under this node
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.content, NodeContent::Leaf(_))
    }

    pub fn accessions(&self) -> Option<&ProteinMapping> {
        match &self.content {
            NodeContent::Leaf(accessions) => Some(accessions),
            NodeContent::Branch { .. } => None,
        }
    }

    pub fn subtree(&self) -> Option<&BTreeMap<char, Node>> {
        match &self.content {
            NodeContent::Leaf(_) => None,
            NodeContent::Branch { subtree, .. } => Some(subtree),
        }
    }

    pub fn termini(&self) -> Option<&ProteinMapping> {
        match &self.content {
            NodeContent::Leaf(_) => None,
            NodeContent::Branch { termini, .. } => Some(termini),
        }
    }

    /// Descend by the residues of `path`, relative to this node
    pub fn sub_node(&self, path: &str) -> Option<&Node> {
        let mut node = self;
        for residue in path.chars() {
            node = node.subtree()?.get(&residue)?;
        }
        Some(node)
    }

    /// All occurrences under this node, flattened
    pub fn occurrences(&self) -> ProteinMapping {
        match &self.content {
            NodeContent::Leaf(accessions) => accessions.clone(),
            NodeContent::Branch { subtree, termini } => {
                let mut result = termini.clone();
                for child in subtree.values() {
                    merge_protein_mapping(&mut result, &child.occurrences());
                }
                result
            }
        }
    }

    /// Import-time accumulation; only valid before the node is split
    pub fn add_accession(&mut self, accession: &str, positions: &[Position]) -> Result<()> {
        let NodeContent::Leaf(accessions) = &mut self.content else {
            return Err(Error::invalid_state("Cannot add accessions to a split node"));
        };
        let entry = accessions.entry(accession.to_string()).or_default();
        let before = entry.len();
        merge_positions(entry, positions);
        self.size += entry.len() - before;
        Ok(())
    }

    /// Positions must arrive in ascending order per accession
    fn push_occurrence(&mut self, accession: &str, position: Position) {
        if let NodeContent::Leaf(accessions) = &mut self.content {
            let entry = accessions.entry(accession.to_string()).or_default();
            if entry.last() != Some(&position) {
                entry.push(position);
                self.size += 1;
            }
        }
    }

    /// Reorganize an oversized leaf into a subtree keyed by the next
    /// residue, recursively, until groups fit `max_node_size` or the depth
    /// reaches `max_peptide_size`.
    pub fn split(
        &mut self,
        max_node_size: usize,
        max_peptide_size: usize,
        provider: &dyn SequenceProvider,
    ) -> Result<()> {
        let mut sequences = SequenceCache::new(provider);
        self.split_with(max_node_size, max_peptide_size, &mut sequences)
    }

    fn split_with(
        &mut self,
        max_node_size: usize,
        max_peptide_size: usize,
        sequences: &mut SequenceCache,
    ) -> Result<()> {
        if self.size <= max_node_size || self.depth >= max_peptide_size {
            return Ok(());
        }
        let NodeContent::Leaf(accessions) = &mut self.content else {
            return Ok(());
        };
        let accessions = std::mem::take(accessions);

        let mut subtree: BTreeMap<char, Node> = BTreeMap::new();
        let mut termini = ProteinMapping::new();

        for (accession, positions) in &accessions {
            let sequence = sequences.get(accession)?;
            let residues = sequence.as_bytes();
            for &position in positions {
                let next = position as usize + self.depth;
                match residues.get(next) {
                    Some(&residue) => subtree
                        .entry(residue as char)
                        .or_insert_with(|| Node::new(self.depth + 1))
                        .push_occurrence(accession, position),
                    None if next == residues.len() => {
                        termini.entry(accession.clone()).or_default().push(position)
                    }
                    None => {
                        return Err(Error::corruption(format!(
                            "Position {} of {} lies beyond the protein ({} residues)",
                            position,
                            accession,
                            residues.len()
                        )));
                    }
                }
            }
        }

        for child in subtree.values_mut() {
            child.split_with(max_node_size, max_peptide_size, sequences)?;
        }

        self.content = NodeContent::Branch { subtree, termini };
        Ok(())
    }

    /// Match `peptide` against the occurrences under this node.
    ///
    /// `prefix` is the residue path of this node and must already match the
    /// first `depth` residues of the peptide. Returns matched protein
    /// subsequence -> accession -> positions.
    pub fn match_peptide(
        &self,
        prefix: &str,
        peptide: &str,
        matcher: &ResidueMatcher,
        provider: &dyn SequenceProvider,
    ) -> Result<PeptideMapping> {
        if peptide.len() < self.depth || prefix.len() != self.depth {
            return Err(Error::invalid_argument(format!(
                "Peptide {} cannot be matched at node {} (depth {})",
                peptide, prefix, self.depth
            )));
        }

        let mut sequences = SequenceCache::new(provider);
        let mut path = prefix.to_string();
        let mut result = PeptideMapping::new();
        self.collect_matches(&mut path, peptide.as_bytes(), matcher, &mut sequences, &mut result)?;
        Ok(result)
    }

    fn collect_matches(
        &self,
        path: &mut String,
        peptide: &[u8],
        matcher: &ResidueMatcher,
        sequences: &mut SequenceCache,
        result: &mut PeptideMapping,
    ) -> Result<()> {
        if peptide.len() == self.depth {
            let occurrences = self.occurrences();
            if !occurrences.is_empty() {
                merge_protein_mapping(result.entry(path.clone()).or_default(), &occurrences);
            }
            return Ok(());
        }

        match &self.content {
            NodeContent::Leaf(accessions) => {
                for (accession, positions) in accessions {
                    let sequence = sequences.get(accession)?;
                    let residues = sequence.as_bytes();
                    for &position in positions {
                        let start = position as usize;
                        let end = start + peptide.len();
                        if end > residues.len() {
                            continue;
                        }
                        let matched = peptide[self.depth..]
                            .iter()
                            .zip(&residues[start + self.depth..end])
                            .all(|(&query, &residue)| matcher.matches(query as char, residue as char));
                        if matched {
                            let subsequence = sequence[start..end].to_string();
                            let entry = result
                                .entry(subsequence)
                                .or_default()
                                .entry(accession.clone())
                                .or_default();
                            merge_positions(entry, &[position]);
                        }
                    }
                }
            }
            NodeContent::Branch { subtree, .. } => {
                let query = peptide[self.depth] as char;
                for residue in matcher.candidates(query) {
                    if let Some(child) = subtree.get(residue) {
                        path.push(*residue);
                        child.collect_matches(path, peptide, matcher, sequences, result)?;
                        path.pop();
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::amino_acid::StandardAminoAcids;
    use crate::alphabet::policy::MatchingPolicy;
    use crate::sequence::provider::InMemorySequenceProvider;

    fn provider() -> InMemorySequenceProvider {
        let mut provider = InMemorySequenceProvider::new();
        provider.add_protein("P1", "MKVLAA");
        provider.add_protein("P2", "KVLCC");
        provider.add_protein("P3", "AKVL");
        provider
    }

    fn kvl_node() -> Node {
        let mut node = Node::new(3);
        node.add_accession("P1", &[1]).unwrap();
        node.add_accession("P2", &[0]).unwrap();
        node.add_accession("P3", &[1]).unwrap();
        node
    }

    fn string_matcher() -> ResidueMatcher {
        ResidueMatcher::new(&StandardAminoAcids::new(), MatchingPolicy::String)
    }

    #[test]
    fn add_accession_counts_unique_positions() {
        let mut node = Node::new(3);
        node.add_accession("P1", &[4, 1]).unwrap();
        node.add_accession("P1", &[1, 7]).unwrap();
        assert_eq!(node.size(), 3);
        assert_eq!(node.accessions().unwrap()["P1"], vec![1, 4, 7]);
    }

    #[test]
    fn leaf_matching_verifies_the_protein() {
        let provider = provider();
        let node = kvl_node();

        let result = node.match_peptide("KVL", "KVLAA", &string_matcher(), &provider).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["KVLAA"]["P1"], vec![1]);

        let result = node.match_peptide("KVL", "KVLAAA", &string_matcher(), &provider).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn split_groups_by_next_residue_and_keeps_termini() {
        let provider = provider();
        let mut node = kvl_node();
        node.split(1, 50, &provider).unwrap();

        assert!(!node.is_leaf());
        assert_eq!(node.size(), 3);
        assert_eq!(node.termini().unwrap()["P3"], vec![1]);
        let subtree = node.subtree().unwrap();
        assert_eq!(subtree.keys().copied().collect::<Vec<_>>(), vec!['A', 'C']);
        assert_eq!(node.sub_node("A").unwrap().depth(), 4);
        assert_eq!(node.sub_node("C").unwrap().accessions().unwrap()["P2"], vec![0]);
        assert!(node.sub_node("Q").is_none());
        assert_eq!(node.occurrences(), kvl_node().occurrences());
    }

    #[test]
    fn split_node_matches_like_the_leaf() {
        let provider = provider();
        let matcher = string_matcher();
        let leaf = kvl_node();
        let mut branch = kvl_node();
        branch.split(1, 50, &provider).unwrap();

        for peptide in ["KVL", "KVLA", "KVLAA", "KVLC", "KVLCC", "KVLCA"] {
            assert_eq!(
                leaf.match_peptide("KVL", peptide, &matcher, &provider).unwrap(),
                branch.match_peptide("KVL", peptide, &matcher, &provider).unwrap(),
                "{}",
                peptide
            );
        }

        let whole = branch.match_peptide("KVL", "KVL", &matcher, &provider).unwrap();
        assert_eq!(whole["KVL"].len(), 3);
    }

    #[test]
    fn split_stops_at_the_peptide_size_bound() {
        let provider = provider();
        let mut node = kvl_node();
        node.split(1, 3, &provider).unwrap();
        assert!(node.is_leaf());
    }

    #[test]
    fn ambiguous_query_explores_every_branch() {
        let provider = provider();
        let mut node = kvl_node();
        node.split(1, 50, &provider).unwrap();
        let matcher = ResidueMatcher::new(&StandardAminoAcids::new(), MatchingPolicy::Combinations);

        let result = node.match_peptide("KVL", "KVLX", &matcher, &provider).unwrap();
        assert_eq!(result["KVLA"]["P1"], vec![1]);
        assert_eq!(result["KVLC"]["P2"], vec![0]);
    }

    #[test]
    fn split_nodes_reject_new_accessions() {
        let provider = provider();
        let mut node = kvl_node();
        node.split(1, 50, &provider).unwrap();
        assert!(node.add_accession("P4", &[0]).is_err());
    }
}
