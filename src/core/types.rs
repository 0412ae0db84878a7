use std::collections::BTreeMap;

/// Position of a residue in a protein sequence (0-based)
pub type Position = u32;

/// Protein accession -> sorted unique positions
pub type ProteinMapping = BTreeMap<String, Vec<Position>>;

/// Matched sequence -> protein accession -> sorted unique positions
pub type PeptideMapping = BTreeMap<String, ProteinMapping>;

/// Merge `positions` into the sorted unique list `target`
pub fn merge_positions(target: &mut Vec<Position>, positions: &[Position]) {
    if target.is_empty() {
        target.extend_from_slice(positions);
        target.sort_unstable();
        target.dedup();
        return;
    }
    for &position in positions {
        if let Err(index) = target.binary_search(&position) {
            target.insert(index, position);
        }
    }
}

/// Merge a protein mapping into another one, keeping position lists sorted and unique
pub fn merge_protein_mapping(target: &mut ProteinMapping, other: &ProteinMapping) {
    for (accession, positions) in other {
        merge_positions(target.entry(accession.clone()).or_default(), positions);
    }
}

/// Merge a peptide mapping into another one
pub fn merge_peptide_mapping(target: &mut PeptideMapping, other: &PeptideMapping) {
    for (sequence, mapping) in other {
        if mapping.is_empty() {
            continue;
        }
        merge_protein_mapping(target.entry(sequence.clone()).or_default(), mapping);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_positions_sorted_and_unique() {
        let mut positions = vec![3, 9];
        merge_positions(&mut positions, &[12, 3, 1, 9]);
        assert_eq!(positions, vec![1, 3, 9, 12]);

        let mut empty = Vec::new();
        merge_positions(&mut empty, &[5, 2, 5]);
        assert_eq!(empty, vec![2, 5]);
    }

    #[test]
    fn merge_peptide_mapping_skips_empty_entries() {
        let mut target = PeptideMapping::new();
        let mut other = PeptideMapping::new();
        other.insert("PEP".to_string(), ProteinMapping::new());
        other.insert("TIDE".to_string(), ProteinMapping::from([("P1".to_string(), vec![4])]));

        merge_peptide_mapping(&mut target, &other);

        assert!(!target.contains_key("PEP"));
        assert_eq!(target["TIDE"]["P1"], vec![4]);
    }
}
