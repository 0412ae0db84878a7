use crate::core::error::{Error, Result};
use crate::core::types::{merge_positions, PeptideMapping, Position};
use crate::sequence::provider::{reverse_sequence, SequenceProvider};
use crate::storage::ComponentStore;

/// Project a mapping onto the reversed proteins: targets become decoys and
/// decoys become targets, each position `p` of a match of length `l` in a
/// protein of length `n` moving to `n - p - l`.
pub fn reversed_results(
    forward: &PeptideMapping,
    provider: &dyn SequenceProvider,
    store: &dyn ComponentStore,
) -> Result<PeptideMapping> {
    let mut result = PeptideMapping::new();

    for (sequence, mapping) in forward {
        let peptide_length = sequence.len();
        let reversed_sequence = reverse_sequence(sequence);

        for (accession, positions) in mapping {
            let (new_accession, target) = if provider.is_decoy_accession(accession) {
                let target = provider.target_accession(accession);
                (target.clone(), target)
            } else {
                (provider.decoy_accession(accession), accession.clone())
            };

            let protein_length = store.protein_length(&target)?.ok_or_else(|| {
                Error::invalid_state(format!("Length of protein {} not found", target))
            })?;

            let mut reversed = Vec::with_capacity(positions.len());
            for &position in positions {
                let index = protein_length as i64 - position as i64 - peptide_length as i64;
                if index < 0 || index >= protein_length as i64 {
                    return Err(Error::invalid_state(format!(
                        "Wrong index found for peptide {} in protein {}: {}",
                        reversed_sequence, new_accession, index
                    )));
                }
                reversed.push(index as Position);
            }

            let entry = result
                .entry(reversed_sequence.clone())
                .or_default()
                .entry(new_accession)
                .or_default();
            merge_positions(entry, &reversed);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::types::ProteinMapping;
    use crate::sequence::provider::InMemorySequenceProvider;
    use crate::storage::MemoryStore;

    fn forward(sequence: &str, accession: &str, positions: Vec<Position>) -> PeptideMapping {
        PeptideMapping::from([(
            sequence.to_string(),
            ProteinMapping::from([(accession.to_string(), positions)]),
        )])
    }

    #[test]
    fn target_matches_move_to_the_decoy() {
        let provider = InMemorySequenceProvider::new();
        let store = MemoryStore::new();
        store.save_protein_length("P1", 6).unwrap();

        // "KVL" at 1 in MKVLAA is "LVK" at 2 in AALVKM
        let result = reversed_results(&forward("KVL", "P1", vec![1]), &provider, &store).unwrap();
        assert_eq!(result["LVK"]["P1_REVERSED"], vec![2]);
    }

    #[test]
    fn decoy_matches_move_back_to_the_target() {
        let provider = InMemorySequenceProvider::new();
        let store = MemoryStore::new();
        store.save_protein_length("P1", 6).unwrap();

        let result = reversed_results(&forward("LVK", "P1_REVERSED", vec![2]), &provider, &store).unwrap();
        assert_eq!(result["KVL"]["P1"], vec![1]);
    }

    #[test]
    fn stale_lengths_are_rejected() {
        let provider = InMemorySequenceProvider::new();
        let store = MemoryStore::new();

        let err = reversed_results(&forward("KVL", "P1", vec![1]), &provider, &store).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);

        store.save_protein_length("P1", 3).unwrap();
        let err = reversed_results(&forward("KVL", "P1", vec![1]), &provider, &store).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
    }
}
