use std::collections::BTreeSet;
use crate::alphabet::policy::ResidueMatcher;

/// Candidate initial tags for a peptide: the cross-product of the matcher's
/// candidates over the first `tag_size` residues, sorted and unique.
pub fn initial_tags(peptide: &str, tag_size: usize, matcher: &ResidueMatcher) -> Vec<String> {
    let mut tags: BTreeSet<String> = BTreeSet::from([String::new()]);

    for residue in peptide.chars().take(tag_size) {
        let candidates = matcher.candidates(residue);
        tags = tags
            .iter()
            .flat_map(|tag| {
                candidates.iter().map(move |candidate| {
                    let mut extended = String::with_capacity(tag_size);
                    extended.push_str(tag);
                    extended.push(*candidate);
                    extended
                })
            })
            .collect();
    }

    tags.into_iter().filter(|tag| tag.len() == tag_size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::amino_acid::StandardAminoAcids;
    use crate::alphabet::policy::MatchingPolicy;

    #[test]
    fn string_policy_yields_the_prefix() {
        let matcher = ResidueMatcher::new(&StandardAminoAcids::new(), MatchingPolicy::String);
        assert_eq!(initial_tags("KVLAA", 3, &matcher), vec!["KVL".to_string()]);
    }

    #[test]
    fn ambiguous_residues_multiply_the_tags() {
        let matcher = ResidueMatcher::new(&StandardAminoAcids::new(), MatchingPolicy::Combinations);
        let tags = initial_tags("KBL", 3, &matcher);
        // K: K, X / B: B, D, N, X / L: L, J, X
        assert_eq!(tags.len(), 2 * 4 * 3);
        assert!(tags.contains(&"KDL".to_string()));
        assert!(tags.contains(&"XXX".to_string()));
        assert!(tags.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn short_peptides_yield_nothing() {
        let matcher = ResidueMatcher::new(&StandardAminoAcids::new(), MatchingPolicy::String);
        assert!(initial_tags("KV", 3, &matcher).is_empty());
    }
}
