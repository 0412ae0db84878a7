use std::fmt;
use crate::alphabet::amino_acid::ResidueTable;

/// Amino-acid equivalence rule applied when resolving residues
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchingPolicy {
    /// Exact string matching
    String,
    /// Ambiguity codes match the residues they cover
    Combinations,
    /// Combinations plus residues within a mass tolerance (Da)
    Indistinguishable { tolerance: f64 },
}

impl fmt::Display for MatchingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MatchingPolicy::String => write!(f, "string"),
            MatchingPolicy::Combinations => write!(f, "combinations"),
            MatchingPolicy::Indistinguishable { tolerance } => {
                write!(f, "indistinguishable ({} Da)", tolerance)
            }
        }
    }
}

/// Per-residue candidate sets for one policy, computed once per query.
///
/// Tag expansion and node matching both go through this type so that a
/// policy is applied identically at every position.
pub struct ResidueMatcher {
    policy: MatchingPolicy,
    candidates: Vec<Vec<char>>,
}

impl ResidueMatcher {
    pub fn new(table: &dyn ResidueTable, policy: MatchingPolicy) -> Self {
        let candidates = (0u8..128)
            .map(|byte| Self::expand(table, policy, byte as char))
            .collect();
        ResidueMatcher { policy, candidates }
    }

    fn expand(table: &dyn ResidueTable, policy: MatchingPolicy, residue: char) -> Vec<char> {
        let mut result = vec![residue];
        let mut push = |aa: char| {
            if !result.contains(&aa) {
                result.push(aa);
            }
        };
        match policy {
            MatchingPolicy::String => {}
            MatchingPolicy::Combinations => {
                table.actual_residues(residue).into_iter().for_each(&mut push);
                table.combinations(residue).into_iter().for_each(&mut push);
            }
            MatchingPolicy::Indistinguishable { tolerance } => {
                table.actual_residues(residue).into_iter().for_each(&mut push);
                table.combinations(residue).into_iter().for_each(&mut push);
                table.indistinguishable(residue, tolerance).into_iter().for_each(&mut push);
            }
        }
        result
    }

    pub fn policy(&self) -> MatchingPolicy {
        self.policy
    }

    /// Database residues a query residue may stand for, the residue itself first
    pub fn candidates(&self, residue: char) -> &[char] {
        self.candidates
            .get(residue as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn matches(&self, query: char, residue: char) -> bool {
        if query == residue {
            return true;
        }
        self.candidates(query).contains(&residue)
    }
}
