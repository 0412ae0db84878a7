/// Residue equivalence data consumed by the index.
///
/// The index never interprets residues itself: everything it knows about
/// ambiguity codes and masses comes through this table.
pub trait ResidueTable: Send + Sync {
    /// Sorted extended alphabet the tag key space is built over
    fn alphabet(&self) -> &[char];

    /// Definite residues a code stands for (`B` -> `D`, `N`); a definite
    /// residue stands for itself
    fn actual_residues(&self, residue: char) -> Vec<char>;

    /// Ambiguity codes covering the residue (`D` -> `B`, `X`)
    fn combinations(&self, residue: char) -> Vec<char>;

    /// Residues and codes whose mass is within `tolerance` Da of one of the
    /// residue's definite residues
    fn indistinguishable(&self, residue: char, tolerance: f64) -> Vec<char>;
}

/// Monoisotopic residue masses of the definite amino acids
const RESIDUE_MASSES: [(char, f64); 22] = [
    ('A', 71.03711),
    ('C', 103.00919),
    ('D', 115.02694),
    ('E', 129.04259),
    ('F', 147.06841),
    ('G', 57.02146),
    ('H', 137.05891),
    ('I', 113.08406),
    ('K', 128.09496),
    ('L', 113.08406),
    ('M', 131.04049),
    ('N', 114.04293),
    ('O', 237.14773),
    ('P', 97.05276),
    ('Q', 128.05858),
    ('R', 156.10111),
    ('S', 87.03203),
    ('T', 101.04768),
    ('U', 150.95364),
    ('V', 99.06841),
    ('W', 186.07931),
    ('Y', 163.06333),
];

/// Ambiguity codes and the definite residues they cover (X handled apart)
const AMBIGUITY_CODES: [(char, &str); 3] = [
    ('B', "DN"),
    ('J', "IL"),
    ('Z', "EQ"),
];

const ANY_RESIDUE: char = 'X';

/// The 26-letter extended amino-acid alphabet
#[derive(Debug, Clone)]
pub struct StandardAminoAcids {
    alphabet: Vec<char>,
}

impl StandardAminoAcids {
    pub fn new() -> Self {
        StandardAminoAcids {
            alphabet: ('A'..='Z').collect(),
        }
    }

    pub fn mass(&self, residue: char) -> Option<f64> {
        RESIDUE_MASSES
            .iter()
            .find(|(aa, _)| *aa == residue)
            .map(|(_, mass)| *mass)
    }

    fn is_definite(residue: char) -> bool {
        RESIDUE_MASSES.iter().any(|(aa, _)| *aa == residue)
    }
}

impl Default for StandardAminoAcids {
    fn default() -> Self {
        Self::new()
    }
}

impl ResidueTable for StandardAminoAcids {
    fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    fn actual_residues(&self, residue: char) -> Vec<char> {
        if residue == ANY_RESIDUE {
            return RESIDUE_MASSES.iter().map(|(aa, _)| *aa).collect();
        }
        match AMBIGUITY_CODES.iter().find(|(code, _)| *code == residue) {
            Some((_, covered)) => covered.chars().collect(),
            None => vec![residue],
        }
    }

    fn combinations(&self, residue: char) -> Vec<char> {
        if residue == ANY_RESIDUE {
            return Vec::new();
        }
        let mut result: Vec<char> = AMBIGUITY_CODES
            .iter()
            .filter(|(_, covered)| covered.contains(residue))
            .map(|(code, _)| *code)
            .collect();
        if Self::is_definite(residue) || AMBIGUITY_CODES.iter().any(|(code, _)| *code == residue) {
            result.push(ANY_RESIDUE);
        }
        result
    }

    fn indistinguishable(&self, residue: char, tolerance: f64) -> Vec<char> {
        let mut result = Vec::new();
        for actual in self.actual_residues(residue) {
            let Some(reference) = self.mass(actual) else {
                continue;
            };
            for (candidate, mass) in RESIDUE_MASSES.iter() {
                if (mass - reference).abs() <= tolerance {
                    for aa in std::iter::once(*candidate).chain(self.combinations(*candidate)) {
                        if !result.contains(&aa) {
                            result.push(aa);
                        }
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_is_the_26_letters() {
        let table = StandardAminoAcids::new();
        assert_eq!(table.alphabet().len(), 26);
        assert_eq!(table.alphabet()[0], 'A');
        assert_eq!(table.alphabet()[25], 'Z');
    }

    #[test]
    fn ambiguity_codes_expand_to_definite_residues() {
        let table = StandardAminoAcids::new();
        assert_eq!(table.actual_residues('B'), vec!['D', 'N']);
        assert_eq!(table.actual_residues('Z'), vec!['E', 'Q']);
        assert_eq!(table.actual_residues('K'), vec!['K']);
        assert_eq!(table.actual_residues('X').len(), 22);
    }

    #[test]
    fn combinations_cover_the_residue() {
        let table = StandardAminoAcids::new();
        assert_eq!(table.combinations('D'), vec!['B', 'X']);
        assert_eq!(table.combinations('L'), vec!['J', 'X']);
        assert_eq!(table.combinations('K'), vec!['X']);
        assert_eq!(table.combinations('Z'), vec!['X']);
        assert!(table.combinations('X').is_empty());
    }

    #[test]
    fn isoleucine_and_leucine_are_indistinguishable() {
        let table = StandardAminoAcids::new();
        let candidates = table.indistinguishable('I', 0.001);
        assert!(candidates.contains(&'L'));
        assert!(candidates.contains(&'J'));
        assert!(!candidates.contains(&'K'));
    }

    #[test]
    fn lysine_and_glutamine_depend_on_tolerance() {
        let table = StandardAminoAcids::new();
        assert!(!table.indistinguishable('K', 0.01).contains(&'Q'));
        assert!(table.indistinguishable('K', 0.05).contains(&'Q'));
    }
}
