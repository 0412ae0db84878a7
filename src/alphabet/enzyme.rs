/// Restricts indexed tags to peptide starts produced by a digestion
pub trait Enzyme: Send + Sync {
    fn is_cleavage_site(&self, previous: char, residue: char) -> bool;
}

/// Cleaves after a residue set unless the next residue restricts it
#[derive(Debug, Clone)]
pub struct CleavageRule {
    pub cleave_after: Vec<char>,
    pub restrict_before: Option<char>,
}

impl CleavageRule {
    pub fn new(cleave_after: &str, restrict_before: Option<char>) -> Self {
        CleavageRule {
            cleave_after: cleave_after.chars().collect(),
            restrict_before,
        }
    }

    /// After K or R, not before P
    pub fn trypsin() -> Self {
        Self::new("KR", Some('P'))
    }
}

impl Enzyme for CleavageRule {
    fn is_cleavage_site(&self, previous: char, residue: char) -> bool {
        self.cleave_after.contains(&previous) && self.restrict_before != Some(residue)
    }
}
