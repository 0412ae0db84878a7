pub mod amino_acid;
pub mod policy;
pub mod tags;
pub mod enzyme;

pub use amino_acid::{ResidueTable, StandardAminoAcids};
pub use enzyme::{CleavageRule, Enzyme};
pub use policy::{MatchingPolicy, ResidueMatcher};
pub use tags::{TagSet, TagSpace};
