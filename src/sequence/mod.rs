pub mod fasta;
pub mod provider;

pub use fasta::{parse_fasta, FastaRecord};
pub use provider::{reverse_sequence, InMemorySequenceProvider, SequenceProvider, DEFAULT_DECOY_SUFFIX};
