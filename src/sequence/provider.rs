use std::collections::BTreeMap;
use std::sync::Arc;
use crate::core::error::{Error, ErrorKind, Result};
use crate::sequence::fasta::parse_fasta;

/// Suffix appended to target accessions to name their reversed decoys
pub const DEFAULT_DECOY_SUFFIX: &str = "_REVERSED";

/// Source of protein sequences the index is built from.
///
/// Implementations must be shareable between import workers.
pub trait SequenceProvider: Send + Sync {
    /// Every accession of the database, decoys included
    fn accessions(&self) -> Vec<String>;

    fn sequence(&self, accession: &str) -> Result<Arc<str>>;

    /// True when decoys are the reversed target sequences, so their
    /// mappings can be derived from the targets at query time
    fn is_default_reversed(&self) -> bool;

    fn decoy_suffix(&self) -> &str {
        DEFAULT_DECOY_SUFFIX
    }

    fn is_decoy_accession(&self, accession: &str) -> bool {
        accession.ends_with(self.decoy_suffix())
    }

    fn decoy_accession(&self, target: &str) -> String {
        format!("{}{}", target, self.decoy_suffix())
    }

    fn target_accession(&self, decoy: &str) -> String {
        decoy
            .strip_suffix(self.decoy_suffix())
            .unwrap_or(decoy)
            .to_string()
    }
}

pub fn reverse_sequence(sequence: &str) -> String {
    sequence.chars().rev().collect()
}

/// Sequence provider backed by an in-memory accession map
#[derive(Debug, Clone, Default)]
pub struct InMemorySequenceProvider {
    proteins: BTreeMap<String, Arc<str>>,
    default_reversed: bool,
}

impl InMemorySequenceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fasta(text: &str) -> Result<Self> {
        let mut provider = Self::new();
        for record in parse_fasta(text)? {
            if provider.proteins.contains_key(&record.accession) {
                return Err(Error::new(
                    ErrorKind::Parse,
                    format!("Duplicate accession {} in FASTA", record.accession),
                ));
            }
            provider.add_protein(record.accession, &record.sequence);
        }
        Ok(provider)
    }

    /// Insert or replace a protein; residues are upper-cased
    pub fn add_protein(&mut self, accession: impl Into<String>, sequence: &str) {
        self.proteins
            .insert(accession.into(), Arc::from(sequence.to_ascii_uppercase()));
    }

    /// Add a reversed decoy for every target and mark the database as
    /// default-reversed
    pub fn generate_decoys(&mut self) {
        let targets: Vec<(String, Arc<str>)> = self
            .proteins
            .iter()
            .filter(|(accession, _)| !self.is_decoy_accession(accession))
            .map(|(accession, sequence)| (accession.clone(), sequence.clone()))
            .collect();

        for (accession, sequence) in targets {
            let decoy = self.decoy_accession(&accession);
            self.proteins
                .insert(decoy, Arc::from(reverse_sequence(&sequence)));
        }
        self.default_reversed = true;
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    pub fn target_count(&self) -> usize {
        self.proteins
            .keys()
            .filter(|accession| !self.is_decoy_accession(accession))
            .count()
    }
}

impl SequenceProvider for InMemorySequenceProvider {
    fn accessions(&self) -> Vec<String> {
        self.proteins.keys().cloned().collect()
    }

    fn sequence(&self, accession: &str) -> Result<Arc<str>> {
        self.proteins.get(accession).cloned().ok_or_else(|| {
            Error::new(ErrorKind::NotFound, format!("Protein {} not found", accession))
        })
    }

    fn is_default_reversed(&self) -> bool {
        self.default_reversed
    }
}
