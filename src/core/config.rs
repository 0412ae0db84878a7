use std::path::PathBuf;
use std::time::Duration;
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, Result};

/// Largest tag size whose key space still fits a `u32` ordinal (26^6).
pub const MAX_INITIAL_TAG_SIZE: usize = 6;

/// Approximate number of accession*node occurrences one MB of memory holds
/// (empirical value).
pub const CACHE_SCALE: usize = 12_000;

/// What the importer does with an accession that keeps failing after retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFailurePolicy {
    /// Log the accession and continue without it
    BestEffort,
    /// Abort the import with the accession's error
    FailFast,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_path: PathBuf,
    pub memory_allocation_mb: usize,

    // Tree shape
    pub initial_tag_size: usize,                 // Residues per index key
    pub max_node_size: usize,                    // Occurrences before a node is split
    pub max_peptide_size: usize,                 // Split depth bound and query length limit

    // Query caches
    pub query_cache_size: usize,                 // Entries per cache (fast and slow)
    pub query_time_threshold: Duration,          // Slower queries go to the slow cache

    // Import
    pub import_workers: usize,
    pub max_import_retries: usize,
    pub failure_policy: ImportFailurePolicy,
    pub compression: CompressionType,
    pub report_expected_import_time: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./protree"),
            memory_allocation_mb: 1024,

            initial_tag_size: 3,
            max_node_size: 500,                  // ~20ms per query
            max_peptide_size: 50,

            query_cache_size: 10_000,
            query_time_threshold: Duration::from_millis(20),

            import_workers: num_cpus::get(),
            max_import_retries: 3,
            failure_policy: ImportFailurePolicy::BestEffort,
            compression: CompressionType::LZ4,
            report_expected_import_time: false,
        }
    }
}

impl Config {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Config {
            storage_path: storage_path.into(),
            ..Default::default()
        }
    }

    /// Node cache budget in occurrence units
    pub fn node_cache_capacity(&self) -> usize {
        self.memory_allocation_mb.saturating_mul(CACHE_SCALE)
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_tag_size == 0 || self.initial_tag_size > MAX_INITIAL_TAG_SIZE {
            return Err(Error::invalid_argument(format!(
                "Initial tag size must be between 1 and {}, got {}",
                MAX_INITIAL_TAG_SIZE, self.initial_tag_size
            )));
        }
        if self.max_node_size == 0 {
            return Err(Error::invalid_argument("Maximal node size must be positive"));
        }
        if self.max_peptide_size < self.initial_tag_size {
            return Err(Error::invalid_argument(format!(
                "Maximal peptide size ({}) is smaller than the initial tag size ({})",
                self.max_peptide_size, self.initial_tag_size
            )));
        }
        if self.query_cache_size == 0 {
            return Err(Error::invalid_argument("Query cache size must be positive"));
        }
        if self.import_workers == 0 {
            return Err(Error::invalid_argument("At least one import worker is needed"));
        }
        Ok(())
    }
}
