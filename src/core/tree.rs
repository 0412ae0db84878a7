use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};
use crate::alphabet::amino_acid::ResidueTable;
use crate::alphabet::enzyme::Enzyme;
use crate::alphabet::policy::{MatchingPolicy, ResidueMatcher};
use crate::alphabet::tags::TagSet;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::stats::TreeStats;
use crate::core::types::{merge_peptide_mapping, PeptideMapping, Position, ProteinMapping};
use crate::index::node::Node;
use crate::index::node_cache::NodeCache;
use crate::parallel::importer::{Importer, INDEX_VERSION};
use crate::parallel::progress::ProgressHandler;
use crate::query::cache::QueryCache;
use crate::query::expansion::initial_tags;
use crate::query::reversal::reversed_results;
use crate::search::iterator::PeptideIterator;
use crate::sequence::provider::{reverse_sequence, SequenceProvider};
use crate::storage::ComponentStore;

/// Peptide to protein index over the proteins of a sequence provider.
///
/// Opening validates the store and rebuilds it when needed; afterwards the
/// tree is read-only and can be queried from several threads.
pub struct ProteinTree {
    config: Config,

    store: Arc<dyn ComponentStore>,
    provider: Arc<dyn SequenceProvider>,
    residues: Arc<dyn ResidueTable>,
    tags: TagSet,

    node_cache: NodeCache,
    query_cache: QueryCache,

    // Metrics
    start_time: Instant,
    query_count: AtomicU64,
}

impl ProteinTree {
    pub fn open(
        config: Config,
        store: Arc<dyn ComponentStore>,
        provider: Arc<dyn SequenceProvider>,
        residues: Arc<dyn ResidueTable>,
        enzyme: Option<&dyn Enzyme>,
        progress: &dyn ProgressHandler,
    ) -> Result<Self> {
        config.validate()?;

        match Self::reindex_reason(store.as_ref(), &config)? {
            Some(reason) => {
                warn!("Rebuilding protein tree: {}", reason);
                store.clear()?;
                let importer = Importer::new(
                    &config,
                    store.as_ref(),
                    provider.as_ref(),
                    residues.as_ref(),
                    enzyme,
                    progress,
                );
                if let Err(e) = importer.run() {
                    warn!("Import failed, clearing the store: {}", e);
                    if let Err(clear_error) = store.clear() {
                        warn!("Could not clear the store: {}", clear_error);
                    }
                    return Err(e);
                }
            }
            None => info!("Opening existing protein tree (tag size {})", config.initial_tag_size),
        }

        let tags = store
            .tags()?
            .ok_or_else(|| Error::corruption("Tag set missing from a completed import"))?;

        Ok(ProteinTree {
            node_cache: NodeCache::new(config.node_cache_capacity()),
            query_cache: QueryCache::new(config.query_cache_size, config.query_time_threshold),
            config,
            store,
            provider,
            residues,
            tags,
            start_time: Instant::now(),
            query_count: AtomicU64::new(0),
        })
    }

    /// Why the store cannot be used as is, if it cannot
    fn reindex_reason(store: &dyn ComponentStore, config: &Config) -> Result<Option<String>> {
        if store.is_corrupted() {
            return Ok(Some("store is corrupted".to_string()));
        }
        if !store.is_import_complete()? {
            return Ok(Some("no completed import".to_string()));
        }
        let version = store.version()?;
        if version.as_deref() != Some(INDEX_VERSION) {
            return Ok(Some(format!("version {:?} is not {}", version, INDEX_VERSION)));
        }
        let tag_size = store.initial_tag_size()?;
        if tag_size != Some(config.initial_tag_size) {
            return Ok(Some(format!(
                "tag size {:?} differs from the requested {}",
                tag_size, config.initial_tag_size
            )));
        }
        match store.tags()? {
            Some(tags) if tags.space().tag_size() == config.initial_tag_size => Ok(None),
            Some(_) => Ok(Some("tag set does not match the tag size".to_string())),
            None => Ok(Some("tag set missing".to_string())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn initial_tag_size(&self) -> usize {
        self.config.initial_tag_size
    }

    /// Tags present in the database
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Node of a tag, paged in through the node cache; `Ok(None)` if the tag
    /// never occurs in the database
    pub fn node(&self, tag: &str) -> Result<Option<Arc<Node>>> {
        if !self.tags.contains(tag) {
            return Ok(None);
        }

        match self.node_cache.get_or_load(tag, || self.store.node(tag))? {
            Some(node) => Ok(Some(node)),
            None => Err(Error::corruption(format!(
                "Node {} is in the tag set but missing from the store",
                tag
            ))),
        }
    }

    /// Matched sequence -> accession -> positions for a peptide under a
    /// matching policy, decoy coordinates included when decoys are reversed
    /// targets
    pub fn protein_mapping(&self, peptide: &str, policy: MatchingPolicy) -> Result<Arc<PeptideMapping>> {
        let peptide = self.normalize(peptide)?;
        let start = Instant::now();
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.query_cache.ensure_policy(policy);

        let matcher = ResidueMatcher::new(self.residues.as_ref(), policy);
        let mapping = self.lookup(&peptide, &matcher, false)?;

        debug!(
            "Mapped {} ({}): {} sequences, {} proteins in {:.2?} (node cache {}/{})",
            peptide,
            policy,
            mapping.len(),
            mapping.values().map(|proteins| proteins.len()).sum::<usize>(),
            start.elapsed(),
            self.node_cache.occupancy(),
            self.node_cache.capacity()
        );
        Ok(mapping)
    }

    fn lookup(&self, peptide: &str, matcher: &ResidueMatcher, reversed: bool) -> Result<Arc<PeptideMapping>> {
        let policy = matcher.policy();
        if let Some(mapping) = self.query_cache.get(peptide, policy) {
            return Ok(mapping);
        }

        let default_reversed = self.provider.is_default_reversed();
        if default_reversed {
            let reversed_peptide = reverse_sequence(peptide);
            if let Some(mapping) = self.query_cache.peek(&reversed_peptide, policy) {
                let converted = reversed_results(&mapping, self.provider.as_ref(), self.store.as_ref())?;
                return Ok(Arc::new(converted));
            }
        }

        let start = Instant::now();
        let mut result = PeptideMapping::new();

        for tag in initial_tags(peptide, self.config.initial_tag_size, matcher) {
            if let Some(node) = self.node(&tag)? {
                let tag_results = node.match_peptide(&tag, peptide, matcher, self.provider.as_ref())?;
                merge_peptide_mapping(&mut result, &tag_results);
            }
        }

        if default_reversed && !reversed {
            let reversed_peptide = reverse_sequence(peptide);
            let reversed_result = if reversed_peptide != peptide {
                let forward = self.lookup(&reversed_peptide, matcher, true)?;
                reversed_results(&forward, self.provider.as_ref(), self.store.as_ref())?
            } else {
                reversed_results(&result, self.provider.as_ref(), self.store.as_ref())?
            };
            merge_peptide_mapping(&mut result, &reversed_result);
        }

        let result = Arc::new(result);
        if !reversed {
            self.query_cache.put(peptide, policy, result.clone(), start.elapsed());
        }
        Ok(result)
    }

    /// Accession -> positions of the peptide itself, exact matching
    pub fn exact_protein_mapping(&self, peptide: &str) -> Result<ProteinMapping> {
        let mapping = self.protein_mapping(peptide, MatchingPolicy::String)?;
        if mapping.len() > 1 {
            return Err(Error::invalid_state(format!(
                "Different mappings found for peptide {} in string matching",
                peptide
            )));
        }
        Ok(mapping.values().next().cloned().unwrap_or_default())
    }

    /// Matched sequence -> positions of a peptide in one protein
    pub fn matched_peptide_sequences(
        &self,
        peptide: &str,
        accession: &str,
        policy: MatchingPolicy,
    ) -> Result<BTreeMap<String, Vec<Position>>> {
        let mapping = self.protein_mapping(peptide, policy)?;
        Ok(mapping
            .iter()
            .filter_map(|(sequence, proteins)| {
                proteins
                    .get(accession)
                    .map(|positions| (sequence.clone(), positions.clone()))
            })
            .collect())
    }

    pub fn peptide_iterator(&self) -> PeptideIterator<'_> {
        PeptideIterator::new(self)
    }

    fn normalize(&self, peptide: &str) -> Result<String> {
        if !peptide.is_ascii() {
            return Err(Error::invalid_argument(format!(
                "Peptide ({}) contains non-ASCII residues",
                peptide
            )));
        }
        if peptide.len() < self.config.initial_tag_size {
            return Err(Error::invalid_argument(format!(
                "Peptide ({}) should be at least of length {}",
                peptide, self.config.initial_tag_size
            )));
        }
        if peptide.len() > self.config.max_peptide_size {
            return Err(Error::invalid_argument(format!(
                "Peptide ({}) is longer than the maximal peptide size {}",
                peptide, self.config.max_peptide_size
            )));
        }
        Ok(peptide.to_ascii_uppercase())
    }

    pub fn reset_caches(&self) {
        self.node_cache.clear();
        self.query_cache.clear();
    }

    pub fn query_cache_size(&self) -> usize {
        self.query_cache.size_limit()
    }

    pub fn set_query_cache_size(&self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(Error::invalid_argument("Query cache size must be positive"));
        }
        self.query_cache.resize(size);
        Ok(())
    }

    pub fn stats(&self) -> TreeStats {
        let (fast_cache, slow_cache) = self.query_cache.stats();
        TreeStats {
            uptime_secs: self.start_time.elapsed().as_secs(),
            initial_tag_size: self.config.initial_tag_size,
            tag_count: self.tags.len(),
            node_cache: self.node_cache.stats(),
            query_count: self.query_count.load(Ordering::Relaxed),
            fast_cache,
            slow_cache,
        }
    }

    /// Drop the caches and flush the store
    pub fn close(self) -> Result<()> {
        self.reset_caches();
        self.store.flush()?;
        info!(
            "Closed protein tree after {} queries",
            self.query_count.load(Ordering::Relaxed)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::amino_acid::StandardAminoAcids;
    use crate::alphabet::enzyme::CleavageRule;
    use crate::compression::compress::CompressionType;
    use crate::core::config::ImportFailurePolicy;
    use crate::core::error::ErrorKind;
    use crate::parallel::progress::{NoProgress, ProgressTracker};
    use crate::sequence::provider::InMemorySequenceProvider;
    use crate::storage::{FileStore, MemoryStore};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::time::Duration;

    fn config() -> Config {
        let mut config = Config::default();
        config.import_workers = 2;
        config
    }

    fn open_with(
        config: Config,
        provider: impl SequenceProvider + 'static,
        store: Arc<dyn ComponentStore>,
        enzyme: Option<&dyn Enzyme>,
        progress: &dyn ProgressHandler,
    ) -> Result<ProteinTree> {
        ProteinTree::open(
            config,
            store,
            Arc::new(provider),
            Arc::new(StandardAminoAcids::new()),
            enzyme,
            progress,
        )
    }

    fn open(provider: InMemorySequenceProvider, store: Arc<MemoryStore>) -> ProteinTree {
        open_with(config(), provider, store, None, &NoProgress).unwrap()
    }

    fn single_protein() -> InMemorySequenceProvider {
        let mut provider = InMemorySequenceProvider::new();
        provider.add_protein("P1", "MKVLAA");
        provider
    }

    fn random_proteins(rng: &mut StdRng, count: usize) -> InMemorySequenceProvider {
        const RESIDUES: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";
        let mut provider = InMemorySequenceProvider::new();
        for i in 0..count {
            let length = rng.gen_range(10..80);
            let sequence: String = (0..length)
                .map(|_| RESIDUES[rng.gen_range(0..RESIDUES.len())] as char)
                .collect();
            provider.add_protein(format!("R{}", i), &sequence);
        }
        provider
    }

    /// Provider whose `BAD` protein can never be read
    struct FailingProvider {
        inner: InMemorySequenceProvider,
    }

    impl SequenceProvider for FailingProvider {
        fn accessions(&self) -> Vec<String> {
            let mut accessions = self.inner.accessions();
            accessions.push("BAD".to_string());
            accessions
        }

        fn sequence(&self, accession: &str) -> Result<Arc<str>> {
            if accession == "BAD" {
                return Err(Error::new(ErrorKind::Io, "disk went away".to_string()));
            }
            self.inner.sequence(accession)
        }

        fn is_default_reversed(&self) -> bool {
            false
        }
    }

    #[test]
    fn maps_the_example_protein() {
        let tree = open(single_protein(), Arc::new(MemoryStore::new()));

        for (tag, position) in [("MKV", 0), ("KVL", 1), ("VLA", 2), ("LAA", 3)] {
            assert_eq!(tree.exact_protein_mapping(tag).unwrap()["P1"], vec![position]);
        }
        assert_eq!(tree.exact_protein_mapping("KVLAA").unwrap()["P1"], vec![1]);
        assert_eq!(tree.exact_protein_mapping("kvlaa").unwrap()["P1"], vec![1]);
        assert!(tree.exact_protein_mapping("KVLAM").unwrap().is_empty());
        assert!(tree.exact_protein_mapping("WWW").unwrap().is_empty());
    }

    #[test]
    fn every_window_is_retrievable() {
        let mut rng = StdRng::seed_from_u64(7);
        let provider = random_proteins(&mut rng, 40);
        let proteins: Vec<(String, Arc<str>)> = provider
            .accessions()
            .into_iter()
            .map(|accession| {
                let sequence = provider.sequence(&accession).unwrap();
                (accession, sequence)
            })
            .collect();

        let mut config = config();
        config.max_node_size = 4;
        let tree = open_with(config, provider, Arc::new(MemoryStore::new()), None, &NoProgress).unwrap();

        for (accession, sequence) in &proteins {
            for length in [3, 5, 8] {
                for start in (0..sequence.len().saturating_sub(length - 1)).step_by(3) {
                    let window = &sequence[start..start + length];
                    let mapping = tree.exact_protein_mapping(window).unwrap();
                    assert!(
                        mapping[accession].contains(&(start as Position)),
                        "{} at {} in {}",
                        window,
                        start,
                        accession
                    );
                }
            }
        }
    }

    #[test]
    fn enzyme_restricts_indexed_windows_to_cleavage_sites() {
        let mut provider = InMemorySequenceProvider::new();
        provider.add_protein("P1", "MAKGLRPAAKVLR");
        let trypsin = CleavageRule::trypsin();
        let tree = open_with(
            config(),
            provider,
            Arc::new(MemoryStore::new()),
            Some(&trypsin),
            &NoProgress,
        )
        .unwrap();

        assert_eq!(tree.exact_protein_mapping("MAK").unwrap()["P1"], vec![0]);
        assert_eq!(tree.exact_protein_mapping("GLRPA").unwrap()["P1"], vec![3]);
        assert_eq!(tree.exact_protein_mapping("VLR").unwrap()["P1"], vec![10]);
        // After R but before P, so no cleavage
        assert!(tree.exact_protein_mapping("PAA").unwrap().is_empty());
        assert!(tree.exact_protein_mapping("AKG").unwrap().is_empty());
    }

    #[test]
    fn combinations_match_ambiguity_codes() {
        let mut provider = InMemorySequenceProvider::new();
        provider.add_protein("P1", "MKDLAA");
        provider.add_protein("P2", "GKNLGG");
        let tree = open(provider, Arc::new(MemoryStore::new()));

        assert!(tree.exact_protein_mapping("KBL").unwrap().is_empty());
        let mapping = tree.protein_mapping("KBL", MatchingPolicy::Combinations).unwrap();
        assert_eq!(mapping["KDL"]["P1"], vec![1]);
        assert_eq!(mapping["KNL"]["P2"], vec![1]);

        let sequences = tree
            .matched_peptide_sequences("KBL", "P2", MatchingPolicy::Combinations)
            .unwrap();
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences["KNL"], vec![1]);
    }

    #[test]
    fn rejects_peptides_outside_the_size_bounds() {
        let tree = open(single_protein(), Arc::new(MemoryStore::new()));
        let err = tree.protein_mapping("KV", MatchingPolicy::String).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);

        let long = "A".repeat(51);
        assert!(tree.protein_mapping(&long, MatchingPolicy::String).is_err());
    }

    #[test]
    fn reversed_decoys_are_derived_from_targets() {
        let mut provider = single_protein();
        provider.generate_decoys();
        let tree = open(provider, Arc::new(MemoryStore::new()));

        let mapping = tree.protein_mapping("KVL", MatchingPolicy::String).unwrap();
        assert_eq!(mapping["KVL"]["P1"], vec![1]);

        // AALVKM holds LVK at 2, so KVL never occurs in the decoy
        let mapping = tree.protein_mapping("LVK", MatchingPolicy::String).unwrap();
        assert_eq!(mapping["LVK"]["P1_REVERSED"], vec![2]);
        assert!(!mapping["LVK"].contains_key("P1"));

        // Decoys are never imported
        assert_eq!(tree.tags().len(), 4);
    }

    #[test]
    fn cached_results_equal_fresh_results() {
        let mut rng = StdRng::seed_from_u64(11);
        let provider = random_proteins(&mut rng, 20);
        let sequence = provider.sequence("R3").unwrap();
        let peptide = sequence[2..7].to_string();

        let mut config = config();
        config.query_time_threshold = Duration::from_secs(3600);
        let tree = open_with(config, provider, Arc::new(MemoryStore::new()), None, &NoProgress).unwrap();

        let fresh = tree.protein_mapping(&peptide, MatchingPolicy::String).unwrap();
        let cached = tree.protein_mapping(&peptide, MatchingPolicy::String).unwrap();
        assert_eq!(fresh, cached);
        assert_eq!(tree.stats().fast_cache.hit_count, 1);

        tree.reset_caches();
        let recomputed = tree.protein_mapping(&peptide, MatchingPolicy::String).unwrap();
        assert_eq!(fresh, recomputed);

        // A policy switch drops the results computed under the old policy
        let combined = tree.protein_mapping(&peptide, MatchingPolicy::Combinations).unwrap();
        assert!(combined.contains_key(&peptide));
        assert_eq!(tree.stats().fast_cache.size, 1);
    }

    #[test]
    fn slow_pool_results_equal_fresh_results() {
        let mut config = config();
        config.query_time_threshold = Duration::ZERO;
        let tree = open_with(config, single_protein(), Arc::new(MemoryStore::new()), None, &NoProgress).unwrap();

        let fresh = tree.protein_mapping("KVLAA", MatchingPolicy::String).unwrap();
        for _ in 0..9 {
            let cached = tree.protein_mapping("KVLAA", MatchingPolicy::String).unwrap();
            assert_eq!(fresh, cached);
        }

        let stats = tree.stats();
        assert_eq!(stats.slow_cache.size, 1);
        assert_eq!(stats.fast_cache.size, 0);
        assert_eq!(stats.slow_cache.hit_count, 9);
        assert_eq!(stats.fast_cache.hit_count, 0);
        assert!((stats.query_hit_rate() - 0.9).abs() < 1e-9);

        tree.reset_caches();
        assert_eq!(tree.protein_mapping("KVLAA", MatchingPolicy::String).unwrap(), fresh);
    }

    #[test]
    fn reversed_cache_check_is_not_counted() {
        let mut provider = single_protein();
        provider.generate_decoys();
        let tree = open(provider, Arc::new(MemoryStore::new()));

        tree.protein_mapping("KVLAA", MatchingPolicy::String).unwrap();
        let (fast, slow) = (tree.stats().fast_cache, tree.stats().slow_cache);
        // One miss for the query itself and one for the reversed sub-query
        assert_eq!(fast.miss_count, 2);
        assert_eq!(slow.miss_count, 2);

        // Served from the cached forward entry of the reversed peptide
        let decoy = tree.protein_mapping("AALVK", MatchingPolicy::String).unwrap();
        assert_eq!(decoy["AALVK"]["P1_REVERSED"], vec![0]);
        let stats = tree.stats();
        assert_eq!(stats.fast_cache.miss_count, 3);
        assert_eq!(stats.slow_cache.miss_count, 3);
    }

    #[test]
    fn mass_tolerance_matches_indistinguishable_residues() {
        let tree = open(single_protein(), Arc::new(MemoryStore::new()));

        assert!(tree.exact_protein_mapping("KVIAA").unwrap().is_empty());
        let mapping = tree
            .protein_mapping("KVIAA", MatchingPolicy::Indistinguishable { tolerance: 0.05 })
            .unwrap();
        let expected = PeptideMapping::from([(
            "KVLAA".to_string(),
            ProteinMapping::from([("P1".to_string(), vec![1])]),
        )]);
        assert_eq!(*mapping, expected);

        // K and Q differ by 0.036 Da
        let mapping = tree
            .protein_mapping("QVLAA", MatchingPolicy::Indistinguishable { tolerance: 0.05 })
            .unwrap();
        assert_eq!(mapping["KVLAA"]["P1"], vec![1]);
        assert!(tree
            .protein_mapping("QVLAA", MatchingPolicy::Indistinguishable { tolerance: 0.01 })
            .unwrap()
            .is_empty());
    }

    #[test]
    fn node_cache_stays_within_budget() {
        let mut rng = StdRng::seed_from_u64(3);
        let provider = random_proteins(&mut rng, 30);
        let tree = open_with(config(), provider, Arc::new(MemoryStore::new()), None, &NoProgress).unwrap();

        let tags: Vec<String> = tree.tags().iter().collect();
        for tag in &tags {
            tree.node(tag).unwrap();
        }
        let stats = tree.stats();
        assert!(stats.node_cache.occupancy <= stats.node_cache.capacity);
        assert_eq!(stats.node_cache.nodes, tags.len());
        assert_eq!(stats.tag_count, tags.len() as u64);
    }

    #[test]
    fn missing_node_for_listed_tag_is_corruption() {
        let store = Arc::new(MemoryStore::new());
        let tree = open(single_protein(), store.clone());
        store.remove_node("KVL");

        assert!(tree.node("WWW").unwrap().is_none());
        assert_eq!(tree.node("KVL").unwrap_err().kind, ErrorKind::Corruption);
    }

    #[test]
    fn reopen_reuses_a_complete_store() {
        let store = Arc::new(MemoryStore::new());
        open(single_protein(), store.clone()).close().unwrap();

        // An empty provider would produce an empty index if it were reimported
        let tree = open(InMemorySequenceProvider::new(), store.clone());
        assert_eq!(tree.tags().len(), 4);

        store.mark_corrupted();
        let tree = open(InMemorySequenceProvider::new(), store);
        assert_eq!(tree.tags().len(), 0);
    }

    #[test]
    fn tag_size_change_forces_reindex() {
        let store = Arc::new(MemoryStore::new());
        open(single_protein(), store.clone()).close().unwrap();

        let mut config = config();
        config.initial_tag_size = 2;
        let tree = open_with(config, single_protein(), store.clone(), None, &NoProgress).unwrap();
        assert_eq!(tree.tags().space().tag_size(), 2);
        assert_eq!(tree.tags().len(), 5);
        assert_eq!(store.initial_tag_size().unwrap(), Some(2));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.storage_path = dir.path().join("tree");
        config.compression = CompressionType::Snappy;

        {
            let store = Arc::new(FileStore::from_config(&config).unwrap());
            let tree = open_with(config.clone(), single_protein(), store, None, &NoProgress).unwrap();
            assert_eq!(tree.exact_protein_mapping("KVLAA").unwrap()["P1"], vec![1]);
            tree.close().unwrap();
        }

        let store = Arc::new(FileStore::from_config(&config).unwrap());
        let tree = open_with(config, single_protein(), store.clone(), None, &NoProgress).unwrap();
        assert_eq!(tree.tags().len(), 4);
        assert_eq!(tree.exact_protein_mapping("KVLAA").unwrap()["P1"], vec![1]);
        assert_eq!(store.protein_length("P1").unwrap(), Some(6));
    }

    #[test]
    fn cancelled_import_leaves_an_empty_store() {
        let store = Arc::new(MemoryStore::new());
        let progress = ProgressTracker::new();
        progress.cancel();

        let err = open_with(config(), single_protein(), store.clone(), None, &progress)
            .err()
            .unwrap();
        assert!(err.is_cancelled());
        assert!(!store.is_import_complete().unwrap());
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn failure_policy_decides_on_unreadable_proteins() {
        let mut config = config();
        config.max_import_retries = 1;

        let tree = open_with(
            config.clone(),
            FailingProvider { inner: single_protein() },
            Arc::new(MemoryStore::new()),
            None,
            &NoProgress,
        )
        .unwrap();
        assert_eq!(tree.exact_protein_mapping("KVL").unwrap()["P1"], vec![1]);

        config.failure_policy = ImportFailurePolicy::FailFast;
        let store = Arc::new(MemoryStore::new());
        let err = open_with(
            config,
            FailingProvider { inner: single_protein() },
            store.clone(),
            None,
            &NoProgress,
        )
        .err()
        .unwrap();
        assert_eq!(err.kind, ErrorKind::Io);
        assert!(err.context.contains("BAD"));
        assert!(!store.is_import_complete().unwrap());
    }

    #[test]
    fn query_cache_size_can_be_changed() {
        let tree = open(single_protein(), Arc::new(MemoryStore::new()));
        assert_eq!(tree.query_cache_size(), 10_000);
        tree.set_query_cache_size(2).unwrap();
        assert_eq!(tree.query_cache_size(), 2);
        assert!(tree.set_query_cache_size(0).is_err());
        assert_eq!(tree.stats().query_count, 0);
    }
}
