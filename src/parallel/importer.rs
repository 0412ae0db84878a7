use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use crate::alphabet::amino_acid::ResidueTable;
use crate::alphabet::enzyme::Enzyme;
use crate::alphabet::tags::{TagSet, TagSpace};
use crate::core::config::{Config, ImportFailurePolicy, CACHE_SCALE};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Position;
use crate::index::node::Node;
use crate::parallel::progress::{expected_import_time, format_expected_import_time, ProgressHandler};
use crate::sequence::provider::SequenceProvider;
use crate::storage::ComponentStore;

/// Version written to the store once an import completes
pub const INDEX_VERSION: &str = "1.0.0";

/// Empirical occurrence estimate per accession and tag node
const OCCURRENCES_PER_ACCESSION: usize = 6 * 500;

type Directory = Mutex<HashMap<u32, Arc<Mutex<Node>>>>;

enum Job {
    Scan { accession: String, attempt: usize },
    Stop,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub passages: usize,
    pub accessions: usize,
    pub skipped: Vec<String>,
    pub tags: u64,
    pub elapsed: Duration,
}

/// Split the key space into passages whose nodes fit the memory budget
pub fn passages(key_space: u64, accession_count: usize, memory_allocation_mb: usize) -> Vec<Range<u64>> {
    let estimated = OCCURRENCES_PER_ACCESSION.saturating_mul(accession_count) as u64;
    let capacity = memory_allocation_mb.saturating_mul(CACHE_SCALE).max(1) as u64;
    let ratio = (estimated / capacity).max(1);
    let tags_per_passage = (key_space / ratio).max(1);

    (0..key_space)
        .step_by(tags_per_passage as usize)
        .map(|start| start..(start + tags_per_passage).min(key_space))
        .collect()
}

/// Builds the tree from every protein of a provider, one passage of the tag
/// key space at a time.
///
/// Stage A scans accessions on scoped worker threads fed by a channel and
/// accumulates per-tag nodes; stage B splits and persists those nodes on a
/// rayon pool. Only one passage worth of nodes is in memory at a time.
pub struct Importer<'a> {
    config: &'a Config,
    store: &'a dyn ComponentStore,
    provider: &'a dyn SequenceProvider,
    residues: &'a dyn ResidueTable,
    enzyme: Option<&'a dyn Enzyme>,
    progress: &'a dyn ProgressHandler,
}

impl<'a> Importer<'a> {
    pub fn new(
        config: &'a Config,
        store: &'a dyn ComponentStore,
        provider: &'a dyn SequenceProvider,
        residues: &'a dyn ResidueTable,
        enzyme: Option<&'a dyn Enzyme>,
        progress: &'a dyn ProgressHandler,
    ) -> Self {
        Importer {
            config,
            store,
            provider,
            residues,
            enzyme,
            progress,
        }
    }

    pub fn run(&self) -> Result<ImportSummary> {
        let start = Instant::now();
        let tag_size = self.config.initial_tag_size;
        let space = TagSpace::new(self.residues.alphabet(), tag_size)?;

        let accessions: Vec<String> = if self.provider.is_default_reversed() {
            self.provider
                .accessions()
                .into_iter()
                .filter(|accession| !self.provider.is_decoy_accession(accession))
                .collect()
        } else {
            self.provider.accessions()
        };

        if self.config.report_expected_import_time {
            if let Some(expected) = expected_import_time(tag_size, accessions.len(), self.config.import_workers) {
                self.progress.append_report(&format_expected_import_time(expected));
            }
        }

        self.store.save_initial_tag_size(tag_size)?;

        let passages = passages(space.len(), accessions.len(), self.config.memory_allocation_mb);
        info!(
            "Importing {} proteins into {} tags of size {} ({} passages)",
            accessions.len(),
            space.len(),
            tag_size,
            passages.len()
        );

        self.progress.set_indeterminate(false);
        self.progress.set_max_progress(passages.len() as u64 * accessions.len() as u64 + space.len());
        self.progress.set_progress(0);

        let recorded_lengths = Mutex::new(HashSet::new());
        let mut tag_set = TagSet::new(space.clone());
        let mut skipped = Vec::new();

        for (index, passage) in passages.iter().enumerate() {
            if self.progress.is_cancelled() {
                return Err(Error::cancelled());
            }
            self.progress.append_report(&format!(
                "Importing passage {}/{}: tags {} to {}",
                index + 1,
                passages.len(),
                space.tag(passage.start as u32),
                space.tag((passage.end - 1) as u32)
            ));

            let directory = self.scan_passage(&space, passage, &accessions, &recorded_lengths, &mut skipped)?;
            let nodes = self.persist_passage(&space, directory, &mut tag_set)?;
            debug!("Passage {} persisted {} nodes", index + 1, nodes);

            self.progress
                .set_progress((index as u64 + 1) * accessions.len() as u64 + passage.end);
        }

        self.store.save_tags(&tag_set)?;
        self.store.set_version(INDEX_VERSION)?;
        self.store.set_import_complete(true)?;
        self.store.flush()?;

        let summary = ImportSummary {
            passages: passages.len(),
            accessions: accessions.len() - skipped.len(),
            skipped,
            tags: tag_set.len(),
            elapsed: start.elapsed(),
        };
        info!(
            "Import complete: {} proteins, {} tags, {} skipped in {:.2?}",
            summary.accessions,
            summary.tags,
            summary.skipped.len(),
            summary.elapsed
        );
        Ok(summary)
    }

    /// Stage A: accumulate the passage's tag nodes from every accession
    fn scan_passage(
        &self,
        space: &TagSpace,
        passage: &Range<u64>,
        accessions: &[String],
        recorded_lengths: &Mutex<HashSet<String>>,
        skipped: &mut Vec<String>,
    ) -> Result<HashMap<u32, Arc<Mutex<Node>>>> {
        let directory: Directory = Mutex::new(HashMap::new());
        if accessions.is_empty() {
            return Ok(HashMap::new());
        }

        let (sender, receiver) = unbounded();
        for accession in accessions {
            sender
                .send(Job::Scan { accession: accession.clone(), attempt: 0 })
                .map_err(|_| Error::new(ErrorKind::Internal, "Import queue closed".to_string()))?;
        }

        let workers = self.config.import_workers.clamp(1, accessions.len());
        let pending = AtomicUsize::new(accessions.len());
        let aborted = AtomicBool::new(false);
        let failure: Mutex<Option<Error>> = Mutex::new(None);
        let dropped: Mutex<Vec<String>> = Mutex::new(Vec::new());

        let context = ScanContext {
            space,
            passage,
            directory: &directory,
            recorded_lengths,
            sender: &sender,
            receiver: &receiver,
            workers,
            pending: &pending,
            aborted: &aborted,
            failure: &failure,
            dropped: &dropped,
        };

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| self.scan_worker(&context));
            }
        });

        if let Some(error) = failure.into_inner() {
            return Err(error);
        }
        for accession in dropped.into_inner() {
            if !skipped.contains(&accession) {
                skipped.push(accession);
            }
        }
        Ok(directory.into_inner())
    }

    fn scan_worker(&self, context: &ScanContext) {
        let mut scratch: HashMap<u32, Vec<Position>> = HashMap::new();

        while let Ok(job) = context.receiver.recv() {
            let Job::Scan { accession, attempt } = job else {
                break;
            };
            if context.aborted.load(Ordering::SeqCst) {
                break;
            }
            if self.progress.is_cancelled() {
                context.abort(Error::cancelled());
                break;
            }

            if let Err(error) = self.scan_accession(&accession, context, &mut scratch) {
                if attempt < self.config.max_import_retries {
                    debug!("Retrying {} after error: {}", accession, error);
                    if context
                        .sender
                        .send(Job::Scan { accession, attempt: attempt + 1 })
                        .is_err()
                    {
                        break;
                    }
                    continue;
                }
                match self.config.failure_policy {
                    ImportFailurePolicy::BestEffort => {
                        warn!(
                            "Skipping {} after {} attempts: {}",
                            accession,
                            attempt + 1,
                            error
                        );
                        context.dropped.lock().push(accession);
                    }
                    ImportFailurePolicy::FailFast => {
                        context.abort(Error::new(
                            error.kind,
                            format!("Failed to import {}: {}", accession, error.context),
                        ));
                        break;
                    }
                }
            }

            self.progress.increment_progress();
            if context.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                context.stop_all();
            }
        }
    }

    fn scan_accession(
        &self,
        accession: &str,
        context: &ScanContext,
        scratch: &mut HashMap<u32, Vec<Position>>,
    ) -> Result<()> {
        let sequence = self.provider.sequence(accession)?;

        if !context.recorded_lengths.lock().contains(accession) {
            self.store.save_protein_length(accession, sequence.len())?;
            context.recorded_lengths.lock().insert(accession.to_string());
        }

        let tag_size = context.space.tag_size();
        let residues = sequence.as_bytes();
        scratch.clear();

        if residues.len() >= tag_size {
            for start in 0..=residues.len() - tag_size {
                if start > 0 {
                    if let Some(enzyme) = self.enzyme {
                        if !enzyme.is_cleavage_site(residues[start - 1] as char, residues[start] as char) {
                            continue;
                        }
                    }
                }
                let Ok(tag) = std::str::from_utf8(&residues[start..start + tag_size]) else {
                    continue;
                };
                let Some(ordinal) = context.space.ordinal(tag) else {
                    continue;
                };
                if context.passage.contains(&(ordinal as u64)) {
                    scratch.entry(ordinal).or_default().push(start as Position);
                }
            }
        }

        for (ordinal, positions) in scratch.drain() {
            let node = context
                .directory
                .lock()
                .entry(ordinal)
                .or_insert_with(|| Arc::new(Mutex::new(Node::new(tag_size))))
                .clone();
            node.lock().add_accession(accession, &positions)?;
        }
        Ok(())
    }

    /// Stage B: split, persist and drop every node of the passage
    fn persist_passage(
        &self,
        space: &TagSpace,
        directory: HashMap<u32, Arc<Mutex<Node>>>,
        tag_set: &mut TagSet,
    ) -> Result<usize> {
        let ordinals: Vec<u32> = directory.keys().copied().collect();
        let directory: Directory = Mutex::new(directory);
        let persisted: Mutex<Vec<u32>> = Mutex::new(Vec::with_capacity(ordinals.len()));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.import_workers)
            .build()
            .map_err(|e| Error::new(ErrorKind::Internal, e.to_string()))?;

        pool.install(|| {
            ordinals.par_iter().try_for_each(|&ordinal| -> Result<()> {
                if self.progress.is_cancelled() {
                    return Err(Error::cancelled());
                }

                let Some(node) = directory.lock().remove(&ordinal) else {
                    return Ok(());
                };
                let mut node = Arc::try_unwrap(node)
                    .map(Mutex::into_inner)
                    .map_err(|_| Error::invalid_state("Node still shared after scanning"))?;

                node.split(self.config.max_node_size, self.config.max_peptide_size, self.provider)?;
                self.store.save_node(&space.tag(ordinal), &node)?;
                persisted.lock().push(ordinal);
                self.progress.increment_progress();
                Ok(())
            })
        })?;

        let persisted = persisted.into_inner();
        for &ordinal in &persisted {
            tag_set.insert_ordinal(ordinal);
        }
        Ok(persisted.len())
    }
}

/// State shared by the stage A workers of one passage
struct ScanContext<'s> {
    space: &'s TagSpace,
    passage: &'s Range<u64>,
    directory: &'s Directory,
    recorded_lengths: &'s Mutex<HashSet<String>>,
    sender: &'s Sender<Job>,
    receiver: &'s Receiver<Job>,
    workers: usize,
    pending: &'s AtomicUsize,
    aborted: &'s AtomicBool,
    failure: &'s Mutex<Option<Error>>,
    dropped: &'s Mutex<Vec<String>>,
}

impl ScanContext<'_> {
    fn stop_all(&self) {
        for _ in 0..self.workers {
            let _ = self.sender.send(Job::Stop);
        }
    }

    /// Keep the first error and release every worker
    fn abort(&self, error: Error) {
        self.aborted.store(true, Ordering::SeqCst);
        self.failure.lock().get_or_insert(error);
        self.stop_all();
    }
}
