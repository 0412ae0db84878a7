use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};
use crate::alphabet::tags::TagSet;
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::index::node::Node;
use crate::storage::file_lock::FileLock;
use crate::storage::frame::{encode_frame, read_framed, write_atomic};
use crate::storage::layout::StorageLayout;
use crate::storage::manifest::Manifest;
use crate::storage::ComponentStore;

/// Component store persisted under one directory.
///
/// Nodes are written as soon as they are saved; protein lengths are
/// buffered and written on `flush` or when the import is marked complete.
pub struct FileStore {
    layout: StorageLayout,
    compression: CompressionType,
    manifest: Mutex<Manifest>,
    lengths: RwLock<BTreeMap<String, usize>>,
    lengths_dirty: AtomicBool,
    corrupted: AtomicBool,
    _lock: FileLock,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>, compression: CompressionType) -> Result<Self> {
        let layout = StorageLayout::new(path.into())?;
        let lock = FileLock::acquire(&layout)?;

        let mut corrupted = false;

        let manifest = match Manifest::load(&layout) {
            Ok(Some(manifest)) => manifest,
            Ok(None) => Manifest::new(),
            Err(e) => {
                warn!("Unreadable manifest in {}: {}", layout.base_dir.display(), e);
                corrupted = true;
                Manifest::new()
            }
        };

        let lengths = match Self::load_lengths(&layout) {
            Ok(lengths) => lengths,
            Err(e) => {
                warn!("Unreadable protein lengths in {}: {}", layout.base_dir.display(), e);
                corrupted = true;
                BTreeMap::new()
            }
        };

        if let Err(e) = read_framed(&layout.tags_path()).and_then(|bytes| match bytes {
            Some(bytes) => TagSet::from_bytes(&bytes).map(|_| ()),
            None => Ok(()),
        }) {
            warn!("Unreadable tag set in {}: {}", layout.base_dir.display(), e);
            corrupted = true;
        }

        debug!(
            "Opened file store at {} ({} protein lengths, corrupted: {})",
            layout.base_dir.display(),
            lengths.len(),
            corrupted
        );

        Ok(FileStore {
            layout,
            compression,
            manifest: Mutex::new(manifest),
            lengths: RwLock::new(lengths),
            lengths_dirty: AtomicBool::new(false),
            corrupted: AtomicBool::new(corrupted),
            _lock: lock,
        })
    }

    /// Store at `config.storage_path`, writing nodes with `config.compression`
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(config.storage_path.clone(), config.compression)
    }

    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    fn load_lengths(layout: &StorageLayout) -> Result<BTreeMap<String, usize>> {
        match read_framed(&layout.lengths_path())? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(BTreeMap::new()),
        }
    }

    fn write_lengths(&self) -> Result<()> {
        if !self.lengths_dirty.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        let data = bincode::serialize(&*self.lengths.read())?;
        if let Err(e) = write_atomic(&self.layout.lengths_path(), &encode_frame(&data)) {
            self.lengths_dirty.store(true, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    fn update_manifest(&self, update: impl FnOnce(&mut Manifest)) -> Result<()> {
        let mut manifest = self.manifest.lock();
        update(&mut manifest);
        manifest.save(&self.layout)
    }
}

impl ComponentStore for FileStore {
    fn node(&self, tag: &str) -> Result<Option<Node>> {
        let path = self.layout.node_path(tag);
        let Some(bytes) = read_framed(&path)? else {
            return Ok(None);
        };

        let block: CompressedBlock = bincode::deserialize(&bytes)
            .map_err(|e| Error::corruption(format!("Node {}: {}", tag, e)))?;
        let data = block.decompress()?;
        let node = bincode::deserialize(&data)
            .map_err(|e| Error::corruption(format!("Node {}: {}", tag, e)))?;
        Ok(Some(node))
    }

    fn save_node(&self, tag: &str, node: &Node) -> Result<()> {
        let path = self.layout.node_path(tag);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = bincode::serialize(node)?;
        let block = CompressedBlock::compress(&data, self.compression)?;
        let encoded = bincode::serialize(&block)?;
        fs::write(path, encode_frame(&encoded))?;
        Ok(())
    }

    fn protein_length(&self, accession: &str) -> Result<Option<usize>> {
        Ok(self.lengths.read().get(accession).copied())
    }

    fn save_protein_length(&self, accession: &str, length: usize) -> Result<()> {
        self.lengths.write().insert(accession.to_string(), length);
        self.lengths_dirty.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn version(&self) -> Result<Option<String>> {
        Ok(self.manifest.lock().version.clone())
    }

    fn set_version(&self, version: &str) -> Result<()> {
        self.update_manifest(|manifest| manifest.version = Some(version.to_string()))
    }

    fn initial_tag_size(&self) -> Result<Option<usize>> {
        Ok(self.manifest.lock().initial_tag_size)
    }

    fn save_initial_tag_size(&self, size: usize) -> Result<()> {
        self.update_manifest(|manifest| manifest.initial_tag_size = Some(size))
    }

    fn is_import_complete(&self) -> Result<bool> {
        Ok(self.manifest.lock().import_complete)
    }

    fn set_import_complete(&self, complete: bool) -> Result<()> {
        if complete {
            self.write_lengths()?;
        }
        self.update_manifest(|manifest| manifest.import_complete = complete)
    }

    fn is_corrupted(&self) -> bool {
        self.corrupted.load(Ordering::SeqCst)
    }

    fn tags(&self) -> Result<Option<TagSet>> {
        match read_framed(&self.layout.tags_path())? {
            Some(bytes) => Ok(Some(TagSet::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_tags(&self, tags: &TagSet) -> Result<()> {
        write_atomic(&self.layout.tags_path(), &encode_frame(&tags.to_bytes()?))
    }

    fn clear(&self) -> Result<()> {
        let mut manifest = self.manifest.lock();
        self.layout.wipe()?;
        *manifest = Manifest::new();
        self.lengths.write().clear();
        self.lengths_dirty.store(false, Ordering::SeqCst);
        self.corrupted.store(false, Ordering::SeqCst);
        debug!("Cleared file store at {}", self.layout.base_dir.display());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.write_lengths()?;
        let mut manifest = self.manifest.lock();
        manifest.save(&self.layout)
    }
}
