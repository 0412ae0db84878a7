use std::path::{Path, PathBuf};
use std::fs;
use crate::core::error::Result;

/// Directory structure of a persisted protein tree
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,      // Root directory
    pub meta_dir: PathBuf,      // Manifest, protein lengths and tag set
    pub nodes_dir: PathBuf,     // One file per tag, bucketed by first residue
}

impl StorageLayout {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        let meta_dir = base_dir.join("meta");
        let nodes_dir = base_dir.join("nodes");

        fs::create_dir_all(&meta_dir)?;
        fs::create_dir_all(&nodes_dir)?;

        Ok(StorageLayout {
            base_dir,
            meta_dir,
            nodes_dir,
        })
    }

    pub fn lock_path(&self) -> PathBuf {
        self.base_dir.join(".lock")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.meta_dir.join("manifest.json")
    }

    pub fn lengths_path(&self) -> PathBuf {
        self.meta_dir.join("lengths.bin")
    }

    pub fn tags_path(&self) -> PathBuf {
        self.meta_dir.join("tags.bin")
    }

    pub fn node_path(&self, tag: &str) -> PathBuf {
        let bucket = tag.get(..1).unwrap_or("_");
        self.nodes_dir.join(bucket).join(format!("{}.node", tag))
    }

    /// Remove every node and metadata file, keeping the lock file
    pub fn wipe(&self) -> Result<()> {
        for dir in [&self.meta_dir, &self.nodes_dir] {
            if dir.exists() {
                fs::remove_dir_all(dir)?;
            }
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
