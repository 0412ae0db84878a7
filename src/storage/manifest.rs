use std::fs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::storage::frame::write_atomic;
use crate::storage::layout::StorageLayout;

/// Tree-level metadata, kept as readable JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: Option<String>,
    pub initial_tag_size: Option<usize>,
    pub import_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Manifest {
    pub fn new() -> Self {
        let now = Utc::now();
        Manifest {
            version: None,
            initial_tag_size: None,
            import_complete: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// `Ok(None)` for a fresh directory
    pub fn load(storage: &StorageLayout) -> Result<Option<Self>> {
        let path = storage.manifest_path();
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(path)?;
        let manifest = serde_json::from_slice(&data)?;
        Ok(Some(manifest))
    }

    pub fn save(&mut self, storage: &StorageLayout) -> Result<()> {
        self.updated_at = Utc::now();
        let data = serde_json::to_vec_pretty(self)?;
        write_atomic(&storage.manifest_path(), &data)
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}
