//! Bucket inventory
//!
//! Lists the bucket and answers existence checks for download and delete.
//! By default every call re-lists the whole bucket. With caching enabled the
//! listing is kept until the next [`InventoryIndex::invalidate`], which the
//! executor calls after every mutating operation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::error::Result;
use crate::path::key_base_name;
use crate::traits::ObjectStore;

/// Local directory downloads are written to
pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

/// One object currently stored remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    pub object_key: String,
    pub size: u64,
    /// Where a download of this object would land
    pub local_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,
}

/// Listing and existence checks over the bucket
pub struct InventoryIndex {
    store: Arc<dyn ObjectStore>,
    download_dir: PathBuf,
    cache: Option<Mutex<Option<Vec<InventoryEntry>>>>,
}

impl InventoryIndex {
    /// Index that re-lists the bucket on every call
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            cache: None,
        }
    }

    /// Keep the listing between calls until invalidated
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(Mutex::new(None));
        self
    }

    /// Directory used for the entries' suggested local paths
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Fetch every file object in the bucket, skipping directory markers
    pub async fn fetch_keys(&self) -> Result<Vec<InventoryEntry>> {
        if let Some(cache) = &self.cache {
            let cached = cache.lock().unwrap_or_else(PoisonError::into_inner).clone();
            if let Some(entries) = cached {
                tracing::debug!(entries = entries.len(), "Using cached inventory");
                return Ok(entries);
            }
        }

        let objects = self.store.list_all().await?;
        let entries: Vec<InventoryEntry> = objects
            .into_iter()
            .filter(|o| !o.is_dir_marker())
            .map(|o| InventoryEntry {
                local_path: self.download_dir.join(key_base_name(&o.key)),
                object_key: o.key,
                size: o.size_bytes,
                last_modified: o.last_modified,
            })
            .collect();
        tracing::debug!(entries = entries.len(), "Listed bucket");

        if let Some(cache) = &self.cache {
            *cache.lock().unwrap_or_else(PoisonError::into_inner) = Some(entries.clone());
        }
        Ok(entries)
    }

    /// Look up `key`, returning `None` when it is not in the bucket
    pub async fn exists(&self, key: &str) -> Result<Option<InventoryEntry>> {
        let entries = self.fetch_keys().await?;
        Ok(entries.into_iter().find(|e| e.object_key == key))
    }

    /// Drop any cached listing
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(PoisonError::into_inner).take();
        }
    }
}
