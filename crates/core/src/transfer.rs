//! Single-file transfers
//!
//! The executor moves exactly one file per call. It never retries; whatever
//! retry policy exists lives in the store client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::TransferSettings;
use crate::descriptor::TransferDescriptor;
use crate::error::{Error, Result};
use crate::inventory::InventoryIndex;
use crate::path::key_base_name;
use crate::strategy::{TransferStrategy, select_strategy};
use crate::traits::{ObjectStore, StreamedUpload};

/// Runs uploads, downloads and deletes for one target at a time
pub struct TransferExecutor {
    store: Arc<dyn ObjectStore>,
    inventory: Arc<InventoryIndex>,
    settings: TransferSettings,
}

impl TransferExecutor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        inventory: Arc<InventoryIndex>,
        settings: TransferSettings,
    ) -> Self {
        Self {
            store,
            inventory,
            settings,
        }
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    pub fn inventory(&self) -> &InventoryIndex {
        &self.inventory
    }

    /// Upload one file to its object key
    pub async fn upload_one(&self, descriptor: &TransferDescriptor) -> Result<()> {
        let path = &descriptor.local_path;
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| Error::SourceUnreadable {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let strategy = descriptor.strategy(self.settings.large_file_threshold);
        tracing::debug!(
            path = %path.display(),
            key = %descriptor.object_key,
            size = descriptor.size,
            ?strategy,
            "Uploading"
        );

        let result = match strategy {
            TransferStrategy::Simple => {
                let content_type = mime_guess::from_path(path)
                    .first()
                    .map(|m| m.essence_str().to_string());
                self.store
                    .put_object(&descriptor.object_key, file, content_type)
                    .await
            }
            TransferStrategy::Streamed => {
                let options = StreamedUpload {
                    part_size: self.settings.part_size,
                    max_concurrent_parts: self.settings.max_concurrent_parts,
                };
                self.store
                    .put_streamed(&descriptor.object_key, file, descriptor.size, options)
                    .await
            }
        };

        // A failed upload may still have left an object behind
        self.inventory.invalidate();

        result.map_err(|e| Error::UploadFailed {
            path: path.clone(),
            cause: e.to_string(),
        })
    }

    /// Download `key` into `destination_dir/<basename(key)>`
    ///
    /// The key must be present in the inventory; no blind fetch is attempted.
    pub async fn download_one(&self, key: &str, destination_dir: &Path) -> Result<PathBuf> {
        let entry = self
            .inventory
            .exists(key)
            .await?
            .ok_or_else(|| Error::ObjectNotFound(key.to_string()))?;

        let target = destination_dir.join(key_base_name(key));

        match select_strategy(entry.size, self.settings.large_file_threshold) {
            TransferStrategy::Simple => {}
            TransferStrategy::Streamed => {
                return Err(Error::Unsupported(format!(
                    "streamed download of {key} ({} bytes)",
                    entry.size
                )));
            }
        }

        tracing::debug!(key, target = %target.display(), size = entry.size, "Downloading");

        let data = self
            .store
            .get_object(key)
            .await
            .map_err(|e| download_failed(key, e))?;

        write_atomically(&target, &data)
            .await
            .map_err(|e| download_failed(key, e))?;

        Ok(target)
    }

    /// Delete `key` after confirming it exists
    pub async fn delete_one(&self, key: &str) -> Result<()> {
        if self.inventory.exists(key).await?.is_none() {
            return Err(Error::ObjectNotFound(key.to_string()));
        }

        let result = self.store.delete_object(key).await;
        self.inventory.invalidate();
        result
    }
}

fn download_failed(key: &str, cause: impl std::fmt::Display) -> Error {
    Error::DownloadFailed {
        key: key.to_string(),
        cause: cause.to_string(),
    }
}

/// Write through a uniquely named temporary sibling so readers never see a
/// partial file and concurrent writers never share a temp path
async fn write_atomically(target: &Path, data: &[u8]) -> std::io::Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    // Removed on drop unless persisted
    let temp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".part")
        .tempfile_in(dir)?;

    tokio::fs::write(temp.path(), data).await?;
    temp.persist(target)?;
    Ok(())
}
