//! User-facing sync flows
//!
//! [`SyncContext`] carries everything an invocation needs (configuration,
//! store handle, inventory and confirmation prompt) and exposes the upload,
//! download, delete and list flows. Every flow that moves or removes data asks
//! for confirmation first; declining yields [`Error::UserAborted`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use humansize::{DECIMAL, format_size};

use crate::batch::{
    BatchCoordinator, BatchItem, BatchObserver, BatchOperation, BatchResult, TransferOutcome,
    download_descriptors,
};
use crate::config::SyncConfig;
use crate::descriptor::TransferDescriptor;
use crate::error::{Error, Result};
use crate::inventory::{DEFAULT_DOWNLOAD_DIR, InventoryEntry, InventoryIndex};
use crate::path::{absolutize, key_base_name};
use crate::scan::DirectoryScanner;
use crate::traits::ObjectStore;
use crate::transfer::TransferExecutor;

/// Yes/no prompt supplied by the invoking surface
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Answers yes to everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// What an upload or download flow did
#[derive(Debug)]
pub enum SyncReport {
    /// A single file moved; holds the descriptor that was transferred
    Single(TransferDescriptor),
    /// A directory or multi-key batch ran
    Batch(BatchResult),
}

/// Immutable per-invocation context
pub struct SyncContext {
    config: Arc<SyncConfig>,
    store: Arc<dyn ObjectStore>,
    inventory: Arc<InventoryIndex>,
    executor: Arc<TransferExecutor>,
    confirm: Arc<dyn Confirm>,
    observer: Option<Arc<dyn BatchObserver>>,
}

impl SyncContext {
    /// Build a context downloading into `./downloads`
    pub fn new(config: SyncConfig, store: Arc<dyn ObjectStore>, confirm: Arc<dyn Confirm>) -> Self {
        Self::with_download_dir(config, store, confirm, DEFAULT_DOWNLOAD_DIR)
    }

    /// Build a context downloading into `download_dir`
    pub fn with_download_dir(
        config: SyncConfig,
        store: Arc<dyn ObjectStore>,
        confirm: Arc<dyn Confirm>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        let inventory = Arc::new(
            InventoryIndex::new(store.clone())
                .with_cache()
                .with_download_dir(download_dir),
        );
        let executor = Arc::new(TransferExecutor::new(
            store.clone(),
            inventory.clone(),
            config.transfer.clone(),
        ));
        Self {
            config: Arc::new(config),
            store,
            inventory,
            executor,
            confirm,
            observer: None,
        }
    }

    /// Report batch items as they finish
    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn executor(&self) -> &Arc<TransferExecutor> {
        &self.executor
    }

    pub fn download_dir(&self) -> &Path {
        self.inventory.download_dir()
    }

    fn coordinator(&self) -> BatchCoordinator {
        let coordinator = BatchCoordinator::new(self.executor.clone())
            .with_max_concurrency(self.config.transfer.max_concurrency);
        match &self.observer {
            Some(observer) => coordinator.with_observer(observer.clone()),
            None => coordinator,
        }
    }

    fn ask(&self, prompt: &str) -> Result<()> {
        if self.confirm.confirm(prompt)? {
            Ok(())
        } else {
            tracing::info!("Aborted by user");
            Err(Error::UserAborted)
        }
    }

    /// Upload a file or, when `path` is a directory, the whole tree
    pub async fn upload_path(&self, path: &Path, key: Option<String>) -> Result<SyncReport> {
        let absolute = absolutize(path)?;
        let metadata = tokio::fs::metadata(&absolute)
            .await
            .map_err(|e| Error::SourceUnreadable {
                path: absolute.clone(),
                reason: e.to_string(),
            })?;

        if metadata.is_dir() {
            self.upload_dir(&absolute).await.map(SyncReport::Batch)
        } else {
            self.upload_file(&absolute, metadata.len(), key)
                .await
                .map(SyncReport::Single)
        }
    }

    /// Scan `root` and upload every file under it
    pub async fn upload_dir(&self, root: &Path) -> Result<BatchResult> {
        let descriptors = DirectoryScanner::new(self.config.sync_prefix()).scan(root)?;
        let total: u64 = descriptors.iter().map(|d| d.size).sum();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        self.ask(&format!(
            "Uploading folder {name} ({} files, {})",
            descriptors.len(),
            format_size(total, DECIMAL)
        ))?;

        Ok(self
            .coordinator()
            .run_batch(descriptors, BatchOperation::Upload)
            .await)
    }

    async fn upload_file(
        &self,
        path: &Path,
        size: u64,
        key: Option<String>,
    ) -> Result<TransferDescriptor> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::PathResolution {
                path: path.to_path_buf(),
                reason: "path has no file name".into(),
            })?;
        let key = key.unwrap_or_else(|| format!("{}{file_name}", self.config.sync_prefix()));
        let descriptor = TransferDescriptor::new(path, size, key);

        self.ask(&format!(
            "Uploading file {file_name} ({}) to {}",
            format_size(size, DECIMAL),
            descriptor.object_key
        ))?;

        self.executor.upload_one(&descriptor).await?;
        Ok(descriptor)
    }

    /// Download one key, or several as a batch, into the download directory
    pub async fn download(&self, keys: &[String]) -> Result<SyncReport> {
        let download_dir = self.download_dir().to_path_buf();
        tokio::fs::create_dir_all(&download_dir).await?;

        match keys {
            [] => Err(Error::General("No object key provided".into())),
            [key] => {
                let entry = self
                    .inventory
                    .exists(key)
                    .await?
                    .ok_or_else(|| Error::ObjectNotFound(key.clone()))?;
                self.ask(&format!(
                    "Downloading file {} ({})",
                    entry.object_key,
                    format_size(entry.size, DECIMAL)
                ))?;

                let local_path = self.executor.download_one(key, &download_dir).await?;
                Ok(SyncReport::Single(TransferDescriptor::new(
                    local_path,
                    entry.size,
                    entry.object_key,
                )))
            }
            keys => {
                let inventory = self.inventory.fetch_keys().await?;
                let mut found: Vec<InventoryEntry> = Vec::with_capacity(keys.len());
                let mut missing: Vec<&String> = Vec::new();
                for key in keys {
                    match inventory.iter().find(|e| &e.object_key == key) {
                        Some(entry) => found.push(entry.clone()),
                        None => missing.push(key),
                    }
                }

                if !found.is_empty() {
                    let total: u64 = found.iter().map(|e| e.size).sum();
                    let mut prompt = format!(
                        "Downloading {} files ({})",
                        found.len(),
                        format_size(total, DECIMAL)
                    );
                    if !missing.is_empty() {
                        let names: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
                        prompt.push_str(&format!("\nNot in bucket: {}", names.join(", ")));
                    }
                    self.ask(&prompt)?;
                }

                let descriptors = download_descriptors(found, &download_dir);
                let mut result = self
                    .coordinator()
                    .run_batch(descriptors, BatchOperation::Download)
                    .await;

                // Never attempted, reported alongside the transfers
                for key in missing {
                    let item = BatchItem {
                        descriptor: TransferDescriptor::new(
                            download_dir.join(key_base_name(key)),
                            0,
                            key.clone(),
                        ),
                        outcome: TransferOutcome::Failure(Error::ObjectNotFound(key.clone())),
                    };
                    if let Some(observer) = &self.observer {
                        observer.on_item(&item);
                    }
                    result.items.push(item);
                }
                Ok(SyncReport::Batch(result))
            }
        }
    }

    /// Delete a single object after confirming it exists
    pub async fn delete(&self, key: &str) -> Result<()> {
        let entry = self
            .inventory
            .exists(key)
            .await?
            .ok_or_else(|| Error::ObjectNotFound(key.to_string()))?;

        self.ask(&format!(
            "Deleting {} ({}). Are you sure?",
            entry.object_key,
            format_size(entry.size, DECIMAL)
        ))?;

        self.executor.delete_one(key).await
    }

    /// Every file object currently in the bucket
    pub async fn list(&self) -> Result<Vec<InventoryEntry>> {
        self.inventory.fetch_keys().await
    }
}
