//! Batch transfers
//!
//! Fans a list of descriptors out across tokio tasks. Every descriptor is moved
//! into its own task, failures are captured per item and the batch always runs
//! to completion. Nothing is rolled back.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::descriptor::TransferDescriptor;
use crate::error::Error;
use crate::inventory::InventoryEntry;
use crate::path::key_base_name;
use crate::transfer::TransferExecutor;

/// Direction of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOperation {
    /// Upload each descriptor's local file to its key
    Upload,
    /// Download each descriptor's key next to its local path
    Download,
}

/// Result of one descriptor
#[derive(Debug)]
pub enum TransferOutcome {
    Success,
    Failure(Error),
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success)
    }
}

/// A descriptor paired with its outcome
#[derive(Debug)]
pub struct BatchItem {
    pub descriptor: TransferDescriptor,
    pub outcome: TransferOutcome,
}

/// Outcomes for every descriptor of a batch, in completion order
#[derive(Debug, Default)]
pub struct BatchResult {
    pub items: Vec<BatchItem>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Descriptors that transferred
    pub fn successes(&self) -> impl Iterator<Item = &TransferDescriptor> {
        self.items
            .iter()
            .filter(|i| i.outcome.is_success())
            .map(|i| &i.descriptor)
    }

    /// Descriptors that failed, with the reason
    pub fn failures(&self) -> impl Iterator<Item = (&TransferDescriptor, &Error)> {
        self.items.iter().filter_map(|i| match &i.outcome {
            TransferOutcome::Failure(e) => Some((&i.descriptor, e)),
            TransferOutcome::Success => None,
        })
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Hook called once per finished item, from the coordinating task
pub trait BatchObserver: Send + Sync {
    fn on_item(&self, item: &BatchItem);
}

/// Runs descriptors concurrently through a [`TransferExecutor`]
pub struct BatchCoordinator {
    executor: Arc<TransferExecutor>,
    max_concurrency: Option<usize>,
    observer: Option<Arc<dyn BatchObserver>>,
}

impl BatchCoordinator {
    /// Coordinator with unbounded fan-out
    pub fn new(executor: Arc<TransferExecutor>) -> Self {
        Self {
            executor,
            max_concurrency: None,
            observer: None,
        }
    }

    /// Cap in-flight transfers; `None` keeps one worker per descriptor
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit.map(|n| n.max(1));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run every descriptor and wait for all of them
    pub async fn run_batch(
        &self,
        descriptors: Vec<TransferDescriptor>,
        operation: BatchOperation,
    ) -> BatchResult {
        let total = descriptors.len();
        let semaphore = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));
        tracing::debug!(
            files = total,
            ?operation,
            max_concurrency = ?self.max_concurrency,
            "Starting batch"
        );

        let mut tasks = JoinSet::new();
        let mut in_flight: HashMap<tokio::task::Id, TransferDescriptor> =
            HashMap::with_capacity(total);

        for descriptor in descriptors {
            let executor = Arc::clone(&self.executor);
            let semaphore = semaphore.clone();
            let owned = descriptor.clone();

            let handle = tasks.spawn(async move {
                let _permit = match semaphore {
                    Some(s) => s.acquire_owned().await.ok(),
                    None => None,
                };
                let result = match operation {
                    BatchOperation::Upload => executor.upload_one(&owned).await,
                    BatchOperation::Download => executor
                        .download_one(&owned.object_key, owned.destination_dir())
                        .await
                        .map(|_| ()),
                };
                (owned, result)
            });
            in_flight.insert(handle.id(), descriptor);
        }

        let mut result = BatchResult {
            items: Vec::with_capacity(total),
        };

        while let Some(joined) = tasks.join_next_with_id().await {
            let item = match joined {
                Ok((id, (descriptor, outcome))) => {
                    in_flight.remove(&id);
                    BatchItem {
                        descriptor,
                        outcome: match outcome {
                            Ok(()) => TransferOutcome::Success,
                            Err(e) => TransferOutcome::Failure(e),
                        },
                    }
                }
                Err(join_error) => {
                    let Some(descriptor) = in_flight.remove(&join_error.id()) else {
                        tracing::error!(error = %join_error, "Batch worker vanished");
                        continue;
                    };
                    BatchItem {
                        descriptor,
                        outcome: TransferOutcome::Failure(Error::General(format!(
                            "worker failed: {join_error}"
                        ))),
                    }
                }
            };

            if let TransferOutcome::Failure(e) = &item.outcome {
                tracing::debug!(path = %item.descriptor.local_path.display(), error = %e, "Transfer failed");
            }
            if let Some(observer) = &self.observer {
                observer.on_item(&item);
            }
            result.items.push(item);
        }

        tracing::debug!(
            succeeded = result.success_count(),
            failed = result.failure_count(),
            "Batch finished"
        );
        result
    }
}

/// Build download descriptors for inventory entries landing in `destination_dir`
pub fn download_descriptors(
    entries: impl IntoIterator<Item = InventoryEntry>,
    destination_dir: &Path,
) -> Vec<TransferDescriptor> {
    entries
        .into_iter()
        .map(|e| {
            let local = destination_dir.join(key_base_name(&e.object_key));
            TransferDescriptor::new(local, e.size, e.object_key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransferSettings;
    use crate::inventory::InventoryIndex;
    use crate::scan::DirectoryScanner;
    use crate::test_support::MemoryStore;
    use crate::traits::ObjectStore;
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn coordinator(store: Arc<dyn ObjectStore>) -> BatchCoordinator {
        let inventory = Arc::new(InventoryIndex::new(store.clone()));
        let executor = TransferExecutor::new(store, inventory, TransferSettings::default());
        BatchCoordinator::new(Arc::new(executor))
    }

    fn write_files(dir: &std::path::Path, count: usize) -> Vec<TransferDescriptor> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("file_{i}.txt"));
                let body = format!("content of file {i}");
                std::fs::write(&path, &body).unwrap();
                TransferDescriptor::new(path, body.len() as u64, format!("sync/file_{i}.txt"))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_batch_uploads_each_file_to_its_own_key() {
        let temp = TempDir::new().unwrap();
        let descriptors = write_files(temp.path(), 25);
        let store = Arc::new(MemoryStore::new());

        let result = coordinator(store.clone())
            .run_batch(descriptors, BatchOperation::Upload)
            .await;

        assert_eq!(result.len(), 25);
        assert!(result.all_succeeded());
        for i in 0..25 {
            let body = store.get(&format!("sync/file_{i}.txt")).unwrap();
            assert_eq!(body, format!("content of file {i}").into_bytes());
        }
    }

    #[tokio::test]
    async fn test_batch_completeness_without_duplicates() {
        let temp = TempDir::new().unwrap();
        let descriptors = write_files(temp.path(), 12);
        let expected: BTreeSet<_> = descriptors.iter().map(|d| d.object_key.clone()).collect();

        let result = coordinator(Arc::new(MemoryStore::new()))
            .with_max_concurrency(Some(3))
            .run_batch(descriptors, BatchOperation::Upload)
            .await;

        let returned: Vec<_> = result
            .items
            .iter()
            .map(|i| i.descriptor.object_key.clone())
            .collect();
        assert_eq!(returned.len(), 12);
        assert_eq!(returned.iter().cloned().collect::<BTreeSet<_>>(), expected);
    }

    #[tokio::test]
    async fn test_one_unreadable_file_is_isolated() {
        let temp = TempDir::new().unwrap();
        let mut descriptors = write_files(temp.path(), 5);
        let bad = temp.path().join("vanished.txt");
        descriptors.push(TransferDescriptor::new(&bad, 4, "sync/vanished.txt"));

        let store = Arc::new(MemoryStore::new());
        let result = coordinator(store.clone())
            .run_batch(descriptors, BatchOperation::Upload)
            .await;

        assert_eq!(result.len(), 6);
        assert_eq!(result.success_count(), 5);
        let failures: Vec<_> = result.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.local_path, bad);
        assert!(matches!(failures[0].1, Error::SourceUnreadable { .. }));
        assert_eq!(store.keys().len(), 5);
    }

    #[tokio::test]
    async fn test_store_failure_does_not_abort_siblings() {
        let temp = TempDir::new().unwrap();
        let descriptors = write_files(temp.path(), 4);
        let store = Arc::new(MemoryStore::failing_on(&["sync/file_2.txt"]));

        let result = coordinator(store.clone())
            .with_max_concurrency(Some(1))
            .run_batch(descriptors, BatchOperation::Upload)
            .await;

        assert_eq!(result.success_count(), 3);
        let (failed, err) = result.failures().next().unwrap();
        assert_eq!(failed.object_key, "sync/file_2.txt");
        assert!(matches!(err, Error::UploadFailed { .. }));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let result = coordinator(Arc::new(MemoryStore::new()))
            .run_batch(Vec::new(), BatchOperation::Upload)
            .await;
        assert!(result.is_empty());
        assert!(result.all_succeeded());
    }

    #[tokio::test]
    async fn test_scanned_directory_round_trip() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("proj");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("a.txt"), b"0123456789").unwrap();
        std::fs::write(root.join("sub").join("b.txt"), b"abcdefghijabcdefghij").unwrap();

        let store = Arc::new(MemoryStore::new());
        let coordinator = coordinator(store.clone());
        let descriptors = DirectoryScanner::new("sync/").scan(&root).unwrap();
        let uploaded = coordinator
            .run_batch(descriptors, BatchOperation::Upload)
            .await;
        assert!(uploaded.all_succeeded());

        let out = temp.path().join("downloads");
        std::fs::create_dir_all(&out).unwrap();
        let entries = InventoryIndex::new(store.clone()).fetch_keys().await.unwrap();
        let downloaded = coordinator
            .run_batch(download_descriptors(entries, &out), BatchOperation::Download)
            .await;

        assert_eq!(downloaded.success_count(), 2);
        assert_eq!(std::fs::read(out.join("a.txt")).unwrap(), b"0123456789");
        assert_eq!(
            std::fs::read(out.join("b.txt")).unwrap(),
            b"abcdefghijabcdefghij"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_downloads_sharing_a_basename() {
        let first = vec![b'x'; 4 * 1024 * 1024];
        let second = vec![b'y'; 3 * 1024 * 1024];
        let store = Arc::new(MemoryStore::new());
        store.insert("sync/x/data.bin", &first);
        store.insert("sync/y/data.bin", &second);
        let coordinator = coordinator(store.clone());
        let entries = InventoryIndex::new(store.clone()).fetch_keys().await.unwrap();

        for _ in 0..20 {
            let temp = TempDir::new().unwrap();
            let mut descriptors = download_descriptors(entries.clone(), temp.path());
            // Same key twice lands on the same target as well
            descriptors.extend(download_descriptors(entries.clone(), temp.path()));

            let result = coordinator
                .run_batch(descriptors, BatchOperation::Download)
                .await;
            assert_eq!(result.len(), 4);
            assert!(
                result.all_succeeded(),
                "{:?}",
                result.failures().map(|(_, e)| e.to_string()).collect::<Vec<_>>()
            );

            let written = std::fs::read(temp.path().join("data.bin")).unwrap();
            assert!(written == first || written == second);
            let names: Vec<_> = std::fs::read_dir(temp.path())
                .unwrap()
                .map(|e| e.unwrap().file_name())
                .collect();
            assert_eq!(names, vec![std::ffi::OsString::from("data.bin")]);
        }
    }

    struct Recorder(Mutex<Vec<String>>);

    impl BatchObserver for Recorder {
        fn on_item(&self, item: &BatchItem) {
            self.0.lock().unwrap().push(item.descriptor.object_key.clone());
        }
    }

    #[tokio::test]
    async fn test_observer_sees_every_item() {
        let temp = TempDir::new().unwrap();
        let descriptors = write_files(temp.path(), 6);
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));

        coordinator(Arc::new(MemoryStore::new()))
            .with_observer(recorder.clone())
            .run_batch(descriptors, BatchOperation::Upload)
            .await;

        assert_eq!(recorder.0.lock().unwrap().len(), 6);
    }
}
