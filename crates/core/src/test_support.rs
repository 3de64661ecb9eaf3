//! In-memory store used by the unit tests

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::error::{Error, Result};
use crate::traits::{ObjectInfo, ObjectStore, StreamedUpload};

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    failing_keys: HashSet<String>,
    pub list_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
    pub streamed_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads to these keys fail with a network error
    pub fn failing_on(keys: &[&str]) -> Self {
        Self {
            failing_keys: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    fn check_failure(&self, key: &str) -> Result<()> {
        if self.failing_keys.contains(key) {
            return Err(Error::Network(format!("injected failure for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<ObjectInfo>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| ObjectInfo::file(k, v.len() as u64))
            .collect())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        self.get(key).ok_or_else(|| Error::ObjectNotFound(key.to_string()))
    }

    async fn put_object(
        &self,
        key: &str,
        mut file: tokio::fs::File,
        _content_type: Option<String>,
    ) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(key)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn put_streamed(
        &self,
        key: &str,
        mut file: tokio::fs::File,
        _size: u64,
        _options: StreamedUpload,
    ) -> Result<()> {
        self.streamed_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(key)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::ObjectNotFound(key.to_string()))
    }
}
