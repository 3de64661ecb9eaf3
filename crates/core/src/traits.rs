//! ObjectStore trait definition
//!
//! This trait defines the interface the sync engine needs from the remote
//! store. A store instance is bound to a single bucket. It allows the engine to
//! be decoupled from the specific S3 SDK implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata for a stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size_bytes: u64,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a file
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes: size,
            last_modified: None,
            etag: None,
        }
    }

    /// Whether this key is a zero-byte "directory" marker
    pub fn is_dir_marker(&self) -> bool {
        self.key.ends_with('/')
    }
}

/// Settings for the multipart uploader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamedUpload {
    /// Bytes per part
    pub part_size: u64,

    /// Parts in flight at once
    pub max_concurrent_parts: usize,
}

/// Trait for single-bucket object storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object in the bucket, following pagination
    async fn list_all(&self) -> Result<Vec<ObjectInfo>>;

    /// Get object content as bytes
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;

    /// Stream an open file to `key` in a single request
    async fn put_object(
        &self,
        key: &str,
        file: tokio::fs::File,
        content_type: Option<String>,
    ) -> Result<()>;

    /// Upload an open file of `size` bytes in parts
    async fn put_streamed(
        &self,
        key: &str,
        file: tokio::fs::File,
        size: u64,
        options: StreamedUpload,
    ) -> Result<()>;

    /// Delete a single object
    async fn delete_object(&self, key: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_file() {
        let info = ObjectInfo::file("test.txt", 1024);
        assert_eq!(info.key, "test.txt");
        assert_eq!(info.size_bytes, 1024);
        assert!(!info.is_dir_marker());
    }

    #[test]
    fn test_dir_marker() {
        let info = ObjectInfo::file("sync/proj/", 0);
        assert!(info.is_dir_marker());
    }
}
