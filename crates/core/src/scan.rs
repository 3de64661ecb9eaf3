//! Directory scanning
//!
//! Walks a local directory and turns every file into a [`TransferDescriptor`].
//! The first unreadable entry aborts the scan and nothing is returned.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::descriptor::TransferDescriptor;
use crate::error::{Error, Result};
use crate::path::{absolutize, map_to_object_key, root_dir_name};

/// Recursive directory scanner
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    base_prefix: String,
}

impl DirectoryScanner {
    /// Create a scanner whose keys start with `base_prefix`
    pub fn new(base_prefix: impl Into<String>) -> Self {
        Self {
            base_prefix: base_prefix.into(),
        }
    }

    /// Scan `root_path`, returning one descriptor per non-directory entry
    pub fn scan(&self, root_path: &Path) -> Result<Vec<TransferDescriptor>> {
        let root = absolutize(root_path)?;
        if !root.is_dir() {
            return Err(scan_error(&root, "not a directory"));
        }
        let root_name = root_dir_name(&root)?;

        let mut descriptors = Vec::new();
        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                scan_error(&path, &e.to_string())
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let metadata = entry
                .metadata()
                .map_err(|e| scan_error(entry.path(), &e.to_string()))?;
            let local_path = entry.path().to_path_buf();
            let object_key = map_to_object_key(&root_name, &local_path, &self.base_prefix)?;

            descriptors.push(TransferDescriptor::new(
                local_path,
                metadata.len(),
                object_key,
            ));
        }

        tracing::debug!(
            root = %root.display(),
            files = descriptors.len(),
            "Scanned directory"
        );
        Ok(descriptors)
    }
}

fn scan_error(path: &Path, reason: &str) -> Error {
    Error::Scan {
        path: PathBuf::from(path),
        reason: reason.to_string(),
    }
}
