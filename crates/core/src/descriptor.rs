//! Transfer descriptors

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::strategy::{TransferStrategy, select_strategy};

/// One file slated for transfer
///
/// For uploads `local_path` is the source; for downloads it is the file that
/// will be written. `size` is captured once and never re-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferDescriptor {
    pub local_path: PathBuf,
    pub size: u64,
    pub object_key: String,
}

impl TransferDescriptor {
    pub fn new(local_path: impl Into<PathBuf>, size: u64, object_key: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            size,
            object_key: object_key.into(),
        }
    }

    /// Strategy for this descriptor under `threshold`
    pub fn strategy(&self, threshold: u64) -> TransferStrategy {
        select_strategy(self.size, threshold)
    }

    /// Directory a download of this descriptor lands in
    pub fn destination_dir(&self) -> &Path {
        self.local_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_uses_captured_size() {
        let d = TransferDescriptor::new("/tmp/a.bin", 101, "sync/a.bin");
        assert_eq!(d.strategy(100), TransferStrategy::Streamed);
        assert_eq!(d.strategy(101), TransferStrategy::Simple);
    }

    #[test]
    fn test_destination_dir() {
        let d = TransferDescriptor::new("downloads/a.txt", 1, "sync/a.txt");
        assert_eq!(d.destination_dir(), Path::new("downloads"));
    }
}
