//! Transfer strategy selection
//!
//! Files up to the threshold go out in a single request; anything bigger is
//! handed to the store's multipart uploader.

use serde::Serialize;

/// Default threshold between simple and streamed transfers: 100 MB
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 100_000_000;

/// Part size for streamed uploads: 10 MiB
pub const DEFAULT_PART_SIZE: u64 = 10 * 1024 * 1024;

/// Parts in flight for a single streamed upload
pub const DEFAULT_MAX_CONCURRENT_PARTS: usize = 5;

/// How a single file is moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStrategy {
    /// Single request for the whole body
    Simple,
    /// Chunked multipart transfer
    Streamed,
}

/// Pick the strategy for a file of `size` bytes
pub const fn select_strategy(size: u64, threshold: u64) -> TransferStrategy {
    if size <= threshold {
        TransferStrategy::Simple
    } else {
        TransferStrategy::Streamed
    }
}
