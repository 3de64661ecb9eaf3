//! fs3-core: Directory synchronization engine for folder-sync
//!
//! This crate provides the core functionality for the fs3 CLI, including:
//! - Configuration management
//! - Local path to object key mapping
//! - Directory scanning and size-based transfer strategy selection
//! - Single-file transfers and concurrent batches
//! - Bucket inventory and existence checks
//! - ObjectStore trait for remote operations
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing and potential future support for other backends.

pub mod batch;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod inventory;
pub mod path;
pub mod scan;
pub mod strategy;
pub mod sync;
pub mod traits;
pub mod transfer;

#[cfg(test)]
mod test_support;

pub use batch::{
    BatchCoordinator, BatchItem, BatchObserver, BatchOperation, BatchResult, TransferOutcome,
};
pub use config::{ConfigManager, SyncConfig, TransferSettings};
pub use descriptor::TransferDescriptor;
pub use error::{Error, Result};
pub use inventory::{InventoryEntry, InventoryIndex};
pub use path::map_to_object_key;
pub use scan::DirectoryScanner;
pub use strategy::{TransferStrategy, select_strategy};
pub use sync::{AssumeYes, Confirm, SyncContext, SyncReport};
pub use traits::{ObjectInfo, ObjectStore, StreamedUpload};
pub use transfer::TransferExecutor;
