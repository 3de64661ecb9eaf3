//! upload command - Upload a file or folder
//!
//! A file lands at `<sync folder><file name>` unless `--key` says otherwise.
//! A folder is scanned and uploaded as a batch, exactly like `dir`.

use std::path::PathBuf;

use clap::Args;
use fs3_core::{BatchOperation, SyncReport};
use serde::Serialize;

use super::context::{batch_output, connect, report_batch, report_error};
use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// Upload a file or folder
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file or folder to upload
    pub path: PathBuf,

    /// Object key for a single file (defaults to the sync folder plus file name)
    #[arg(long)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadOutput {
    status: &'static str,
    key: String,
    local_path: String,
    size_bytes: u64,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, output_config: OutputConfig, assume_yes: bool) -> ExitCode {
    let (formatter, observer) = batch_output(output_config, BatchOperation::Upload);

    let context = match connect(&formatter, assume_yes, Some(observer.clone())).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let report = context.upload_path(&args.path, args.key).await;
    observer.finish();

    match report {
        Ok(SyncReport::Single(descriptor)) => {
            if formatter.is_json() {
                formatter.json(&UploadOutput {
                    status: "success",
                    key: descriptor.object_key,
                    local_path: descriptor.local_path.display().to_string(),
                    size_bytes: descriptor.size,
                });
            } else {
                formatter.success(&format!("Upload successful {}", descriptor.object_key));
            }
            ExitCode::Success
        }
        Ok(SyncReport::Batch(result)) => report_batch(&formatter, BatchOperation::Upload, &result),
        Err(e) => report_error(&formatter, &e),
    }
}
