//! download command - Download objects
//!
//! Files are written to `./downloads/<base name of key>`. One key is a single
//! transfer; several keys run as a batch.

use clap::Args;
use fs3_core::{BatchOperation, SyncReport};
use serde::Serialize;

use super::context::{batch_output, connect, report_batch, report_error};
use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// Download objects
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Object key(s) to download
    #[arg(required = true)]
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DownloadOutput {
    status: &'static str,
    key: String,
    local_path: String,
    size_bytes: u64,
}

/// Execute the download command
pub async fn execute(
    args: DownloadArgs,
    output_config: OutputConfig,
    assume_yes: bool,
) -> ExitCode {
    let (formatter, observer) = batch_output(output_config, BatchOperation::Download);

    let context = match connect(&formatter, assume_yes, Some(observer.clone())).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let report = context.download(&args.keys).await;
    observer.finish();

    match report {
        Ok(SyncReport::Single(descriptor)) => {
            if formatter.is_json() {
                formatter.json(&DownloadOutput {
                    status: "success",
                    key: descriptor.object_key,
                    local_path: descriptor.local_path.display().to_string(),
                    size_bytes: descriptor.size,
                });
            } else {
                formatter.success(&format!(
                    "Download successful {} -> {}",
                    descriptor.object_key,
                    descriptor.local_path.display()
                ));
            }
            ExitCode::Success
        }
        Ok(SyncReport::Batch(result)) => {
            report_batch(&formatter, BatchOperation::Download, &result)
        }
        Err(e) => report_error(&formatter, &e),
    }
}
