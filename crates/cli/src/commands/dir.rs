//! dir command - Upload a whole folder
//!
//! Every file below the folder keeps its path relative to the folder's parent,
//! so `~/proj/sub/b.txt` becomes `<sync folder>proj/sub/b.txt`.

use std::path::PathBuf;

use clap::Args;
use fs3_core::BatchOperation;
use fs3_core::path::absolutize;

use super::context::{batch_output, connect, report_batch, report_error};
use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// Upload a folder
#[derive(Args, Debug)]
pub struct DirArgs {
    /// Local folder to upload
    pub path: PathBuf,
}

/// Execute the dir command
pub async fn execute(args: DirArgs, output_config: OutputConfig, assume_yes: bool) -> ExitCode {
    let (formatter, observer) = batch_output(output_config, BatchOperation::Upload);

    let root = match absolutize(&args.path) {
        Ok(p) if p.is_dir() => p,
        Ok(p) => {
            formatter.error(&format!("Not a folder: {}", p.display()));
            return ExitCode::UsageError;
        }
        Err(e) => return report_error(&formatter, &e),
    };

    let context = match connect(&formatter, assume_yes, Some(observer.clone())).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = context.upload_dir(&root).await;
    observer.finish();

    match result {
        Ok(result) => report_batch(&formatter, BatchOperation::Upload, &result),
        Err(e) => report_error(&formatter, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dir_rejects_a_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        std::fs::write(&file, b"hello").unwrap();

        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        let code = execute(DirArgs { path: file }, config, true).await;
        assert_eq!(code, ExitCode::UsageError);
    }
}
