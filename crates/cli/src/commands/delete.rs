//! delete command - Remove one object after confirmation

use clap::Args;
use serde::Serialize;

use super::context::{connect, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Delete an object
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Object key to delete
    pub key: String,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    status: &'static str,
    key: String,
}

/// Execute the delete command
pub async fn execute(args: DeleteArgs, output_config: OutputConfig, assume_yes: bool) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let context = match connect(&formatter, assume_yes, None).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match context.delete(&args.key).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&DeleteOutput {
                    status: "success",
                    key: args.key,
                });
            } else {
                formatter.success(&format!("Deleted {}", args.key));
            }
            ExitCode::Success
        }
        Err(e) => report_error(&formatter, &e),
    }
}
