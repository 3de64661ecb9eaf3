//! Shared plumbing for the transfer commands
//!
//! Loads the configuration, connects to the bucket and wires the interactive
//! pieces (confirmation prompt, per-file progress) into a [`SyncContext`].

use std::io::{BufRead, Write};
use std::sync::{Arc, OnceLock};

use fs3_core::{
    BatchItem, BatchObserver, BatchOperation, BatchResult, Confirm, ConfigManager, Error,
    ObjectStore, SyncContext,
};
use fs3_s3::S3Client;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Reads y/n answers from stdin
///
/// The prompt goes to stderr so JSON on stdout stays parseable.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> fs3_core::Result<bool> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{prompt}\nContinue? (y/n) ")?;
        stderr.flush()?;

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

/// Accept `y` or `yes` in any case
pub fn is_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Prints a line per transferred file and advances a counter
pub struct ProgressObserver {
    formatter: Formatter,
    operation: BatchOperation,
    bar: OnceLock<ProgressBar>,
}

impl ProgressObserver {
    pub fn new(formatter: Formatter, operation: BatchOperation) -> Self {
        Self {
            formatter,
            operation,
            bar: OnceLock::new(),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = self.bar.get() {
            bar.finish_and_clear();
        }
    }
}

impl BatchObserver for ProgressObserver {
    fn on_item(&self, item: &BatchItem) {
        // Created on first use so it never draws over the confirmation prompt
        let bar = self.bar.get_or_init(|| {
            ProgressBar::counter(self.formatter.config(), verb(self.operation))
        });
        bar.inc(1);

        if item.outcome.is_success() && !self.formatter.is_quiet() && !self.formatter.is_json() {
            bar.println(&format!(
                "{} successful {}",
                verb(self.operation),
                item.descriptor.object_key
            ));
        }
    }
}

fn verb(operation: BatchOperation) -> &'static str {
    match operation {
        BatchOperation::Upload => "Upload",
        BatchOperation::Download => "Download",
    }
}

/// Load config, connect and assemble a context for one invocation
pub async fn connect(
    formatter: &Formatter,
    assume_yes: bool,
    observer: Option<Arc<dyn BatchObserver>>,
) -> Result<SyncContext, ExitCode> {
    let manager = ConfigManager::new().map_err(|e| report_error(formatter, &e))?;
    let config = manager.load().map_err(|e| report_error(formatter, &e))?;
    config.validate().map_err(|e| report_error(formatter, &e))?;

    let client = S3Client::new(&config)
        .await
        .map_err(|e| report_error(formatter, &e))?;
    let store: Arc<dyn ObjectStore> = Arc::new(client);

    let confirm: Arc<dyn Confirm> = if assume_yes {
        Arc::new(fs3_core::AssumeYes)
    } else {
        Arc::new(StdinConfirm)
    };

    let context = SyncContext::new(config, store, confirm);
    Ok(match observer {
        Some(observer) => context.with_observer(observer),
        None => context,
    })
}

/// Print an error and pick the exit code for it
///
/// A declined prompt is reported as "Aborted" and is not a failure.
pub fn report_error(formatter: &Formatter, err: &Error) -> ExitCode {
    if err.is_failure() {
        tracing::debug!(error = ?err, "Command failed");
        formatter.error(&err.to_string());
    } else if formatter.is_json() {
        formatter.json(&serde_json::json!({ "status": "aborted" }));
    } else {
        formatter.warning("Aborted");
    }
    ExitCode::from_error(err)
}

#[derive(Debug, Serialize)]
struct BatchOutput {
    operation: BatchOperation,
    total: usize,
    succeeded: Vec<String>,
    failed: Vec<FailedItem>,
}

#[derive(Debug, Serialize)]
struct FailedItem {
    path: String,
    key: String,
    error: String,
}

/// Summarise a finished batch; any failed file makes it a general error
pub fn report_batch(
    formatter: &Formatter,
    operation: BatchOperation,
    result: &BatchResult,
) -> ExitCode {
    if formatter.is_json() {
        let output = BatchOutput {
            operation,
            total: result.len(),
            succeeded: result.successes().map(|d| d.object_key.clone()).collect(),
            failed: result
                .failures()
                .map(|(d, e)| FailedItem {
                    path: d.local_path.display().to_string(),
                    key: d.object_key.clone(),
                    error: e.to_string(),
                })
                .collect(),
        };
        formatter.json(&output);
    } else {
        for (descriptor, err) in result.failures() {
            formatter.error(&format!("{}: {err}", descriptor.local_path.display()));
        }
        if result.all_succeeded() {
            formatter.success(&format!(
                "{} complete: {} file(s)",
                verb(operation),
                result.len()
            ));
        } else {
            formatter.warning(&format!(
                "{} finished with errors: {} of {} file(s) failed",
                verb(operation),
                result.failure_count(),
                result.len()
            ));
        }
    }

    if result.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    }
}

/// Formatter plus observer for a batch-capable command
pub fn batch_output(
    output_config: OutputConfig,
    operation: BatchOperation,
) -> (Formatter, Arc<ProgressObserver>) {
    let formatter = Formatter::new(output_config);
    let observer = Arc::new(ProgressObserver::new(formatter.clone(), operation));
    (formatter, observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs3_core::{TransferDescriptor, TransferOutcome};

    fn quiet() -> Formatter {
        Formatter::new(OutputConfig {
            quiet: true,
            no_progress: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_is_yes() {
        for answer in ["y", "Y", "yes", "Yes", "YES\n", "  y  "] {
            assert!(is_yes(answer), "{answer:?} should confirm");
        }
        for answer in ["", "n", "no", "yep", "sure"] {
            assert!(!is_yes(answer), "{answer:?} should decline");
        }
    }

    #[test]
    fn test_report_error_abort_is_success() {
        assert_eq!(report_error(&quiet(), &Error::UserAborted), ExitCode::Success);
        assert_eq!(
            report_error(&quiet(), &Error::ObjectNotFound("k".into())),
            ExitCode::NotFound
        );
    }

    #[test]
    fn test_report_batch_exit_codes() {
        let ok = BatchResult {
            items: vec![BatchItem {
                descriptor: TransferDescriptor::new("/p/a.txt", 1, "sync/p/a.txt"),
                outcome: TransferOutcome::Success,
            }],
        };
        assert_eq!(
            report_batch(&quiet(), BatchOperation::Upload, &ok),
            ExitCode::Success
        );

        let mut partial = ok;
        partial.items.push(BatchItem {
            descriptor: TransferDescriptor::new("/p/b.txt", 1, "sync/p/b.txt"),
            outcome: TransferOutcome::Failure(Error::UploadFailed {
                path: "/p/b.txt".into(),
                cause: "denied".into(),
            }),
        });
        assert_eq!(
            report_batch(&quiet(), BatchOperation::Upload, &partial),
            ExitCode::GeneralError
        );
    }

    #[test]
    fn test_observer_counts_items() {
        let observer = ProgressObserver::new(quiet(), BatchOperation::Download);
        let item = BatchItem {
            descriptor: TransferDescriptor::new("downloads/a", 1, "sync/a"),
            outcome: TransferOutcome::Success,
        };
        observer.on_item(&item);
        observer.on_item(&item);
        assert!(observer.bar.get().is_some_and(|b| !b.is_visible()));
        observer.finish();
    }
}
