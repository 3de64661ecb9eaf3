//! list command - List every object in the bucket
//!
//! Human output is one `[size] key` line per object; folder markers are
//! never shown.

use clap::Args;
use fs3_core::InventoryEntry;
use humansize::{DECIMAL, format_size};
use serde::Serialize;

use super::context::{connect, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// List objects
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show totals
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for list command (JSON format)
#[derive(Debug, Serialize)]
struct ListOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    objects: Option<Vec<InventoryEntry>>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_objects: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn of(entries: &[InventoryEntry]) -> Self {
        let total_size_bytes = entries.iter().map(|e| e.size).sum();
        Self {
            total_objects: entries.len(),
            total_size_bytes,
            total_size_human: format_size(total_size_bytes, DECIMAL),
        }
    }
}

/// Execute the list command
pub async fn execute(args: ListArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    // Listing never prompts
    let context = match connect(&formatter, true, None).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let spinner = ProgressBar::spinner(&output_config, "Listing bucket");
    let listed = context.list().await;
    spinner.finish_and_clear();

    let mut entries = match listed {
        Ok(entries) => entries,
        Err(e) => return report_error(&formatter, &e),
    };
    entries.sort_by(|a, b| a.object_key.cmp(&b.object_key));

    let summary = Summary::of(&entries);
    if formatter.is_json() {
        formatter.json(&ListOutput {
            objects: (!args.summarize).then_some(entries),
            summary,
        });
        return ExitCode::Success;
    }

    if !args.summarize {
        for entry in &entries {
            formatter.println(&format_entry(&formatter, entry));
        }
    }
    formatter.println(&format!(
        "Total: {} object(s), {}",
        summary.total_objects, summary.total_size_human
    ));

    ExitCode::Success
}

fn format_entry(formatter: &Formatter, entry: &InventoryEntry) -> String {
    let size = format!("[{}]", format_size(entry.size, DECIMAL));
    if formatter.colors_enabled() {
        format!("{} {}", console::style(size).yellow(), entry.object_key)
    } else {
        format!("{size} {}", entry.object_key)
    }
}
