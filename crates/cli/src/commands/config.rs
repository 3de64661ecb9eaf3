//! Configuration file commands
//!
//! The file lives at `<config dir>/folder-sync/config.toml` unless
//! `FS3_CONFIG_DIR` points elsewhere.

use clap::Subcommand;
use fs3_core::{ConfigManager, SyncConfig};
use serde::Serialize;

use super::context::report_error;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write an empty config file to fill in
    Generate,

    /// Remove the config file
    Delete,

    /// Print the current config (secret key hidden)
    Show,
}

#[derive(Debug, Serialize)]
struct ConfigOperationOutput {
    success: bool,
    path: String,
    message: String,
}

/// Config as shown to the user, without the secret key
#[derive(Debug, Serialize)]
struct ConfigView {
    path: String,
    bucket_name: String,
    bucket_region: String,
    bucket_sync_folder: String,
    aws_access_key_id: String,
    aws_secret_access_key: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    large_file_threshold: u64,
    part_size: u64,
    max_concurrent_parts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_concurrency: Option<usize>,
}

impl ConfigView {
    fn new(path: String, config: SyncConfig) -> Self {
        let secret = if config.aws_secret_access_key.is_empty() {
            ""
        } else {
            "********"
        };
        Self {
            path,
            bucket_name: config.bucket_name,
            bucket_region: config.bucket_region,
            bucket_sync_folder: config.bucket_sync_folder,
            aws_access_key_id: config.aws_access_key_id,
            aws_secret_access_key: secret,
            endpoint: config.endpoint,
            large_file_threshold: config.transfer.large_file_threshold,
            part_size: config.transfer.part_size,
            max_concurrent_parts: config.transfer.max_concurrent_parts,
            max_concurrency: config.transfer.max_concurrency,
        }
    }
}

/// Execute a config subcommand
pub fn execute(cmd: ConfigCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => return report_error(&formatter, &e),
    };
    run(cmd, &manager, &formatter)
}

fn run(cmd: ConfigCommands, manager: &ConfigManager, formatter: &Formatter) -> ExitCode {
    let path = manager.config_path().display().to_string();

    match cmd {
        ConfigCommands::Generate => match manager.generate() {
            Ok(()) => {
                done(
                    formatter,
                    path.clone(),
                    format!("File created successfully. Please fill out the details at {path}"),
                );
                ExitCode::Success
            }
            Err(e) => report_error(formatter, &e),
        },
        ConfigCommands::Delete => match manager.delete() {
            Ok(()) => {
                done(formatter, path, "Deleted successfully!".into());
                ExitCode::Success
            }
            Err(e) => report_error(formatter, &e),
        },
        ConfigCommands::Show => match manager.load() {
            Ok(config) => {
                let view = ConfigView::new(path, config);
                if formatter.is_json() {
                    formatter.json(&view);
                } else {
                    formatter.println(&render(&view));
                }
                ExitCode::Success
            }
            Err(e) => report_error(formatter, &e),
        },
    }
}

fn done(formatter: &Formatter, path: String, message: String) {
    if formatter.is_json() {
        formatter.json(&ConfigOperationOutput {
            success: true,
            path,
            message,
        });
    } else {
        formatter.success(&message);
    }
}

fn render(view: &ConfigView) -> String {
    let mut lines = vec![
        format!("Config file:          {}", view.path),
        format!("Bucket:               {}", view.bucket_name),
        format!("Region:               {}", view.bucket_region),
        format!("Sync folder:          {}", view.bucket_sync_folder),
        format!("Access key:           {}", view.aws_access_key_id),
        format!("Secret key:           {}", view.aws_secret_access_key),
    ];
    if let Some(endpoint) = &view.endpoint {
        lines.push(format!("Endpoint:             {endpoint}"));
    }
    lines.push(format!("Large file threshold: {}", view.large_file_threshold));
    lines.push(format!("Part size:            {}", view.part_size));
    lines.push(format!("Parts in flight:      {}", view.max_concurrent_parts));
    lines.push(format!(
        "Batch concurrency:    {}",
        view.max_concurrency
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
    ));
    lines.join("\n")
}
