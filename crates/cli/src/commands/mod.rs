//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Every command returns an [`ExitCode`]; errors are reported through the
//! shared [`Formatter`](crate::output::Formatter) before returning.

use clap::{Parser, Subcommand};

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

mod completions;
mod config;
pub mod context;
mod delete;
mod dir;
mod download;
mod list;
mod upload;

/// fs3 - folder sync for S3
///
/// Mirrors local files and folders into an S3 bucket and pulls them back.
#[derive(Parser, Debug)]
#[command(name = "fs3")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true, default_value = "false")]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a file (or a folder) to the bucket
    Upload(upload::UploadArgs),

    /// Upload every file under a folder
    Dir(dir::DirArgs),

    /// Download objects into ./downloads
    Download(download::DownloadArgs),

    /// Delete an object
    Delete(delete::DeleteArgs),

    /// List every object in the bucket
    List(list::ListArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Upload(args) => upload::execute(args, output_config, cli.yes).await,
        Commands::Dir(args) => dir::execute(args, output_config, cli.yes).await,
        Commands::Download(args) => download::execute(args, output_config, cli.yes).await,
        Commands::Delete(args) => delete::execute(args, output_config, cli.yes).await,
        Commands::List(args) => list::execute(args, output_config).await,
        Commands::Config(cmd) => config::execute(cmd, output_config),
        Commands::Completions(args) => completions::execute(args),
    }
}
