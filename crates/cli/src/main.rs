//! fs3 - folder sync for S3
//!
//! Uploads local files and folders to an S3 bucket, lists what is stored and
//! downloads or deletes objects again.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod exit_code;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --debug wins over RUST_LOG
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
