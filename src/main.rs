//! # azstorage CLI
//!
//! ```bash
//! # Configure an account once
//! azstorage account add
//!
//! # List containers, reading from the secondary of an RA-GRS account
//! azstorage --account prod --location-mode secondary container list
//!
//! # Upload and download
//! azstorage blob upload ./report.csv reports/2024/report.csv
//! azstorage blob download reports/2024/report.csv ./copy.csv
//! ```
//!
//! Credentials can also come from `AZURE_STORAGE_CONNECTION_STRING` or
//! `AZURE_STORAGE_ACCOUNT` with `AZURE_STORAGE_KEY` / `AZURE_STORAGE_SAS_TOKEN`.

use anyhow::Result;
use azstorage_cli::{commands, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "azstorage_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cmd = cli.cmd.unwrap_or_else(|| {
        eprintln!("No command provided. Use --help to see available commands.");
        std::process::exit(1);
    });
    commands::run(cmd, cli.connection).await
}
