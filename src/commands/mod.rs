use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use crate::{
    blob::BlobService,
    client::StorageClient,
    config::{load_accounts_config, AccountsConfig},
    connection::Service,
    credentials::{resolve, ConnectionArgs},
};

pub mod account;
pub mod blob;
pub mod completions;
pub mod container;
pub mod doctor;
pub mod stats;

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Create, delete, list and probe blob containers")]
    Container {
        #[command(subcommand)]
        cmd: container::ContainerCommands,
    },
    #[command(about = "List, upload, download and probe blobs")]
    Blob {
        #[command(subcommand)]
        cmd: blob::BlobCommands,
    },
    #[command(
        about = "Show geo-replication status (served by the secondary endpoint only)"
    )]
    ServiceStats,
    #[command(about = "Manage configured storage accounts (list/show/add/remove)")]
    Account {
        #[command(subcommand)]
        cmd: account::AccountCommands,
    },
    #[command(about = "Validate configured accounts and check that each one answers")]
    Doctor,
    #[command(about = "Emit shell completion scripts (bash/zsh/fish)")]
    Completions { shell: String },
}

pub async fn run(cmd: Commands, conn: ConnectionArgs) -> Result<()> {
    match cmd {
        Commands::Container { cmd } => container::run(cmd, &conn).await,
        Commands::Blob { cmd } => blob::run(cmd, &conn).await,
        Commands::ServiceStats => stats::run(&conn).await,
        Commands::Account { cmd } => account::run(cmd).await,
        Commands::Doctor => doctor::run().await,
        Commands::Completions { shell } => completions::run(shell),
    }
}

/// Resolve the target account and build a blob client for it.
pub(crate) fn blob_service(conn: &ConnectionArgs, cfg: &AccountsConfig) -> Result<BlobService> {
    let resolved = resolve(conn, cfg, Service::Blob)?;
    tracing::debug!(
        source = %resolved.source,
        endpoint = %resolved.params.primary_endpoint,
        location = %resolved.location_mode,
        "resolved storage account"
    );
    let client = StorageClient::new(resolved.params)
        .with_context(|| format!("creating client for {}", resolved.source))?
        .location_mode(resolved.location_mode)
        .retry_policy(resolved.retry.build());
    Ok(BlobService::new(client))
}

pub(crate) fn load_config() -> Result<AccountsConfig> {
    load_accounts_config()
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
