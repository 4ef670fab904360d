//! # azstorage
//!
//! A client library and command-line tool for Azure Storage.
//!
//! The core is the request pipeline in [`client`]: every operation is bound
//! to the primary or secondary endpoint of the account, signed, sent, and
//! retried according to a [`retry::RetryPolicy`]. Accounts with read-access
//! geo-redundant storage (RA-GRS) can serve reads from the secondary and fail
//! over to it on retry.

use clap::Parser;

pub mod auth;
pub mod blob;
pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod http;
pub mod identifier;
pub mod location;
pub mod models;
pub mod request;
pub mod retry;

/// Command-line client for Azure Storage
///
/// Lists, uploads and downloads blobs and containers, retrying transient
/// failures and optionally reading from the secondary endpoint of RA-GRS
/// accounts.
#[derive(Parser)]
#[command(
    name = "azstorage",
    version,
    about = "Command-line client for Azure Storage with retry and geo-redundant failover",
    long_about = "Command-line client for Azure Storage.\n\nRequests are signed with Shared Key or SAS, retried with exponential or linear backoff,\nand can be served from the secondary endpoint of read-access geo-redundant accounts."
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: credentials::ConnectionArgs,

    /// Log requests, responses and retries
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Option<commands::Commands>,
}
