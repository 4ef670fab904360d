use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Subcommand;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::{fs, io::IsTerminal, path::PathBuf};

use super::{blob_service, load_config, print_json};
use crate::{credentials::ConnectionArgs, identifier::BlobIdentifier};

#[derive(Subcommand, Debug)]
pub enum BlobCommands {
    /// List blobs in a container
    List {
        /// `[account/]container`; prompts when omitted on a terminal
        container: Option<String>,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        num_results: Option<u32>,
        #[arg(long)]
        marker: Option<String>,
    },
    /// Download a blob to a local file
    Download {
        /// `[account/]container/blob`
        source: String,
        /// Local file to write
        file: PathBuf,
    },
    /// Upload a local file as a block blob
    Upload {
        /// Local file to read
        file: PathBuf,
        /// `[account/]container/blob`
        destination: String,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Check whether a blob exists
    Exists {
        /// `[account/]container/blob`
        path: String,
    },
}

/// An `account/` prefix in the path acts like `--account`.
fn connection_for(conn: &ConnectionArgs, id: &BlobIdentifier) -> ConnectionArgs {
    let mut conn = conn.clone();
    if let Some(account) = &id.account {
        conn.account = Some(account.clone());
    }
    conn
}

pub async fn run(cmd: BlobCommands, conn: &ConnectionArgs) -> Result<()> {
    let cfg = load_config()?;
    let known = cfg.names();

    match cmd {
        BlobCommands::List {
            container,
            prefix,
            num_results,
            marker,
        } => {
            let mut id = container
                .as_deref()
                .map(|c| BlobIdentifier::parse(c, &known))
                .unwrap_or_default();
            let service = blob_service(&connection_for(conn, &id), &cfg)?;
            if id.container.is_none() && std::io::stdin().is_terminal() {
                id.complete_container_interactive(&service).await?;
            }
            let container = id.require_container()?;
            let blobs = service
                .list_blobs(container, prefix.as_deref(), num_results, marker)
                .await
                .with_context(|| format!("listing {}", id.to_display_string()))?;
            print_json(&blobs)
        }
        BlobCommands::Download { source, file } => {
            let id = BlobIdentifier::parse(&source, &known);
            let service = blob_service(&connection_for(conn, &id), &cfg)?;
            let data = service
                .get_blob(id.require_container()?, id.require_blob()?)
                .await
                .with_context(|| format!("downloading {}", id.to_display_string()))?;
            fs::write(&file, &data).with_context(|| format!("writing {}", file.display()))?;
            let sha = hex::encode(Sha256::digest(&data));
            print_json(&json!({
                "file": file.display().to_string(),
                "size": data.len(),
                "sha256": sha,
            }))
        }
        BlobCommands::Upload {
            file,
            destination,
            content_type,
        } => {
            let id = BlobIdentifier::parse(&destination, &known);
            let data = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let service = blob_service(&connection_for(conn, &id), &cfg)?;
            let etag = service
                .put_blob(
                    id.require_container()?,
                    id.require_blob()?,
                    Bytes::from(data),
                    content_type.as_deref(),
                )
                .await
                .with_context(|| format!("uploading to {}", id.to_display_string()))?;
            print_json(&json!({ "etag": etag }))
        }
        BlobCommands::Exists { path } => {
            let id = BlobIdentifier::parse(&path, &known);
            let service = blob_service(&connection_for(conn, &id), &cfg)?;
            let exists = service
                .exists(id.require_container()?, Some(id.require_blob()?))
                .await?;
            print_json(&json!({ "exists": exists }))
        }
    }
}
