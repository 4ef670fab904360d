use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use super::{blob_service, load_config, print_json};
use crate::credentials::ConnectionArgs;

#[derive(Subcommand, Debug)]
pub enum ContainerCommands {
    /// List containers in the account
    List {
        /// Only containers whose names start with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Stop after this many containers
        #[arg(long)]
        num_results: Option<u32>,
        /// Continuation marker from a previous listing
        #[arg(long)]
        marker: Option<String>,
    },
    /// Create a container
    Create {
        name: String,
        /// Fail if the container already exists
        #[arg(long)]
        fail_on_exist: bool,
    },
    /// Delete a container
    Delete {
        name: String,
        /// Fail if the container does not exist
        #[arg(long)]
        fail_not_exist: bool,
    },
    /// Check whether a container exists
    Exists { name: String },
}

pub async fn run(cmd: ContainerCommands, conn: &ConnectionArgs) -> Result<()> {
    let cfg = load_config()?;
    let service = blob_service(conn, &cfg)?;

    match cmd {
        ContainerCommands::List {
            prefix,
            num_results,
            marker,
        } => {
            let containers = service
                .list_containers(prefix.as_deref(), num_results, marker)
                .await?;
            print_json(&containers)
        }
        ContainerCommands::Create {
            name,
            fail_on_exist,
        } => {
            let created = service.create_container(&name, fail_on_exist).await?;
            print_json(&json!({ "created": created }))
        }
        ContainerCommands::Delete {
            name,
            fail_not_exist,
        } => {
            let deleted = service.delete_container(&name, fail_not_exist).await?;
            print_json(&json!({ "deleted": deleted }))
        }
        ContainerCommands::Exists { name } => {
            let exists = service.exists(&name, None).await?;
            print_json(&json!({ "exists": exists }))
        }
    }
}
