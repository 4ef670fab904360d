use anyhow::{Context, Result};

use super::{blob_service, load_config, print_json};
use crate::credentials::ConnectionArgs;

pub async fn run(conn: &ConnectionArgs) -> Result<()> {
    let cfg = load_config()?;
    let service = blob_service(conn, &cfg)?;
    let stats = service
        .get_service_stats()
        .await
        .context("service stats require an RA-GRS account with a secondary endpoint")?;
    print_json(&stats)
}
