use crate::{
    blob::BlobService,
    client::{OperationContext, StorageClient},
    config::{accounts_path, load_accounts_config, AuthConfig},
    connection::Service,
    credentials::from_account_config,
    location::LocationMode,
    retry::NoRetry,
};
use anyhow::{anyhow, Result};
use std::sync::Arc;

pub async fn run() -> Result<()> {
    // 1) load and check names
    let cfg = load_accounts_config()?;
    println!("accounts file: {}", accounts_path().display());

    let dups = cfg.duplicate_names();
    if !dups.is_empty() {
        return Err(anyhow!("duplicate account names: {}", dups.join(", ")));
    }
    if let Some(default) = &cfg.default_account {
        if cfg.find(default).is_none() {
            return Err(anyhow!("default account '{}' is not configured", default));
        }
    }

    // 2) resolve credentials and ping each primary endpoint once
    let env = |k: &str| std::env::var(k).ok();
    let mut all_ok = true;
    for account in &cfg.accounts {
        let resolved = match from_account_config(Service::Blob, account, &env) {
            Ok(r) => r,
            Err(e) => {
                println!("❌ {}: {e:#}", account.name);
                all_ok = false;
                continue;
            }
        };
        let endpoint = resolved.params.primary_endpoint.clone();
        let client = StorageClient::new(resolved.params)?
            .location_mode(LocationMode::Primary)
            .retry_policy(Arc::new(NoRetry));
        let service = BlobService::new(client);
        let mut op = OperationContext::default();
        match service
            .list_containers_page(None, Some(1), None, &mut op)
            .await
        {
            Ok(_) => println!("✔️  {} reachable at {endpoint}", account.name),
            // anonymous accounts may not list containers but still answered
            Err(e) if e.status().is_some() && account.auth == AuthConfig::None => {
                println!("✔️  {} answered at {endpoint} ({e})", account.name)
            }
            Err(e) => {
                println!("❌ {} at {endpoint}: {e}", account.name);
                all_ok = false;
            }
        }
    }

    if !all_ok {
        return Err(anyhow!("doctor found problems"));
    }
    println!("✅ doctor checks passed");
    Ok(())
}

