//! Working out which account a command talks to, and with what credential.
//!
//! Sources, first hit wins:
//! 1. `--connection-string`, then `--account-name` with `--account-key` /
//!    `--sas-token` (key and token may also come from the environment);
//! 2. the configured account named by `--account`, else the default account;
//! 3. `AZURE_STORAGE_CONNECTION_STRING`;
//! 4. `AZURE_STORAGE_ACCOUNT` with `AZURE_STORAGE_KEY` or `AZURE_STORAGE_SAS_TOKEN`.
//!
//! An account name ending in `-secondary` selects the secondary location.

use crate::{
    config::{AccountConfig, AccountsConfig, AuthConfig, RetryConfig},
    connection::{Service, ServiceParameters},
    constants::{ENV_ACCOUNT, ENV_CONNECTION_STRING, ENV_KEY, ENV_SAS_TOKEN, SECONDARY_SUFFIX},
    identifier::suggest,
    location::LocationMode,
};
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Configured account to use (see `azstorage account list`)
    #[arg(long, global = true)]
    pub account: Option<String>,
    /// Storage connection string
    #[arg(long, global = true)]
    pub connection_string: Option<String>,
    /// Storage account name
    #[arg(long, global = true)]
    pub account_name: Option<String>,
    /// Storage account key
    #[arg(long, global = true)]
    pub account_key: Option<String>,
    /// Shared access signature token
    #[arg(long, global = true)]
    pub sas_token: Option<String>,
    /// Read from the primary or the secondary endpoint
    #[arg(long, global = true)]
    pub location_mode: Option<LocationMode>,
}

/// A fully resolved target account.
#[derive(Debug, Clone)]
pub struct ResolvedAccount {
    /// Where the settings came from, for messages
    pub source: String,
    pub params: ServiceParameters,
    pub location_mode: LocationMode,
    pub retry: RetryConfig,
}

/// Strip a `-secondary` suffix, reporting whether one was present.
pub fn split_secondary(name: &str) -> (String, bool) {
    match name.strip_suffix(SECONDARY_SUFFIX) {
        Some(base) if !base.is_empty() => (base.to_string(), true),
        _ => (name.to_string(), false),
    }
}

/// Resolve using the process environment.
pub fn resolve(
    args: &ConnectionArgs,
    cfg: &AccountsConfig,
    service: Service,
) -> Result<ResolvedAccount> {
    resolve_with_env(args, cfg, service, |k| std::env::var(k).ok())
}

pub fn resolve_with_env(
    args: &ConnectionArgs,
    cfg: &AccountsConfig,
    service: Service,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedAccount> {
    let non_empty = |k: &str| env(k).filter(|v| !v.is_empty());

    let mut resolved = if let Some(conn) = &args.connection_string {
        from_connection_string("--connection-string", service, conn)?
    } else if let Some(name) = &args.account_name {
        let key = args.account_key.clone().or_else(|| non_empty(ENV_KEY));
        let sas = args.sas_token.clone().or_else(|| non_empty(ENV_SAS_TOKEN));
        from_name("--account-name", service, name, key, sas)?
    } else if let Some(account) = configured_account(args, cfg)? {
        from_account_config(service, account, &env)?
    } else if let Some(conn) = non_empty(ENV_CONNECTION_STRING) {
        from_connection_string(ENV_CONNECTION_STRING, service, &conn)?
    } else if let Some(name) = non_empty(ENV_ACCOUNT) {
        let key = args.account_key.clone().or_else(|| non_empty(ENV_KEY));
        let sas = args.sas_token.clone().or_else(|| non_empty(ENV_SAS_TOKEN));
        from_name(ENV_ACCOUNT, service, &name, key, sas)?
    } else {
        bail!(
            "no storage account specified; use --account, --connection-string, --account-name \
             or set {ENV_CONNECTION_STRING}"
        );
    };

    if let Some(mode) = args.location_mode {
        resolved.location_mode = mode;
    }
    Ok(resolved)
}

fn configured_account<'a>(
    args: &ConnectionArgs,
    cfg: &'a AccountsConfig,
) -> Result<Option<&'a AccountConfig>> {
    match &args.account {
        Some(name) => cfg.find(name).map(Some).ok_or_else(|| {
            let names = cfg.names();
            let hints = suggest(name, &names);
            match hints.first() {
                Some(hint) => anyhow!("account '{name}' is not configured (did you mean '{hint}'?)"),
                None => anyhow!("account '{name}' is not configured"),
            }
        }),
        None => match &cfg.default_account {
            Some(name) => cfg
                .find(name)
                .map(Some)
                .ok_or_else(|| anyhow!("default account '{name}' is not configured")),
            None => Ok(None),
        },
    }
}

fn from_connection_string(source: &str, service: Service, conn: &str) -> Result<ResolvedAccount> {
    let mut params = ServiceParameters::from_connection_string(service, conn)
        .with_context(|| format!("parsing connection string from {source}"))?;
    let mut location_mode = LocationMode::Primary;
    if let Some(name) = params.account_name.clone() {
        let (base, secondary) = split_secondary(&name);
        if secondary {
            params = ServiceParameters::from_connection_string(
                service,
                &format!("{conn};AccountName={base}"),
            )?;
            location_mode = LocationMode::Secondary;
        }
    }
    Ok(ResolvedAccount {
        source: source.to_string(),
        params,
        location_mode,
        retry: RetryConfig::default(),
    })
}

fn from_name(
    source: &str,
    service: Service,
    name: &str,
    key: Option<String>,
    sas: Option<String>,
) -> Result<ResolvedAccount> {
    let (base, secondary) = split_secondary(name);
    let params = ServiceParameters::new(service, Some(base), key, sas, None, None, None)?;
    Ok(ResolvedAccount {
        source: source.to_string(),
        params,
        location_mode: if secondary {
            LocationMode::Secondary
        } else {
            LocationMode::Primary
        },
        retry: RetryConfig::default(),
    })
}

/// Build parameters from a configured account, reading secrets from `env`.
pub fn from_account_config(
    service: Service,
    account: &AccountConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<ResolvedAccount> {
    let secret = |var: &str| {
        env(var).filter(|v| !v.is_empty()).ok_or_else(|| {
            anyhow!(
                "account '{}' reads its credential from ${var}, which is not set",
                account.name
            )
        })
    };
    let source = format!("account '{}'", account.name);

    let mut resolved = match &account.auth {
        AuthConfig::ConnectionString {
            connection_string_env,
        } => from_connection_string(&source, service, &secret(connection_string_env.as_str())?)?,
        auth => {
            let name = account.account_name.as_deref().ok_or_else(|| {
                anyhow!("account '{}' needs accountName for {:?} auth", account.name, auth)
            })?;
            let (key, sas) = match auth {
                AuthConfig::SharedKey { account_key_env } => (Some(secret(account_key_env.as_str())?), None),
                AuthConfig::Sas { token_env } => (None, Some(secret(token_env.as_str())?)),
                _ => (None, None),
            };
            let (base, secondary) = split_secondary(name);
            let custom_domain = match service {
                Service::Blob => account.blob_endpoint.clone(),
                _ => None,
            };
            let params = ServiceParameters::new(
                service,
                Some(base),
                key,
                sas,
                account.protocol.clone(),
                account.endpoint_suffix.clone(),
                custom_domain,
            )?;
            ResolvedAccount {
                source,
                params,
                location_mode: if secondary {
                    LocationMode::Secondary
                } else {
                    LocationMode::Primary
                },
                retry: RetryConfig::default(),
            }
        }
    };

    if account.location_mode == LocationMode::Secondary {
        resolved.location_mode = LocationMode::Secondary;
    }
    resolved.retry = account.retry.clone();
    Ok(resolved)
}
