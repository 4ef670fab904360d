//! Configuration management for azstorage
//!
//! Named storage accounts live in a YAML file, by default
//! `~/.config/azstorage/accounts.yaml`, or the path in
//! `AZSTORAGE_ACCOUNTS_PATH`. Secrets are never stored in the file; each
//! account names the environment variable holding its key, SAS token or
//! connection string.
//!
//! ## Environment Variable Expansion
//!
//! The file is expanded before parsing:
//! - `${VAR}` - Simple substitution
//! - `${VAR:-default}` - Use default if VAR is unset or empty
//! - `${VAR-default}` - Use default if VAR is unset
//! - `${VAR:+alt}` - Use alt if VAR is set and non-empty
//! - `${VAR+alt}` - Use alt if VAR is set

use crate::{
    constants::{ACCOUNTS_FILE, ENV_ACCOUNTS_PATH},
    location::LocationMode,
    retry::{ExponentialRetry, LinearRetry, NoRetry, RetryPolicy, RetrySettings},
};
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf, sync::Arc, sync::OnceLock};

/// Contents of the accounts file.
///
/// # Example
///
/// ```yaml
/// defaultAccount: prod
/// accounts:
///   - name: prod
///     accountName: contosodata
///     auth:
///       type: sharedKey
///       accountKeyEnv: CONTOSO_KEY
///     locationMode: primary
///     retry:
///       policy: exponential
///       maxAttempts: 5
///       retryToSecondary: true
///   - name: local
///     auth:
///       type: connectionString
///       connectionStringEnv: LOCAL_STORAGE
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccountsConfig {
    /// Account used when no `--account` flag is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_account: Option<String>,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// One named storage account.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    /// Local alias used on the command line
    pub name: String,
    /// Storage account name; not needed with connection-string auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    /// e.g. `core.chinacloudapi.cn` for sovereign clouds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Custom domain for the blob service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_endpoint: Option<String>,
    #[serde(default)]
    pub location_mode: LocationMode,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Where an account's credential comes from. Values are environment variable names.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthConfig {
    /// Anonymous access (public containers)
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    SharedKey { account_key_env: String },
    #[serde(rename_all = "camelCase")]
    Sas { token_env: String },
    #[serde(rename_all = "camelCase")]
    ConnectionString { connection_string_env: String },
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetryKind {
    #[default]
    Exponential,
    Linear,
    None,
}

/// Retry settings; unset numbers take the policy's defaults.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    #[serde(default)]
    pub policy: RetryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Seconds; the fixed backoff for the linear policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_backoff: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment_base: Option<f64>,
    /// Seconds of random jitter on either side of the backoff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f64>,
    #[serde(default)]
    pub retry_to_secondary: bool,
}

impl RetryConfig {
    pub fn build(&self) -> Arc<dyn RetryPolicy> {
        match self.policy {
            RetryKind::Exponential => {
                let defaults = ExponentialRetry::default();
                Arc::new(ExponentialRetry {
                    initial_backoff: self.initial_backoff.unwrap_or(defaults.initial_backoff),
                    increment_base: self.increment_base.unwrap_or(defaults.increment_base),
                    random_jitter_range: self.jitter.unwrap_or(defaults.random_jitter_range),
                    settings: self.settings(defaults.settings),
                })
            }
            RetryKind::Linear => {
                let defaults = LinearRetry::default();
                Arc::new(LinearRetry {
                    backoff: self.initial_backoff.unwrap_or(defaults.backoff),
                    random_jitter_range: self.jitter.unwrap_or(defaults.random_jitter_range),
                    settings: self.settings(defaults.settings),
                })
            }
            RetryKind::None => Arc::new(NoRetry),
        }
    }

    fn settings(&self, defaults: RetrySettings) -> RetrySettings {
        RetrySettings {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            retry_to_secondary: self.retry_to_secondary,
        }
    }
}

impl AccountsConfig {
    pub fn find(&self, name: &str) -> Option<&AccountConfig> {
        self.accounts.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.accounts.iter().map(|a| a.name.clone()).collect()
    }

    /// Names that appear more than once.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut dups = Vec::new();
        for a in &self.accounts {
            if !seen.insert(a.name.as_str()) && !dups.contains(&a.name) {
                dups.push(a.name.clone());
            }
        }
        dups
    }
}

pub fn accounts_path() -> PathBuf {
    env::var(ENV_ACCOUNTS_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push(ACCOUNTS_FILE);
            p
        })
}

pub fn load_accounts_config() -> anyhow::Result<AccountsConfig> {
    load_accounts_config_from(&accounts_path())
}

pub fn load_accounts_config_from(path: &Path) -> anyhow::Result<AccountsConfig> {
    if !path.exists() {
        return Ok(AccountsConfig::default());
    }
    let data = preprocess_config(path)
        .with_context(|| format!("reading accounts file {}", path.display()))?;
    let cfg: AccountsConfig = serde_yaml::from_str(&data)
        .with_context(|| format!("parsing accounts file {}", path.display()))?;
    Ok(cfg)
}

pub fn save_accounts_config(cfg: &AccountsConfig) -> anyhow::Result<PathBuf> {
    let path = accounts_path();
    save_accounts_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_accounts_config_to(cfg: &AccountsConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_yaml::to_string(cfg)?;
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?[-+])([^}]*))?\}")
            .expect("placeholder pattern is valid")
    })
}

pub fn expand_env_placeholders(input: &str) -> String {
    placeholder_regex()
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let op = caps.get(2).map_or("", |m| m.as_str());
            let val = caps.get(3).map_or("", |m| m.as_str());
            let var = env::var(var_name).ok();

            match (var.as_deref(), op) {
                (Some(v), "") => v.to_string(),                       // ${VAR}
                (Some(v), ":-") if !v.is_empty() => v.to_string(),    // ${VAR:-default}
                (_, ":-") => val.to_string(),
                (Some(v), "-") => v.to_string(),                      // ${VAR-default}
                (None, "-") => val.to_string(),
                (Some(v), ":+") if !v.is_empty() => val.to_string(),  // ${VAR:+alt}
                (Some(_), "+") => val.to_string(),                    // ${VAR+alt}
                _ => String::new(),
            }
        })
        .to_string()
}

pub fn preprocess_config(path: &Path) -> anyhow::Result<String> {
    let raw_data = fs::read_to_string(path)?;
    Ok(expand_env_placeholders(&raw_data))
}
