use crate::{
    config::{load_accounts_config, save_accounts_config, AccountConfig, AuthConfig},
    location::LocationMode,
};
use anyhow::{anyhow, Result};
use clap::Subcommand;
use dialoguer::{Confirm, Select};
use std::io::{stdin, stdout, Write};

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// List configured accounts
    List,
    /// Show one configured account
    Show { name: String },
    /// Add a new account (interactive prompts)
    Add,
    /// Remove an account by name
    Remove { name: String },
}

fn prompt(msg: &str) -> Result<String> {
    print!("{msg}: ");
    stdout().flush()?;
    let mut input = String::new();
    stdin().read_line(&mut input)?;
    let val = input.trim().to_string();
    if val.is_empty() {
        Err(anyhow!("{} cannot be empty", msg))
    } else {
        Ok(val)
    }
}

fn describe(a: &AccountConfig) -> String {
    let auth = match &a.auth {
        AuthConfig::None => "anonymous".to_string(),
        AuthConfig::SharedKey { account_key_env } => format!("shared key from ${account_key_env}"),
        AuthConfig::Sas { token_env } => format!("SAS from ${token_env}"),
        AuthConfig::ConnectionString {
            connection_string_env,
        } => format!("connection string from ${connection_string_env}"),
    };
    format!(
        "{} → {} ({auth}, {}, retry={:?})",
        a.name,
        a.account_name.as_deref().unwrap_or("-"),
        a.location_mode,
        a.retry.policy
    )
}

pub async fn run(cmd: AccountCommands) -> Result<()> {
    let mut cfg = load_accounts_config()?;

    match cmd {
        AccountCommands::List => {
            if cfg.accounts.is_empty() {
                println!("(no accounts configured)");
            } else {
                for a in &cfg.accounts {
                    let marker = if cfg.default_account.as_deref() == Some(a.name.as_str()) {
                        "*"
                    } else {
                        "-"
                    };
                    println!(" {marker} {}", describe(a));
                }
            }
        }
        AccountCommands::Show { name } => {
            let account = cfg
                .find(&name)
                .ok_or_else(|| anyhow!("no such account '{name}'"))?;
            print!("{}", serde_yaml::to_string(account)?);
        }
        AccountCommands::Add => {
            let name = prompt("Account alias")?;
            if cfg.find(&name).is_some() {
                return Err(anyhow!("account '{}' already exists", name));
            }

            let auth_options = vec!["shared key", "sas", "connection string", "none"];
            let selection = Select::new()
                .with_prompt("Auth type")
                .items(&auth_options)
                .default(0)
                .interact()?;

            let (account_name, auth) = match auth_options[selection] {
                "shared key" => {
                    let account_name = prompt("Storage account name")?;
                    let ev = prompt("Account key env var")?;
                    (Some(account_name), AuthConfig::SharedKey { account_key_env: ev })
                }
                "sas" => {
                    let account_name = prompt("Storage account name")?;
                    let ev = prompt("SAS token env var")?;
                    (Some(account_name), AuthConfig::Sas { token_env: ev })
                }
                "connection string" => {
                    let ev = prompt("Connection string env var")?;
                    (
                        None,
                        AuthConfig::ConnectionString {
                            connection_string_env: ev,
                        },
                    )
                }
                "none" => (Some(prompt("Storage account name")?), AuthConfig::None),
                other => return Err(anyhow!("unknown auth type '{}'", other)),
            };

            let read_secondary = Confirm::new()
                .with_prompt("Read from the secondary endpoint (RA-GRS)?")
                .default(false)
                .interact()?;

            cfg.accounts.push(AccountConfig {
                name: name.clone(),
                account_name,
                auth,
                location_mode: if read_secondary {
                    LocationMode::Secondary
                } else {
                    LocationMode::Primary
                },
                ..Default::default()
            });
            if cfg.default_account.is_none() {
                cfg.default_account = Some(name.clone());
            }
            let path = save_accounts_config(&cfg)?;
            println!("✅ Added account '{name}' to {}", path.display());
        }
        AccountCommands::Remove { name } => {
            let before = cfg.accounts.len();
            cfg.accounts.retain(|a| a.name != name);
            if cfg.accounts.len() == before {
                println!("no such account '{name}'");
            } else {
                if cfg.default_account.as_deref() == Some(name.as_str()) {
                    cfg.default_account = None;
                }
                save_accounts_config(&cfg)?;
                println!("removed '{name}'");
            }
        }
    }

    Ok(())
}
