use azstorage_cli::{
    config::{
        load_accounts_config_from, save_accounts_config_to, AccountConfig, AccountsConfig,
        AuthConfig, RetryConfig, RetryKind,
    },
    location::LocationMode,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_save_then_load_accounts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/accounts.yaml");

    let cfg = AccountsConfig {
        default_account: Some("prod".into()),
        accounts: vec![AccountConfig {
            name: "prod".into(),
            account_name: Some("contoso".into()),
            auth: AuthConfig::Sas {
                token_env: "CONTOSO_SAS".into(),
            },
            location_mode: LocationMode::Secondary,
            retry: RetryConfig {
                policy: RetryKind::Linear,
                max_attempts: Some(4),
                retry_to_secondary: true,
                ..Default::default()
            },
            ..Default::default()
        }],
    };
    save_accounts_config_to(&cfg, &path).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("tokenEnv: CONTOSO_SAS"));
    assert!(written.contains("locationMode: secondary"));
    assert!(!written.contains("endpointSuffix"));

    let loaded = load_accounts_config_from(&path).unwrap();
    assert_eq!(loaded.default_account.as_deref(), Some("prod"));
    assert_eq!(loaded.accounts, cfg.accounts);
}

#[test]
fn test_missing_file_is_empty_config() {
    let dir = TempDir::new().unwrap();
    let loaded = load_accounts_config_from(&dir.path().join("absent.yaml")).unwrap();
    assert!(loaded.accounts.is_empty());
    assert!(loaded.default_account.is_none());
}

#[test]
fn test_placeholders_expand_before_parsing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("accounts.yaml");
    std::env::set_var("AZSTORAGE_IT_SUFFIX", "core.usgovcloudapi.net");
    fs::write(
        &path,
        r#"
accounts:
  - name: gov
    accountName: ${AZSTORAGE_IT_ACCOUNT:-govdata}
    endpointSuffix: ${AZSTORAGE_IT_SUFFIX}
"#,
    )
    .unwrap();

    let loaded = load_accounts_config_from(&path).unwrap();
    let gov = loaded.find("gov").unwrap();
    assert_eq!(gov.account_name.as_deref(), Some("govdata"));
    assert_eq!(gov.endpoint_suffix.as_deref(), Some("core.usgovcloudapi.net"));
    assert_eq!(gov.auth, AuthConfig::None);
}

#[test]
fn test_duplicate_names_are_detected() {
    let cfg: AccountsConfig = serde_yaml::from_str(
        "accounts:\n  - name: a\n    accountName: x\n  - name: a\n    accountName: y\n",
    )
    .unwrap();
    assert_eq!(cfg.duplicate_names(), vec!["a".to_string()]);
}
