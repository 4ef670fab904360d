use std::process::Command;
use tempfile::TempDir;

fn azstorage(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_azstorage"));
    cmd.env("AZSTORAGE_ACCOUNTS_PATH", home.path().join("accounts.yaml"))
        .env_remove("AZURE_STORAGE_CONNECTION_STRING")
        .env_remove("AZURE_STORAGE_ACCOUNT")
        .env_remove("AZURE_STORAGE_KEY")
        .env_remove("AZURE_STORAGE_SAS_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help_command() {
    let home = TempDir::new().unwrap();
    let output = azstorage(&home)
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("azstorage"));
    assert!(stdout.contains("--location-mode"));
}

#[test]
fn test_missing_account_is_reported() {
    let home = TempDir::new().unwrap();
    let output = azstorage(&home)
        .args(["container", "list"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no storage account specified"));
}

#[test]
fn test_account_list_with_empty_config() {
    let home = TempDir::new().unwrap();
    let output = azstorage(&home)
        .args(["account", "list"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no accounts configured"));
}

#[test]
fn test_completions_reject_unknown_shell() {
    let home = TempDir::new().unwrap();
    let ok = azstorage(&home).args(["completions", "bash"]).output().unwrap();
    assert!(ok.status.success());
    assert!(!ok.stdout.is_empty());

    let bad = azstorage(&home).args(["completions", "tcsh"]).output().unwrap();
    assert!(!bad.status.success());
}
