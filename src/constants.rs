//! Well-known names, hosts and defaults shared across the crate.

use std::time::Duration;

/// Storage REST API version sent as `x-ms-version` on every request.
pub const X_MS_VERSION: &str = "2017-11-09";

pub const USER_AGENT: &str = concat!("azstorage/", env!("CARGO_PKG_VERSION"));

pub const SERVICE_HOST_BASE: &str = "core.windows.net";
pub const DEFAULT_PROTOCOL: &str = "https";

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2000);

/// Upper bound for a single retry wait, in seconds.
pub const MAX_BACKOFF_SECS: f64 = 24.0 * 60.0 * 60.0;

// Storage emulator
pub const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
pub const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
pub const DEV_HOST: &str = "127.0.0.1";

/// Suffix that marks the read-only secondary of an RA-GRS account.
pub const SECONDARY_SUFFIX: &str = "-secondary";

// Environment variables read when no flag or configured account supplies a value
pub const ENV_CONNECTION_STRING: &str = "AZURE_STORAGE_CONNECTION_STRING";
pub const ENV_ACCOUNT: &str = "AZURE_STORAGE_ACCOUNT";
pub const ENV_KEY: &str = "AZURE_STORAGE_KEY";
pub const ENV_SAS_TOKEN: &str = "AZURE_STORAGE_SAS_TOKEN";
pub const ENV_ACCOUNTS_PATH: &str = "AZSTORAGE_ACCOUNTS_PATH";

/// Accounts file location under the user's config dir.
pub const ACCOUNTS_FILE: &str = "azstorage/accounts.yaml";
