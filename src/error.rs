//! Error types for the storage request pipeline.
//!
//! Every failure surfaced by [`crate::client::StorageClient`] is a
//! [`StorageError`]. HTTP failures keep the status, reason phrase and the
//! service's `x-ms-error-code` so callers (and the retry policies) can
//! classify them.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The service answered with a status code of 300 or above.
    #[error("{}", http_message(.reason, .error_code))]
    Http {
        status: u16,
        reason: String,
        error_code: Option<String>,
        body: String,
    },

    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// A successful response whose body could not be decoded.
    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("{0}")]
    Config(String),

    #[error("you need to provide an account name and either an account key or a SAS token when creating a storage service")]
    MissingInfo,
}

fn http_message(reason: &str, error_code: &Option<String>) -> String {
    match error_code {
        Some(code) => format!("Operation returned an invalid status '{reason}' ErrorCode:{code}"),
        None => format!("Operation returned an invalid status '{reason}'"),
    }
}

impl StorageError {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StorageError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            StorageError::Http { error_code, .. } => error_code.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Transport(err.to_string())
    }
}

impl From<quick_xml::DeError> for StorageError {
    fn from(err: quick_xml::DeError) -> Self {
        StorageError::Parse(err.to_string())
    }
}

/// Map a 404 to `Ok(false)`, for deletes that tolerate a missing resource.
pub fn dont_fail_not_exist(result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Map a 409 to `Ok(false)`, for creates that tolerate an existing resource.
pub fn dont_fail_on_exist(result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_conflict() => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, code: Option<&str>) -> StorageError {
        StorageError::Http {
            status,
            reason: "Not Found".into(),
            error_code: code.map(str::to_string),
            body: String::new(),
        }
    }

    #[test]
    fn message_includes_error_code() {
        let err = http(404, Some("ContainerNotFound"));
        assert_eq!(
            err.to_string(),
            "Operation returned an invalid status 'Not Found' ErrorCode:ContainerNotFound"
        );
        assert_eq!(
            http(404, None).to_string(),
            "Operation returned an invalid status 'Not Found'"
        );
    }

    #[test]
    fn tolerant_helpers_only_swallow_their_status() {
        assert!(!dont_fail_not_exist(Err(http(404, None))).unwrap());
        assert!(dont_fail_not_exist(Err(http(409, None))).is_err());
        assert!(!dont_fail_on_exist(Err(http(409, None))).unwrap());
        assert!(dont_fail_on_exist(Err(http(500, None))).is_err());
        assert!(dont_fail_on_exist(Ok(())).unwrap());
    }
}
