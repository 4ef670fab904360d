use crate::{
    error::{Result, StorageError},
    location::HostLocations,
};
use bytes::Bytes;
use reqwest::Method;
use std::collections::BTreeMap;
use url::Url;

/// A storage request before it is bound to a host.
///
/// Header names are kept lower-case and both headers and query parameters are
/// sorted, which is the order Shared Key signing needs.
#[derive(Debug, Clone)]
pub struct StorageRequest {
    pub method: Method,
    pub host: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
    pub host_locations: HostLocations,
}

impl StorageRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        StorageRequest {
            method,
            host: String::new(),
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: Bytes::new(),
            host_locations: HostLocations::new(),
        }
    }

    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.insert(name.to_string(), value.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_host_locations(mut self, locations: HostLocations) -> Self {
        self.host_locations = locations;
        self
    }

    /// Add `name=value` unless the value is `None`.
    pub fn with_optional_query(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.with_query(name, v.to_string()),
            None => self,
        }
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Absolute URL for the current host.
    pub fn url(&self, protocol: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{protocol}://{}{}", self.host, self.path))
            .map_err(|e| StorageError::Config(format!("invalid request url: {e}")))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

/// A response with the body fully read.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Convert a failed response into the error the pipeline reports.
    pub fn into_error(self) -> StorageError {
        StorageError::Http {
            status: self.status,
            error_code: self.header("x-ms-error-code").map(str::to_string),
            body: self.text(),
            reason: self.reason,
        }
    }
}

/// Percent-encode a path, keeping `/` and unreserved characters.
pub fn quote_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_everything_but_unreserved() {
        assert_eq!(quote_path("/c/dir/my file+1.txt"), "/c/dir/my%20file%2B1.txt");
        assert_eq!(quote_path("/c/é"), "/c/%C3%A9");
    }

    #[test]
    fn url_carries_sorted_query() {
        let mut req = StorageRequest::new(Method::GET, "/")
            .with_query("restype", "container")
            .with_query("comp", "list");
        req.host = "acct.blob.core.windows.net".into();
        let url = req.url("https").unwrap();
        assert_eq!(
            url.as_str(),
            "https://acct.blob.core.windows.net/?comp=list&restype=container"
        );
    }

    #[test]
    fn error_keeps_service_error_code() {
        let mut resp = HttpResponse {
            status: 409,
            reason: "Conflict".into(),
            ..Default::default()
        };
        resp.headers
            .insert("x-ms-error-code".into(), "ContainerAlreadyExists".into());
        let err = resp.into_error();
        assert!(err.is_conflict());
        assert_eq!(err.error_code(), Some("ContainerAlreadyExists"));
    }
}
