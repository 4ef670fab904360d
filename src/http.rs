use crate::{
    constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT},
    error::Result,
    request::{HttpResponse, StorageRequest},
};
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;

/// Sends one fully prepared request and reads the whole response.
///
/// The pipeline owns retries; a transport makes exactly one attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, protocol: &str, request: &StorageRequest) -> Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeouts(DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT)
    }

    pub fn with_timeouts(connect: Duration, read: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect)
            .timeout(read)
            .build()?;
        Ok(ReqwestTransport { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, protocol: &str, request: &StorageRequest) -> Result<HttpResponse> {
        let url = request.url(protocol)?;
        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            // reqwest derives it from the body
            if name == "content-length" {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        let has_body = !request.body.is_empty()
            || request.method == Method::PUT
            || request.method == Method::POST;
        if has_body {
            builder = builder.body(request.body.clone());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_ascii_lowercase(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = resp.bytes().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
