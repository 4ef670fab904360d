use crate::{
    client::{OperationContext, StorageClient},
    error::{dont_fail_not_exist, dont_fail_on_exist, Result, StorageError},
    models::{self, Blob, Container, Page, ServiceStats},
    request::{quote_path, HttpResponse, StorageRequest},
};
use bytes::Bytes;
use reqwest::Method;
use tracing::debug;

/// Blob-service operations on top of the storage pipeline.
///
/// Reads may be served by the secondary of an RA-GRS account; writes always
/// go to the primary.
pub struct BlobService {
    client: StorageClient,
}

fn container_path(container: &str) -> String {
    quote_path(&format!("/{container}"))
}

/// URL parsers collapse `.` and `..` segments, so such names would be signed
/// for one path and sent to another.
fn blob_path(container: &str, blob: &str) -> Result<String> {
    if blob.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(StorageError::Config(format!(
            "blob name '{blob}' contains a '.' or '..' path segment"
        )));
    }
    Ok(quote_path(&format!("/{container}/{blob}")))
}

fn body_text(resp: HttpResponse) -> Result<String> {
    String::from_utf8(resp.body.to_vec()).map_err(|e| StorageError::Parse(e.to_string()))
}

impl BlobService {
    pub fn new(client: StorageClient) -> Self {
        BlobService { client }
    }

    pub fn client(&self) -> &StorageClient {
        &self.client
    }

    /// One page of containers.
    pub async fn list_containers_page(
        &self,
        prefix: Option<&str>,
        max_results: Option<u32>,
        marker: Option<&str>,
        operation: &mut OperationContext,
    ) -> Result<Page<Container>> {
        let request = StorageRequest::new(Method::GET, "/")
            .with_host_locations(self.client.host_locations(true, true))
            .with_query("comp", "list")
            .with_optional_query("prefix", prefix)
            .with_optional_query("maxresults", max_results)
            .with_optional_query("marker", marker);
        self.client
            .perform_request(request, Some(operation), |resp| {
                models::parse_container_page(&body_text(resp)?)
            })
            .await
    }

    /// Follow `NextMarker` until `num_results` items are collected or the
    /// listing ends. All pages come from the same location.
    pub async fn list_containers(
        &self,
        prefix: Option<&str>,
        num_results: Option<u32>,
        marker: Option<String>,
    ) -> Result<Vec<Container>> {
        if num_results == Some(0) {
            return Ok(Vec::new());
        }
        let mut operation = OperationContext::locked();
        let mut marker = marker;
        let mut items = Vec::new();
        loop {
            let remaining = num_results.map(|n| n.saturating_sub(items.len() as u32));
            let page = self
                .list_containers_page(prefix, remaining, marker.as_deref(), &mut operation)
                .await?;
            debug!(count = page.items.len(), next = ?page.next_marker, "container page");
            items.extend(page.items);
            marker = page.next_marker;
            if marker.is_none() || num_results.is_some_and(|n| items.len() as u32 >= n) {
                return Ok(items);
            }
        }
    }

    pub async fn list_blobs_page(
        &self,
        container: &str,
        prefix: Option<&str>,
        max_results: Option<u32>,
        marker: Option<&str>,
        operation: &mut OperationContext,
    ) -> Result<Page<Blob>> {
        let request = StorageRequest::new(Method::GET, container_path(container))
            .with_host_locations(self.client.host_locations(true, true))
            .with_query("restype", "container")
            .with_query("comp", "list")
            .with_optional_query("prefix", prefix)
            .with_optional_query("maxresults", max_results)
            .with_optional_query("marker", marker);
        self.client
            .perform_request(request, Some(operation), |resp| {
                models::parse_blob_page(&body_text(resp)?)
            })
            .await
    }

    pub async fn list_blobs(
        &self,
        container: &str,
        prefix: Option<&str>,
        num_results: Option<u32>,
        marker: Option<String>,
    ) -> Result<Vec<Blob>> {
        if num_results == Some(0) {
            return Ok(Vec::new());
        }
        let mut operation = OperationContext::locked();
        let mut marker = marker;
        let mut items = Vec::new();
        loop {
            let remaining = num_results.map(|n| n.saturating_sub(items.len() as u32));
            let page = self
                .list_blobs_page(container, prefix, remaining, marker.as_deref(), &mut operation)
                .await?;
            debug!(count = page.items.len(), next = ?page.next_marker, "blob page");
            items.extend(page.items);
            marker = page.next_marker;
            if marker.is_none() || num_results.is_some_and(|n| items.len() as u32 >= n) {
                return Ok(items);
            }
        }
    }

    /// Returns `false` when the container already existed and `fail_on_exist` is off.
    pub async fn create_container(&self, container: &str, fail_on_exist: bool) -> Result<bool> {
        let request = StorageRequest::new(Method::PUT, container_path(container))
            .with_host_locations(self.client.host_locations(true, false))
            .with_query("restype", "container");
        let result = self.client.perform_request(request, None, |_| Ok(())).await;
        if fail_on_exist {
            result.map(|_| true)
        } else {
            dont_fail_on_exist(result)
        }
    }

    /// Returns `false` when the container was missing and `fail_not_exist` is off.
    pub async fn delete_container(&self, container: &str, fail_not_exist: bool) -> Result<bool> {
        let request = StorageRequest::new(Method::DELETE, container_path(container))
            .with_host_locations(self.client.host_locations(true, false))
            .with_query("restype", "container");
        let result = self.client.perform_request(request, None, |_| Ok(())).await;
        if fail_not_exist {
            result.map(|_| true)
        } else {
            dont_fail_not_exist(result)
        }
    }

    /// HEAD the container, or the blob when one is named.
    pub async fn exists(&self, container: &str, blob: Option<&str>) -> Result<bool> {
        let request = match blob {
            Some(blob) => StorageRequest::new(Method::HEAD, blob_path(container, blob)?),
            None => StorageRequest::new(Method::HEAD, container_path(container))
                .with_query("restype", "container"),
        }
        .with_host_locations(self.client.host_locations(true, true));
        let result = self.client.perform_request(request, None, |_| Ok(())).await;
        dont_fail_not_exist(result)
    }

    pub async fn get_blob(&self, container: &str, blob: &str) -> Result<Bytes> {
        let request = StorageRequest::new(Method::GET, blob_path(container, blob)?)
            .with_host_locations(self.client.host_locations(true, true));
        self.client
            .perform_request(request, None, |resp| Ok(resp.body))
            .await
    }

    /// Upload `data` as a block blob in a single request. Returns the new ETag.
    pub async fn put_blob(
        &self,
        container: &str,
        blob: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<Option<String>> {
        let request = StorageRequest::new(Method::PUT, blob_path(container, blob)?)
            .with_host_locations(self.client.host_locations(true, false))
            .with_header("x-ms-blob-type", "BlockBlob")
            .with_header(
                "content-type",
                content_type.unwrap_or("application/octet-stream"),
            )
            .with_body(data);
        self.client
            .perform_request(request, None, |resp| {
                Ok(resp.header("etag").map(str::to_string))
            })
            .await
    }

    /// Geo-replication status; only the secondary endpoint answers this.
    pub async fn get_service_stats(&self) -> Result<ServiceStats> {
        let request = StorageRequest::new(Method::GET, "/")
            .with_host_locations(self.client.host_locations(false, true))
            .with_query("restype", "service")
            .with_query("comp", "stats");
        self.client
            .perform_request(request, None, |resp| {
                models::parse_service_stats(&body_text(resp)?)
            })
            .await
    }
}
