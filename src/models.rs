//! Response bodies of the blob service.
//!
//! The service speaks XML with PascalCase element names; the CLI prints JSON
//! with camelCase keys, so every struct renames in both directions.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One page of a listing plus the marker for the next page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_marker: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all(deserialize = "PascalCase", serialize = "camelCase"))]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub properties: ContainerProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all(deserialize = "PascalCase", serialize = "camelCase"))]
pub struct ContainerProperties {
    #[serde(rename(deserialize = "Last-Modified"), default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub lease_status: Option<String>,
    #[serde(default)]
    pub lease_state: Option<String>,
    #[serde(default)]
    pub public_access: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all(deserialize = "PascalCase", serialize = "camelCase"))]
pub struct Blob {
    pub name: String,
    #[serde(default)]
    pub properties: BlobProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all(deserialize = "PascalCase", serialize = "camelCase"))]
pub struct BlobProperties {
    #[serde(rename(deserialize = "Last-Modified"), default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(rename(deserialize = "Content-Length"), default)]
    pub content_length: Option<u64>,
    #[serde(rename(deserialize = "Content-Type"), default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub blob_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all(deserialize = "PascalCase", serialize = "camelCase"))]
pub struct ServiceStats {
    pub geo_replication: GeoReplication,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all(deserialize = "PascalCase", serialize = "camelCase"))]
pub struct GeoReplication {
    pub status: String,
    #[serde(default)]
    pub last_sync_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerEnumeration {
    #[serde(default)]
    containers: ContainerList,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerList {
    #[serde(rename = "Container", default)]
    items: Vec<Container>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BlobEnumeration {
    #[serde(default)]
    blobs: BlobList,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BlobList {
    #[serde(rename = "Blob", default)]
    items: Vec<Blob>,
}

fn strip_bom(xml: &str) -> &str {
    xml.trim_start_matches('\u{feff}')
}

fn non_empty(marker: Option<String>) -> Option<String> {
    marker.filter(|m| !m.trim().is_empty())
}

pub fn parse_container_page(xml: &str) -> Result<Page<Container>> {
    let parsed: ContainerEnumeration = quick_xml::de::from_str(strip_bom(xml))?;
    Ok(Page {
        items: parsed.containers.items,
        next_marker: non_empty(parsed.next_marker),
    })
}

pub fn parse_blob_page(xml: &str) -> Result<Page<Blob>> {
    let parsed: BlobEnumeration = quick_xml::de::from_str(strip_bom(xml))?;
    Ok(Page {
        items: parsed.blobs.items,
        next_marker: non_empty(parsed.next_marker),
    })
}

pub fn parse_service_stats(xml: &str) -> Result<ServiceStats> {
    Ok(quick_xml::de::from_str(strip_bom(xml))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_page_with_marker() {
        let xml = "\u{feff}<?xml version=\"1.0\" encoding=\"utf-8\"?>\
<EnumerationResults ServiceEndpoint=\"https://acct.blob.core.windows.net/\">\
<MaxResults>2</MaxResults>\
<Containers>\
<Container><Name>logs</Name><Properties><Last-Modified>Wed, 01 Jan 2020 00:00:00 GMT</Last-Modified><Etag>\"0x1\"</Etag><LeaseStatus>unlocked</LeaseStatus></Properties></Container>\
<Container><Name>media</Name><Properties><Etag>\"0x2\"</Etag></Properties></Container>\
</Containers>\
<NextMarker>/acct/next</NextMarker>\
</EnumerationResults>";
        let page = parse_container_page(xml).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "logs");
        assert_eq!(page.items[0].properties.lease_status.as_deref(), Some("unlocked"));
        assert_eq!(page.next_marker.as_deref(), Some("/acct/next"));
    }

    #[test]
    fn blob_page_without_marker() {
        let xml = "<EnumerationResults ContainerName=\"logs\"><Blobs>\
<Blob><Name>a/b.txt</Name><Properties><Content-Length>12</Content-Length><BlobType>BlockBlob</BlobType></Properties></Blob>\
</Blobs><NextMarker /></EnumerationResults>";
        let page = parse_blob_page(xml).unwrap();
        assert_eq!(page.items[0].name, "a/b.txt");
        assert_eq!(page.items[0].properties.content_length, Some(12));
        assert!(page.next_marker.is_none());
    }

    #[test]
    fn service_stats() {
        let xml = "<StorageServiceStats><GeoReplication><Status>live</Status>\
<LastSyncTime>Wed, 19 Jan 2021 22:28:43 GMT</LastSyncTime></GeoReplication></StorageServiceStats>";
        let stats = parse_service_stats(xml).unwrap();
        assert_eq!(stats.geo_replication.status, "live");
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["geoReplication"]["status"], "live");
    }
}
