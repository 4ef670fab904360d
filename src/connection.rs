//! Connection strings and per-service endpoint resolution.
//!
//! A storage account exposes one endpoint per service. Accounts with
//! read-access geo-redundancy also answer reads on a secondary host named
//! `{account}-secondary.{service}.{suffix}`.

use crate::{
    auth::Credential,
    constants::{
        DEFAULT_PROTOCOL, DEV_ACCOUNT_KEY, DEV_ACCOUNT_NAME, DEV_HOST, SERVICE_HOST_BASE,
    },
    error::{Result, StorageError},
    location::{HostLocations, LocationMode},
};
use std::collections::HashMap;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Blob,
    Queue,
    Table,
    File,
}

impl Service {
    /// DNS label used in `{account}.{label}.{suffix}`.
    pub fn label(self) -> &'static str {
        match self {
            Service::Blob => "blob",
            Service::Queue => "queue",
            Service::Table => "table",
            Service::File => "file",
        }
    }

    fn endpoint_key(self) -> &'static str {
        match self {
            Service::Blob => "blobendpoint",
            Service::Queue => "queueendpoint",
            Service::Table => "tableendpoint",
            Service::File => "fileendpoint",
        }
    }

    /// Port the local storage emulator listens on for this service.
    pub fn emulator_port(self) -> Option<u16> {
        match self {
            Service::Blob => Some(10000),
            Service::Queue => Some(10001),
            Service::Table => Some(10002),
            Service::File => None,
        }
    }
}

/// Everything needed to address and authenticate against one service of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceParameters {
    pub service: Service,
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub sas_token: Option<String>,
    pub protocol: String,
    pub primary_endpoint: String,
    pub secondary_endpoint: Option<String>,
    pub is_emulated: bool,
}

/// Split `Key=Value;Key=Value` into a map with lower-cased keys.
pub fn parse_connection_string(input: &str) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for segment in input.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (key, value) = segment.split_once('=').ok_or_else(|| {
            StorageError::InvalidConnectionString(format!("segment '{segment}' is not key=value"))
        })?;
        map.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }
    Ok(map)
}

/// Strip the leading `?` that portal-issued SAS tokens carry.
pub fn normalize_sas_token(token: &str) -> String {
    token.trim_start_matches('?').to_string()
}

impl ServiceParameters {
    /// Build parameters from explicit values.
    ///
    /// With a custom domain the primary host comes from it; otherwise an
    /// account name is required. The secondary is derived from the account
    /// name whenever one is known.
    pub fn new(
        service: Service,
        account_name: Option<String>,
        account_key: Option<String>,
        sas_token: Option<String>,
        protocol: Option<String>,
        endpoint_suffix: Option<String>,
        custom_domain: Option<String>,
    ) -> Result<Self> {
        let suffix = endpoint_suffix.unwrap_or_else(|| SERVICE_HOST_BASE.to_string());
        let mut protocol = protocol.unwrap_or_else(|| DEFAULT_PROTOCOL.to_string());

        let primary_endpoint = match custom_domain {
            Some(domain) => {
                let (scheme, host_and_path) = split_scheme(&domain);
                if let Some(scheme) = scheme {
                    protocol = scheme.to_string();
                }
                host_and_path.trim_end_matches('/').to_string()
            }
            None => {
                let account = account_name.as_deref().ok_or(StorageError::MissingInfo)?;
                format!("{account}.{}.{suffix}", service.label())
            }
        };
        let secondary_endpoint = account_name
            .as_deref()
            .map(|account| format!("{account}-secondary.{}.{suffix}", service.label()));

        Ok(ServiceParameters {
            service,
            account_name,
            account_key,
            sas_token: sas_token.as_deref().map(normalize_sas_token),
            protocol,
            primary_endpoint,
            secondary_endpoint,
            is_emulated: false,
        })
    }

    /// Parameters for the local storage emulator.
    pub fn development(service: Service, proxy_uri: Option<&str>) -> Result<Self> {
        let port = service.emulator_port().ok_or_else(|| {
            StorageError::Config(format!(
                "the storage emulator does not host the {} service",
                service.label()
            ))
        })?;
        let (protocol, host) = match proxy_uri {
            Some(uri) => {
                let parsed = Url::parse(uri).map_err(|e| {
                    StorageError::InvalidConnectionString(format!(
                        "DevelopmentStorageProxyUri '{uri}': {e}"
                    ))
                })?;
                let host = parsed.host_str().unwrap_or(DEV_HOST).to_string();
                (parsed.scheme().to_string(), host)
            }
            None => ("http".to_string(), DEV_HOST.to_string()),
        };
        let endpoint = format!("{host}:{port}");
        Ok(ServiceParameters {
            service,
            account_name: Some(DEV_ACCOUNT_NAME.to_string()),
            account_key: Some(DEV_ACCOUNT_KEY.to_string()),
            sas_token: None,
            protocol,
            primary_endpoint: endpoint.clone(),
            secondary_endpoint: Some(endpoint),
            is_emulated: true,
        })
    }

    pub fn from_connection_string(service: Service, input: &str) -> Result<Self> {
        let map = parse_connection_string(input)?;

        let dev = map
            .get("usedevelopmentstorage")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if dev {
            let proxy = map.get("developmentstorageproxyuri").map(String::as_str);
            return Self::development(service, proxy);
        }

        Self::new(
            service,
            map.get("accountname").cloned(),
            map.get("accountkey").cloned(),
            map.get("sharedaccesssignature").cloned(),
            map.get("defaultendpointsprotocol").cloned(),
            map.get("endpointsuffix").cloned(),
            map.get(service.endpoint_key()).cloned(),
        )
    }

    /// Hosts an operation may use.
    pub fn host_locations(&self, primary: bool, secondary: bool) -> HostLocations {
        let mut locations = HostLocations::new();
        if primary {
            locations.insert(LocationMode::Primary, self.primary_endpoint.clone());
        }
        if secondary {
            if let Some(host) = &self.secondary_endpoint {
                locations.insert(LocationMode::Secondary, host.clone());
            }
        }
        locations
    }

    /// Pick the signing scheme: account key first, then SAS, then anonymous.
    pub fn credential(&self) -> Credential {
        match (&self.account_name, &self.account_key, &self.sas_token) {
            (Some(account), Some(key), _) if self.service == Service::Table => {
                Credential::SharedKeyTable {
                    account: account.clone(),
                    key: key.clone(),
                }
            }
            (Some(account), Some(key), _) => Credential::SharedKey {
                account: account.clone(),
                key: key.clone(),
            },
            (_, _, Some(token)) => Credential::Sas(token.clone()),
            _ => Credential::Anonymous,
        }
    }
}

fn split_scheme(value: &str) -> (Option<&str>, &str) {
    match value.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_connection_string() {
        let params = ServiceParameters::from_connection_string(
            Service::Blob,
            "DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=a2V5;EndpointSuffix=core.chinacloudapi.cn",
        )
        .unwrap();
        assert_eq!(params.primary_endpoint, "acct.blob.core.chinacloudapi.cn");
        assert_eq!(
            params.secondary_endpoint.as_deref(),
            Some("acct-secondary.blob.core.chinacloudapi.cn")
        );
        assert_eq!(params.protocol, "https");
        assert!(matches!(params.credential(), Credential::SharedKey { .. }));
    }

    #[test]
    fn custom_endpoint_overrides_primary_only() {
        let params = ServiceParameters::from_connection_string(
            Service::Blob,
            "AccountName=acct;SharedAccessSignature=?sv=2017&sig=abc%3D;BlobEndpoint=http://cdn.example.com/store/",
        )
        .unwrap();
        assert_eq!(params.primary_endpoint, "cdn.example.com/store");
        assert_eq!(params.protocol, "http");
        assert_eq!(
            params.secondary_endpoint.as_deref(),
            Some("acct-secondary.blob.core.windows.net")
        );
        assert_eq!(params.credential(), Credential::Sas("sv=2017&sig=abc%3D".into()));
    }

    #[test]
    fn development_storage() {
        let params =
            ServiceParameters::from_connection_string(Service::Queue, "UseDevelopmentStorage=true;")
                .unwrap();
        assert!(params.is_emulated);
        assert_eq!(params.primary_endpoint, "127.0.0.1:10001");
        assert_eq!(params.protocol, "http");
        assert_eq!(params.account_name.as_deref(), Some(DEV_ACCOUNT_NAME));
    }

    #[test]
    fn missing_account_name_is_rejected() {
        let err = ServiceParameters::from_connection_string(Service::Blob, "AccountKey=a2V5")
            .unwrap_err();
        assert!(matches!(err, StorageError::MissingInfo));
        assert!(parse_connection_string("AccountName").is_err());
    }

    #[test]
    fn table_service_uses_table_signing() {
        let params = ServiceParameters::new(
            Service::Table,
            Some("acct".into()),
            Some("a2V5".into()),
            None,
            None,
            None,
            None,
        )
        .unwrap();
        assert!(matches!(params.credential(), Credential::SharedKeyTable { .. }));
        assert_eq!(params.host_locations(false, true).len(), 1);
    }
}
