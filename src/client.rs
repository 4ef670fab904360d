//! The storage request pipeline.
//!
//! [`StorageClient::perform_request`] runs one logical operation: bind the
//! request to a host, then sign, send and classify until it succeeds or the
//! retry policy gives up. Operations that span several requests (paged
//! listings) can share an [`OperationContext`] so that every request after
//! the first goes to the location that served the first.

use crate::{
    auth::Credential,
    connection::ServiceParameters,
    constants::{SECONDARY_SUFFIX, USER_AGENT, X_MS_VERSION},
    error::{Result, StorageError},
    http::{ReqwestTransport, Transport},
    location::{HostLocations, LocationMode},
    request::{HttpResponse, StorageRequest},
    retry::{ExponentialRetry, RetryContext, RetryPolicy},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub type RequestCallback = Arc<dyn Fn(&mut StorageRequest) + Send + Sync>;
pub type ResponseCallback = Arc<dyn Fn(&HttpResponse) + Send + Sync>;
pub type RetryCallback = Arc<dyn Fn(&RetryContext) + Send + Sync>;

/// Per-operation state shared by the requests of one logical operation.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    pub location_lock: bool,
    host_location: Option<(LocationMode, String)>,
}

impl OperationContext {
    /// A context whose first request decides the location for the rest.
    pub fn locked() -> Self {
        OperationContext {
            location_lock: true,
            host_location: None,
        }
    }

    pub fn locked_location(&self) -> Option<(LocationMode, &str)> {
        self.host_location
            .as_ref()
            .map(|(mode, host)| (*mode, host.as_str()))
    }
}

pub struct StorageClient {
    params: ServiceParameters,
    credential: Credential,
    transport: Arc<dyn Transport>,
    retry_policy: Arc<dyn RetryPolicy>,
    location_mode: LocationMode,
    request_callback: Option<RequestCallback>,
    response_callback: Option<ResponseCallback>,
    retry_callback: Option<RetryCallback>,
}

impl StorageClient {
    /// Client with the default transport and exponential retry.
    pub fn new(params: ServiceParameters) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Ok(Self::with_transport(params, transport))
    }

    pub fn with_transport(params: ServiceParameters, transport: Arc<dyn Transport>) -> Self {
        StorageClient {
            credential: params.credential(),
            params,
            transport,
            retry_policy: Arc::new(ExponentialRetry::default()),
            location_mode: LocationMode::Primary,
            request_callback: None,
            response_callback: None,
            retry_callback: None,
        }
    }

    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn location_mode(mut self, mode: LocationMode) -> Self {
        self.location_mode = mode;
        self
    }

    pub fn on_request(mut self, callback: RequestCallback) -> Self {
        self.request_callback = Some(callback);
        self
    }

    pub fn on_response(mut self, callback: ResponseCallback) -> Self {
        self.response_callback = Some(callback);
        self
    }

    pub fn on_retry(mut self, callback: RetryCallback) -> Self {
        self.retry_callback = Some(callback);
        self
    }

    pub fn params(&self) -> &ServiceParameters {
        &self.params
    }

    /// Hosts for an operation; see [`ServiceParameters::host_locations`].
    pub fn host_locations(&self, primary: bool, secondary: bool) -> HostLocations {
        self.params.host_locations(primary, secondary)
    }

    /// Run one logical operation and decode its response with `parser`.
    pub async fn perform_request<T, F>(
        &self,
        mut request: StorageRequest,
        mut operation: Option<&mut OperationContext>,
        parser: F,
    ) -> Result<T>
    where
        F: Fn(HttpResponse) -> Result<T>,
    {
        let location_mode = self.apply_host(&mut request, operation.as_deref())?;
        if self.params.is_emulated {
            self.apply_emulator_path(&mut request, location_mode);
        }
        let client_request_id = Uuid::new_v4().to_string();
        update_request(&mut request, &client_request_id);

        let mut context = RetryContext::new(request, location_mode, self.params.is_emulated);
        loop {
            match self.attempt(&mut context, &parser).await {
                Ok(value) => {
                    if let Some(op) = operation.as_deref_mut() {
                        if op.location_lock && op.host_location.is_none() {
                            op.host_location =
                                Some((context.location_mode, context.request.host.clone()));
                        }
                    }
                    return Ok(value);
                }
                Err(err @ (StorageError::Auth(_) | StorageError::Config(_))) => {
                    error!(%client_request_id, error = %err, "request cannot be sent");
                    return Err(err);
                }
                Err(err) => {
                    context.last_error = Some(err.to_string());
                    match self.retry_policy.retry(&mut context) {
                        Some(delay) => {
                            if let Some(callback) = &self.retry_callback {
                                callback(&context);
                            }
                            warn!(
                                %client_request_id,
                                status = ?context.status,
                                error = %err,
                                retry = context.count,
                                location = %context.location_mode,
                                delay_ms = delay.as_millis() as u64,
                                "retrying request"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            error!(
                                %client_request_id,
                                status = ?context.status,
                                error = %err,
                                retries = context.count,
                                "giving up on request"
                            );
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    async fn attempt<T, F>(&self, context: &mut RetryContext, parser: &F) -> Result<T>
    where
        F: Fn(HttpResponse) -> Result<T>,
    {
        context.status = None;
        if let Some(callback) = &self.request_callback {
            callback(&mut context.request);
        }

        // date and signature go on last so retries after long sleeps stay valid
        let request = &mut context.request;
        request.set_header("x-ms-date", rfc1123_now());
        request.headers.remove("authorization");
        self.credential.sign(request)?;

        info!(
            method = %request.method,
            host = %request.host,
            path = %request.path,
            location = %context.location_mode,
            attempt = context.count + 1,
            "sending request"
        );
        let response = self
            .transport
            .send(&self.params.protocol, &context.request)
            .await?;
        if let Some(callback) = &self.response_callback {
            callback(&response);
        }
        context.status = Some(response.status);
        info!(
            status = response.status,
            request_id = response.header("x-ms-request-id").unwrap_or_default(),
            "received response"
        );

        if response.status >= 300 {
            return Err(response.into_error());
        }
        parser(response)
    }

    fn apply_host(
        &self,
        request: &mut StorageRequest,
        operation: Option<&OperationContext>,
    ) -> Result<LocationMode> {
        if let Some((mode, host)) = operation
            .filter(|op| op.location_lock)
            .and_then(OperationContext::locked_location)
        {
            request.host_locations = HostLocations::single(mode, host);
            request.host = host.to_string();
            return Ok(mode);
        }

        if let Some((mode, host)) = request.host_locations.sole() {
            request.host = host.to_string();
            return Ok(mode);
        }

        match request.host_locations.get(self.location_mode) {
            Some(host) => {
                request.host = host.to_string();
                Ok(self.location_mode)
            }
            None => Err(StorageError::Config(format!(
                "no {} endpoint is available for this request",
                self.location_mode
            ))),
        }
    }

    fn apply_emulator_path(&self, request: &mut StorageRequest, mode: LocationMode) {
        let account = self.params.account_name.as_deref().unwrap_or_default();
        let prefix = match mode {
            LocationMode::Primary => format!("/{account}"),
            LocationMode::Secondary => format!("/{account}{SECONDARY_SUFFIX}"),
        };
        request.path = format!("{prefix}{}", request.path);
    }
}

fn update_request(request: &mut StorageRequest, client_request_id: &str) {
    request.set_header("x-ms-version", X_MS_VERSION);
    request.set_header("user-agent", USER_AGENT);
    request.set_header("content-length", request.body.len().to_string());
    request.set_header("x-ms-client-request-id", client_request_id);
}

fn rfc1123_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
