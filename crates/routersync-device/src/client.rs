// Device HTTP client
//
// Wraps `reqwest::Client` with RouterOS URL construction, HTTP Basic auth and
// status handling. One request per call; nothing is retried here.

use std::time::{Duration, Instant};

use reqwest::Method;
use routersync_core::{Result, Router, SyncError};
use serde_json::Value;
use tracing::{debug, trace};

use crate::target::DeviceTarget;
use crate::DeviceOptions;

/// Raw JSON client for one router
pub struct DeviceClient {
    http: reqwest::Client,
    target: DeviceTarget,
    username: String,
    password: String,
}

impl DeviceClient {
    /// Client for ordinary operations, bounded by the configured request timeout
    pub fn new(router: &Router, target: DeviceTarget, options: &DeviceOptions) -> Result<Self> {
        Self::with_timeout(router, target, options, options.request_timeout)
    }

    /// Client with an explicit per-request timeout (used by the probe)
    pub fn with_timeout(
        router: &Router,
        target: DeviceTarget,
        options: &DeviceOptions,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .user_agent(concat!("routersync/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout).connect_timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| SyncError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            target,
            username: router.username.clone(),
            password: router.password.clone(),
        })
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.execute(Method::GET, path, None).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(Method::PATCH, path, Some(body)).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(Method::POST, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.execute(Method::DELETE, path, None).await
    }

    async fn execute(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.target.resource_url(path)?;
        debug!(method = %method, url = %url, "device request");

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            trace!(body = %body, "device request body");
            request = request.json(body);
        }

        let started = Instant::now();
        let result = request.send().await;
        let elapsed = started.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                routersync_metrics::record_device_request(method.as_str(), "error", elapsed);
                return Err(connection_error(&url, &e));
            }
        };

        let status = response.status();
        routersync_metrics::record_device_request(method.as_str(), status.as_str(), elapsed);

        let text = response
            .text()
            .await
            .map_err(|e| connection_error(&url, &e))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), url = %url, "device returned error status");
            return Err(SyncError::device(status.as_u16(), text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            let preview = &text[..floor_char_boundary(&text, 200)];
            SyncError::Mapping(format!("invalid JSON from {}: {} (body preview: {:?})", url, e, preview))
        })
    }
}

fn connection_error(url: &url::Url, error: &reqwest::Error) -> SyncError {
    let host = url.host_str().unwrap_or("router");
    if error.is_timeout() {
        SyncError::Connection(format!("request to {} timed out", host))
    } else {
        SyncError::Connection(format!("{}: {}", host, error))
    }
}

fn floor_char_boundary(text: &str, max: usize) -> usize {
    let mut cut = text.len().min(max);
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}
