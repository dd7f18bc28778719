use routersync_core::{Result, Router, SyncError};
use tracing::{debug, info, warn};

use crate::adapter::{DeviceAdapter, SystemInfo};
use crate::client::DeviceClient;
use crate::target::{is_private_address, probe_candidates, DeviceTarget};
use crate::DeviceOptions;

/// Successful connectivity probe
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// Candidate that answered, e.g. `https:443`
    pub reached: String,
    pub base_url: String,
    pub info: SystemInfo,
}

/// Try each candidate {scheme, port} in turn and stop at the first answer.
///
/// Private and loopback addresses fail before any network call unless
/// `allow_private_addresses` is set. An authentication failure stops the probe
/// at once, since other ports would reject the same credentials.
pub async fn probe(router: &Router, options: &DeviceOptions) -> Result<ProbeOutcome> {
    if router.api_dialect.default_base_path().is_none() {
        return Err(SyncError::UnsupportedDialect(router.api_dialect));
    }
    if !options.allow_private_addresses && is_private_address(&router.address) {
        warn!(address = %router.address, "refusing to probe private address");
        return Err(SyncError::Connection(format!(
            "Router address {} is in a private or loopback range and cannot be reached from this service. \
             Use the router's public address or a port forward.",
            router.address.trim()
        )));
    }

    let mut attempts = Vec::new();
    for target in probe_candidates(router)? {
        let label = target.label();
        match attempt(router, target, options).await {
            Ok((base_url, info)) => {
                info!(router = %router.name, reached = %label, "router reachable");
                return Ok(ProbeOutcome {
                    reached: label,
                    base_url,
                    info,
                });
            }
            Err(SyncError::Device { status, body }) if status == 401 || status == 403 => {
                return Err(SyncError::Device {
                    status,
                    body: if body.is_empty() {
                        "authentication failed, check the router username and password".to_string()
                    } else {
                        body
                    },
                });
            }
            Err(e) => {
                debug!(router = %router.name, candidate = %label, error = %e, "probe attempt failed");
                attempts.push(format!("{} ({})", label, e));
            }
        }
    }

    Err(SyncError::Connection(format!(
        "Could not reach router at {}. Tried: {}",
        router.address.trim(),
        attempts.join("; ")
    )))
}

async fn attempt(
    router: &Router,
    target: DeviceTarget,
    options: &DeviceOptions,
) -> Result<(String, SystemInfo)> {
    let base_url = target.base_url();
    let client = DeviceClient::with_timeout(router, target, options, Some(options.probe_timeout))?;
    let info = DeviceAdapter::with_client(client, router.api_dialect)
        .system_info()
        .await?;
    Ok((base_url, info))
}
