use std::sync::Arc;
use std::time::Duration;

use routersync_config::AppConfig;
use routersync_device::DeviceOptions;
use routersync_store::{ActivityEntry, ActivityStore, MirrorPolicy, Store};
use tracing::warn;

/// App state shared across handlers
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub device: DeviceOptions,
    pub mirror: MirrorPolicy,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, device: DeviceOptions, mirror: MirrorPolicy) -> Self {
        Self {
            store,
            device,
            mirror,
        }
    }

    /// State with device and mirror settings taken from the service config
    pub fn from_config(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        let device = DeviceOptions {
            request_timeout: config.device.request_timeout_secs.map(Duration::from_secs),
            probe_timeout: Duration::from_secs(config.device.probe_timeout_secs),
            allow_private_addresses: config.device.allow_private_addresses,
            accept_invalid_certs: config.device.accept_invalid_certs,
        };
        let mirror = MirrorPolicy {
            prune_stale: config.mirror.prune_stale,
        };
        Self::new(store, device, mirror)
    }

    /// Append an activity entry in the background; failures are only logged
    pub fn log_activity(&self, entry: ActivityEntry) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.append(&entry).await {
                warn!(action = %entry.action, error = %e, "failed to write activity log");
            }
        });
    }
}
