// Device adapter for RouterOS-style REST APIs

use std::time::Duration;

pub mod adapter;
pub mod client;
pub mod mapping;
pub mod probe;
pub mod target;

pub use adapter::{DeviceAdapter, SystemInfo};
pub use client::DeviceClient;
pub use probe::{probe, ProbeOutcome};
pub use target::{is_private_address, DeviceTarget, Scheme};

/// Connection settings shared by every adapter
#[derive(Debug, Clone)]
pub struct DeviceOptions {
    /// Bound for ordinary operations; `None` leaves it to the HTTP stack
    pub request_timeout: Option<Duration>,
    /// Per-attempt bound for the connectivity probe
    pub probe_timeout: Duration,
    pub allow_private_addresses: bool,
    pub accept_invalid_certs: bool,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            request_timeout: None,
            probe_timeout: Duration::from_secs(5),
            allow_private_addresses: false,
            accept_invalid_certs: true,
        }
    }
}
