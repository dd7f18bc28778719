use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use routersync_core::{Result, Router, SyncError};
use url::Url;

/// URL scheme used to reach a router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Scheme implied by an explicit port
    pub fn for_port(port: u16) -> Self {
        match port {
            443 | 8443 => Self::Https,
            _ => Self::Http,
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a router's API lives: `{scheme}://{host}:{port}{base_path}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Always starts with `/`, never ends with one
    pub base_path: String,
}

impl DeviceTarget {
    /// Target for ordinary operations: explicit port (scheme inferred) or http:80
    pub fn from_router(router: &Router) -> Result<Self> {
        let (scheme, port) = match router.port {
            Some(port) => (Scheme::for_port(port), port),
            None => (Scheme::Http, Scheme::Http.default_port()),
        };
        Self::with_scheme(router, scheme, port)
    }

    pub fn with_scheme(router: &Router, scheme: Scheme, port: u16) -> Result<Self> {
        let host = router.address.trim();
        if host.is_empty() {
            return Err(SyncError::Validation("Router address is empty".to_string()));
        }
        let default_path = router
            .api_dialect
            .default_base_path()
            .ok_or(SyncError::UnsupportedDialect(router.api_dialect))?;
        let base_path = normalize_base_path(router.api_endpoint.as_deref().unwrap_or(default_path));

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            base_path,
        })
    }

    /// Base API URL, e.g. `http://203.0.113.1:80/rest`
    pub fn base_url(&self) -> String {
        let host = match self.host.parse::<Ipv6Addr>() {
            Ok(_) => format!("[{}]", self.host),
            Err(_) => self.host.clone(),
        };
        format!("{}://{}:{}{}", self.scheme, host, self.port, self.base_path)
    }

    /// Full URL of a resource path below the API base
    pub fn resource_url(&self, path: &str) -> Result<Url> {
        let full = format!("{}/{}", self.base_url(), path.trim_start_matches('/'));
        Url::parse(&full).map_err(|e| SyncError::Validation(format!("Invalid router URL {}: {}", full, e)))
    }

    /// Short label for logs and probe reports, e.g. `https:443`
    pub fn label(&self) -> String {
        format!("{}:{}", self.scheme, self.port)
    }
}

fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Candidate targets for a connectivity probe, in attempt order.
///
/// An explicit port goes first, followed by http:80 and https:443.
pub fn probe_candidates(router: &Router) -> Result<Vec<DeviceTarget>> {
    let mut candidates = Vec::new();
    if let Some(port) = router.port {
        candidates.push(DeviceTarget::with_scheme(router, Scheme::for_port(port), port)?);
    }
    for scheme in [Scheme::Http, Scheme::Https] {
        let target = DeviceTarget::with_scheme(router, scheme, scheme.default_port())?;
        if !candidates.contains(&target) {
            candidates.push(target);
        }
    }
    Ok(candidates)
}

/// Loopback, RFC1918, link-local and IPv6 unique-local addresses.
///
/// Hostnames other than `localhost` are not resolved and count as public.
pub fn is_private_address(address: &str) -> bool {
    let address = address.trim().trim_start_matches('[').trim_end_matches(']');
    if address.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => is_private_v4(ip),
        Ok(IpAddr::V6(ip)) => is_private_v6(ip),
        Err(_) => false,
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_v4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || (first & 0xffc0) == 0xfe80
        || (first & 0xfe00) == 0xfc00
}
