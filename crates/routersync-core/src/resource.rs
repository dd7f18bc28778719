use serde::{Deserialize, Serialize};

/// A device record with logical (camelCase) field names.
///
/// The device adapter produces these from the router's native field names;
/// the mirror writer turns them into typed rows.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Logical key carrying the router's own row identifier (`.id` on RouterOS)
pub const DEVICE_ID_FIELD: &str = "id";

/// Kinds of router configuration mirrored into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Vlan,
    DhcpServer,
    DhcpNetwork,
    IpPool,
    FirewallRule,
    BandwidthQueue,
    PppoeSecret,
    PppoeSession,
    NatRule,
    Interface,
}

/// How a sync writes a kind into its mirror table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Upsert row by row on (router, natural key)
    Upsert,
    /// Delete every row of the router, then insert in device order
    Replace,
}

impl ResourceKind {
    /// Every kind, in the order a full sync visits them
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Interface,
        ResourceKind::Vlan,
        ResourceKind::IpPool,
        ResourceKind::DhcpServer,
        ResourceKind::DhcpNetwork,
        ResourceKind::FirewallRule,
        ResourceKind::NatRule,
        ResourceKind::BandwidthQueue,
        ResourceKind::PppoeSecret,
        ResourceKind::PppoeSession,
    ];

    /// Path under the API base, e.g. `interface/vlan`
    pub fn device_path(&self) -> &'static str {
        match self {
            Self::Vlan => "interface/vlan",
            Self::DhcpServer => "ip/dhcp-server",
            Self::DhcpNetwork => "ip/dhcp-server/network",
            Self::IpPool => "ip/pool",
            Self::FirewallRule => "ip/firewall/filter",
            Self::BandwidthQueue => "queue/simple",
            Self::PppoeSecret => "ppp/secret",
            Self::PppoeSession => "ppp/active",
            Self::NatRule => "ip/firewall/nat",
            Self::Interface => "interface",
        }
    }

    /// Mirror table name
    pub fn table(&self) -> &'static str {
        match self {
            Self::Vlan => "vlans",
            Self::DhcpServer => "dhcp_servers",
            Self::DhcpNetwork => "dhcp_networks",
            Self::IpPool => "ip_pools",
            Self::FirewallRule => "firewall_rules",
            Self::BandwidthQueue => "bandwidth_queues",
            Self::PppoeSecret => "pppoe_secrets",
            Self::PppoeSession => "pppoe_sessions",
            Self::NatRule => "nat_rules",
            Self::Interface => "interfaces",
        }
    }

    /// Column holding the natural key, next to `router_id`
    pub fn key_column(&self) -> &'static str {
        match self {
            Self::Vlan => "vlan_id",
            Self::DhcpNetwork => "address",
            Self::FirewallRule => "position",
            Self::NatRule => "device_id",
            _ => "name",
        }
    }

    pub fn write_policy(&self) -> WritePolicy {
        match self {
            Self::FirewallRule => WritePolicy::Replace,
            _ => WritePolicy::Upsert,
        }
    }

    /// Plural label used in user-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Vlan => "VLANs",
            Self::DhcpServer => "DHCP servers",
            Self::DhcpNetwork => "DHCP networks",
            Self::IpPool => "IP pools",
            Self::FirewallRule => "firewall rules",
            Self::BandwidthQueue => "bandwidth queues",
            Self::PppoeSecret => "PPPoE secrets",
            Self::PppoeSession => "PPPoE sessions",
            Self::NatRule => "NAT rules",
            Self::Interface => "interfaces",
        }
    }

    /// Kebab-case name, as used in URLs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vlan => "vlan",
            Self::DhcpServer => "dhcp-server",
            Self::DhcpNetwork => "dhcp-network",
            Self::IpPool => "ip-pool",
            Self::FirewallRule => "firewall-rule",
            Self::BandwidthQueue => "bandwidth-queue",
            Self::PppoeSecret => "pppoe-secret",
            Self::PppoeSession => "pppoe-session",
            Self::NatRule => "nat-rule",
            Self::Interface => "interface",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s || kind.table() == s)
            .ok_or_else(|| format!("unknown resource kind '{}'", s))
    }
}
