use routersync_core::ResourceKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// VLAN mirror row, keyed by (router_id, vlan_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VlanRow {
    pub router_id: Uuid,
    pub vlan_id: i32,
    pub name: String,
    pub interface: Option<String>,
    pub mtu: Option<i32>,
    pub running: bool,
    pub enabled: bool,
    pub comment: Option<String>,
    pub device_id: Option<String>,
}

/// DHCP server mirror row, keyed by (router_id, name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DhcpServerRow {
    pub router_id: Uuid,
    pub name: String,
    pub interface: Option<String>,
    pub address_pool: Option<String>,
    pub lease_time: Option<String>,
    pub enabled: bool,
    pub comment: Option<String>,
    pub device_id: Option<String>,
}

/// DHCP network mirror row, keyed by (router_id, address)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DhcpNetworkRow {
    pub router_id: Uuid,
    pub address: String,
    pub gateway: Option<String>,
    pub dns_servers: Option<String>,
    pub comment: Option<String>,
    pub device_id: Option<String>,
}

/// IP pool mirror row, keyed by (router_id, name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IpPoolRow {
    pub router_id: Uuid,
    pub name: String,
    pub ranges: String,
    pub next_pool: Option<String>,
    pub comment: Option<String>,
    pub device_id: Option<String>,
}

/// Firewall filter rule; the table is replaced as a whole, ordered by position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleRow {
    pub router_id: Uuid,
    pub position: i32,
    pub chain: String,
    pub action: String,
    pub protocol: Option<String>,
    pub src_address: Option<String>,
    pub dst_address: Option<String>,
    pub src_port: Option<String>,
    pub dst_port: Option<String>,
    pub in_interface: Option<String>,
    pub out_interface: Option<String>,
    pub connection_state: Option<String>,
    pub enabled: bool,
    pub comment: Option<String>,
    pub device_id: Option<String>,
}

/// Simple queue mirror row, keyed by (router_id, name). Rates in bits per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BandwidthQueueRow {
    pub router_id: Uuid,
    pub name: String,
    pub target: String,
    pub max_upload: i64,
    pub max_download: i64,
    pub priority: i32,
    pub enabled: bool,
    pub comment: Option<String>,
    pub device_id: Option<String>,
}

/// PPPoE secret mirror row, keyed by (router_id, name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PppoeSecretRow {
    pub router_id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub service: Option<String>,
    pub profile: Option<String>,
    pub local_address: Option<String>,
    pub remote_address: Option<String>,
    pub caller_id: Option<String>,
    pub enabled: bool,
    pub comment: Option<String>,
    pub device_id: Option<String>,
}

/// Active PPPoE session mirror row, keyed by (router_id, name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PppoeSessionRow {
    pub router_id: Uuid,
    pub name: String,
    pub service: Option<String>,
    pub caller_id: Option<String>,
    pub address: Option<String>,
    pub uptime: Option<String>,
    pub session_id: Option<String>,
    pub device_id: Option<String>,
}

/// NAT rule mirror row, keyed by (router_id, device_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NatRuleRow {
    pub router_id: Uuid,
    pub device_id: String,
    pub position: i32,
    pub chain: String,
    pub action: String,
    pub protocol: Option<String>,
    pub src_address: Option<String>,
    pub dst_address: Option<String>,
    pub dst_port: Option<String>,
    pub in_interface: Option<String>,
    pub out_interface: Option<String>,
    pub to_addresses: Option<String>,
    pub to_ports: Option<String>,
    pub enabled: bool,
    pub comment: Option<String>,
}

/// Interface mirror row, keyed by (router_id, name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRow {
    pub router_id: Uuid,
    pub name: String,
    pub interface_type: Option<String>,
    pub mac_address: Option<String>,
    pub mtu: Option<i32>,
    pub running: bool,
    pub enabled: bool,
    pub comment: Option<String>,
    pub device_id: Option<String>,
}

/// One mirror table row of any kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MirrorRow {
    Vlan(VlanRow),
    DhcpServer(DhcpServerRow),
    DhcpNetwork(DhcpNetworkRow),
    IpPool(IpPoolRow),
    FirewallRule(FirewallRuleRow),
    BandwidthQueue(BandwidthQueueRow),
    PppoeSecret(PppoeSecretRow),
    PppoeSession(PppoeSessionRow),
    NatRule(NatRuleRow),
    Interface(InterfaceRow),
}

impl MirrorRow {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Vlan(_) => ResourceKind::Vlan,
            Self::DhcpServer(_) => ResourceKind::DhcpServer,
            Self::DhcpNetwork(_) => ResourceKind::DhcpNetwork,
            Self::IpPool(_) => ResourceKind::IpPool,
            Self::FirewallRule(_) => ResourceKind::FirewallRule,
            Self::BandwidthQueue(_) => ResourceKind::BandwidthQueue,
            Self::PppoeSecret(_) => ResourceKind::PppoeSecret,
            Self::PppoeSession(_) => ResourceKind::PppoeSession,
            Self::NatRule(_) => ResourceKind::NatRule,
            Self::Interface(_) => ResourceKind::Interface,
        }
    }

    pub fn router_id(&self) -> Uuid {
        match self {
            Self::Vlan(r) => r.router_id,
            Self::DhcpServer(r) => r.router_id,
            Self::DhcpNetwork(r) => r.router_id,
            Self::IpPool(r) => r.router_id,
            Self::FirewallRule(r) => r.router_id,
            Self::BandwidthQueue(r) => r.router_id,
            Self::PppoeSecret(r) => r.router_id,
            Self::PppoeSession(r) => r.router_id,
            Self::NatRule(r) => r.router_id,
            Self::Interface(r) => r.router_id,
        }
    }

    /// Value of the kind's key column, as text
    pub fn natural_key(&self) -> String {
        match self {
            Self::Vlan(r) => r.vlan_id.to_string(),
            Self::DhcpServer(r) => r.name.clone(),
            Self::DhcpNetwork(r) => r.address.clone(),
            Self::IpPool(r) => r.name.clone(),
            Self::FirewallRule(r) => r.position.to_string(),
            Self::BandwidthQueue(r) => r.name.clone(),
            Self::PppoeSecret(r) => r.name.clone(),
            Self::PppoeSession(r) => r.name.clone(),
            Self::NatRule(r) => r.device_id.clone(),
            Self::Interface(r) => r.name.clone(),
        }
    }

    /// Device-reported order, for kinds where order matters
    pub fn position(&self) -> Option<i32> {
        match self {
            Self::FirewallRule(r) => Some(r.position),
            Self::NatRule(r) => Some(r.position),
            _ => None,
        }
    }
}
