//! Turn logical device records into typed mirror rows.

use routersync_core::convert::{as_bool, as_i64, as_text, parse_priority, parse_rate};
use routersync_core::{Record, ResourceKind, DEVICE_ID_FIELD};
use uuid::Uuid;

use crate::rows::*;

const DEFAULT_QUEUE_PRIORITY: i32 = 8;

/// Build the mirror row for one device record.
///
/// `position` is the record's index in the device response.
pub fn normalize(
    kind: ResourceKind,
    router_id: Uuid,
    position: usize,
    record: &Record,
) -> Result<MirrorRow, String> {
    let fields = Fields(record);
    let position = i32::try_from(position).map_err(|_| "position out of range".to_string())?;

    let row = match kind {
        ResourceKind::Vlan => {
            let vlan_id = fields.required_int("vlanId")?;
            if !(1..=4094).contains(&vlan_id) {
                return Err(format!("vlanId {} is outside 1-4094", vlan_id));
            }
            MirrorRow::Vlan(VlanRow {
                router_id,
                vlan_id: vlan_id as i32,
                name: fields.required_text("name")?,
                interface: fields.text("interface"),
                mtu: fields.small_int("mtu"),
                running: fields.flag("running").unwrap_or(false),
                enabled: fields.enabled(),
                comment: fields.text("comment"),
                device_id: fields.device_id(),
            })
        }
        ResourceKind::DhcpServer => MirrorRow::DhcpServer(DhcpServerRow {
            router_id,
            name: fields.required_text("name")?,
            interface: fields.text("interface"),
            address_pool: fields.text("addressPool"),
            lease_time: fields.text("leaseTime"),
            enabled: fields.enabled(),
            comment: fields.text("comment"),
            device_id: fields.device_id(),
        }),
        ResourceKind::DhcpNetwork => MirrorRow::DhcpNetwork(DhcpNetworkRow {
            router_id,
            address: fields.required_text("address")?,
            gateway: fields.text("gateway"),
            dns_servers: fields.text("dnsServer"),
            comment: fields.text("comment"),
            device_id: fields.device_id(),
        }),
        ResourceKind::IpPool => MirrorRow::IpPool(IpPoolRow {
            router_id,
            name: fields.required_text("name")?,
            ranges: fields.text("ranges").unwrap_or_default(),
            next_pool: fields.text("nextPool"),
            comment: fields.text("comment"),
            device_id: fields.device_id(),
        }),
        ResourceKind::FirewallRule => MirrorRow::FirewallRule(FirewallRuleRow {
            router_id,
            position,
            chain: fields.required_text("chain")?,
            action: fields.text("action").unwrap_or_else(|| "accept".to_string()),
            protocol: fields.text("protocol"),
            src_address: fields.text("srcAddress"),
            dst_address: fields.text("dstAddress"),
            src_port: fields.text("srcPort"),
            dst_port: fields.text("dstPort"),
            in_interface: fields.text("inInterface"),
            out_interface: fields.text("outInterface"),
            connection_state: fields.text("connectionState"),
            enabled: fields.enabled(),
            comment: fields.text("comment"),
            device_id: fields.device_id(),
        }),
        ResourceKind::BandwidthQueue => MirrorRow::BandwidthQueue(BandwidthQueueRow {
            router_id,
            name: fields.required_text("name")?,
            target: fields.text("target").unwrap_or_default(),
            max_upload: fields.rate("maxUpload")?,
            max_download: fields.rate("maxDownload")?,
            priority: match fields.text("priority") {
                Some(text) => parse_priority(&text)
                    .ok_or_else(|| format!("invalid queue priority '{}'", text))?,
                None => DEFAULT_QUEUE_PRIORITY,
            },
            enabled: fields.enabled(),
            comment: fields.text("comment"),
            device_id: fields.device_id(),
        }),
        ResourceKind::PppoeSecret => MirrorRow::PppoeSecret(PppoeSecretRow {
            router_id,
            name: fields.required_text("name")?,
            password: fields.text("password"),
            service: fields.text("service"),
            profile: fields.text("profile"),
            local_address: fields.text("localAddress"),
            remote_address: fields.text("remoteAddress"),
            caller_id: fields.text("callerId"),
            enabled: fields.enabled(),
            comment: fields.text("comment"),
            device_id: fields.device_id(),
        }),
        ResourceKind::PppoeSession => MirrorRow::PppoeSession(PppoeSessionRow {
            router_id,
            name: fields.required_text("name")?,
            service: fields.text("service"),
            caller_id: fields.text("callerId"),
            address: fields.text("address"),
            uptime: fields.text("uptime"),
            session_id: fields.text("sessionId"),
            device_id: fields.device_id(),
        }),
        ResourceKind::NatRule => MirrorRow::NatRule(NatRuleRow {
            router_id,
            device_id: fields
                .device_id()
                .ok_or_else(|| "NAT rule has no device id".to_string())?,
            position,
            chain: fields.required_text("chain")?,
            action: fields.text("action").unwrap_or_else(|| "masquerade".to_string()),
            protocol: fields.text("protocol"),
            src_address: fields.text("srcAddress"),
            dst_address: fields.text("dstAddress"),
            dst_port: fields.text("dstPort"),
            in_interface: fields.text("inInterface"),
            out_interface: fields.text("outInterface"),
            to_addresses: fields.text("toAddresses"),
            to_ports: fields.text("toPorts"),
            enabled: fields.enabled(),
            comment: fields.text("comment"),
        }),
        ResourceKind::Interface => MirrorRow::Interface(InterfaceRow {
            router_id,
            name: fields.required_text("name")?,
            interface_type: fields.text("type"),
            mac_address: fields.text("macAddress"),
            mtu: fields.small_int("mtu"),
            running: fields.flag("running").unwrap_or(false),
            enabled: fields.enabled(),
            comment: fields.text("comment"),
            device_id: fields.device_id(),
        }),
    };
    Ok(row)
}

struct Fields<'a>(&'a Record);

impl Fields<'_> {
    fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(as_text)
            .filter(|text| !text.is_empty())
    }

    fn required_text(&self, key: &str) -> Result<String, String> {
        self.text(key).ok_or_else(|| format!("missing {}", key))
    }

    fn required_int(&self, key: &str) -> Result<i64, String> {
        let value = self.0.get(key).ok_or_else(|| format!("missing {}", key))?;
        as_i64(value).ok_or_else(|| format!("{} is not a number: {}", key, value))
    }

    /// Integers such as `mtu`; RouterOS may report `auto`, which maps to none
    fn small_int(&self, key: &str) -> Option<i32> {
        self.0
            .get(key)
            .and_then(as_i64)
            .and_then(|n| i32::try_from(n).ok())
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(as_bool)
    }

    fn enabled(&self) -> bool {
        !self.flag("disabled").unwrap_or(false)
    }

    fn rate(&self, key: &str) -> Result<i64, String> {
        match self.text(key) {
            None => Ok(0),
            Some(text) => parse_rate(&text)
                .and_then(|bps| i64::try_from(bps).ok())
                .ok_or_else(|| format!("invalid rate {} '{}'", key, text)),
        }
    }

    fn device_id(&self) -> Option<String> {
        self.text(DEVICE_ID_FIELD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_queue_row() {
        let router_id = Uuid::new_v4();
        let row = normalize(
            ResourceKind::BandwidthQueue,
            router_id,
            0,
            &record(json!({
                "name": "q1",
                "target": "10.0.0.5/32",
                "maxUpload": "1000000",
                "maxDownload": "5000000",
                "priority": "8"
            })),
        )
        .unwrap();

        match row {
            MirrorRow::BandwidthQueue(q) => {
                assert_eq!(q.router_id, router_id);
                assert_eq!(q.max_upload, 1_000_000);
                assert_eq!(q.max_download, 5_000_000);
                assert_eq!(q.priority, 8);
                assert!(q.enabled);
            }
            other => panic!("unexpected row {:?}", other),
        }
    }

    #[test]
    fn test_disabled_accepts_string_or_bool() {
        let id = Uuid::new_v4();
        for disabled in [json!("true"), json!(true), json!("yes")] {
            let row = normalize(
                ResourceKind::Vlan,
                id,
                0,
                &record(json!({"name": "v", "vlanId": "10", "disabled": disabled})),
            )
            .unwrap();
            match row {
                MirrorRow::Vlan(v) => assert!(!v.enabled),
                other => panic!("unexpected row {:?}", other),
            }
        }
    }

    #[test]
    fn test_vlan_requires_valid_id() {
        let id = Uuid::new_v4();
        assert!(normalize(ResourceKind::Vlan, id, 0, &record(json!({"name": "v"}))).is_err());
        assert!(normalize(
            ResourceKind::Vlan,
            id,
            0,
            &record(json!({"name": "v", "vlanId": "5000"}))
        )
        .is_err());
    }

    #[test]
    fn test_firewall_position_and_defaults() {
        let row = normalize(
            ResourceKind::FirewallRule,
            Uuid::new_v4(),
            3,
            &record(json!({"chain": "forward", "srcAddress": "10.0.0.0/8"})),
        )
        .unwrap();
        match row {
            MirrorRow::FirewallRule(r) => {
                assert_eq!(r.position, 3);
                assert_eq!(r.action, "accept");
                assert_eq!(r.src_address.as_deref(), Some("10.0.0.0/8"));
            }
            other => panic!("unexpected row {:?}", other),
        }
    }

    #[test]
    fn test_nat_rule_keyed_by_device_id() {
        let id = Uuid::new_v4();
        let row = normalize(
            ResourceKind::NatRule,
            id,
            0,
            &record(json!({"id": "*5", "chain": "srcnat", "action": "masquerade"})),
        )
        .unwrap();
        assert_eq!(row.natural_key(), "*5");

        let err = normalize(ResourceKind::NatRule, id, 0, &record(json!({"chain": "srcnat"})))
            .unwrap_err();
        assert!(err.contains("device id"));
    }

    #[test]
    fn test_interface_mtu_auto() {
        let row = normalize(
            ResourceKind::Interface,
            Uuid::new_v4(),
            0,
            &record(json!({"name": "ether1", "type": "ether", "mtu": "auto", "running": "true"})),
        )
        .unwrap();
        match row {
            MirrorRow::Interface(i) => {
                assert_eq!(i.mtu, None);
                assert!(i.running);
                assert_eq!(i.interface_type.as_deref(), Some("ether"));
            }
            other => panic!("unexpected row {:?}", other),
        }
    }

    #[test]
    fn test_bad_rate_is_error() {
        let err = normalize(
            ResourceKind::BandwidthQueue,
            Uuid::new_v4(),
            0,
            &record(json!({"name": "q", "maxUpload": "fast"})),
        )
        .unwrap_err();
        assert!(err.contains("maxUpload"));
    }
}
