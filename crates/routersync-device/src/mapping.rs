//! Field-mapping tables between logical records and RouterOS REST keys.
//!
//! Logical records use camelCase names (`vlanId`, `srcAddress`). RouterOS uses
//! hyphenated names (`vlan-id`, `src-address`) and reports every scalar as a
//! string. The generic REST dialect already speaks logical names, so only the
//! field list applies to it.

use routersync_core::convert::as_text;
use routersync_core::{ApiDialect, Record, ResourceKind, Result, SyncError, DEVICE_ID_FIELD};
use serde_json::Value;

/// One entry of a mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// One logical key, one device key
    Plain {
        logical: &'static str,
        vendor: &'static str,
    },
    /// A `"{up}/{down}"` device value split across two logical keys
    RatePair {
        vendor: &'static str,
        up: &'static str,
        down: &'static str,
    },
}

const fn plain(logical: &'static str, vendor: &'static str) -> Field {
    Field::Plain { logical, vendor }
}

const ID: Field = plain(DEVICE_ID_FIELD, ".id");

const VLAN: &[Field] = &[
    ID,
    plain("name", "name"),
    plain("vlanId", "vlan-id"),
    plain("interface", "interface"),
    plain("mtu", "mtu"),
    plain("running", "running"),
    plain("disabled", "disabled"),
    plain("comment", "comment"),
];

const DHCP_SERVER: &[Field] = &[
    ID,
    plain("name", "name"),
    plain("interface", "interface"),
    plain("addressPool", "address-pool"),
    plain("leaseTime", "lease-time"),
    plain("disabled", "disabled"),
    plain("comment", "comment"),
];

const DHCP_NETWORK: &[Field] = &[
    ID,
    plain("address", "address"),
    plain("gateway", "gateway"),
    plain("dnsServer", "dns-server"),
    plain("comment", "comment"),
];

const IP_POOL: &[Field] = &[
    ID,
    plain("name", "name"),
    plain("ranges", "ranges"),
    plain("nextPool", "next-pool"),
    plain("comment", "comment"),
];

const FIREWALL_RULE: &[Field] = &[
    ID,
    plain("chain", "chain"),
    plain("action", "action"),
    plain("protocol", "protocol"),
    plain("srcAddress", "src-address"),
    plain("dstAddress", "dst-address"),
    plain("srcPort", "src-port"),
    plain("dstPort", "dst-port"),
    plain("inInterface", "in-interface"),
    plain("outInterface", "out-interface"),
    plain("connectionState", "connection-state"),
    plain("disabled", "disabled"),
    plain("comment", "comment"),
];

const BANDWIDTH_QUEUE: &[Field] = &[
    ID,
    plain("name", "name"),
    plain("target", "target"),
    plain("parent", "parent"),
    Field::RatePair {
        vendor: "max-limit",
        up: "maxUpload",
        down: "maxDownload",
    },
    Field::RatePair {
        vendor: "limit-at",
        up: "limitAtUpload",
        down: "limitAtDownload",
    },
    plain("priority", "priority"),
    plain("disabled", "disabled"),
    plain("comment", "comment"),
];

const PPPOE_SECRET: &[Field] = &[
    ID,
    plain("name", "name"),
    plain("password", "password"),
    plain("service", "service"),
    plain("profile", "profile"),
    plain("localAddress", "local-address"),
    plain("remoteAddress", "remote-address"),
    plain("callerId", "caller-id"),
    plain("disabled", "disabled"),
    plain("comment", "comment"),
];

const PPPOE_SESSION: &[Field] = &[
    ID,
    plain("name", "name"),
    plain("service", "service"),
    plain("callerId", "caller-id"),
    plain("address", "address"),
    plain("uptime", "uptime"),
    plain("encoding", "encoding"),
    plain("sessionId", "session-id"),
];

const NAT_RULE: &[Field] = &[
    ID,
    plain("chain", "chain"),
    plain("action", "action"),
    plain("protocol", "protocol"),
    plain("srcAddress", "src-address"),
    plain("dstAddress", "dst-address"),
    plain("dstPort", "dst-port"),
    plain("inInterface", "in-interface"),
    plain("outInterface", "out-interface"),
    plain("toAddresses", "to-addresses"),
    plain("toPorts", "to-ports"),
    plain("disabled", "disabled"),
    plain("comment", "comment"),
];

const INTERFACE: &[Field] = &[
    ID,
    plain("name", "name"),
    plain("type", "type"),
    plain("macAddress", "mac-address"),
    plain("mtu", "mtu"),
    plain("running", "running"),
    plain("disabled", "disabled"),
    plain("comment", "comment"),
];

/// Mapping table of a resource kind
pub fn fields(kind: ResourceKind) -> &'static [Field] {
    match kind {
        ResourceKind::Vlan => VLAN,
        ResourceKind::DhcpServer => DHCP_SERVER,
        ResourceKind::DhcpNetwork => DHCP_NETWORK,
        ResourceKind::IpPool => IP_POOL,
        ResourceKind::FirewallRule => FIREWALL_RULE,
        ResourceKind::BandwidthQueue => BANDWIDTH_QUEUE,
        ResourceKind::PppoeSecret => PPPOE_SECRET,
        ResourceKind::PppoeSession => PPPOE_SESSION,
        ResourceKind::NatRule => NAT_RULE,
        ResourceKind::Interface => INTERFACE,
    }
}

/// Translate one device object into a logical record.
///
/// Keys missing from the table are dropped. Fails only when the device
/// returned something other than a JSON object.
pub fn from_device(kind: ResourceKind, dialect: ApiDialect, value: &Value) -> Result<Record> {
    let object = value.as_object().ok_or_else(|| {
        SyncError::Mapping(format!(
            "expected a JSON object for {}, got {}",
            kind.as_str(),
            type_name(value)
        ))
    })?;

    let mut record = Record::new();
    for field in fields(kind) {
        match (*field, dialect) {
            (Field::Plain { logical, vendor }, ApiDialect::MikrotikRest) => {
                if let Some(v) = object.get(vendor).filter(|v| !v.is_null()) {
                    record.insert(logical.to_string(), v.clone());
                }
            }
            (Field::RatePair { vendor, up, down }, ApiDialect::MikrotikRest) => {
                if let Some(text) = object.get(vendor).and_then(as_text) {
                    let (up_value, down_value) = match text.split_once('/') {
                        Some((u, d)) => (u.to_string(), d.to_string()),
                        None => (text.clone(), text),
                    };
                    record.insert(up.to_string(), Value::String(up_value));
                    record.insert(down.to_string(), Value::String(down_value));
                }
            }
            (Field::Plain { logical, .. }, _) => copy_logical(object, &mut record, logical),
            (Field::RatePair { up, down, .. }, _) => {
                copy_logical(object, &mut record, up);
                copy_logical(object, &mut record, down);
            }
        }
    }
    Ok(record)
}

/// Translate a list response into logical records
pub fn list_from_device(kind: ResourceKind, dialect: ApiDialect, value: &Value) -> Result<Vec<Record>> {
    let items = value.as_array().ok_or_else(|| {
        SyncError::Mapping(format!(
            "expected a JSON array for {}, got {}",
            kind.label(),
            type_name(value)
        ))
    })?;
    items
        .iter()
        .map(|item| from_device(kind, dialect, item))
        .collect()
}

/// Translate a logical record into a device request body.
///
/// The device id is never part of a body; updates carry it in the URL.
pub fn to_device(kind: ResourceKind, dialect: ApiDialect, record: &Record) -> Value {
    let mut body = serde_json::Map::new();
    for field in fields(kind) {
        match (*field, dialect) {
            (Field::Plain { logical, .. }, _) if logical == DEVICE_ID_FIELD => {}
            (Field::Plain { logical, vendor }, ApiDialect::MikrotikRest) => {
                if let Some(text) = record.get(logical).and_then(as_text) {
                    body.insert(vendor.to_string(), Value::String(text));
                }
            }
            (Field::RatePair { vendor, up, down }, ApiDialect::MikrotikRest) => {
                let up_text = record.get(up).and_then(as_text);
                let down_text = record.get(down).and_then(as_text);
                if let (Some(u), Some(d)) = (up_text, down_text) {
                    body.insert(vendor.to_string(), Value::String(format!("{}/{}", u, d)));
                }
            }
            (Field::Plain { logical, .. }, _) => copy_logical(record, &mut body, logical),
            (Field::RatePair { up, down, .. }, _) => {
                copy_logical(record, &mut body, up);
                copy_logical(record, &mut body, down);
            }
        }
    }
    Value::Object(body)
}

fn copy_logical(from: &serde_json::Map<String, Value>, to: &mut Record, key: &str) {
    if let Some(v) = from.get(key).filter(|v| !v.is_null()) {
        to.insert(key.to_string(), v.clone());
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
