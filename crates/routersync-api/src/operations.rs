//! Named operations behind `POST /api/v1/operations/{operation}`.
//!
//! Every request runs the same sequence: parse the body, validate it, resolve
//! the router, call the device, write the mirror, append one activity entry.
//! Validation happens before the router is touched, so a malformed request
//! never reaches the device.

use std::str::FromStr;

use chrono::Utc;
use routersync_core::convert::{as_i64, mbps_to_bps};
use routersync_core::validate::{
    check_address_or_cidr, check_cidr, check_dns_servers, check_ip_range, check_ipv4,
    check_required,
};
use routersync_core::{Record, ResourceKind, Result, Router, RouterStatus, SyncError};
use routersync_device::{probe, DeviceAdapter};
use routersync_store::{ActivityEntry, MirrorRow, MirrorStore, MirrorWriter, RouterStore};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Operation name from the request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    TestConnection,
    Sync(ResourceKind),
    SyncAll,
    CreateVlan,
    ConfigureDhcp,
    CreateQueue,
    UpdateQueue,
    CreateFirewallRule,
    CreatePppoeSecret,
    DisconnectPppoeSession,
}

impl Operation {
    pub fn all() -> Vec<Operation> {
        let mut all = vec![Operation::TestConnection];
        all.extend(ResourceKind::ALL.iter().map(|kind| Operation::Sync(*kind)));
        all.extend([
            Operation::SyncAll,
            Operation::CreateVlan,
            Operation::ConfigureDhcp,
            Operation::CreateQueue,
            Operation::UpdateQueue,
            Operation::CreateFirewallRule,
            Operation::CreatePppoeSecret,
            Operation::DisconnectPppoeSession,
        ]);
        all
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::TestConnection => "test-connection",
            Operation::Sync(kind) => match kind {
                ResourceKind::Vlan => "sync-vlans",
                ResourceKind::DhcpServer => "sync-dhcp-servers",
                ResourceKind::DhcpNetwork => "sync-dhcp-networks",
                ResourceKind::IpPool => "sync-ip-pools",
                ResourceKind::FirewallRule => "sync-firewall-rules",
                ResourceKind::BandwidthQueue => "sync-queues",
                ResourceKind::PppoeSecret => "sync-pppoe-secrets",
                ResourceKind::PppoeSession => "sync-pppoe-sessions",
                ResourceKind::NatRule => "sync-nat-rules",
                ResourceKind::Interface => "sync-interfaces",
            },
            Operation::SyncAll => "sync-all",
            Operation::CreateVlan => "create-vlan",
            Operation::ConfigureDhcp => "configure-dhcp",
            Operation::CreateQueue => "create-queue",
            Operation::UpdateQueue => "update-queue",
            Operation::CreateFirewallRule => "create-firewall-rule",
            Operation::CreatePppoeSecret => "create-pppoe-secret",
            Operation::DisconnectPppoeSession => "disconnect-pppoe-session",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = SyncError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Operation::all()
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| SyncError::NotFound(format!("Unknown operation '{}'", s)))
    }
}

/// Successful operation result, rendered as the success envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outcome {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
}

impl Outcome {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    fn with_stats(mut self, stats: Value) -> Self {
        self.stats = Some(stats);
        self
    }
}

// ========================================
// Payloads
// ========================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVlan {
    pub name: String,
    #[serde(deserialize_with = "flexible_int")]
    pub vlan_id: i64,
    pub interface: String,
    #[serde(default, deserialize_with = "flexible_opt_int")]
    pub mtu: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureDhcp {
    pub name: String,
    pub interface: String,
    pub pool_name: String,
    pub ip_range: String,
    pub network: String,
    pub gateway: String,
    pub dns_servers: String,
    #[serde(default)]
    pub lease_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQueue {
    pub name: String,
    pub target: String,
    #[serde(deserialize_with = "flexible_f64")]
    pub max_upload_mbps: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub max_download_mbps: f64,
    #[serde(default, deserialize_with = "flexible_opt_int")]
    pub priority: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQueue {
    pub device_id: String,
    pub name: String,
    #[serde(deserialize_with = "flexible_f64")]
    pub max_upload_mbps: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub max_download_mbps: f64,
    #[serde(default, deserialize_with = "flexible_opt_int")]
    pub priority: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFirewallRule {
    pub chain: String,
    pub action: String,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub src_address: Option<String>,
    #[serde(default)]
    pub dst_address: Option<String>,
    #[serde(default, deserialize_with = "flexible_opt_text")]
    pub dst_port: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePppoeSecret {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub local_address: Option<String>,
    #[serde(default)]
    pub remote_address: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectPppoeSession {
    pub device_id: String,
    pub name: String,
}

/// Parsed operation body
#[derive(Debug, Clone)]
pub enum Payload {
    TestConnection,
    Sync(ResourceKind),
    SyncAll,
    CreateVlan(CreateVlan),
    ConfigureDhcp(ConfigureDhcp),
    CreateQueue(CreateQueue),
    UpdateQueue(UpdateQueue),
    CreateFirewallRule(CreateFirewallRule),
    CreatePppoeSecret(CreatePppoeSecret),
    DisconnectPppoeSession(DisconnectPppoeSession),
}

/// A validated operation request
#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub router_id: Uuid,
    pub payload: Payload,
}

impl OperationRequest {
    /// Parse and validate a request body for `operation`
    pub fn parse(operation: Operation, body: &[u8]) -> Result<Self> {
        let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(body)
                .map_err(|e| SyncError::Validation(format!("Request body is not valid JSON: {}", e)))?
        };
        if !value.is_object() {
            return Err(SyncError::Validation(
                "Request body must be a JSON object".to_string(),
            ));
        }

        let router_id = match value.get("routerId") {
            None | Some(Value::Null) => {
                return Err(SyncError::Validation("routerId is required".to_string()))
            }
            Some(Value::String(id)) => Uuid::parse_str(id.trim())
                .map_err(|_| SyncError::Validation("routerId must be a UUID".to_string()))?,
            Some(_) => return Err(SyncError::Validation("routerId must be a UUID".to_string())),
        };

        let payload = match operation {
            Operation::TestConnection => Payload::TestConnection,
            Operation::Sync(kind) => Payload::Sync(kind),
            Operation::SyncAll => Payload::SyncAll,
            Operation::CreateVlan => Payload::CreateVlan(body_of(value)?),
            Operation::ConfigureDhcp => Payload::ConfigureDhcp(body_of(value)?),
            Operation::CreateQueue => Payload::CreateQueue(body_of(value)?),
            Operation::UpdateQueue => Payload::UpdateQueue(body_of(value)?),
            Operation::CreateFirewallRule => Payload::CreateFirewallRule(body_of(value)?),
            Operation::CreatePppoeSecret => Payload::CreatePppoeSecret(body_of(value)?),
            Operation::DisconnectPppoeSession => Payload::DisconnectPppoeSession(body_of(value)?),
        };
        payload.validate()?;

        Ok(Self { router_id, payload })
    }
}

fn body_of<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| SyncError::Validation(format!("Invalid request body: {}", e)))
}

impl Payload {
    /// Format checks that must pass before any device call
    pub fn validate(&self) -> Result<()> {
        match self {
            Payload::TestConnection | Payload::Sync(_) | Payload::SyncAll => Ok(()),
            Payload::CreateVlan(p) => {
                check_required("name", &p.name)?;
                check_required("interface", &p.interface)?;
                if !(1..=4094).contains(&p.vlan_id) {
                    return Err(SyncError::Validation(
                        "vlanId must be between 1 and 4094".to_string(),
                    ));
                }
                if let Some(mtu) = p.mtu {
                    if !(68..=65535).contains(&mtu) {
                        return Err(SyncError::Validation(
                            "mtu must be between 68 and 65535".to_string(),
                        ));
                    }
                }
                Ok(())
            }
            Payload::ConfigureDhcp(p) => {
                check_required("name", &p.name)?;
                check_required("interface", &p.interface)?;
                check_required("poolName", &p.pool_name)?;
                check_ip_range("ipRange", &p.ip_range)?;
                check_cidr("network", &p.network)?;
                check_ipv4("gateway", &p.gateway)?;
                check_dns_servers("dnsServers", &p.dns_servers)
            }
            Payload::CreateQueue(p) => {
                check_required("name", &p.name)?;
                check_address_or_cidr("target", &p.target)?;
                check_rate("maxUploadMbps", p.max_upload_mbps)?;
                check_rate("maxDownloadMbps", p.max_download_mbps)?;
                check_priority(p.priority)
            }
            Payload::UpdateQueue(p) => {
                check_required("deviceId", &p.device_id)?;
                check_required("name", &p.name)?;
                check_rate("maxUploadMbps", p.max_upload_mbps)?;
                check_rate("maxDownloadMbps", p.max_download_mbps)?;
                check_priority(p.priority)
            }
            Payload::CreateFirewallRule(p) => {
                check_required("chain", &p.chain)?;
                check_required("action", &p.action)?;
                if let Some(address) = present(&p.src_address) {
                    check_address_or_cidr("srcAddress", address)?;
                }
                if let Some(address) = present(&p.dst_address) {
                    check_address_or_cidr("dstAddress", address)?;
                }
                Ok(())
            }
            Payload::CreatePppoeSecret(p) => {
                check_required("name", &p.name)?;
                check_required("password", &p.password)?;
                if let Some(address) = present(&p.local_address) {
                    check_ipv4("localAddress", address)?;
                }
                if let Some(address) = present(&p.remote_address) {
                    check_ipv4("remoteAddress", address)?;
                }
                Ok(())
            }
            Payload::DisconnectPppoeSession(p) => {
                check_required("deviceId", &p.device_id)?;
                check_required("name", &p.name)
            }
        }
    }
}

fn check_rate(field: &str, mbps: f64) -> Result<()> {
    if mbps.is_finite() && mbps > 0.0 {
        Ok(())
    } else {
        Err(SyncError::Validation(format!(
            "{} must be a positive number",
            field
        )))
    }
}

fn check_priority(priority: Option<i64>) -> Result<()> {
    match priority {
        Some(p) if !(1..=8).contains(&p) => Err(SyncError::Validation(
            "priority must be between 1 and 8".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Optional text that is set and non-blank
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn flexible_int<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    as_i64(&value).ok_or_else(|| de::Error::custom(format!("expected an integer, got {}", value)))
}

fn flexible_opt_int<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => as_i64(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected an integer, got {}", value))),
    }
}

fn flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.ok_or_else(|| de::Error::custom(format!("expected a number, got {}", value)))
}

fn flexible_opt_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(routersync_core::convert::as_text))
}

// ========================================
// Records sent to the device
// ========================================

struct RecordBuilder(Record);

impl RecordBuilder {
    fn new() -> Self {
        Self(Record::new())
    }

    fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    fn set_opt(self, key: &str, value: &Option<String>) -> Self {
        match present(value) {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    fn build(self) -> Record {
        self.0
    }
}

fn queue_priority(priority: Option<i64>) -> Option<String> {
    priority.map(|p| format!("{}/{}", p, p))
}

// ========================================
// Dispatch
// ========================================

/// Run one operation end to end
pub async fn dispatch(state: &AppState, operation: Operation, body: &[u8]) -> Result<Outcome> {
    routersync_metrics::record_operation(operation.as_str());
    let result = execute(state, operation, body).await;
    if let Err(e) = &result {
        routersync_metrics::record_operation_error(operation.as_str(), e.kind());
        warn!(operation = %operation, kind = e.kind(), error = %e, "operation failed");
    }
    result
}

async fn execute(state: &AppState, operation: Operation, body: &[u8]) -> Result<Outcome> {
    let request = OperationRequest::parse(operation, body)?;
    let router = state
        .store
        .get_router(request.router_id)
        .await?
        .ok_or_else(|| SyncError::NotFound("Router not found".to_string()))?;

    let outcome = run(state, &router, request.payload).await?;
    info!(operation = %operation, router = %router.name, message = %outcome.message, "operation finished");

    state.log_activity(ActivityEntry::new(
        Some(&router),
        operation.as_str(),
        outcome.message.clone(),
    ));
    Ok(outcome)
}

async fn run(state: &AppState, router: &Router, payload: Payload) -> Result<Outcome> {
    let adapter = DeviceAdapter::for_router(router, &state.device)?;
    let writer = MirrorWriter::new(state.store.as_ref(), state.mirror);

    match payload {
        Payload::TestConnection => test_connection(state, router).await,
        Payload::Sync(kind) => {
            let records = adapter.list(kind).await?;
            let report = writer.sync(router.id, kind, &records).await?;
            Ok(
                Outcome::new(format!("Synced {} {}", report.upserted, kind.label()))
                    .with_count(report.upserted)
                    .with_stats(json!(report)),
            )
        }
        Payload::SyncAll => {
            let mut stats = Map::new();
            let mut total = 0;
            for kind in ResourceKind::ALL {
                let records = adapter.list(kind).await?;
                let report = writer.sync(router.id, kind, &records).await?;
                total += report.upserted;
                stats.insert(kind.as_str().to_string(), json!(report.upserted));
            }
            Ok(Outcome::new(format!(
                "Synced {} rows across {} resource kinds",
                total,
                ResourceKind::ALL.len()
            ))
            .with_count(total)
            .with_stats(Value::Object(stats)))
        }
        Payload::CreateVlan(p) => {
            let record = RecordBuilder::new()
                .set("name", p.name.trim())
                .set("vlanId", p.vlan_id)
                .set("interface", p.interface.trim())
                .set("mtu", p.mtu)
                .set_opt("comment", &p.comment)
                .build();
            let created = adapter.create(ResourceKind::Vlan, &record).await?;
            writer.write_one(router.id, ResourceKind::Vlan, &created).await?;
            Ok(Outcome::new(format!(
                "VLAN {} ({}) created on {}",
                p.vlan_id,
                p.name.trim(),
                p.interface.trim()
            ))
            .with_count(1))
        }
        Payload::ConfigureDhcp(p) => {
            let pool = RecordBuilder::new()
                .set("name", p.pool_name.trim())
                .set("ranges", p.ip_range.trim())
                .build();
            let network = RecordBuilder::new()
                .set("address", p.network.trim())
                .set("gateway", p.gateway.trim())
                .set("dnsServer", p.dns_servers.replace(' ', ""))
                .build();
            let server = RecordBuilder::new()
                .set("name", p.name.trim())
                .set("interface", p.interface.trim())
                .set("addressPool", p.pool_name.trim())
                .set_opt("leaseTime", &p.lease_time)
                .set("disabled", "no")
                .build();

            for (kind, record) in [
                (ResourceKind::IpPool, pool),
                (ResourceKind::DhcpNetwork, network),
                (ResourceKind::DhcpServer, server),
            ] {
                let created = adapter.create(kind, &record).await?;
                writer.write_one(router.id, kind, &created).await?;
            }
            Ok(Outcome::new(format!(
                "DHCP server {} configured on {}",
                p.name.trim(),
                p.interface.trim()
            ))
            .with_count(3))
        }
        Payload::CreateQueue(p) => {
            let upload = mbps_to_bps(p.max_upload_mbps);
            let download = mbps_to_bps(p.max_download_mbps);
            let record = RecordBuilder::new()
                .set("name", p.name.trim())
                .set("target", p.target.trim())
                .set("maxUpload", upload)
                .set("maxDownload", download)
                .set("priority", queue_priority(p.priority))
                .set_opt("comment", &p.comment)
                .build();
            let created = adapter.create(ResourceKind::BandwidthQueue, &record).await?;
            writer
                .write_one(router.id, ResourceKind::BandwidthQueue, &created)
                .await?;
            Ok(Outcome::new(format!(
                "Queue {} created for {} ({} / {} Mbps)",
                p.name.trim(),
                p.target.trim(),
                p.max_upload_mbps,
                p.max_download_mbps
            ))
            .with_count(1))
        }
        Payload::UpdateQueue(p) => {
            let record = RecordBuilder::new()
                .set("name", p.name.trim())
                .set("maxUpload", mbps_to_bps(p.max_upload_mbps))
                .set("maxDownload", mbps_to_bps(p.max_download_mbps))
                .set("priority", queue_priority(p.priority))
                .build();
            let mut updated = adapter
                .update(ResourceKind::BandwidthQueue, p.device_id.trim(), &record)
                .await?;
            fill_from_mirror(state, router.id, &mut updated).await?;
            writer
                .write_one(router.id, ResourceKind::BandwidthQueue, &updated)
                .await?;
            Ok(Outcome::new(format!("Queue {} updated", p.name.trim())).with_count(1))
        }
        Payload::CreateFirewallRule(p) => {
            let record = RecordBuilder::new()
                .set("chain", p.chain.trim())
                .set("action", p.action.trim())
                .set_opt("protocol", &p.protocol)
                .set_opt("srcAddress", &p.src_address)
                .set_opt("dstAddress", &p.dst_address)
                .set_opt("dstPort", &p.dst_port)
                .set_opt("comment", &p.comment)
                .build();
            adapter.create(ResourceKind::FirewallRule, &record).await?;

            // Rule order shifts on insert; mirror the whole chain again
            let rules = adapter.list(ResourceKind::FirewallRule).await?;
            let report = writer
                .sync(router.id, ResourceKind::FirewallRule, &rules)
                .await?;
            Ok(Outcome::new(format!(
                "Firewall rule added to {} chain; {} rules mirrored",
                p.chain.trim(),
                report.upserted
            ))
            .with_count(report.upserted))
        }
        Payload::CreatePppoeSecret(p) => {
            let record = RecordBuilder::new()
                .set("name", p.name.trim())
                .set("password", p.password.as_str())
                .set("service", "pppoe")
                .set_opt("profile", &p.profile)
                .set_opt("localAddress", &p.local_address)
                .set_opt("remoteAddress", &p.remote_address)
                .set_opt("comment", &p.comment)
                .build();
            let created = adapter.create(ResourceKind::PppoeSecret, &record).await?;
            writer
                .write_one(router.id, ResourceKind::PppoeSecret, &created)
                .await?;
            Ok(Outcome::new(format!("PPPoE secret {} created", p.name.trim())).with_count(1))
        }
        Payload::DisconnectPppoeSession(p) => {
            adapter.disconnect_session(p.device_id.trim()).await?;
            let removed = state
                .store
                .remove(router.id, ResourceKind::PppoeSession, p.name.trim())
                .await?;
            Ok(
                Outcome::new(format!("PPPoE session {} disconnected", p.name.trim()))
                    .with_count(u64::from(removed)),
            )
        }
    }
}

async fn test_connection(state: &AppState, router: &Router) -> Result<Outcome> {
    match probe(router, &state.device).await {
        Ok(outcome) => {
            state
                .store
                .record_status(router.id, RouterStatus::Online, Some(Utc::now()))
                .await?;
            let info = &outcome.info;
            Ok(Outcome::new(format!(
                "Connected to {} via {}",
                router.name, outcome.reached
            ))
            .with_stats(json!({
                "reachedVia": outcome.reached,
                "baseUrl": outcome.base_url,
                "version": info.version,
                "uptime": info.uptime,
                "boardName": info.board_name,
                "cpuLoad": info.cpu_load,
                "architecture": info.architecture,
            })))
        }
        Err(e) => {
            if let Err(store_error) = state
                .store
                .record_status(router.id, RouterStatus::Offline, None)
                .await
            {
                warn!(router = %router.name, error = %store_error, "failed to record router status");
            }
            Err(e)
        }
    }
}

/// A PATCH answer may omit fields that were not changed; keep the mirrored ones
async fn fill_from_mirror(state: &AppState, router_id: Uuid, record: &mut Record) -> Result<()> {
    if record.contains_key("target") {
        return Ok(());
    }
    let name = record.get("name").and_then(Value::as_str).unwrap_or_default();
    let rows = state
        .store
        .list(router_id, ResourceKind::BandwidthQueue)
        .await?;
    let existing = rows.into_iter().find_map(|row| match row {
        MirrorRow::BandwidthQueue(q) if q.name == name => Some(q),
        _ => None,
    });
    if let Some(queue) = existing {
        record.insert("target".to_string(), Value::String(queue.target));
        if let Some(comment) = queue.comment {
            record.entry("comment".to_string()).or_insert(Value::String(comment));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(operation: &str, body: Value) -> Result<OperationRequest> {
        let operation: Operation = operation.parse()?;
        OperationRequest::parse(operation, body.to_string().as_bytes())
    }

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::all() {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert_eq!(
            "sync-queues".parse::<Operation>().unwrap(),
            Operation::Sync(ResourceKind::BandwidthQueue)
        );
        assert!(matches!(
            "reboot".parse::<Operation>(),
            Err(SyncError::NotFound(_))
        ));
    }

    #[test]
    fn test_router_id_required() {
        let err = parse("sync-vlans", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "routerId is required");

        let err = parse("sync-vlans", json!({"routerId": "router-1"})).unwrap_err();
        assert_eq!(err.to_string(), "routerId must be a UUID");
    }

    #[test]
    fn test_configure_dhcp_rejects_bad_dns() {
        let err = parse(
            "configure-dhcp",
            json!({
                "routerId": Uuid::new_v4().to_string(),
                "name": "dhcp1",
                "interface": "bridge",
                "poolName": "pool1",
                "ipRange": "192.168.88.10-192.168.88.254",
                "network": "192.168.88.0/24",
                "gateway": "192.168.88.1",
                "dnsServers": "8.8.8.8,dns.google"
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("dnsServers"));
    }

    #[test]
    fn test_configure_dhcp_rejects_bad_range() {
        let err = parse(
            "configure-dhcp",
            json!({
                "routerId": Uuid::new_v4().to_string(),
                "name": "dhcp1",
                "interface": "bridge",
                "poolName": "pool1",
                "ipRange": "192.168.88.10 to 192.168.88.254",
                "network": "192.168.88.0/24",
                "gateway": "192.168.88.1",
                "dnsServers": "8.8.8.8"
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("ipRange"));
    }

    #[test]
    fn test_queue_accepts_string_numbers() {
        let request = parse(
            "create-queue",
            json!({
                "routerId": Uuid::new_v4().to_string(),
                "name": "q1",
                "target": "10.0.0.5/32",
                "maxUploadMbps": "1.5",
                "maxDownloadMbps": 5,
                "priority": "8"
            }),
        )
        .unwrap();
        match request.payload {
            Payload::CreateQueue(q) => {
                assert_eq!(mbps_to_bps(q.max_upload_mbps), 1_500_000);
                assert_eq!(q.priority, Some(8));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_vlan_id_range() {
        let err = parse(
            "create-vlan",
            json!({
                "routerId": Uuid::new_v4().to_string(),
                "name": "guests",
                "vlanId": 4095,
                "interface": "bridge"
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("vlanId"));
    }

    #[test]
    fn test_missing_field_is_validation_error() {
        let err = parse(
            "disconnect-pppoe-session",
            json!({"routerId": Uuid::new_v4().to_string(), "name": "alice"}),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert!(err.to_string().contains("deviceId"));
    }

    #[test]
    fn test_outcome_envelope_skips_empty_fields() {
        let value = serde_json::to_value(Outcome::new("done")).unwrap();
        assert_eq!(value, json!({"message": "done"}));
    }
}
