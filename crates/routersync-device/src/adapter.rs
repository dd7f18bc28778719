use routersync_core::{ApiDialect, Record, ResourceKind, Result, Router, SyncError, DEVICE_ID_FIELD};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::client::DeviceClient;
use crate::mapping;
use crate::target::DeviceTarget;
use crate::DeviceOptions;

/// System information reported by `system/resource`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    #[serde(default, alias = "board-name")]
    pub board_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default, alias = "cpu-load", deserialize_with = "text_or_number")]
    pub cpu_load: Option<String>,
    #[serde(default, alias = "architecture-name")]
    pub architecture: Option<String>,
}

fn text_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(routersync_core::convert::as_text))
}

/// Logical operations against one router.
///
/// Each method issues exactly one HTTP request and translates field names
/// through the mapping tables in both directions.
pub struct DeviceAdapter {
    client: DeviceClient,
    dialect: ApiDialect,
}

impl DeviceAdapter {
    /// Adapter for a stored router record
    pub fn for_router(router: &Router, options: &DeviceOptions) -> Result<Self> {
        let target = DeviceTarget::from_router(router)?;
        let client = DeviceClient::new(router, target, options)?;
        Ok(Self::with_client(client, router.api_dialect))
    }

    pub fn with_client(client: DeviceClient, dialect: ApiDialect) -> Self {
        Self { client, dialect }
    }

    /// Fetch every row of a kind
    pub async fn list(&self, kind: ResourceKind) -> Result<Vec<Record>> {
        let response = self.client.get(kind.device_path()).await?;
        let records = mapping::list_from_device(kind, self.dialect, &response)?;
        debug!(kind = %kind, count = records.len(), "listed device rows");
        Ok(records)
    }

    /// Create a row; returns the device's view of it.
    ///
    /// When the device answers without a body the submitted record is returned.
    pub async fn create(&self, kind: ResourceKind, record: &Record) -> Result<Record> {
        let body = mapping::to_device(kind, self.dialect, record);
        let response = match self.dialect {
            ApiDialect::MikrotikRest => self.client.put(kind.device_path(), &body).await?,
            _ => self.client.post(kind.device_path(), &body).await?,
        };
        self.echo(kind, record, &response)
    }

    /// Update a row identified by its device id
    pub async fn update(&self, kind: ResourceKind, device_id: &str, record: &Record) -> Result<Record> {
        if device_id.is_empty() {
            return Err(SyncError::Validation(format!(
                "A device id is required to update {}",
                kind.label()
            )));
        }
        let body = mapping::to_device(kind, self.dialect, record);
        let path = format!("{}/{}", kind.device_path(), device_id);
        let response = self.client.patch(&path, &body).await?;
        let mut merged = self.echo(kind, record, &response)?;
        merged
            .entry(DEVICE_ID_FIELD.to_string())
            .or_insert_with(|| Value::String(device_id.to_string()));
        Ok(merged)
    }

    /// Remove a row identified by its device id
    pub async fn remove(&self, kind: ResourceKind, device_id: &str) -> Result<()> {
        let path = format!("{}/{}", kind.device_path(), device_id);
        self.client.delete(&path).await?;
        Ok(())
    }

    /// Drop an active PPPoE session
    pub async fn disconnect_session(&self, device_id: &str) -> Result<()> {
        match self.dialect {
            ApiDialect::MikrotikRest => {
                let path = format!("{}/remove", ResourceKind::PppoeSession.device_path());
                self.client.post(&path, &json!({ ".id": device_id })).await?;
                Ok(())
            }
            _ => self.remove(ResourceKind::PppoeSession, device_id).await,
        }
    }

    /// Read `system/resource`
    pub async fn system_info(&self) -> Result<SystemInfo> {
        let response = self.client.get("system/resource").await?;
        serde_json::from_value(response)
            .map_err(|e| SyncError::Mapping(format!("invalid system resource response: {}", e)))
    }

    fn echo(&self, kind: ResourceKind, submitted: &Record, response: &Value) -> Result<Record> {
        let response = match response {
            // RouterOS sometimes wraps single objects in a one-element array
            Value::Array(items) if items.len() == 1 => &items[0],
            other => other,
        };
        if !response.is_object() {
            return Ok(submitted.clone());
        }
        let mut record = submitted.clone();
        record.extend(mapping::from_device(kind, self.dialect, response)?);
        Ok(record)
    }
}
