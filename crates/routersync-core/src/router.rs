use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API dialect spoken by a router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiDialect {
    /// MikroTik RouterOS REST API (`/rest`, hyphenated keys)
    MikrotikRest,
    /// Generic JSON REST API (`/api`, logical keys)
    GenericRest,
    Snmp,
    Ssh,
}

impl ApiDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MikrotikRest => "mikrotik_rest",
            Self::GenericRest => "generic_rest",
            Self::Snmp => "snmp",
            Self::Ssh => "ssh",
        }
    }

    /// Default API base path when the router has no endpoint override
    pub fn default_base_path(&self) -> Option<&'static str> {
        match self {
            Self::MikrotikRest => Some("/rest"),
            Self::GenericRest => Some("/api"),
            Self::Snmp | Self::Ssh => None,
        }
    }
}

impl Default for ApiDialect {
    fn default() -> Self {
        Self::MikrotikRest
    }
}

impl std::fmt::Display for ApiDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiDialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mikrotik_rest" | "mikrotik" => Ok(Self::MikrotikRest),
            "generic_rest" | "rest" => Ok(Self::GenericRest),
            "snmp" => Ok(Self::Snmp),
            "ssh" => Ok(Self::Ssh),
            other => Err(format!("unknown api dialect '{}'", other)),
        }
    }
}

/// Last known reachability of a router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterStatus {
    Online,
    Offline,
    Unknown,
}

impl RouterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        }
    }
}

impl Default for RouterStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for RouterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RouterStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(format!("unknown router status '{}'", other)),
        }
    }
}

/// Router connection record as kept in the credential store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub provider_id: Option<Uuid>,
    pub name: String,
    /// IP address or hostname
    pub address: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub api_dialect: ApiDialect,
    /// Overrides the dialect's default base path (e.g. `/rest`)
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub status: RouterStatus,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Router {
    /// Create a MikroTik router record with default settings
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id: None,
            name: name.into(),
            address: address.into(),
            port: None,
            username: username.into(),
            password: password.into(),
            api_dialect: ApiDialect::MikrotikRest,
            api_endpoint: None,
            status: RouterStatus::Unknown,
            last_seen: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_dialect(mut self, dialect: ApiDialect) -> Self {
        self.api_dialect = dialect;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = Some(endpoint.into());
        self
    }
}
