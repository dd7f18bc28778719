use async_trait::async_trait;
use chrono::{DateTime, Utc};
use routersync_core::{ResourceKind, Router, RouterStatus};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::info;
use uuid::Uuid;

use crate::rows::*;
use crate::{ActivityEntry, ActivityStore, MirrorStore, RouterStore, StoreError, StoreResult};

#[derive(Clone)]
pub struct PostgresRepository {
    pool: Pool<Postgres>,
}

impl PostgresRepository {
    /// Connect and run pending migrations
    pub async fn new(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(max_connections, "database ready");

        Ok(Self { pool })
    }
}

/// `routers` row before the text columns are parsed
#[derive(sqlx::FromRow)]
struct RouterRecord {
    id: Uuid,
    provider_id: Option<Uuid>,
    name: String,
    address: String,
    port: Option<i32>,
    username: String,
    password: String,
    api_dialect: String,
    api_endpoint: Option<String>,
    status: String,
    last_seen: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RouterRecord> for Router {
    type Error = StoreError;

    fn try_from(record: RouterRecord) -> Result<Self, Self::Error> {
        let port = record
            .port
            .map(u16::try_from)
            .transpose()
            .map_err(|_| StoreError::Corrupt(format!("router {} has invalid port", record.id)))?;

        Ok(Router {
            id: record.id,
            provider_id: record.provider_id,
            name: record.name,
            address: record.address,
            port,
            username: record.username,
            password: record.password,
            api_dialect: record.api_dialect.parse().map_err(StoreError::Corrupt)?,
            api_endpoint: record.api_endpoint,
            status: record.status.parse().map_err(StoreError::Corrupt)?,
            last_seen: record.last_seen,
            created_at: Some(record.created_at),
        })
    }
}

const ROUTER_COLUMNS: &str = "id, provider_id, name, address, port, username, password, \
     api_dialect, api_endpoint, status, last_seen, created_at";

#[async_trait]
impl RouterStore for PostgresRepository {
    async fn list_routers(&self) -> StoreResult<Vec<Router>> {
        let sql = format!("SELECT {} FROM routers ORDER BY created_at", ROUTER_COLUMNS);
        sqlx::query_as::<_, RouterRecord>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Router::try_from)
            .collect()
    }

    async fn get_router(&self, id: Uuid) -> StoreResult<Option<Router>> {
        let sql = format!("SELECT {} FROM routers WHERE id = $1", ROUTER_COLUMNS);
        sqlx::query_as::<_, RouterRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Router::try_from)
            .transpose()
    }

    async fn save_router(&self, router: &Router) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO routers (id, provider_id, name, address, port, username, password, \
             api_dialect, api_endpoint, status, last_seen, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, COALESCE($12, now())) \
             ON CONFLICT (id) DO UPDATE SET provider_id = $2, name = $3, address = $4, port = $5, \
             username = $6, password = $7, api_dialect = $8, api_endpoint = $9, status = $10, \
             last_seen = $11",
        )
        .bind(router.id)
        .bind(router.provider_id)
        .bind(&router.name)
        .bind(&router.address)
        .bind(router.port.map(i32::from))
        .bind(&router.username)
        .bind(&router.password)
        .bind(router.api_dialect.as_str())
        .bind(&router.api_endpoint)
        .bind(router.status.as_str())
        .bind(router.last_seen)
        .bind(router.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_router(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM routers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_status(
        &self,
        id: Uuid,
        status: RouterStatus,
        seen_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE routers SET status = $2, last_seen = COALESCE($3, last_seen) WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(seen_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UnknownRouter(id));
        }
        Ok(())
    }
}

/// `INSERT ... ON CONFLICT (router_id, key) DO UPDATE` over the given columns.
/// `columns` starts with `router_id` and the key column.
fn upsert_sql(kind: ResourceKind, columns: &[&str]) -> String {
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
    let updates: Vec<String> = columns
        .iter()
        .skip(2)
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT (router_id, {}) DO UPDATE SET {}",
        kind.table(),
        columns.join(", "),
        placeholders.join(", "),
        kind.key_column(),
        updates.join(", ")
    )
}

const VLAN_COLUMNS: &[&str] = &[
    "router_id", "vlan_id", "name", "interface", "mtu", "running", "enabled", "comment", "device_id",
];
const DHCP_SERVER_COLUMNS: &[&str] = &[
    "router_id", "name", "interface", "address_pool", "lease_time", "enabled", "comment", "device_id",
];
const DHCP_NETWORK_COLUMNS: &[&str] = &[
    "router_id", "address", "gateway", "dns_servers", "comment", "device_id",
];
const IP_POOL_COLUMNS: &[&str] = &["router_id", "name", "ranges", "next_pool", "comment", "device_id"];
const FIREWALL_COLUMNS: &[&str] = &[
    "router_id", "position", "chain", "action", "protocol", "src_address", "dst_address",
    "src_port", "dst_port", "in_interface", "out_interface", "connection_state", "enabled",
    "comment", "device_id",
];
const QUEUE_COLUMNS: &[&str] = &[
    "router_id", "name", "target", "max_upload", "max_download", "priority", "enabled", "comment",
    "device_id",
];
const PPPOE_SECRET_COLUMNS: &[&str] = &[
    "router_id", "name", "password", "service", "profile", "local_address", "remote_address",
    "caller_id", "enabled", "comment", "device_id",
];
const PPPOE_SESSION_COLUMNS: &[&str] = &[
    "router_id", "name", "service", "caller_id", "address", "uptime", "session_id", "device_id",
];
const NAT_COLUMNS: &[&str] = &[
    "router_id", "device_id", "position", "chain", "action", "protocol", "src_address",
    "dst_address", "dst_port", "in_interface", "out_interface", "to_addresses", "to_ports",
    "enabled", "comment",
];
const INTERFACE_COLUMNS: &[&str] = &[
    "router_id", "name", "interface_type", "mac_address", "mtu", "running", "enabled", "comment",
    "device_id",
];

fn firewall_insert<'q>(
    sql: &'q str,
    rule: &'q FirewallRuleRow,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(sql)
        .bind(rule.router_id)
        .bind(rule.position)
        .bind(&rule.chain)
        .bind(&rule.action)
        .bind(&rule.protocol)
        .bind(&rule.src_address)
        .bind(&rule.dst_address)
        .bind(&rule.src_port)
        .bind(&rule.dst_port)
        .bind(&rule.in_interface)
        .bind(&rule.out_interface)
        .bind(&rule.connection_state)
        .bind(rule.enabled)
        .bind(&rule.comment)
        .bind(&rule.device_id)
}

async fn list_rows<T>(pool: &Pool<Postgres>, kind: ResourceKind, router_id: Uuid) -> StoreResult<Vec<T>>
where
    T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    let order = match kind {
        ResourceKind::FirewallRule | ResourceKind::NatRule => "position, device_id",
        _ => kind.key_column(),
    };
    let sql = format!(
        "SELECT * FROM {} WHERE router_id = $1 ORDER BY {}",
        kind.table(),
        order
    );
    Ok(sqlx::query_as::<_, T>(&sql)
        .bind(router_id)
        .fetch_all(pool)
        .await?)
}

#[async_trait]
impl MirrorStore for PostgresRepository {
    async fn upsert(&self, row: &MirrorRow) -> StoreResult<()> {
        let query = match row {
            MirrorRow::Vlan(r) => sqlx::query(&upsert_sql(ResourceKind::Vlan, VLAN_COLUMNS))
                .bind(r.router_id)
                .bind(r.vlan_id)
                .bind(&r.name)
                .bind(&r.interface)
                .bind(r.mtu)
                .bind(r.running)
                .bind(r.enabled)
                .bind(&r.comment)
                .bind(&r.device_id)
                .execute(&self.pool)
                .await,
            MirrorRow::DhcpServer(r) => {
                sqlx::query(&upsert_sql(ResourceKind::DhcpServer, DHCP_SERVER_COLUMNS))
                    .bind(r.router_id)
                    .bind(&r.name)
                    .bind(&r.interface)
                    .bind(&r.address_pool)
                    .bind(&r.lease_time)
                    .bind(r.enabled)
                    .bind(&r.comment)
                    .bind(&r.device_id)
                    .execute(&self.pool)
                    .await
            }
            MirrorRow::DhcpNetwork(r) => {
                sqlx::query(&upsert_sql(ResourceKind::DhcpNetwork, DHCP_NETWORK_COLUMNS))
                    .bind(r.router_id)
                    .bind(&r.address)
                    .bind(&r.gateway)
                    .bind(&r.dns_servers)
                    .bind(&r.comment)
                    .bind(&r.device_id)
                    .execute(&self.pool)
                    .await
            }
            MirrorRow::IpPool(r) => sqlx::query(&upsert_sql(ResourceKind::IpPool, IP_POOL_COLUMNS))
                .bind(r.router_id)
                .bind(&r.name)
                .bind(&r.ranges)
                .bind(&r.next_pool)
                .bind(&r.comment)
                .bind(&r.device_id)
                .execute(&self.pool)
                .await,
            MirrorRow::FirewallRule(r) => {
                let sql = upsert_sql(ResourceKind::FirewallRule, FIREWALL_COLUMNS);
                let result = firewall_insert(&sql, r).execute(&self.pool).await;
                result
            }
            MirrorRow::BandwidthQueue(r) => {
                sqlx::query(&upsert_sql(ResourceKind::BandwidthQueue, QUEUE_COLUMNS))
                    .bind(r.router_id)
                    .bind(&r.name)
                    .bind(&r.target)
                    .bind(r.max_upload)
                    .bind(r.max_download)
                    .bind(r.priority)
                    .bind(r.enabled)
                    .bind(&r.comment)
                    .bind(&r.device_id)
                    .execute(&self.pool)
                    .await
            }
            MirrorRow::PppoeSecret(r) => {
                sqlx::query(&upsert_sql(ResourceKind::PppoeSecret, PPPOE_SECRET_COLUMNS))
                    .bind(r.router_id)
                    .bind(&r.name)
                    .bind(&r.password)
                    .bind(&r.service)
                    .bind(&r.profile)
                    .bind(&r.local_address)
                    .bind(&r.remote_address)
                    .bind(&r.caller_id)
                    .bind(r.enabled)
                    .bind(&r.comment)
                    .bind(&r.device_id)
                    .execute(&self.pool)
                    .await
            }
            MirrorRow::PppoeSession(r) => {
                sqlx::query(&upsert_sql(ResourceKind::PppoeSession, PPPOE_SESSION_COLUMNS))
                    .bind(r.router_id)
                    .bind(&r.name)
                    .bind(&r.service)
                    .bind(&r.caller_id)
                    .bind(&r.address)
                    .bind(&r.uptime)
                    .bind(&r.session_id)
                    .bind(&r.device_id)
                    .execute(&self.pool)
                    .await
            }
            MirrorRow::NatRule(r) => sqlx::query(&upsert_sql(ResourceKind::NatRule, NAT_COLUMNS))
                .bind(r.router_id)
                .bind(&r.device_id)
                .bind(r.position)
                .bind(&r.chain)
                .bind(&r.action)
                .bind(&r.protocol)
                .bind(&r.src_address)
                .bind(&r.dst_address)
                .bind(&r.dst_port)
                .bind(&r.in_interface)
                .bind(&r.out_interface)
                .bind(&r.to_addresses)
                .bind(&r.to_ports)
                .bind(r.enabled)
                .bind(&r.comment)
                .execute(&self.pool)
                .await,
            MirrorRow::Interface(r) => {
                sqlx::query(&upsert_sql(ResourceKind::Interface, INTERFACE_COLUMNS))
                    .bind(r.router_id)
                    .bind(&r.name)
                    .bind(&r.interface_type)
                    .bind(&r.mac_address)
                    .bind(r.mtu)
                    .bind(r.running)
                    .bind(r.enabled)
                    .bind(&r.comment)
                    .bind(&r.device_id)
                    .execute(&self.pool)
                    .await
            }
        };

        match query {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(StoreError::UnknownRouter(row.router_id()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn replace_firewall_rules(
        &self,
        router_id: Uuid,
        rules: &[FirewallRuleRow],
    ) -> StoreResult<()> {
        let columns = FIREWALL_COLUMNS.join(", ");
        let placeholders: Vec<String> =
            (1..=FIREWALL_COLUMNS.len()).map(|i| format!("${}", i)).collect();
        let insert = format!(
            "INSERT INTO firewall_rules ({}) VALUES ({})",
            columns,
            placeholders.join(", ")
        );

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM firewall_rules WHERE router_id = $1")
            .bind(router_id)
            .execute(&mut *tx)
            .await?;
        for rule in rules {
            firewall_insert(&insert, rule).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn prune(&self, router_id: Uuid, kind: ResourceKind, keep: &[String]) -> StoreResult<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE router_id = $1 AND NOT ({}::text = ANY($2))",
            kind.table(),
            kind.key_column()
        );
        let result = sqlx::query(&sql)
            .bind(router_id)
            .bind(keep)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn remove(&self, router_id: Uuid, kind: ResourceKind, key: &str) -> StoreResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE router_id = $1 AND {}::text = $2",
            kind.table(),
            kind.key_column()
        );
        let result = sqlx::query(&sql)
            .bind(router_id)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, router_id: Uuid, kind: ResourceKind) -> StoreResult<Vec<MirrorRow>> {
        let pool = &self.pool;
        let rows = match kind {
            ResourceKind::Vlan => list_rows::<VlanRow>(pool, kind, router_id)
                .await?
                .into_iter()
                .map(MirrorRow::Vlan)
                .collect(),
            ResourceKind::DhcpServer => list_rows::<DhcpServerRow>(pool, kind, router_id)
                .await?
                .into_iter()
                .map(MirrorRow::DhcpServer)
                .collect(),
            ResourceKind::DhcpNetwork => list_rows::<DhcpNetworkRow>(pool, kind, router_id)
                .await?
                .into_iter()
                .map(MirrorRow::DhcpNetwork)
                .collect(),
            ResourceKind::IpPool => list_rows::<IpPoolRow>(pool, kind, router_id)
                .await?
                .into_iter()
                .map(MirrorRow::IpPool)
                .collect(),
            ResourceKind::FirewallRule => list_rows::<FirewallRuleRow>(pool, kind, router_id)
                .await?
                .into_iter()
                .map(MirrorRow::FirewallRule)
                .collect(),
            ResourceKind::BandwidthQueue => list_rows::<BandwidthQueueRow>(pool, kind, router_id)
                .await?
                .into_iter()
                .map(MirrorRow::BandwidthQueue)
                .collect(),
            ResourceKind::PppoeSecret => list_rows::<PppoeSecretRow>(pool, kind, router_id)
                .await?
                .into_iter()
                .map(MirrorRow::PppoeSecret)
                .collect(),
            ResourceKind::PppoeSession => list_rows::<PppoeSessionRow>(pool, kind, router_id)
                .await?
                .into_iter()
                .map(MirrorRow::PppoeSession)
                .collect(),
            ResourceKind::NatRule => list_rows::<NatRuleRow>(pool, kind, router_id)
                .await?
                .into_iter()
                .map(MirrorRow::NatRule)
                .collect(),
            ResourceKind::Interface => list_rows::<InterfaceRow>(pool, kind, router_id)
                .await?
                .into_iter()
                .map(MirrorRow::Interface)
                .collect(),
        };
        Ok(rows)
    }
}

#[async_trait]
impl ActivityStore for PostgresRepository {
    async fn append(&self, entry: &ActivityEntry) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO activity_logs (id, router_id, provider_id, action, message, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id)
        .bind(entry.router_id)
        .bind(entry.provider_id)
        .bind(&entry.action)
        .bind(&entry.message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, router_id: Option<Uuid>, limit: i64) -> StoreResult<Vec<ActivityEntry>> {
        Ok(sqlx::query_as::<_, ActivityEntry>(
            "SELECT id, router_id, provider_id, action, message, created_at FROM activity_logs \
             WHERE ($1::uuid IS NULL OR router_id = $1) ORDER BY created_at DESC LIMIT $2",
        )
        .bind(router_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?)
    }
}
