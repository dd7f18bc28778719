// Repository layer for routers, mirror tables and the activity log

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use routersync_core::{ResourceKind, Router, RouterStatus, SyncError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod normalize;
pub mod postgres;
pub mod rows;
pub mod writer;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;
pub use rows::MirrorRow;
pub use writer::{MirrorPolicy, MirrorWriter, SyncReport};

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Unknown router {0}")]
    UnknownRouter(Uuid),
}

impl From<StoreError> for SyncError {
    fn from(error: StoreError) -> Self {
        SyncError::Store(error.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One audit line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub router_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub action: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(router: Option<&Router>, action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            router_id: router.map(|r| r.id),
            provider_id: router.and_then(|r| r.provider_id),
            action: action.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Router connection records
#[async_trait]
pub trait RouterStore: Send + Sync {
    async fn list_routers(&self) -> StoreResult<Vec<Router>>;

    async fn get_router(&self, id: Uuid) -> StoreResult<Option<Router>>;

    /// Insert or replace a router record
    async fn save_router(&self, router: &Router) -> StoreResult<()>;

    /// Delete a router and, through cascade, its mirror rows
    async fn delete_router(&self, id: Uuid) -> StoreResult<bool>;

    async fn record_status(
        &self,
        id: Uuid,
        status: RouterStatus,
        seen_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;
}

/// Mirror tables. Every write goes through the kind's natural key.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Insert or update one row on (router, natural key)
    async fn upsert(&self, row: &MirrorRow) -> StoreResult<()>;

    /// Replace every firewall rule of a router with `rules`, in order
    async fn replace_firewall_rules(
        &self,
        router_id: Uuid,
        rules: &[rows::FirewallRuleRow],
    ) -> StoreResult<()>;

    /// Delete rows of a kind whose natural key is not in `keep`
    async fn prune(&self, router_id: Uuid, kind: ResourceKind, keep: &[String]) -> StoreResult<u64>;

    /// Delete one row by natural key
    async fn remove(&self, router_id: Uuid, kind: ResourceKind, key: &str) -> StoreResult<bool>;

    /// Rows of a kind for a router, ordered by position then key
    async fn list(&self, router_id: Uuid, kind: ResourceKind) -> StoreResult<Vec<MirrorRow>>;
}

/// Append-only activity log
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn append(&self, entry: &ActivityEntry) -> StoreResult<()>;

    /// Most recent entries first
    async fn recent(&self, router_id: Option<Uuid>, limit: i64) -> StoreResult<Vec<ActivityEntry>>;
}

/// Everything the dispatcher needs from the relational store
pub trait Store: RouterStore + MirrorStore + ActivityStore {}

impl<T: RouterStore + MirrorStore + ActivityStore> Store for T {}
