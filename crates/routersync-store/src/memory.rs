use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use routersync_core::{ResourceKind, Router, RouterStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::rows::{FirewallRuleRow, MirrorRow};
use crate::{ActivityEntry, ActivityStore, MirrorStore, RouterStore, StoreError, StoreResult};

type MirrorKey = (Uuid, ResourceKind, String);

#[derive(Default)]
struct State {
    routers: BTreeMap<Uuid, Router>,
    mirror: BTreeMap<MirrorKey, MirrorRow>,
    activity: Vec<ActivityEntry>,
}

/// In-process repository, used when no database is configured and in tests
#[derive(Clone)]
pub struct MemoryRepository {
    state: Arc<RwLock<State>>,
}

impl MemoryRepository {
    /// Create new repository
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// Number of mirror rows of a kind held for a router
    pub async fn count(&self, router_id: Uuid, kind: ResourceKind) -> usize {
        let state = self.state.read().await;
        state
            .mirror
            .keys()
            .filter(|(id, k, _)| *id == router_id && *k == kind)
            .count()
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RouterStore for MemoryRepository {
    async fn list_routers(&self) -> StoreResult<Vec<Router>> {
        let state = self.state.read().await;
        let mut routers: Vec<Router> = state.routers.values().cloned().collect();
        routers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(routers)
    }

    async fn get_router(&self, id: Uuid) -> StoreResult<Option<Router>> {
        let state = self.state.read().await;
        Ok(state.routers.get(&id).cloned())
    }

    async fn save_router(&self, router: &Router) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.routers.insert(router.id, router.clone());
        Ok(())
    }

    async fn delete_router(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let existed = state.routers.remove(&id).is_some();
        if existed {
            state.mirror.retain(|(router_id, _, _), _| *router_id != id);
        }
        Ok(existed)
    }

    async fn record_status(
        &self,
        id: Uuid,
        status: RouterStatus,
        seen_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let router = state
            .routers
            .get_mut(&id)
            .ok_or(StoreError::UnknownRouter(id))?;
        router.status = status;
        if seen_at.is_some() {
            router.last_seen = seen_at;
        }
        Ok(())
    }
}

#[async_trait]
impl MirrorStore for MemoryRepository {
    async fn upsert(&self, row: &MirrorRow) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.routers.contains_key(&row.router_id()) {
            return Err(StoreError::UnknownRouter(row.router_id()));
        }
        let key = (row.router_id(), row.kind(), row.natural_key());
        state.mirror.insert(key, row.clone());
        Ok(())
    }

    async fn replace_firewall_rules(
        &self,
        router_id: Uuid,
        rules: &[FirewallRuleRow],
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.routers.contains_key(&router_id) {
            return Err(StoreError::UnknownRouter(router_id));
        }
        state
            .mirror
            .retain(|(id, kind, _), _| !(*id == router_id && *kind == ResourceKind::FirewallRule));
        for rule in rules {
            let row = MirrorRow::FirewallRule(rule.clone());
            state
                .mirror
                .insert((router_id, ResourceKind::FirewallRule, row.natural_key()), row);
        }
        Ok(())
    }

    async fn prune(&self, router_id: Uuid, kind: ResourceKind, keep: &[String]) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let before = state.mirror.len();
        state.mirror.retain(|(id, k, key), _| {
            *id != router_id || *k != kind || keep.iter().any(|kept| kept == key)
        });
        Ok((before - state.mirror.len()) as u64)
    }

    async fn remove(&self, router_id: Uuid, kind: ResourceKind, key: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state
            .mirror
            .remove(&(router_id, kind, key.to_string()))
            .is_some())
    }

    async fn list(&self, router_id: Uuid, kind: ResourceKind) -> StoreResult<Vec<MirrorRow>> {
        let state = self.state.read().await;
        let mut rows: Vec<MirrorRow> = state
            .mirror
            .iter()
            .filter(|((id, k, _), _)| *id == router_id && *k == kind)
            .map(|(_, row)| row.clone())
            .collect();
        rows.sort_by(listing_order);
        Ok(rows)
    }
}

/// Same order as the SQL listing: device position, then the key column
fn listing_order(a: &MirrorRow, b: &MirrorRow) -> Ordering {
    a.position().cmp(&b.position()).then_with(|| match (a, b) {
        (MirrorRow::Vlan(x), MirrorRow::Vlan(y)) => x.vlan_id.cmp(&y.vlan_id),
        _ => a.natural_key().cmp(&b.natural_key()),
    })
}

#[async_trait]
impl ActivityStore for MemoryRepository {
    async fn append(&self, entry: &ActivityEntry) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.activity.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, router_id: Option<Uuid>, limit: i64) -> StoreResult<Vec<ActivityEntry>> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(state
            .activity
            .iter()
            .rev()
            .filter(|entry| router_id.is_none() || entry.router_id == router_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{MirrorPolicy, MirrorWriter};
    use routersync_core::Record;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<Record> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    async fn repo_with_router() -> (MemoryRepository, Router) {
        let repo = MemoryRepository::new();
        let router = Router::new("core-1", "203.0.113.10", "admin", "secret");
        repo.save_router(&router).await.unwrap();
        (repo, router)
    }

    #[tokio::test]
    async fn test_router_crud() {
        let (repo, router) = repo_with_router().await;

        let fetched = repo.get_router(router.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "core-1");
        assert_eq!(repo.list_routers().await.unwrap().len(), 1);

        let seen = Utc::now();
        repo.record_status(router.id, RouterStatus::Online, Some(seen))
            .await
            .unwrap();
        let fetched = repo.get_router(router.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RouterStatus::Online);
        assert_eq!(fetched.last_seen, Some(seen));

        assert!(repo.delete_router(router.id).await.unwrap());
        assert!(!repo.delete_router(router.id).await.unwrap());
        assert!(repo.get_router(router.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_vlans_listed_by_numeric_id() {
        let (repo, router) = repo_with_router().await;
        let writer = MirrorWriter::new(&repo, MirrorPolicy::default());
        let vlans = records(json!([
            {"id": "*1", "name": "vlan10", "vlanId": "10"},
            {"id": "*2", "name": "vlan2", "vlanId": "2"}
        ]));
        writer.sync(router.id, ResourceKind::Vlan, &vlans).await.unwrap();

        let ids: Vec<i32> = repo
            .list(router.id, ResourceKind::Vlan)
            .await
            .unwrap()
            .into_iter()
            .map(|row| match row {
                MirrorRow::Vlan(v) => v.vlan_id,
                other => panic!("unexpected row {:?}", other),
            })
            .collect();
        assert_eq!(ids, vec![2, 10]);
    }

    #[tokio::test]
    async fn test_sync_twice_is_idempotent() {
        let (repo, router) = repo_with_router().await;
        let writer = MirrorWriter::new(&repo, MirrorPolicy::default());
        let vlans = records(json!([
            {"id": "*1", "name": "vlan10", "vlanId": "10", "interface": "ether1"},
            {"id": "*2", "name": "vlan20", "vlanId": "20", "interface": "ether1"}
        ]));

        writer.sync(router.id, ResourceKind::Vlan, &vlans).await.unwrap();
        let first = repo.list(router.id, ResourceKind::Vlan).await.unwrap();
        writer.sync(router.id, ResourceKind::Vlan, &vlans).await.unwrap();
        let second = repo.list(router.id, ResourceKind::Vlan).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_firewall_replace_keeps_device_order() {
        let (repo, router) = repo_with_router().await;
        let writer = MirrorWriter::new(&repo, MirrorPolicy::default());

        let three = records(json!([
            {"id": "*a", "chain": "input", "action": "accept"},
            {"id": "*b", "chain": "forward", "action": "drop"},
            {"id": "*c", "chain": "output", "action": "accept"}
        ]));
        writer
            .sync(router.id, ResourceKind::FirewallRule, &three)
            .await
            .unwrap();

        let two = records(json!([
            {"id": "*c", "chain": "output", "action": "accept"},
            {"id": "*a", "chain": "input", "action": "accept"}
        ]));
        let report = writer
            .sync(router.id, ResourceKind::FirewallRule, &two)
            .await
            .unwrap();
        assert_eq!(report.upserted, 2);

        let rows = repo.list(router.id, ResourceKind::FirewallRule).await.unwrap();
        let chains: Vec<(i32, String)> = rows
            .into_iter()
            .map(|row| match row {
                MirrorRow::FirewallRule(r) => (r.position, r.chain),
                other => panic!("unexpected row {:?}", other),
            })
            .collect();
        assert_eq!(
            chains,
            vec![(0, "output".to_string()), (1, "input".to_string())]
        );
    }

    #[tokio::test]
    async fn test_bad_row_is_skipped() {
        let (repo, router) = repo_with_router().await;
        let writer = MirrorWriter::new(&repo, MirrorPolicy::default());
        let vlans = records(json!([
            {"name": "ok", "vlanId": "10"},
            {"name": "broken"},
            {"name": "also-ok", "vlanId": 30}
        ]));

        let report = writer.sync(router.id, ResourceKind::Vlan, &vlans).await.unwrap();
        assert_eq!(report.upserted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(repo.count(router.id, ResourceKind::Vlan).await, 2);
    }

    #[tokio::test]
    async fn test_prune_only_when_enabled() {
        let (repo, router) = repo_with_router().await;
        let full = records(json!([
            {"name": "pool-a", "ranges": "10.0.0.10-10.0.0.20"},
            {"name": "pool-b", "ranges": "10.0.1.10-10.0.1.20"}
        ]));
        let partial = records(json!([{"name": "pool-a", "ranges": "10.0.0.10-10.0.0.20"}]));

        let keep = MirrorWriter::new(&repo, MirrorPolicy::default());
        keep.sync(router.id, ResourceKind::IpPool, &full).await.unwrap();
        keep.sync(router.id, ResourceKind::IpPool, &partial).await.unwrap();
        assert_eq!(repo.count(router.id, ResourceKind::IpPool).await, 2);

        let prune = MirrorWriter::new(&repo, MirrorPolicy { prune_stale: true });
        let report = prune
            .sync(router.id, ResourceKind::IpPool, &partial)
            .await
            .unwrap();
        assert_eq!(report.pruned, 1);
        assert_eq!(repo.count(router.id, ResourceKind::IpPool).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_router_fails_sync() {
        let repo = MemoryRepository::new();
        let writer = MirrorWriter::new(&repo, MirrorPolicy::default());
        let vlans = records(json!([{"name": "v", "vlanId": "10"}]));

        let result = writer.sync(Uuid::new_v4(), ResourceKind::Vlan, &vlans).await;
        assert!(matches!(result, Err(StoreError::UnknownRouter(_))));
    }

    #[tokio::test]
    async fn test_delete_router_cascades() {
        let (repo, router) = repo_with_router().await;
        let writer = MirrorWriter::new(&repo, MirrorPolicy::default());
        let queues = records(json!([{"name": "q1", "target": "10.0.0.5/32", "maxUpload": "1M", "maxDownload": "5M"}]));
        writer
            .sync(router.id, ResourceKind::BandwidthQueue, &queues)
            .await
            .unwrap();

        repo.delete_router(router.id).await.unwrap();
        assert_eq!(repo.count(router.id, ResourceKind::BandwidthQueue).await, 0);
    }

    #[tokio::test]
    async fn test_activity_newest_first() {
        let (repo, router) = repo_with_router().await;
        repo.append(&ActivityEntry::new(Some(&router), "sync-vlans", "Synced 2 VLANs"))
            .await
            .unwrap();
        repo.append(&ActivityEntry::new(None, "create-router", "Added router"))
            .await
            .unwrap();
        repo.append(&ActivityEntry::new(Some(&router), "sync-queues", "Synced 1 queues"))
            .await
            .unwrap();

        let entries = repo.recent(Some(router.id), 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "sync-queues");

        let all = repo.recent(None, 1).await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
