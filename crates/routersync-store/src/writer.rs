use routersync_core::{Record, ResourceKind, SyncError, WritePolicy};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::normalize::normalize;
use crate::rows::MirrorRow;
use crate::{MirrorStore, StoreError, StoreResult};

/// How stale mirror rows are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorPolicy {
    /// Delete rows the router no longer reports. Firewall rules are always replaced.
    pub prune_stale: bool,
}

/// Outcome of mirroring one list response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub upserted: u64,
    pub skipped: u64,
    pub pruned: u64,
}

/// Writes device list results into the mirror tables
pub struct MirrorWriter<'a, S: ?Sized> {
    store: &'a S,
    policy: MirrorPolicy,
}

impl<'a, S: MirrorStore + ?Sized> MirrorWriter<'a, S> {
    pub fn new(store: &'a S, policy: MirrorPolicy) -> Self {
        Self { store, policy }
    }

    /// Mirror a full list response for one kind.
    ///
    /// Rows are upserted one at a time in device order. A row that cannot be
    /// normalized or stored is logged and skipped; earlier rows stay written.
    pub async fn sync(
        &self,
        router_id: Uuid,
        kind: ResourceKind,
        records: &[Record],
    ) -> StoreResult<SyncReport> {
        let report = match kind.write_policy() {
            WritePolicy::Replace => self.replace(router_id, kind, records).await?,
            WritePolicy::Upsert => self.upsert_all(router_id, kind, records).await?,
        };

        routersync_metrics::record_mirror_rows(kind.as_str(), report.upserted, report.skipped);
        info!(
            router_id = %router_id,
            kind = %kind,
            upserted = report.upserted,
            skipped = report.skipped,
            pruned = report.pruned,
            "mirror sync finished"
        );
        Ok(report)
    }

    /// Mirror a single record returned by a create/update call
    pub async fn write_one(
        &self,
        router_id: Uuid,
        kind: ResourceKind,
        record: &Record,
    ) -> Result<MirrorRow, SyncError> {
        let row = normalize(kind, router_id, 0, record).map_err(|reason| {
            SyncError::Mapping(format!("cannot mirror {} row: {}", kind.as_str(), reason))
        })?;
        self.store.upsert(&row).await?;
        routersync_metrics::record_mirror_rows(kind.as_str(), 1, 0);
        Ok(row)
    }

    async fn upsert_all(
        &self,
        router_id: Uuid,
        kind: ResourceKind,
        records: &[Record],
    ) -> StoreResult<SyncReport> {
        let mut report = SyncReport::default();
        let mut keep = Vec::with_capacity(records.len());
        let mut last_error: Option<StoreError> = None;

        for (index, record) in records.iter().enumerate() {
            let row = match normalize(kind, router_id, index, record) {
                Ok(row) => row,
                Err(reason) => {
                    warn!(router_id = %router_id, kind = %kind, index, reason = %reason, "skipping device row");
                    report.skipped += 1;
                    continue;
                }
            };
            keep.push(row.natural_key());

            match self.store.upsert(&row).await {
                Ok(()) => report.upserted += 1,
                Err(e) => {
                    warn!(router_id = %router_id, kind = %kind, key = %row.natural_key(), error = %e, "upsert failed");
                    report.skipped += 1;
                    last_error = Some(e);
                }
            }
        }

        // Nothing stored at all: the store itself is failing
        if report.upserted == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        if self.policy.prune_stale {
            report.pruned = self.store.prune(router_id, kind, &keep).await?;
        }
        Ok(report)
    }

    async fn replace(
        &self,
        router_id: Uuid,
        kind: ResourceKind,
        records: &[Record],
    ) -> StoreResult<SyncReport> {
        let mut report = SyncReport::default();
        let mut rules = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            match normalize(kind, router_id, index, record) {
                Ok(MirrorRow::FirewallRule(mut rule)) => {
                    rule.position = i32::try_from(rules.len()).unwrap_or(i32::MAX);
                    rules.push(rule);
                }
                Ok(other) => {
                    warn!(kind = %other.kind(), "unexpected row kind in replace sync");
                    report.skipped += 1;
                }
                Err(reason) => {
                    warn!(router_id = %router_id, kind = %kind, index, reason = %reason, "skipping device row");
                    report.skipped += 1;
                }
            }
        }

        self.store.replace_firewall_rules(router_id, &rules).await?;
        report.upserted = rules.len() as u64;
        Ok(report)
    }
}
