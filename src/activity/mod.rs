/// Append-only activity ledger
///
/// Records one immutable fact per mutation on workflows, steps, and
/// comments. Recording is best-effort: a failed ledger write is logged and
/// swallowed so it can never abort the business mutation that triggered it.
/// Entries are never updated or deleted.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::store::{tables, EntityStore};

/// Kind of entity an entry is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Workflow,
    Step,
    Comment,
}

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub action: ActivityAction,
    #[serde(default)]
    pub details: Option<String>,
    pub created_at: String,
}

/// One mutation fact, ready to be recorded
#[derive(Debug, Clone)]
pub struct ActivityEvent {
    pub organization_id: Option<String>,
    pub workflow_id: Option<String>,
    pub user_id: Option<String>,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub action: ActivityAction,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct ActivityLedger {
    store: EntityStore,
}

impl ActivityLedger {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Record one mutation fact
    ///
    /// Never fails: ledger availability must not gate the primary write, so
    /// store errors are logged at warn and dropped here. `created_at` is
    /// assigned by the store at insert time, which keeps entries
    /// monotonically non-decreasing.
    pub async fn record(&self, event: ActivityEvent) {
        let payload = json!({
            "organization_id": event.organization_id,
            "workflow_id": event.workflow_id,
            "user_id": event.user_id,
            "entity_type": event.entity_type,
            "entity_id": event.entity_id,
            "action": event.action,
            "details": event.details,
        });

        if let Err(e) = self
            .store
            .insert_one::<ActivityLogEntry>(tables::ACTIVITY_LOGS, payload)
            .await
        {
            tracing::warn!("activity log write failed: {}", e);
        }
    }

    /// List ledger entries, newest first
    ///
    /// Filters are AND-combined. The workflow filter matches either the
    /// entry's own workflow scope or the acted-upon entity itself (a
    /// workflow deletion clears its workflow scope but keeps the workflow
    /// as `entity_id`), so it is applied here rather than at the store.
    pub async fn list(
        &self,
        org_id: Option<&str>,
        workflow_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Vec<ActivityLogEntry>, AppError> {
        let mut filters: Vec<(&str, &str)> = Vec::new();
        if let Some(org) = org_id.map(str::trim).filter(|s| !s.is_empty()) {
            filters.push(("organization_id", org));
        }
        if let Some(user) = user_id {
            filters.push(("user_id", user));
        }

        let entries: Vec<ActivityLogEntry> = self
            .store
            .list(tables::ACTIVITY_LOGS, &filters, Some("created_at.desc"))
            .await?;

        Ok(match workflow_id {
            Some(wid) => entries
                .into_iter()
                .filter(|entry| entry.workflow_id.as_deref() == Some(wid) || entry.entity_id == wid)
                .collect(),
            None => entries,
        })
    }
}
