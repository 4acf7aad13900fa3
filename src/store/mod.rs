/// Row store abstraction
///
/// The backend persists everything through a REST-style row store that only
/// understands equality filters and a `field.asc|desc` order directive.
/// `RowStore` captures that contract behind a trait so the hosted adapter
/// and the in-memory adapter are interchangeable; `EntityStore` layers the
/// typed conversions on top so services never touch raw JSON rows.

// Supabase/PostgREST adapter over reqwest
pub mod rest;

// In-memory adapter for tests and store-less deployments
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use memory::InMemoryRowStore;
pub use rest::RestRowStore;

/// A single row as it crosses the store boundary
pub type Row = serde_json::Map<String, Value>;

/// Logical table names shared by both adapters
pub mod tables {
    pub const ORGANIZATIONS: &str = "organizations";
    pub const ORGANIZATION_MEMBERS: &str = "organization_members";
    pub const WORKFLOWS: &str = "workflows";
    pub const WORKFLOW_STEPS: &str = "workflow_steps";
    pub const COMMENTS: &str = "comments";
    pub const ACTIVITY_LOGS: &str = "activity_logs";
    pub const USERS: &str = "users";
}

/// Current UTC time in the RFC 3339 format rows carry on the wire
pub fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing service could not be reached at all
    #[error("row store unreachable: {0}")]
    Unavailable(String),

    /// The backing service answered with a non-success status
    #[error("row store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// A row could not be encoded or decoded
    #[error("malformed row payload: {0}")]
    Malformed(String),
}

/// Minimal CRUD contract of the backing row store
///
/// Filters are equality predicates as `(field, value)` pairs. `insert` and
/// `update` return the post-write representation (server-assigned id and
/// timestamps included) so callers never need a follow-up read. A missing
/// row is an empty result set, not an error.
#[async_trait]
pub trait RowStore: Send + Sync + std::fmt::Debug {
    async fn select(
        &self,
        table: &str,
        filters: &[(String, String)],
        order: Option<&str>,
    ) -> Result<Vec<Row>, StoreError>;

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError>;

    async fn update(
        &self,
        table: &str,
        matches: &[(String, String)],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError>;

    async fn delete(&self, table: &str, matches: &[(String, String)]) -> Result<(), StoreError>;
}

/// Typed CRUD primitives over the row store
///
/// Translates between domain types and raw rows. Cloning is cheap; the
/// underlying adapter is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct EntityStore {
    rows: Arc<dyn RowStore>,
}

impl EntityStore {
    pub fn new(rows: Arc<dyn RowStore>) -> Self {
        Self { rows }
    }

    /// Fetch a single row by id, `None` when absent
    pub async fn get<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let filters = [("id".to_string(), id.to_string())];
        let rows = self.rows.select(table, &filters, None).await?;
        rows.into_iter().next().map(from_row).transpose()
    }

    /// List rows matching every filter, optionally ordered
    pub async fn list<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
        order: Option<&str>,
    ) -> Result<Vec<T>, StoreError> {
        let rows = self.rows.select(table, &own(filters), order).await?;
        rows.into_iter().map(from_row).collect()
    }

    /// Insert one row and return its post-write representation
    pub async fn insert_one<T: DeserializeOwned>(
        &self,
        table: &str,
        payload: impl Serialize,
    ) -> Result<T, StoreError> {
        let mut rows = self.rows.insert(table, vec![to_row(payload)?]).await?;
        if rows.is_empty() {
            return Err(StoreError::Malformed(format!(
                "insert into '{table}' returned no representation"
            )));
        }
        from_row(rows.remove(0))
    }

    /// Patch all rows matching the filters, returning the updated rows.
    /// An empty result means nothing matched; callers decide what that means.
    pub async fn update<T: DeserializeOwned>(
        &self,
        table: &str,
        matches: &[(&str, &str)],
        patch: impl Serialize,
    ) -> Result<Vec<T>, StoreError> {
        let rows = self
            .rows
            .update(table, &own(matches), to_row(patch)?)
            .await?;
        rows.into_iter().map(from_row).collect()
    }

    pub async fn delete(&self, table: &str, matches: &[(&str, &str)]) -> Result<(), StoreError> {
        self.rows.delete(table, &own(matches)).await
    }
}

fn own(filters: &[(&str, &str)]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Malformed(e.to_string()))
}

fn to_row(payload: impl Serialize) -> Result<Row, StoreError> {
    match serde_json::to_value(payload).map_err(|e| StoreError::Malformed(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Malformed(format!(
            "expected an object payload, got {other}"
        ))),
    }
}
