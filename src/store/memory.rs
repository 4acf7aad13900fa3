/// In-memory row-store adapter
///
/// Backs tests and store-less deployments with the same contract as the
/// hosted adapter: equality filters, `field.asc|desc` ordering, and
/// server-assigned `id`/`created_at`/`updated_at` on insert. Rows live in a
/// table-name -> row-list map behind an async RwLock.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{now_utc, Row, RowStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryRowStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filters(row: &Row, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(field, expected)| match row.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == *expected,
        Some(Value::Bool(b)) => b.to_string() == *expected,
        Some(Value::Null) | None => expected == "null",
        Some(_) => false,
    })
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Null) | None) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Sort rows by an `field.asc|desc` directive. The sort is stable, so rows
/// with equal keys keep their insertion order.
fn apply_order(rows: &mut [Row], directive: &str) {
    let (field, descending) = match directive.rsplit_once('.') {
        Some((f, "desc")) => (f, true),
        Some((f, "asc")) => (f, false),
        _ => (directive, false),
    };

    rows.sort_by(|a, b| {
        let ord = compare_values(a.get(field), b.get(field));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn select(
        &self,
        table: &str,
        filters: &[(String, String)],
        order: Option<&str>,
    ) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|row| matches_filters(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(directive) = order {
            apply_order(&mut rows, directive);
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().await;
        let bucket = tables.entry(table.to_string()).or_default();

        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            let now = now_utc();
            row.entry("id".to_string())
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            row.entry("created_at".to_string())
                .or_insert_with(|| Value::String(now.clone()));
            row.entry("updated_at".to_string())
                .or_insert_with(|| Value::String(now));
            bucket.push(row.clone());
            inserted.push(row);
        }

        Ok(inserted)
    }

    async fn update(
        &self,
        table: &str,
        matches: &[(String, String)],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(bucket) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in bucket.iter_mut().filter(|row| matches_filters(row, matches)) {
            for (field, value) in patch.clone() {
                row.insert(field, value);
            }
            updated.push(row.clone());
        }

        Ok(updated)
    }

    async fn delete(&self, table: &str, matches: &[(String, String)]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(bucket) = tables.get_mut(table) {
            bucket.retain(|row| !matches_filters(row, matches));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = InMemoryRowStore::new();
        let inserted = store
            .insert("workflows", vec![row(json!({"title": "Onboarding"}))])
            .await
            .unwrap();

        assert_eq!(inserted.len(), 1);
        assert!(inserted[0].get("id").unwrap().is_string());
        assert!(inserted[0].get("created_at").unwrap().is_string());
        assert!(inserted[0].get("updated_at").unwrap().is_string());
    }

    #[tokio::test]
    async fn select_applies_equality_filters() {
        let store = InMemoryRowStore::new();
        store
            .insert(
                "workflow_steps",
                vec![
                    row(json!({"workflow_id": "wf-1", "title": "a"})),
                    row(json!({"workflow_id": "wf-2", "title": "b"})),
                ],
            )
            .await
            .unwrap();

        let rows = store
            .select(
                "workflow_steps",
                &[("workflow_id".to_string(), "wf-1".to_string())],
                None,
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("title").unwrap(), "a");
    }

    #[tokio::test]
    async fn order_directive_sorts_numbers_numerically() {
        let store = InMemoryRowStore::new();
        store
            .insert(
                "workflow_steps",
                vec![
                    row(json!({"title": "ten", "step_order": 10})),
                    row(json!({"title": "two", "step_order": 2})),
                    row(json!({"title": "one", "step_order": 1})),
                ],
            )
            .await
            .unwrap();

        let rows = store
            .select("workflow_steps", &[], Some("step_order.asc"))
            .await
            .unwrap();

        let titles: Vec<&str> = rows
            .iter()
            .map(|r| r.get("title").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["one", "two", "ten"]);
    }

    #[tokio::test]
    async fn order_ties_keep_insertion_order() {
        let store = InMemoryRowStore::new();
        store
            .insert(
                "workflow_steps",
                vec![
                    row(json!({"title": "first", "step_order": 0})),
                    row(json!({"title": "second", "step_order": 0})),
                ],
            )
            .await
            .unwrap();

        let rows = store
            .select("workflow_steps", &[], Some("step_order.asc"))
            .await
            .unwrap();

        assert_eq!(rows[0].get("title").unwrap(), "first");
        assert_eq!(rows[1].get("title").unwrap(), "second");
    }

    #[tokio::test]
    async fn update_merges_patch_and_returns_representation() {
        let store = InMemoryRowStore::new();
        let inserted = store
            .insert("workflows", vec![row(json!({"title": "before"}))])
            .await
            .unwrap();
        let id = inserted[0].get("id").unwrap().as_str().unwrap().to_string();

        let updated = store
            .update(
                "workflows",
                &[("id".to_string(), id)],
                row(json!({"title": "after"})),
            )
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].get("title").unwrap(), "after");
    }

    #[tokio::test]
    async fn update_on_missing_rows_returns_empty() {
        let store = InMemoryRowStore::new();
        let updated = store
            .update(
                "workflows",
                &[("id".to_string(), "missing".to_string())],
                row(json!({"title": "after"})),
            )
            .await
            .unwrap();
        assert!(updated.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_matching_rows() {
        let store = InMemoryRowStore::new();
        store
            .insert(
                "comments",
                vec![
                    row(json!({"workflow_id": "wf-1", "content": "a"})),
                    row(json!({"workflow_id": "wf-2", "content": "b"})),
                ],
            )
            .await
            .unwrap();

        store
            .delete("comments", &[("workflow_id".to_string(), "wf-1".to_string())])
            .await
            .unwrap();

        let rest = store.select("comments", &[], None).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].get("content").unwrap(), "b");
    }
}
