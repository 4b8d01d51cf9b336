use crate::domain::{DomainError, DomainResult};
use crate::store::{ChangeBatch, DocumentBackend, ItemQuery, QueryDiagnostics};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;

/// In-memory implementation of [`DocumentBackend`] using nested HashMaps.
///
/// Each container keeps its items in insertion order plus an append-only
/// change log; the change feed exposes a single partition range backed by
/// that log. Request charges are simulated so callers can exercise the
/// diagnostics path.
#[derive(Default)]
pub struct MemoryBackend {
    databases: RwLock<HashMap<String, MemoryDatabase>>,
}

#[derive(Default)]
struct MemoryDatabase {
    containers: HashMap<String, MemoryContainer>,
}

struct MemoryContainer {
    #[allow(dead_code)]
    partition_key_path: String,
    #[allow(dead_code)]
    throughput_ru: i32,
    items: Vec<Value>,
    changes: Vec<Value>,
}

/// The single logical partition range the in-memory change feed exposes.
const PARTITION_RANGE: &str = "0";

fn diagnostics(started: Instant, item_count: usize) -> QueryDiagnostics {
    // Rough RU model: fixed per-call cost plus a per-item read charge.
    QueryDiagnostics {
        request_charge: 2.3 + 0.03 * item_count as f64,
        duration: started.elapsed(),
    }
}

fn item_id(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn create_database(&self, db: &str) -> DomainResult<QueryDiagnostics> {
        let started = Instant::now();
        let mut databases = self.databases.write().await;
        databases.entry(db.to_string()).or_default();
        Ok(diagnostics(started, 0))
    }

    async fn delete_database(&self, db: &str) -> DomainResult<QueryDiagnostics> {
        let started = Instant::now();
        let mut databases = self.databases.write().await;
        databases
            .remove(db)
            .ok_or_else(|| DomainError::DatabaseNotFound(db.to_string()))?;
        Ok(diagnostics(started, 0))
    }

    async fn list_databases(&self) -> DomainResult<Vec<String>> {
        let databases = self.databases.read().await;
        let mut names: Vec<String> = databases.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn database_exists(&self, db: &str) -> DomainResult<bool> {
        let databases = self.databases.read().await;
        Ok(databases.contains_key(db))
    }

    async fn create_container(
        &self,
        db: &str,
        container: &str,
        partition_key_path: &str,
        throughput_ru: i32,
    ) -> DomainResult<QueryDiagnostics> {
        let started = Instant::now();
        let mut databases = self.databases.write().await;
        let database = databases
            .get_mut(db)
            .ok_or_else(|| DomainError::DatabaseNotFound(db.to_string()))?;
        database
            .containers
            .entry(container.to_string())
            .or_insert_with(|| MemoryContainer {
                partition_key_path: partition_key_path.to_string(),
                throughput_ru,
                items: Vec::new(),
                changes: Vec::new(),
            });
        Ok(diagnostics(started, 0))
    }

    async fn delete_container(&self, db: &str, container: &str) -> DomainResult<QueryDiagnostics> {
        let started = Instant::now();
        let mut databases = self.databases.write().await;
        let database = databases
            .get_mut(db)
            .ok_or_else(|| DomainError::DatabaseNotFound(db.to_string()))?;
        database
            .containers
            .remove(container)
            .ok_or_else(|| DomainError::ContainerNotFound(db.to_string(), container.to_string()))?;
        Ok(diagnostics(started, 0))
    }

    async fn list_containers(&self, db: &str) -> DomainResult<Vec<String>> {
        let databases = self.databases.read().await;
        let database = databases
            .get(db)
            .ok_or_else(|| DomainError::DatabaseNotFound(db.to_string()))?;
        let mut names: Vec<String> = database.containers.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn container_exists(&self, db: &str, container: &str) -> DomainResult<bool> {
        let databases = self.databases.read().await;
        Ok(databases
            .get(db)
            .map(|database| database.containers.contains_key(container))
            .unwrap_or(false))
    }

    async fn create_item(
        &self,
        db: &str,
        container: &str,
        item: Value,
    ) -> DomainResult<(Value, QueryDiagnostics)> {
        let started = Instant::now();
        let mut databases = self.databases.write().await;
        let target = container_mut(&mut databases, db, container)?;
        target.items.push(item.clone());
        target.changes.push(item.clone());
        Ok((item, diagnostics(started, 1)))
    }

    async fn upsert_item(
        &self,
        db: &str,
        container: &str,
        item: Value,
    ) -> DomainResult<(Value, QueryDiagnostics)> {
        let started = Instant::now();
        let mut databases = self.databases.write().await;
        let target = container_mut(&mut databases, db, container)?;
        let existing = item_id(&item).and_then(|id| {
            target
                .items
                .iter()
                .position(|stored| item_id(stored) == Some(id))
        });
        match existing {
            Some(index) => target.items[index] = item.clone(),
            None => target.items.push(item.clone()),
        }
        target.changes.push(item.clone());
        Ok((item, diagnostics(started, 1)))
    }

    async fn query_items(
        &self,
        db: &str,
        container: &str,
        query: &ItemQuery,
    ) -> DomainResult<(Vec<Value>, QueryDiagnostics)> {
        let started = Instant::now();
        let databases = self.databases.read().await;
        let database = databases
            .get(db)
            .ok_or_else(|| DomainError::DatabaseNotFound(db.to_string()))?;
        let target = database
            .containers
            .get(container)
            .ok_or_else(|| DomainError::ContainerNotFound(db.to_string(), container.to_string()))?;

        let items = match query {
            ItemQuery::All => target.items.clone(),
            ItemQuery::ById(id) => target
                .items
                .iter()
                .filter(|item| item_id(item) == Some(id.as_str()))
                .cloned()
                .collect(),
            ItemQuery::OrderedByField {
                field,
                offset,
                limit,
            } => {
                let mut ordered = target.items.clone();
                ordered.sort_by_key(|item| {
                    item.get(field).and_then(Value::as_i64).unwrap_or(i64::MIN)
                });
                ordered.into_iter().skip(*offset).take(*limit).collect()
            }
        };
        let count = items.len();
        Ok((items, diagnostics(started, count)))
    }

    async fn partition_ranges(&self, db: &str, container: &str) -> DomainResult<Vec<String>> {
        if !self.container_exists(db, container).await? {
            return Err(DomainError::ContainerNotFound(
                db.to_string(),
                container.to_string(),
            ));
        }
        Ok(vec![PARTITION_RANGE.to_string()])
    }

    async fn read_changes(
        &self,
        db: &str,
        container: &str,
        _range: &str,
        continuation: u64,
        max_batch: usize,
    ) -> DomainResult<ChangeBatch> {
        let databases = self.databases.read().await;
        let database = databases
            .get(db)
            .ok_or_else(|| DomainError::DatabaseNotFound(db.to_string()))?;
        let target = database
            .containers
            .get(container)
            .ok_or_else(|| DomainError::ContainerNotFound(db.to_string(), container.to_string()))?;

        let start = (continuation as usize).min(target.changes.len());
        let end = (start + max_batch).min(target.changes.len());
        Ok(ChangeBatch {
            docs: target.changes[start..end].to_vec(),
            continuation: end as u64,
        })
    }
}

fn container_mut<'a>(
    databases: &'a mut HashMap<String, MemoryDatabase>,
    db: &str,
    container: &str,
) -> DomainResult<&'a mut MemoryContainer> {
    databases
        .get_mut(db)
        .ok_or_else(|| DomainError::DatabaseNotFound(db.to_string()))?
        .containers
        .get_mut(container)
        .ok_or_else(|| DomainError::ContainerNotFound(db.to_string(), container.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn backend_with_container() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.create_database("PERSON_DB").await.unwrap();
        backend
            .create_container("PERSON_DB", "personmanage", "/lastName", 400)
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn create_database_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.create_database("db").await.unwrap();
        backend.create_database("db").await.unwrap();
        assert_eq!(backend.list_databases().await.unwrap(), vec!["db"]);
    }

    #[tokio::test]
    async fn delete_missing_database_fails() {
        let backend = MemoryBackend::new();
        let err = backend.delete_database("nope").await.unwrap_err();
        assert!(matches!(err, DomainError::DatabaseNotFound(_)));
    }

    #[tokio::test]
    async fn container_requires_database() {
        let backend = MemoryBackend::new();
        let err = backend
            .create_container("nope", "c", "/pk", 400)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DatabaseNotFound(_)));
    }

    #[tokio::test]
    async fn ordered_query_sorts_and_pages() {
        let backend = backend_with_container().await;
        for (id, age) in [("a", 30), ("b", 10), ("c", 20)] {
            backend
                .create_item("PERSON_DB", "personmanage", json!({"id": id, "age": age}))
                .await
                .unwrap();
        }
        let (items, diag) = backend
            .query_items(
                "PERSON_DB",
                "personmanage",
                &ItemQuery::OrderedByField {
                    field: "age".to_string(),
                    offset: 1,
                    limit: 30,
                },
            )
            .await
            .unwrap();
        let ids: Vec<&str> = items.iter().map(|i| item_id(i).unwrap()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert!(diag.request_charge > 0.0);
    }

    #[tokio::test]
    async fn query_by_id_matches_single_item() {
        let backend = backend_with_container().await;
        backend
            .create_item("PERSON_DB", "personmanage", json!({"id": "p1", "age": 1}))
            .await
            .unwrap();
        let (items, _) = backend
            .query_items(
                "PERSON_DB",
                "personmanage",
                &ItemQuery::ById("p1".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        let (items, _) = backend
            .query_items(
                "PERSON_DB",
                "personmanage",
                &ItemQuery::ById("p2".to_string()),
            )
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn change_feed_returns_changes_in_order_with_continuation() {
        let backend = backend_with_container().await;
        for id in ["1", "2", "3"] {
            backend
                .create_item("PERSON_DB", "personmanage", json!({"id": id}))
                .await
                .unwrap();
        }
        let batch = backend
            .read_changes("PERSON_DB", "personmanage", "0", 0, 2)
            .await
            .unwrap();
        assert_eq!(batch.docs.len(), 2);
        assert_eq!(batch.continuation, 2);
        assert_eq!(item_id(&batch.docs[0]), Some("1"));

        let rest = backend
            .read_changes("PERSON_DB", "personmanage", "0", batch.continuation, 10)
            .await
            .unwrap();
        assert_eq!(rest.docs.len(), 1);
        assert_eq!(item_id(&rest.docs[0]), Some("3"));
        assert_eq!(rest.continuation, 3);
    }

    #[tokio::test]
    async fn upsert_replaces_by_id_and_still_logs_change() {
        let backend = backend_with_container().await;
        backend
            .upsert_item("PERSON_DB", "personmanage", json!({"id": "x", "v": 1}))
            .await
            .unwrap();
        backend
            .upsert_item("PERSON_DB", "personmanage", json!({"id": "x", "v": 2}))
            .await
            .unwrap();
        let (items, _) = backend
            .query_items("PERSON_DB", "personmanage", &ItemQuery::All)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["v"], 2);
        let batch = backend
            .read_changes("PERSON_DB", "personmanage", "0", 0, 10)
            .await
            .unwrap();
        assert_eq!(batch.docs.len(), 2);
    }
}
