use crate::domain::{DomainError, DomainResult};
use crate::store::{
    ChangeBatch, DocumentBackend, ItemQuery, MemoryBackend, QueryDiagnostics, StoreConfig,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A typed query result together with its per-call diagnostics.
#[derive(Debug)]
pub struct QueryResponse<T> {
    pub items: Vec<T>,
    pub diagnostics: QueryDiagnostics,
}

/// A stored item together with its per-call diagnostics.
#[derive(Debug)]
pub struct ItemResponse<T> {
    pub item: T,
    pub diagnostics: QueryDiagnostics,
}

/// Explicitly owned connection context for the document store.
///
/// One client is opened per process, shared by cloning, and closed exactly
/// once during shutdown. All handles derived from a closed client fail
/// with [`DomainError::ClientClosed`].
#[derive(Clone)]
pub struct StoreClient {
    backend: Arc<dyn DocumentBackend>,
    closed: Arc<AtomicBool>,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    /// Connects using the in-tree memory backend.
    pub fn connect(config: StoreConfig) -> DomainResult<Self> {
        Self::connect_with_backend(config, Arc::new(MemoryBackend::new()))
    }

    /// Connects with an explicit backend implementation.
    pub fn connect_with_backend(
        config: StoreConfig,
        backend: Arc<dyn DocumentBackend>,
    ) -> DomainResult<Self> {
        if config.endpoint.is_empty() {
            return Err(DomainError::InvalidStoreConfig(
                "endpoint must not be empty".to_string(),
            ));
        }
        if config.key.is_empty() {
            return Err(DomainError::InvalidStoreConfig(
                "key must not be empty".to_string(),
            ));
        }
        info!(
            endpoint = %config.endpoint,
            preferred_region = %config.preferred_region,
            consistency_level = ?config.consistency_level,
            "connected document store client"
        );
        Ok(Self {
            backend,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DomainError::ClientClosed);
        }
        Ok(())
    }

    pub fn database(&self, name: impl Into<String>) -> DatabaseHandle {
        DatabaseHandle {
            backend: Arc::clone(&self.backend),
            closed: Arc::clone(&self.closed),
            name: name.into(),
        }
    }

    pub async fn create_database(&self, name: &str) -> DomainResult<QueryDiagnostics> {
        self.ensure_open()?;
        self.backend.create_database(name).await
    }

    pub async fn delete_database(&self, name: &str) -> DomainResult<QueryDiagnostics> {
        self.ensure_open()?;
        self.backend.delete_database(name).await
    }

    pub async fn list_databases(&self) -> DomainResult<Vec<String>> {
        self.ensure_open()?;
        self.backend.list_databases().await
    }

    pub async fn database_exists(&self, name: &str) -> DomainResult<bool> {
        self.ensure_open()?;
        self.backend.database_exists(name).await
    }

    /// Releases the client. Idempotent; must happen after any change-feed
    /// processor using this client has been stopped.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("closed document store client");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Handle to a named database.
#[derive(Clone)]
pub struct DatabaseHandle {
    backend: Arc<dyn DocumentBackend>,
    closed: Arc<AtomicBool>,
    name: String,
}

impl DatabaseHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DomainError::ClientClosed);
        }
        Ok(())
    }

    pub fn container(&self, name: impl Into<String>) -> ContainerHandle {
        ContainerHandle {
            backend: Arc::clone(&self.backend),
            closed: Arc::clone(&self.closed),
            db: self.name.clone(),
            name: name.into(),
        }
    }

    pub async fn exists(&self) -> DomainResult<bool> {
        self.ensure_open()?;
        self.backend.database_exists(&self.name).await
    }

    pub async fn create_container(
        &self,
        name: &str,
        partition_key_path: &str,
        throughput_ru: i32,
    ) -> DomainResult<QueryDiagnostics> {
        self.ensure_open()?;
        self.backend
            .create_container(&self.name, name, partition_key_path, throughput_ru)
            .await
    }

    pub async fn delete_container(&self, name: &str) -> DomainResult<QueryDiagnostics> {
        self.ensure_open()?;
        self.backend.delete_container(&self.name, name).await
    }

    pub async fn list_containers(&self) -> DomainResult<Vec<String>> {
        self.ensure_open()?;
        self.backend.list_containers(&self.name).await
    }
}

/// Handle to a named container, with typed item helpers.
#[derive(Clone)]
pub struct ContainerHandle {
    backend: Arc<dyn DocumentBackend>,
    closed: Arc<AtomicBool>,
    db: String,
    name: String,
}

impl ContainerHandle {
    pub fn database_name(&self) -> &str {
        &self.db
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DomainError::ClientClosed);
        }
        Ok(())
    }

    pub async fn exists(&self) -> DomainResult<bool> {
        self.ensure_open()?;
        self.backend.container_exists(&self.db, &self.name).await
    }

    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &ItemQuery,
    ) -> DomainResult<QueryResponse<T>> {
        self.ensure_open()?;
        let (raw, diagnostics) = self.backend.query_items(&self.db, &self.name, query).await?;
        debug!(
            container = %self.name,
            request_charge = diagnostics.request_charge,
            duration_ms = diagnostics.duration.as_millis() as u64,
            "query diagnostics"
        );
        let items = raw
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(QueryResponse { items, diagnostics })
    }

    pub async fn create_item<T: Serialize + DeserializeOwned>(
        &self,
        item: &T,
    ) -> DomainResult<ItemResponse<T>> {
        self.ensure_open()?;
        let raw = serde_json::to_value(item)?;
        let (stored, diagnostics) = self.backend.create_item(&self.db, &self.name, raw).await?;
        Ok(ItemResponse {
            item: serde_json::from_value(stored)?,
            diagnostics,
        })
    }

    pub async fn upsert_raw(&self, item: Value) -> DomainResult<(Value, QueryDiagnostics)> {
        self.ensure_open()?;
        self.backend.upsert_item(&self.db, &self.name, item).await
    }

    pub async fn query_raw(
        &self,
        query: &ItemQuery,
    ) -> DomainResult<(Vec<Value>, QueryDiagnostics)> {
        self.ensure_open()?;
        self.backend.query_items(&self.db, &self.name, query).await
    }

    pub async fn partition_ranges(&self) -> DomainResult<Vec<String>> {
        self.ensure_open()?;
        self.backend.partition_ranges(&self.db, &self.name).await
    }

    pub async fn read_changes(
        &self,
        range: &str,
        continuation: u64,
        max_batch: usize,
    ) -> DomainResult<ChangeBatch> {
        self.ensure_open()?;
        self.backend
            .read_changes(&self.db, &self.name, range, continuation, max_batch)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Person;
    use crate::store::ConsistencyLevel;

    fn test_config() -> StoreConfig {
        StoreConfig::new("https://localhost:8081/", "test-key")
            .with_preferred_region("local")
            .with_consistency_level(ConsistencyLevel::Eventual)
    }

    #[tokio::test]
    async fn connect_rejects_empty_endpoint() {
        let err = StoreClient::connect(StoreConfig::new("", "key")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStoreConfig(_)));
    }

    #[tokio::test]
    async fn typed_round_trip_through_container() {
        let client = StoreClient::connect(test_config()).unwrap();
        client.create_database("PERSON_DB").await.unwrap();
        let db = client.database("PERSON_DB");
        db.create_container("personmanage", "/lastName", 400)
            .await
            .unwrap();

        let container = db.container("personmanage");
        let person = Person {
            first_name: Some("Yoshio".to_string()),
            age: 39,
            ..Person::default()
        }
        .with_generated_id();
        let created = container.create_item(&person).await.unwrap();
        assert_eq!(created.item.id, person.id);

        let response: QueryResponse<Person> = container.query(&ItemQuery::All).await.unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].first_name.as_deref(), Some("Yoshio"));
    }

    #[tokio::test]
    async fn close_is_idempotent_and_fails_later_calls() {
        let client = StoreClient::connect(test_config()).unwrap();
        let db = client.database("any");
        client.close();
        client.close();
        assert!(client.is_closed());
        let err = db.exists().await.unwrap_err();
        assert!(matches!(err, DomainError::ClientClosed));
        let err = client.list_databases().await.unwrap_err();
        assert!(matches!(err, DomainError::ClientClosed));
    }
}
