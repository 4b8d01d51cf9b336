use crate::domain::DomainResult;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// A typed query against a container.
///
/// The gateway only ever issues these three shapes, so the backend surface
/// carries them as data instead of a query-language string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemQuery {
    /// Every item in the container.
    All,
    /// Items whose `id` field equals the given value.
    ById(String),
    /// Items ordered ascending by a numeric field, then offset/limited.
    OrderedByField {
        field: String,
        offset: usize,
        limit: usize,
    },
}

/// Per-call cost and latency, reported by every backend operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryDiagnostics {
    /// Request units consumed by the call.
    pub request_charge: f64,
    pub duration: Duration,
}

/// One page of raw change-feed output for a partition range.
#[derive(Debug, Clone)]
pub struct ChangeBatch {
    /// Changed documents in the range's change order.
    pub docs: Vec<Value>,
    /// Continuation to pass to the next read for this range.
    pub continuation: u64,
}

/// Capability boundary of the managed document store.
///
/// Everything the service needs from the vendor SDK goes through this
/// trait; [`MemoryBackend`](crate::store::MemoryBackend) is the in-tree
/// implementation.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn create_database(&self, db: &str) -> DomainResult<QueryDiagnostics>;
    async fn delete_database(&self, db: &str) -> DomainResult<QueryDiagnostics>;
    async fn list_databases(&self) -> DomainResult<Vec<String>>;
    async fn database_exists(&self, db: &str) -> DomainResult<bool>;

    /// Creates a container with the given partition key path and manual
    /// throughput. No-op if the container already exists.
    async fn create_container(
        &self,
        db: &str,
        container: &str,
        partition_key_path: &str,
        throughput_ru: i32,
    ) -> DomainResult<QueryDiagnostics>;
    async fn delete_container(&self, db: &str, container: &str) -> DomainResult<QueryDiagnostics>;
    async fn list_containers(&self, db: &str) -> DomainResult<Vec<String>>;
    async fn container_exists(&self, db: &str, container: &str) -> DomainResult<bool>;

    /// Stores a new item. The caller is responsible for id assignment.
    async fn create_item(
        &self,
        db: &str,
        container: &str,
        item: Value,
    ) -> DomainResult<(Value, QueryDiagnostics)>;

    /// Inserts or replaces an item by its `id` field.
    async fn upsert_item(
        &self,
        db: &str,
        container: &str,
        item: Value,
    ) -> DomainResult<(Value, QueryDiagnostics)>;

    async fn query_items(
        &self,
        db: &str,
        container: &str,
        query: &ItemQuery,
    ) -> DomainResult<(Vec<Value>, QueryDiagnostics)>;

    /// The container's logical partition ranges, for change-feed reads.
    async fn partition_ranges(&self, db: &str, container: &str) -> DomainResult<Vec<String>>;

    /// Reads changes for one partition range starting at `continuation`,
    /// returning at most `max_batch` documents.
    async fn read_changes(
        &self,
        db: &str,
        container: &str,
        range: &str,
        continuation: u64,
        max_batch: usize,
    ) -> DomainResult<ChangeBatch>;
}
