use serde::{Deserialize, Serialize};

/// Consistency level requested when connecting to the document store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyLevel {
    Strong,
    BoundedStaleness,
    Session,
    ConsistentPrefix,
    /// Performance-first default for this service.
    #[default]
    Eventual,
}

/// Connection settings for a [`StoreClient`](crate::store::StoreClient).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Account endpoint URL.
    pub endpoint: String,
    /// Account key. Not logged.
    pub key: String,
    /// Preferred region for request routing.
    pub preferred_region: String,
    pub consistency_level: ConsistencyLevel,
}

impl StoreConfig {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            preferred_region: String::new(),
            consistency_level: ConsistencyLevel::default(),
        }
    }

    pub fn with_preferred_region(mut self, region: impl Into<String>) -> Self {
        self.preferred_region = region.into();
        self
    }

    pub fn with_consistency_level(mut self, level: ConsistencyLevel) -> Self {
        self.consistency_level = level;
        self
    }
}
