use common::store::ConsistencyLevel;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    // Document store configuration
    /// Store account endpoint
    #[serde(default = "default_store_endpoint")]
    pub store_endpoint: String,

    /// Store account key
    #[serde(default = "default_store_key")]
    pub store_key: String,

    /// Preferred region for request routing
    #[serde(default = "default_store_region")]
    pub store_region: String,

    /// Consistency level for the store connection
    #[serde(default)]
    pub store_consistency: ConsistencyLevel,

    // Change feed configuration
    /// Database holding the feed and lease containers
    #[serde(default = "default_feed_database")]
    pub feed_database: String,

    /// Container whose change feed is subscribed
    #[serde(default = "default_feed_container")]
    pub feed_container: String,

    /// Container holding change-feed lease checkpoints
    #[serde(default = "default_lease_container")]
    pub lease_container: String,

    /// Host name recorded on owned leases
    #[serde(default = "default_feed_host_name")]
    pub feed_host_name: String,

    /// Feed poll interval in seconds. The processor default is 5; this
    /// service runs at 1 for lower notification latency at higher RU cost.
    #[serde(default = "default_feed_poll_secs")]
    pub feed_poll_secs: u64,

    /// Upper bound on documents per delivered batch
    #[serde(default = "default_feed_max_batch")]
    pub feed_max_batch: usize,

    // Notification webhook configuration
    /// Webhook POST endpoint for mapped notifications
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,

    // Gateway HTTP server configuration
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_endpoint() -> String {
    "https://localhost:8081/".to_string()
}

fn default_store_key() -> String {
    "local-dev-key".to_string()
}

fn default_store_region() -> String {
    "local".to_string()
}

fn default_feed_database() -> String {
    "MESSAGES".to_string()
}

fn default_feed_container() -> String {
    "message".to_string()
}

fn default_lease_container() -> String {
    "message-leases".to_string()
}

fn default_feed_host_name() -> String {
    "change-feedhost".to_string()
}

fn default_feed_poll_secs() -> u64 {
    1
}

fn default_feed_max_batch() -> usize {
    100
}

fn default_webhook_url() -> String {
    "http://localhost:9090/notify".to_string()
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("FEEDBRIDGE"))
            .build()?
            .try_deserialize()
    }
}
