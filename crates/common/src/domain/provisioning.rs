use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for database create/delete routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseRequest {
    pub db_name: String,
}

/// Request body for container create/delete routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRequest {
    pub container_name: String,
    #[serde(default)]
    pub partition_name: String,
    #[serde(default)]
    pub request_unit: i32,
}

/// Response body for completed database provisioning operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseOperation {
    pub db_name: String,
    #[serde(with = "executed_date_time")]
    pub executed_date_time: DateTime<Utc>,
}

/// Response body for completed container provisioning operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOperation {
    pub container_name: String,
    #[serde(with = "executed_date_time")]
    pub executed_date_time: DateTime<Utc>,
}

/// `yyyy/MM/dd HH:mm:ss` timestamp formatting for provisioning responses.
mod executed_date_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y/%m/%d %H:%M:%S";

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)?;
        Ok(naive.and_utc())
    }
}
