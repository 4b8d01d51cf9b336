use serde::{Deserialize, Serialize};

/// The record shape forwarded to the notification webhook.
///
/// Derived one-to-one from a changed document: fields absent in the raw
/// document stay `None` and serialize as null, unknown raw fields are
/// dropped. Field order is the canonical wire order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
