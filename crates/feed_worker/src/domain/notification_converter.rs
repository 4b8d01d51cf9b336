use common::domain::{DomainResult, Notification};
use serde_json::Value;

/// Reinterprets a raw changed document as a [`Notification`].
///
/// Lenient by construction: unknown fields are dropped, missing fields
/// default to null.
pub fn to_notification(doc: Value) -> DomainResult<Notification> {
    Ok(serde_json::from_value(doc)?)
}

/// The canonical JSON text form submitted to the notification sink.
pub fn canonical_json(notification: &Notification) -> DomainResult<String> {
    Ok(serde_json::to_string(notification)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_full_document_to_identical_json() {
        let doc = json!({"id":"u1","name":"Azure Cosmos Updates","message":"hello"});
        let notification = to_notification(doc).unwrap();
        assert_eq!(
            canonical_json(&notification).unwrap(),
            r#"{"id":"u1","name":"Azure Cosmos Updates","message":"hello"}"#
        );
    }

    #[test]
    fn missing_message_defaults_to_null() {
        let doc = json!({"id":"u1","name":"n","_rid":"sys","_ts":170000});
        let notification = to_notification(doc).unwrap();
        assert_eq!(notification.message, None);
        assert_eq!(
            canonical_json(&notification).unwrap(),
            r#"{"id":"u1","name":"n","message":null}"#
        );
    }

    #[test]
    fn non_object_document_is_an_error() {
        assert!(to_notification(json!("just a string")).is_err());
    }
}
