use serde::{Deserialize, Serialize};

/// A person record as stored in the document container.
///
/// The id is server-assigned at creation time; request bodies arrive
/// without one. Unknown fields in stored documents are ignored on
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub age: i64,
}

impl Person {
    /// Returns a copy of this person with a freshly generated unique id.
    pub fn with_generated_id(mut self) -> Self {
        self.id = Some(xid::new().to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_leniently() {
        let person: Person = serde_json::from_str(
            r#"{"firstName":"Aki","lastName":"Sato","age":41,"_etag":"xyz"}"#,
        )
        .unwrap();
        assert_eq!(person.id, None);
        assert_eq!(person.first_name.as_deref(), Some("Aki"));
        assert_eq!(person.age, 41);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = Person::default().with_generated_id();
        let b = Person::default().with_generated_id();
        assert!(a.id.is_some());
        assert_ne!(a.id, b.id);
    }
}
