//! Stored record type
//!
//! A record is the unit of persistence: a primary key, a write version and
//! a flat map of named attributes. The key is never part of the attribute
//! map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute name reserved for the primary key
pub const ID_ATTRIBUTE: &str = "id";

/// Named attribute values of a record
pub type Attributes = Map<String, Value>;

/// A record as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key
    pub id: String,
    /// Incremented on every successful write, starting at 1
    pub version: u64,
    /// Everything except the primary key
    pub attributes: Attributes,
}

impl Record {
    /// Create a record at its first version
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            version: 1,
            attributes: without_key(attributes),
        }
    }

    /// Merge `changes` into the attributes and bump the version.
    ///
    /// The primary key attribute is skipped even if present.
    pub fn apply_changes(&mut self, changes: &Attributes) {
        for (name, value) in changes {
            if name == ID_ATTRIBUTE {
                continue;
            }
            self.attributes.insert(name.clone(), value.clone());
        }
        self.version += 1;
    }

    /// Get a single attribute
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Drop the primary key attribute from a map
pub fn without_key(mut attributes: Attributes) -> Attributes {
    attributes.remove(ID_ATTRIBUTE);
    attributes
}

/// Whether `changes` names at least one attribute other than the key
pub fn has_updatable(changes: &Attributes) -> bool {
    changes.keys().any(|k| k != ID_ATTRIBUTE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_new_strips_key() {
        let record = Record::new("b1", attrs(json!({"id": "other", "title": "Dune"})));
        assert_eq!(record.id, "b1");
        assert_eq!(record.version, 1);
        assert!(record.attribute("id").is_none());
        assert_eq!(record.attribute("title"), Some(&json!("Dune")));
    }

    #[test]
    fn test_apply_changes_is_sparse() {
        let mut record = Record::new("b1", attrs(json!({"title": "Dune", "price": 9.5})));
        record.apply_changes(&attrs(json!({"price": 12.0, "id": "hijack"})));

        assert_eq!(record.id, "b1");
        assert_eq!(record.version, 2);
        assert_eq!(record.attribute("title"), Some(&json!("Dune")));
        assert_eq!(record.attribute("price"), Some(&json!(12.0)));
        assert!(record.attribute("id").is_none());
    }

    #[test]
    fn test_has_updatable() {
        assert!(!has_updatable(&attrs(json!({}))));
        assert!(!has_updatable(&attrs(json!({"id": "x"}))));
        assert!(has_updatable(&attrs(json!({"id": "x", "title": "y"}))));
    }
}
