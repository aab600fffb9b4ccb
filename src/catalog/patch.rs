//! Sparse field changes
//!
//! A patch field is either absent (leave the stored value alone), an
//! explicit `null`, or a value. Absent and `null` are deliberately
//! different states.

use serde::{Deserialize, Deserializer};

use super::book::Category;

/// Tri-state patch field
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    /// Key not supplied
    Absent,
    /// Key supplied as `null`
    Null,
    /// Key supplied with a value
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Value(value)
    }
}

// Only runs for keys that are present; `#[serde(default)]` covers the rest.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

/// Changes to the mutable fields of a book.
///
/// `id`, `createdAt` and `borrowRecords` are not patchable; such keys in
/// the input are ignored.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookPatch {
    pub title: Patch<String>,
    pub author: Patch<String>,
    pub isbn: Patch<String>,
    pub category: Patch<Category>,
    pub description: Patch<String>,
    pub cover_url: Patch<String>,
    pub price: Patch<f64>,
    pub quantity: Patch<i64>,
}

impl BookPatch {
    /// True when no field is supplied
    pub fn is_empty(&self) -> bool {
        self.title.is_absent()
            && self.author.is_absent()
            && self.isbn.is_absent()
            && self.category.is_absent()
            && self.description.is_absent()
            && self.cover_url.is_absent()
            && self.price.is_absent()
            && self.quantity.is_absent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_null_value_are_distinct() {
        let patch: BookPatch =
            serde_json::from_str(r#"{"title": "Dune", "coverUrl": null}"#).unwrap();

        assert_eq!(patch.title, Patch::Value("Dune".to_string()));
        assert_eq!(patch.cover_url, Patch::Null);
        assert_eq!(patch.author, Patch::Absent);
        assert_eq!(patch.price, Patch::Absent);
    }

    #[test]
    fn test_empty_patch() {
        let patch: BookPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());

        let patch: BookPatch = serde_json::from_str(r#"{"quantity": 0}"#).unwrap();
        assert!(!patch.is_empty());
        assert_eq!(patch.quantity.value(), Some(&0));
    }

    #[test]
    fn test_protected_keys_are_ignored() {
        let patch: BookPatch = serde_json::from_str(
            r#"{"id": "x", "createdAt": "2020-01-01T00:00:00Z", "borrowRecords": []}"#,
        )
        .unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_negative_values_deserialize_for_validation() {
        let patch: BookPatch = serde_json::from_str(r#"{"price": -1, "quantity": -1}"#).unwrap();
        assert_eq!(patch.price, Patch::Value(-1.0));
        assert_eq!(patch.quantity, Patch::Value(-1));
    }
}
